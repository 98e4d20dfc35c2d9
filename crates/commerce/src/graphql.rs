//! Minimal GraphQL transport over `reqwest`.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::CommerceConfig;
use crate::error::RemoteError;

/// Header carrying the admin access token.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Standard GraphQL response envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorMessage {
    message: String,
}

/// One entry of a mutation's `userErrors` list.
#[derive(Debug, Clone, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

impl UserError {
    fn describe(&self) -> String {
        match &self.field {
            Some(path) if !path.is_empty() => format!("{}: {}", path.join("."), self.message),
            _ => self.message.clone(),
        }
    }

    fn is_not_found(&self) -> bool {
        let msg = self.message.to_ascii_lowercase();
        msg.contains("does not exist") || msg.contains("not found") || msg.contains("couldn't find")
    }
}

/// Turn a non-empty `userErrors` list into an error.
///
/// A list that only says the target is missing becomes
/// [`RemoteError::NotFound`] so deletes can treat it as done.
pub fn check_user_errors(
    errors: &[UserError],
    kind: &'static str,
    id: Option<&str>,
) -> Result<(), RemoteError> {
    if errors.is_empty() {
        return Ok(());
    }
    if let Some(id) = id {
        if errors.iter().all(UserError::is_not_found) {
            return Err(RemoteError::NotFound {
                kind,
                id: id.to_string(),
            });
        }
    }
    Err(RemoteError::UserErrors(
        errors.iter().map(UserError::describe).collect(),
    ))
}

/// HTTP client for the admin GraphQL endpoint of any shop.
pub struct GraphqlClient {
    client: reqwest::Client,
    config: CommerceConfig,
}

impl GraphqlClient {
    pub fn new(config: CommerceConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: CommerceConfig) -> Self {
        Self { client, config }
    }

    /// Run a query or mutation against a shop and decode its `data`.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        shop: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, RemoteError> {
        let body = serde_json::json!({
            "query": query,
            "variables": variables,
        });

        let response = self
            .client
            .post(self.config.endpoint(shop))
            .header(ACCESS_TOKEN_HEADER, &self.config.access_token)
            .json(&body)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let envelope: Envelope<T> = response.json().await?;
        Self::unwrap_envelope(envelope)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, capturing the body
    /// on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RemoteError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    fn unwrap_envelope<T>(envelope: Envelope<T>) -> Result<T, RemoteError> {
        if !envelope.errors.is_empty() {
            return Err(RemoteError::Graphql(
                envelope.errors.into_iter().map(|e| e.message).collect(),
            ));
        }
        envelope.data.ok_or(RemoteError::MissingPayload("data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn user_error(message: &str) -> UserError {
        UserError {
            field: Some(vec!["id".into()]),
            message: message.into(),
        }
    }

    #[test]
    fn empty_user_errors_pass() {
        assert!(check_user_errors(&[], "discount", Some("d1")).is_ok());
    }

    #[test]
    fn missing_target_maps_to_not_found() {
        let errors = [user_error("Discount does not exist")];
        assert_matches!(
            check_user_errors(&errors, "discount", Some("d1")),
            Err(RemoteError::NotFound { kind: "discount", .. })
        );
    }

    #[test]
    fn other_user_errors_are_rejections() {
        let errors = [user_error("Title can't be blank")];
        let err = check_user_errors(&errors, "discount", None).unwrap_err();
        assert_matches!(&err, RemoteError::UserErrors(msgs) if msgs[0] == "id: Title can't be blank");
    }

    #[test]
    fn envelope_errors_take_precedence() {
        let envelope: Envelope<serde_json::Value> = serde_json::from_value(serde_json::json!({
            "data": null,
            "errors": [{ "message": "Throttled" }]
        }))
        .unwrap();
        assert_matches!(
            GraphqlClient::unwrap_envelope(envelope),
            Err(RemoteError::Graphql(msgs)) if msgs == vec!["Throttled".to_string()]
        );
    }

    #[test]
    fn envelope_without_data_is_missing_payload() {
        let envelope: Envelope<serde_json::Value> =
            serde_json::from_value(serde_json::json!({})).unwrap();
        assert_matches!(
            GraphqlClient::unwrap_envelope(envelope),
            Err(RemoteError::MissingPayload("data"))
        );
    }
}
