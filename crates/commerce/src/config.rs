/// Connection settings for the commerce platform's admin GraphQL API.
#[derive(Debug, Clone)]
pub struct CommerceConfig {
    /// Fixed endpoint overriding the per-shop URL (proxies, local stubs).
    pub api_url: Option<String>,
    /// Admin API access token sent with every request.
    pub access_token: String,
    /// API version segment of the per-shop URL.
    pub api_version: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl CommerceConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                        | Default    |
    /// |--------------------------------|------------|
    /// | `COMMERCE_API_URL`             | (per shop) |
    /// | `COMMERCE_ACCESS_TOKEN`        | (empty)    |
    /// | `COMMERCE_API_VERSION`         | `2024-10`  |
    /// | `COMMERCE_REQUEST_TIMEOUT_SECS`| `15`       |
    pub fn from_env() -> Self {
        let api_url = std::env::var("COMMERCE_API_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        let access_token = std::env::var("COMMERCE_ACCESS_TOKEN").unwrap_or_default();
        if access_token.is_empty() {
            tracing::warn!("COMMERCE_ACCESS_TOKEN is not set; remote calls will be rejected");
        }

        let api_version =
            std::env::var("COMMERCE_API_VERSION").unwrap_or_else(|_| "2024-10".into());

        let request_timeout_secs: u64 = std::env::var("COMMERCE_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "15".into())
            .parse()
            .expect("COMMERCE_REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            api_url,
            access_token,
            api_version,
            request_timeout_secs,
        }
    }

    /// GraphQL endpoint for a shop.
    pub fn endpoint(&self, shop: &str) -> String {
        match &self.api_url {
            Some(url) => url.clone(),
            None => format!(
                "https://{shop}/admin/api/{}/graphql.json",
                self.api_version
            ),
        }
    }
}
