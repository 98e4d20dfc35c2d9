/// Errors from the remote commerce platform.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The platform returned a non-2xx status code.
    #[error("Commerce API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Top-level GraphQL errors (malformed query, throttling, auth).
    #[error("GraphQL error: {}", .0.join("; "))]
    Graphql(Vec<String>),

    /// The mutation ran but rejected its input.
    #[error("Rejected by platform: {}", .0.join("; "))]
    UserErrors(Vec<String>),

    /// The response did not carry the expected payload node.
    #[error("Response missing {0}")]
    MissingPayload(&'static str),

    /// The payload was present but could not be interpreted.
    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
}

impl RemoteError {
    /// Whether the target object does not exist remotely. Deletes treat
    /// this as success.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Api { status, .. } => *status == 404,
            _ => false,
        }
    }
}
