/// Which remote object a failed remote call was operating on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteResource {
    Bundle,
    Discount,
    Product,
}

impl std::fmt::Display for RemoteResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bundle => f.write_str("bundle"),
            Self::Discount => f.write_str("discount"),
            Self::Product => f.write_str("product"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The remote platform rejected a create. No local state was changed
    /// and nothing is left orphaned.
    /// A remote read failed. Nothing was changed.
    #[error("Remote {resource} read failed: {message}")]
    RemoteRead {
        resource: RemoteResource,
        message: String,
    },

    #[error("Remote {resource} create failed: {message}")]
    RemoteCreate {
        resource: RemoteResource,
        message: String,
    },

    #[error("Remote {resource} update failed for {id}: {message}")]
    RemoteUpdate {
        resource: RemoteResource,
        id: String,
        message: String,
    },

    #[error("Remote {resource} delete failed for {id}: {message}")]
    RemoteDelete {
        resource: RemoteResource,
        id: String,
        message: String,
    },

    /// Local and remote state diverged and compensation could not restore
    /// them. Carries every identifier needed for manual reconciliation.
    #[error(
        "Consistency error (bundle: {}, discount: {}): {message}",
        bundle_id.as_deref().unwrap_or("-"),
        discount_id.as_deref().unwrap_or("-")
    )]
    Consistency {
        bundle_id: Option<String>,
        discount_id: Option<String>,
        message: String,
    },

    /// The bundle's old discount was removed but its replacement does not
    /// exist yet. Retrying the same update recreates it.
    #[error("Partial update of bundle {bundle_id}: {message}")]
    PartialUpdate { bundle_id: String, message: String },

    #[error("No discount link recorded for bundle {bundle_id}")]
    OrphanedRecord { bundle_id: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for [`CoreError::NotFound`] with any displayable key.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether the caller may safely retry the same operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PartialUpdate { .. })
    }
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
