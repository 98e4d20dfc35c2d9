/// All local primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Remote object identifiers are opaque strings issued by the commerce
/// platform (e.g. `gid://platform/Metaobject/123`).
pub type RemoteId = String;
