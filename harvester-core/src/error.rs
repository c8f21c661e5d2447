use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Feed API error: {0}")]
    FeedApi(#[from] FeedApiError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedApiError {
    #[error("Transport failure: {reason}")]
    Transport { reason: String },

    #[error("Request timed out after {seconds} seconds")]
    RequestTimeout { seconds: u64 },

    #[error("Server returned status {status_code}: {body}")]
    ServerError { status_code: u16, body: String },

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },
}

impl FeedApiError {
    /// Both variants that mean the request never produced a response.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FeedApiError::Transport { .. } | FeedApiError::RequestTimeout { .. }
        )
    }
}

impl From<reqwest::Error> for FeedApiError {
    fn from(e: reqwest::Error) -> Self {
        // Timeouts land in Transport here; the client knows its configured
        // limit and reports RequestTimeout itself.
        if e.is_decode() {
            FeedApiError::InvalidResponse {
                details: e.to_string(),
            }
        } else {
            FeedApiError::Transport {
                reason: e.to_string(),
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Migration failed: {migration}")]
    MigrationFailed { migration: String },

    #[error("Insert of record {index} (postId {post_id}) failed: {reason}")]
    InsertFailed {
        index: usize,
        post_id: String,
        reason: String,
    },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
