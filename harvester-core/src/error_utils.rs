use crate::error::*;
use tracing::{error, info};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::FeedApi(e) => {
                error!("Feed API error details: {:?}", e);
            }
            CoreError::Database(e) => {
                error!("Database error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::FeedApi(e) => e.user_friendly_message(),
            CoreError::Database(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Io(e) => format!("File system error: {}", e),
            CoreError::Serialization(_) => {
                "Data could not be serialized. Please report this issue.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::FeedApi(_) => "FEED_API".to_string(),
            CoreError::Database(_) => "DATABASE".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
        }
    }
}

impl ErrorExt for FeedApiError {
    fn log_error(&self) -> &Self {
        error!("FeedApiError: {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            FeedApiError::Transport { .. } => {
                "Could not reach the feed API. Please check your network connection.".to_string()
            }
            FeedApiError::RequestTimeout { seconds } => format!(
                "The feed API did not answer within {} seconds.",
                seconds
            ),
            FeedApiError::ServerError { status_code, .. }
                if *status_code == 401 || *status_code == 403 =>
            {
                "The feed API rejected the session. Please refresh the cookies in the configuration."
                    .to_string()
            }
            FeedApiError::ServerError { status_code, .. } => {
                format!("The feed API answered with status {}.", status_code)
            }
            FeedApiError::InvalidResponse { .. } => {
                "The feed API returned data in an unexpected format.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            FeedApiError::Transport { .. } => "FEED_TRANSPORT".to_string(),
            FeedApiError::RequestTimeout { .. } => "FEED_TIMEOUT".to_string(),
            FeedApiError::ServerError { .. } => "FEED_SERVER_ERROR".to_string(),
            FeedApiError::InvalidResponse { .. } => "FEED_INVALID_RESPONSE".to_string(),
        }
    }
}

impl ErrorExt for DatabaseError {
    fn log_error(&self) -> &Self {
        error!("DatabaseError: {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            DatabaseError::ConnectionFailed { .. } => {
                "Database connection failed. Please check the database url.".to_string()
            }
            DatabaseError::MigrationFailed { .. } => {
                "The opportunities table could not be created or updated.".to_string()
            }
            DatabaseError::InsertFailed { post_id, .. } => format!(
                "Saving post {} failed; the current page was not stored.",
                post_id
            ),
            _ => "Database error occurred. Please try again.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            DatabaseError::ConnectionFailed { .. } => "DB_CONNECTION_FAILED".to_string(),
            DatabaseError::MigrationFailed { .. } => "DB_MIGRATION_FAILED".to_string(),
            DatabaseError::InsertFailed { .. } => "DB_INSERT_FAILED".to_string(),
            DatabaseError::TransactionFailed { .. } => "DB_TRANSACTION_FAILED".to_string(),
            DatabaseError::Sql(_) => "DB_SQL_ERROR".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' not found.", path)
            }
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            ConfigError::ValidationFailed { reason } => {
                format!("Configuration is inconsistent: {}", reason)
            }
            ConfigError::Parse(_) => {
                "Configuration file format is invalid. Please check the settings.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::ValidationFailed { .. } => "CONFIG_VALIDATION_FAILED".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

/// Reports a failure at the process boundary: log details, code and the
/// operator-facing message.
#[derive(Debug, Default)]
pub struct ErrorReporter;

impl ErrorReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn report_error(&self, error: &CoreError) {
        error.log_error();
        info!("Error code: {}", error.error_code());
        info!("User message: {}", error.user_friendly_message());
    }
}
