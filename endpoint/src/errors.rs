use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid secret")]
    Auth,

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl Error {
    /// Message safe to hand back to an untrusted caller.
    pub fn public_message(&self) -> String {
        match self {
            Error::Auth => "invalid secret".to_string(),
            Error::Validation(msg) => msg.clone(),
            Error::Storage(_) => "storage unavailable".to_string(),
            Error::Config(_) | Error::Json(_) | Error::Metrics(_) => "internal error".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_message_hides_driver_details() {
        let err = Error::Storage(sqlx::Error::Protocol("password authentication failed".into()));
        assert_eq!(err.public_message(), "storage unavailable");
        assert!(err.to_string().contains("password authentication failed"));
    }

    #[test]
    fn test_validation_message_passes_through() {
        let err = Error::Validation("temperature must be a finite number".to_string());
        assert_eq!(err.public_message(), "temperature must be a finite number");
    }
}
