use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    DatabaseError(String),
    BrowserError(String),
    ScrapeFailed { username: String, message: String },
    ConfigError(String),
}

impl AppError {
    /// Wraps any failure of the automation flow into the single error the
    /// request boundary reports for a username.
    pub fn scrape_failed(username: &str, cause: impl fmt::Display) -> Self {
        AppError::ScrapeFailed {
            username: username.to_string(),
            message: cause.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::BrowserError(msg) => write!(f, "Browser error: {}", msg),
            AppError::ScrapeFailed { username, message } => write!(
                f,
                "Failed to scrape the data for username {}. Please check your credentials and try again. Error: {}",
                username, message
            ),
            AppError::ConfigError(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<mongodb::error::Error> for AppError {
    fn from(e: mongodb::error::Error) -> Self {
        AppError::DatabaseError(e.to_string())
    }
}
