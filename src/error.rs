use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Amount missing, zero or negative.
    #[error("Invalid invoice: {0}")]
    Validation(String),

    /// The remote form rejected the document; carries the first alert text.
    #[error("Remote form error: {0}")]
    RemoteForm(String),

    #[error("Browser surface not available")]
    AutomationUnavailable,

    #[error("WebDriver error: {0}")]
    WebDriver(#[from] reqwest::Error),

    #[error("WebDriver command failed: {0}")]
    WebDriverCommand(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type AppResult<T> = Result<T, AppError>;
