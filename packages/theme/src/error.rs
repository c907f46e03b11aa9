use folio_store::StoreError;
use thiserror::Error;

pub type ThemeResult<T> = Result<T, ThemeError>;

#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("Unknown theme token '{0}'")]
    UnknownToken(String),

    #[error("Token name '{0}' is not kebab-case")]
    InvalidName(String),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to read theme defaults: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed theme defaults: {0}")]
    Json(#[from] serde_json::Error),
}
