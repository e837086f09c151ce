use thiserror::Error;

/// Error taxonomy shared by every repository operation.
///
/// The first five variants are the caller-facing contract: the presentation
/// layer renders them directly. The rest are ambient failures (store, config,
/// environment) that bubble up through the same `Result` alias.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad input shape, length, or format. User-correctable; the operation
    /// was not performed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Role mismatch. The operation was not performed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A referenced id does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate unique key.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// I/O failure writing an attachment to the content store.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
