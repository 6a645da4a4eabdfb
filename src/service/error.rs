use thiserror::Error;

/// Outcomes of the create / resolve / statistics calls that are not a success.
///
/// All of them are recoverable by the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Invalid URL format. Must be a valid HTTP/HTTPS URL")]
    InvalidUrl,
    #[error("Validity must be a positive number representing minutes")]
    InvalidValidity,
    #[error("Custom shortcode must be alphanumeric and 3-20 characters long")]
    InvalidShortcodeFormat,
    #[error("Custom shortcode already exists. Please choose a different one")]
    ShortcodeConflict,
    #[error("Shortcode not found or has expired")]
    NotFound,
    #[error("Failed to generate a unique shortcode after {attempts} attempts")]
    GenerationExhausted { attempts: usize },
}

pub type ServiceResult<T> = Result<T, ServiceError>;
