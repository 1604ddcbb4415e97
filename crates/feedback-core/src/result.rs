//! Convenience result type alias for the feedback hub.

use crate::error::AppError;

/// A specialized `Result` type for feedback hub operations.
pub type AppResult<T> = Result<T, AppError>;
