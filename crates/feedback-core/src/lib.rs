//! # feedback-core
//!
//! Core crate for the feedback hub. Contains configuration schemas, the
//! principal/ticket vocabulary shared by every layer, and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other feedback crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
