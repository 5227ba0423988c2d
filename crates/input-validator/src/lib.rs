//! Request Validation
//!
//! Range checking for analysis requests before any frame is decoded or detected.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{ValidationConfig, ValidationResult, Validator};
