pub mod error;
pub mod logger;
pub mod prompt;
pub mod validation;
