//! Utility functions and helpers.

pub mod identifier;

// Re-export commonly used types
pub use identifier::{
    first_message, validate_identifier, validate_not_blank, Identifier, IdentifierValidator,
};
