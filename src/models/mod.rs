pub mod admin;
pub mod experience;
pub mod project;
pub mod skill;

pub use admin::*;
pub use experience::*;
pub use project::*;
pub use skill::*;

use validator::ValidationError;

/// Rejects strings that are empty once surrounding whitespace is removed.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// Trims an optional string and collapses an empty result to `None`.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
