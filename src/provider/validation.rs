//! Attribute validators
//!
//! Validators never touch the backend. They return warnings and errors
//! separately; warnings are always an empty list for now.

use super::data::AttrValue;
use crate::scw::rdb::Permission;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("'{0}' is not a string")]
    NotAString(String),
    #[error("'{0}' is not a valid permission")]
    InvalidPermission(String),
}

pub type Validation = (Vec<String>, Vec<ValidationError>);

/// Check that `value` is one of the permission names
pub fn validate_permission(value: &AttrValue, field: &str) -> Validation {
    let warnings = Vec::new();

    let Some(permission) = value.as_str() else {
        return (warnings, vec![ValidationError::NotAString(field.to_string())]);
    };

    if permission.parse::<Permission>().is_err() {
        return (
            warnings,
            vec![ValidationError::InvalidPermission(field.to_string())],
        );
    }

    (warnings, Vec::new())
}
