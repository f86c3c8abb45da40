//! Failures raised inside resource operations
//!
//! None of these leave a handler as-is: they are turned into diagnostics by
//! [`super::diag`] at the operation boundary.

use super::validation::ValidationError;
use crate::scw::region::{Region, RegionError};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Persisted identifier with the wrong shape
    #[error("can't parse user resource id: {0}")]
    MalformedIdentifier(String),

    #[error("invalid region in '{reference}': {source}")]
    InvalidRegion {
        reference: String,
        #[source]
        source: RegionError,
    },

    /// Required attribute absent or of the wrong type
    #[error("attribute '{name}' {problem}")]
    MissingAttribute { name: String, problem: &'static str },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Any error returned by a backend call
    #[error("{operation} {target} in {region}: {source:#}")]
    Backend {
        operation: &'static str,
        region: Region,
        target: String,
        #[source]
        source: anyhow::Error,
    },

    /// A lookup scoped to one resource returned several
    #[error("{operation} {target} in {region} returned {count} results, expected at most one")]
    AmbiguousLookup {
        operation: &'static str,
        region: Region,
        target: String,
        count: usize,
    },
}

impl ProviderError {
    pub fn missing(name: &str) -> Self {
        Self::MissingAttribute {
            name: name.to_string(),
            problem: "is required",
        }
    }

    pub fn wrong_type(name: &str) -> Self {
        Self::MissingAttribute {
            name: name.to_string(),
            problem: "has the wrong type",
        }
    }

    /// Build a `map_err` adapter that tags a backend error with its call site
    pub fn backend(
        operation: &'static str,
        region: &Region,
        target: impl Into<String>,
    ) -> impl FnOnce(anyhow::Error) -> Self {
        let region = region.clone();
        let target = target.into();
        move |source| Self::Backend {
            operation,
            region,
            target,
            source,
        }
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_identifier_message() {
        let err = ProviderError::MalformedIdentifier("notandid".to_string());
        assert_eq!(err.to_string(), "can't parse user resource id: notandid");
    }

    #[test]
    fn test_backend_error_embeds_region_and_target() {
        let to_err = ProviderError::backend("list databases", &Region::FR_SRR, "1111/dbname");
        let err = to_err(anyhow::anyhow!("Error"));
        assert_eq!(err.to_string(), "list databases 1111/dbname in fr-srr: Error");
    }
}
