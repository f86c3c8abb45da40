//! Composite resource identifiers
//!
//! `region/backend-id` names a top-level resource (an instance), and
//! `region/backend-id/sub-name` a resource living inside one (a database, a
//! user). Decoding is purely syntactic: the region token is returned as
//! written, and checking it is left to [`super::resolver`].

use super::error::{ProviderError, ProviderResult};
use crate::scw::region::Region;
use std::fmt;

const SEPARATOR: char = '/';

/// Decoded form of a persisted identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub region: Region,
    pub backend_id: String,
    pub sub_name: Option<String>,
}

impl ResourceId {
    pub fn new(region: Region, backend_id: impl Into<String>) -> Self {
        Self {
            region,
            backend_id: backend_id.into(),
            sub_name: None,
        }
    }

    pub fn nested(region: Region, backend_id: impl Into<String>, sub_name: impl Into<String>) -> Self {
        Self {
            region,
            backend_id: backend_id.into(),
            sub_name: Some(sub_name.into()),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(&self.region, &self.backend_id, self.sub_name.as_deref()))
    }
}

/// Join the tokens of an identifier
pub fn encode(region: &Region, backend_id: &str, sub_name: Option<&str>) -> String {
    match sub_name {
        Some(name) => format!("{region}{SEPARATOR}{backend_id}{SEPARATOR}{name}"),
        None => format!("{region}{SEPARATOR}{backend_id}"),
    }
}

/// Split an identifier into region, backend id and optional sub-resource name
pub fn decode(id: &str) -> ProviderResult<ResourceId> {
    let parts: Vec<&str> = id.split(SEPARATOR).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(ProviderError::MalformedIdentifier(id.to_string()));
    }

    match parts.as_slice() {
        [region, backend_id] => Ok(ResourceId::new(Region::from_raw(*region), *backend_id)),
        [region, backend_id, sub_name] => Ok(ResourceId::nested(
            Region::from_raw(*region),
            *backend_id,
            *sub_name,
        )),
        _ => Err(ProviderError::MalformedIdentifier(id.to_string())),
    }
}

/// Decode an identifier that must name a sub-resource
pub fn decode_nested(id: &str) -> ProviderResult<(Region, String, String)> {
    let decoded = decode(id)?;
    match decoded.sub_name {
        Some(name) => Ok((decoded.region, decoded.backend_id, name)),
        None => Err(ProviderError::MalformedIdentifier(id.to_string())),
    }
}

/// Decode an identifier that must name a top-level resource
pub fn decode_regional(id: &str) -> ProviderResult<(Region, String)> {
    let decoded = decode(id)?;
    match decoded.sub_name {
        None => Ok((decoded.region, decoded.backend_id)),
        Some(_) => Err(ProviderError::MalformedIdentifier(id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_three_tokens() {
        let (region, instance_id, name) = decode_nested("region/instanceid/dbname").unwrap();
        assert_eq!(region, Region::from_raw("region"));
        assert_eq!(instance_id, "instanceid");
        assert_eq!(name, "dbname");
    }

    #[test]
    fn test_decode_two_tokens_has_no_sub_name() {
        let id = decode("fr-par/1111").unwrap();
        assert_eq!(id, ResourceId::new(Region::FR_PAR, "1111"));
    }

    #[test]
    fn test_decode_wrongly_formatted_id() {
        let err = decode("notandid").unwrap_err();
        assert_eq!(err.to_string(), "can't parse user resource id: notandid");
    }

    #[test]
    fn test_decode_rejects_empty_and_extra_tokens() {
        for id in ["", "fr-par/", "/1111", "fr-par//db", "a/b/c/d"] {
            assert!(
                matches!(decode(id), Err(ProviderError::MalformedIdentifier(ref lit)) if lit == id),
                "{id} should be malformed"
            );
        }
    }

    #[test]
    fn test_shape_specific_decoders() {
        assert!(decode_nested("fr-par/1111").is_err());
        assert!(decode_regional("fr-par/1111/db").is_err());
        assert_eq!(
            decode_regional("nl-ams/1111").unwrap(),
            (Region::NL_AMS, "1111".to_string())
        );
    }

    #[test]
    fn test_display_matches_encode() {
        let id = ResourceId::nested(Region::FR_SRR, "1111", "db");
        assert_eq!(id.to_string(), "fr-srr/1111/db");
    }
}
