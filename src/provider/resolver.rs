//! Effective region of an operation
//!
//! A reference to a parent resource may carry its own region (`fr-srr/1111`)
//! or be a bare id (`1111`). Bare ids fall back to the region declared on the
//! resource, then to the configured default. Leaving the region out never fails.

use super::error::{ProviderError, ProviderResult};
use crate::scw::region::Region;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionResolver {
    default_region: Region,
}

impl RegionResolver {
    pub fn new(default_region: Region) -> Self {
        Self { default_region }
    }

    pub fn default_region(&self) -> &Region {
        &self.default_region
    }

    /// Resolve the region of `reference` and strip it down to the bare id
    ///
    /// The reference is either `id` or `region/id`, with no empty token.
    pub fn resolve(
        &self,
        declared_region: Option<&str>,
        reference: &str,
    ) -> ProviderResult<(Region, String)> {
        let malformed = || ProviderError::MalformedIdentifier(reference.to_string());

        if let Some((region, id)) = reference.split_once('/') {
            if region.is_empty() || id.is_empty() || id.contains('/') {
                return Err(malformed());
            }
            let region = parse_region(region, reference)?;
            return Ok((region, id.to_string()));
        }

        if reference.is_empty() {
            return Err(malformed());
        }
        let region = self.declared_or_default(declared_region)?;
        Ok((region, reference.to_string()))
    }

    /// Region declared on the resource itself, or the default one
    pub fn declared_or_default(&self, declared_region: Option<&str>) -> ProviderResult<Region> {
        match declared_region.filter(|r| !r.is_empty()) {
            Some(region) => parse_region(region, region),
            None => Ok(self.default_region.clone()),
        }
    }

    /// Check a region taken verbatim from a persisted identifier
    pub fn check(&self, region: &Region, literal: &str) -> ProviderResult<Region> {
        parse_region(region.as_str(), literal)
    }
}

impl Default for RegionResolver {
    fn default() -> Self {
        Self::new(Region::DEFAULT)
    }
}

fn parse_region(code: &str, reference: &str) -> ProviderResult<Region> {
    code.parse().map_err(|source| ProviderError::InvalidRegion {
        reference: reference.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regionalized_reference_uses_its_region() {
        let resolver = RegionResolver::default();
        let (region, id) = resolver
            .resolve(None, "fr-srr/1111-111111111111-11111111")
            .unwrap();
        assert_eq!(region.to_string(), "fr-srr");
        assert_eq!(id, "1111-111111111111-11111111");
    }

    #[test]
    fn test_bare_reference_uses_default_region() {
        let resolver = RegionResolver::default();
        let (region, id) = resolver.resolve(None, "1111-111111111111-11111111").unwrap();
        assert_eq!(region.to_string(), "fr-par");
        assert_eq!(id, "1111-111111111111-11111111");
    }

    #[test]
    fn test_declared_region_beats_default() {
        let resolver = RegionResolver::new(Region::FR_PAR);
        let (region, _) = resolver.resolve(Some("pl-waw"), "1111").unwrap();
        assert_eq!(region, Region::PL_WAW);

        // Prefix wins over the declaration
        let (region, _) = resolver.resolve(Some("pl-waw"), "nl-ams/1111").unwrap();
        assert_eq!(region, Region::NL_AMS);
    }

    #[test]
    fn test_unknown_region_prefix_fails() {
        let err = RegionResolver::default()
            .resolve(None, "mars-01/1111")
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRegion { ref reference, .. } if reference == "mars-01/1111"));
    }

    #[test]
    fn test_reference_shape_is_checked() {
        let resolver = RegionResolver::default();
        for reference in ["", "fr-par/", "/1111", "fr-par/1111/olddb", "mars-01/1111/db"] {
            let err = resolver.resolve(None, reference).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("can't parse user resource id: {}", reference)
            );
        }
    }

    #[test]
    fn test_resolver_default_is_injected() {
        let resolver = RegionResolver::new(Region::NL_AMS);
        assert_eq!(resolver.resolve(None, "1111").unwrap().0, Region::NL_AMS);
        assert_eq!(resolver.declared_or_default(Some("")).unwrap(), Region::NL_AMS);
    }
}
