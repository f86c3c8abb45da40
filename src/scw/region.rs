//! Scaleway regions
//!
//! A region is a plain string code (`fr-par`, `nl-ams`, ...). Parsing through
//! [`str::parse`] validates it against the known regions; [`Region::from_raw`]
//! keeps whatever was persisted so identifiers can be decoded without judgement.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Geographic partition of the Scaleway API
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(Cow<'static, str>);

impl Region {
    pub const FR_PAR: Region = Region(Cow::Borrowed("fr-par"));
    pub const NL_AMS: Region = Region(Cow::Borrowed("nl-ams"));
    pub const PL_WAW: Region = Region(Cow::Borrowed("pl-waw"));
    pub const FR_SRR: Region = Region(Cow::Borrowed("fr-srr"));

    /// Region used when neither the reference nor the configuration names one
    pub const DEFAULT: Region = Region::FR_PAR;

    /// Wrap a region code without validating it
    pub fn from_raw(code: impl Into<String>) -> Self {
        Self(Cow::Owned(code.into()))
    }

    /// Canonical string form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Region {
    type Err = RegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        all_regions()
            .iter()
            .find(|r| r.as_str() == s)
            .cloned()
            .ok_or_else(|| RegionError::Unknown(s.to_string()))
    }
}

/// Region parsing failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegionError {
    #[error("unknown region '{0}', expected one of: fr-par, nl-ams, pl-waw, fr-srr")]
    Unknown(String),
}

/// List all known regions
pub fn all_regions() -> &'static [Region] {
    &[Region::FR_PAR, Region::NL_AMS, Region::PL_WAW, Region::FR_SRR]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_region() {
        let region: Region = "nl-ams".parse().unwrap();
        assert_eq!(region, Region::NL_AMS);
        assert_eq!(region.to_string(), "nl-ams");
    }

    #[test]
    fn test_parse_unknown_region_fails() {
        let err = "mars-01".parse::<Region>().unwrap_err();
        assert_eq!(err, RegionError::Unknown("mars-01".to_string()));
    }

    #[test]
    fn test_raw_region_compares_with_constant() {
        assert_eq!(Region::from_raw("fr-srr"), Region::FR_SRR);
        assert!(!all_regions().contains(&Region::from_raw("region")));
    }

    #[test]
    fn test_default_region_is_paris() {
        assert_eq!(Region::default().as_str(), "fr-par");
    }
}
