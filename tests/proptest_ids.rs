//! Property-based tests using proptest
//!
//! These tests check the identifier codec, region resolution and the
//! read handler against randomized identifiers.

use proptest::prelude::*;
use scw_rdb::provider::id::{decode, encode};
use scw_rdb::provider::{database, Meta, MetaConfig, RegionResolver, ResourceData};
use scw_rdb::scw::memory::InMemoryRdbApi;
use scw_rdb::scw::rdb::Database;
use scw_rdb::scw::region::{all_regions, Region};
use std::sync::Arc;

/// One of the known regions
fn arb_region() -> impl Strategy<Value = Region> {
    prop::sample::select(all_regions().to_vec())
}

/// Backend id or sub-resource name: never empty, never contains `/`
fn arb_token() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.-]{1,36}"
}

proptest! {
    #[test]
    fn two_tokens_round_trip(region in arb_region(), id in arb_token()) {
        let decoded = decode(&encode(&region, &id, None)).unwrap();
        prop_assert_eq!(decoded.region, region);
        prop_assert_eq!(decoded.backend_id, id);
        prop_assert_eq!(decoded.sub_name, None);
    }

    #[test]
    fn three_tokens_round_trip(region in arb_region(), id in arb_token(), name in arb_token()) {
        let encoded = encode(&region, &id, Some(&name));
        let decoded = decode(&encoded).unwrap();
        prop_assert_eq!(decoded.to_string(), encoded);
        prop_assert_eq!(decoded.sub_name, Some(name));
    }

    #[test]
    fn decoding_does_not_judge_region(region in "[a-z]{2,6}-[a-z0-9]{2,6}", id in arb_token()) {
        let decoded = decode(&format!("{}/{}", region, id)).unwrap();
        prop_assert_eq!(decoded.region.as_str(), region.as_str());
    }

    #[test]
    fn wrong_token_count_is_malformed(tokens in prop::collection::vec(arb_token(), 4..8)) {
        let id = tokens.join("/");
        let err = decode(&id).unwrap_err();
        prop_assert_eq!(err.to_string(), format!("can't parse user resource id: {}", id));
    }

    #[test]
    fn single_token_is_malformed(id in arb_token()) {
        prop_assert!(decode(&id).is_err());
    }

    #[test]
    fn empty_token_is_malformed(region in arb_region(), name in arb_token()) {
        let double_slash = format!("{}//{}", region, name);
        let trailing_slash = format!("{}/{}/", region, name);
        prop_assert!(decode(&double_slash).is_err());
        prop_assert!(decode(&trailing_slash).is_err());
    }
}

mod resolver_props {
    use super::*;

    proptest! {
        #[test]
        fn prefix_region_wins(
            default in arb_region(),
            declared in arb_region(),
            prefix in arb_region(),
            id in arb_token(),
        ) {
            let resolver = RegionResolver::new(default);
            let (region, bare) = resolver
                .resolve(Some(declared.as_str()), &format!("{}/{}", prefix, id))
                .unwrap();
            prop_assert_eq!(region, prefix);
            prop_assert_eq!(bare, id);
        }

        #[test]
        fn bare_id_never_fails(default in arb_region(), id in arb_token()) {
            let resolver = RegionResolver::new(default.clone());
            let (region, bare) = resolver.resolve(None, &id).unwrap();
            prop_assert_eq!(region, default);
            prop_assert_eq!(bare, id);
        }

        #[test]
        fn extra_token_is_rejected(region in arb_region(), id in arb_token(), name in arb_token()) {
            let reference = encode(&region, &id, Some(&name));
            let err = RegionResolver::default().resolve(None, &reference).unwrap_err();
            prop_assert_eq!(err.to_string(), format!("can't parse user resource id: {}", reference));
        }

        #[test]
        fn unknown_prefix_is_rejected(prefix in "[a-z]{3}-[0-9]{3}", id in arb_token()) {
            let resolver = RegionResolver::default();
            let reference = format!("{}/{}", prefix, id);
            prop_assert!(resolver.resolve(None, &reference).is_err());
        }
    }
}

mod handler_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Whatever the region, the database handler reads from that region only
        #[test]
        fn read_uses_region_of_identifier(region in arb_region(), id in arb_token(), name in arb_token()) {
            let api = Arc::new(InMemoryRdbApi::new().with_expected_region(region.clone()));
            api.seed_database(region.clone(), &id, Database {
                name: name.clone(),
                owner: "owner".to_string(),
                managed: true,
                size: 1,
            });
            let meta = Meta::new(MetaConfig::default()).unwrap();
            meta.set_substitute_api(api.clone()).unwrap();

            let mut data = ResourceData::new();
            data.set_id(encode(&region, &id, Some(&name)));
            let diags = tokio_test::block_on(database::read(&mut data, &meta));

            let instance_id = encode(&region, &id, None);
            prop_assert!(diags.is_empty(), "{:?}", diags);
            prop_assert_eq!(data.id(), encode(&region, &id, Some(&name)));
            prop_assert_eq!(
                data.get("instance_id").and_then(|v| v.as_str()),
                Some(instance_id.as_str())
            );
        }

        /// Every malformed identifier gives exactly one diagnostic and no backend call
        #[test]
        fn malformed_read_reports_once(id in "[a-z0-9]{0,12}") {
            let api = Arc::new(InMemoryRdbApi::new());
            let meta = Meta::new(MetaConfig::default()).unwrap();
            meta.set_substitute_api(api.clone()).unwrap();

            let mut data = ResourceData::new();
            data.set_id(id.as_str());
            let diags = tokio_test::block_on(database::read(&mut data, &meta));

            prop_assert_eq!(diags.len(), 1);
            prop_assert_eq!(&diags[0].summary, &format!("can't parse user resource id: {}", id));
            prop_assert_eq!(data.id(), id.as_str());
            prop_assert!(api.calls().is_empty());
        }
    }
}
