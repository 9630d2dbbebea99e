//! Property-based tests for port ranges, environment layering and ids.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use rsu_fleet_cli::domain::env::{EnvMap, layer_environment};
use rsu_fleet_cli::domain::port::allocate_range;
use rsu_fleet_cli::domain::registration::truncate_detail;
use rsu_fleet_cli::domain::{DeployRequest, validate_instance_id};

fn env_map() -> impl Strategy<Value = EnvMap> {
    proptest::collection::btree_map("[A-C]{1,2}", "[a-z]{0,4}", 0..6)
}

proptest! {
    /// Ranges are sequential, distinct and exactly `count` long.
    #[test]
    fn prop_range_is_sequential(start in 1024u16..=65000, count in 1u16..=100) {
        let ports = allocate_range(start, count).unwrap();
        prop_assert_eq!(ports.len(), usize::from(count));
        prop_assert_eq!(ports[0], start);
        prop_assert!(ports.windows(2).all(|w| w[1] == w[0] + 1));
    }

    /// A range past `u16::MAX` is rejected rather than wrapped.
    #[test]
    fn prop_overflowing_range_rejected(start in 65500u16..=u16::MAX, count in 100u16..=200) {
        prop_assert!(allocate_range(start, count).is_err());
    }

    /// Overrides always win, defaults never shadow, inherited keys survive.
    #[test]
    fn prop_layering_precedence(
        inherited in env_map(),
        overrides in env_map(),
        defaults in env_map(),
    ) {
        let env = layer_environment(inherited.clone(), &overrides, &defaults);
        for (k, v) in &overrides {
            prop_assert_eq!(env.get(k), Some(v));
        }
        for (k, v) in &inherited {
            if !overrides.contains_key(k) {
                prop_assert_eq!(env.get(k), Some(v));
            }
        }
        for (k, v) in &defaults {
            if !overrides.contains_key(k) && !inherited.contains_key(k) {
                prop_assert_eq!(env.get(k), Some(v));
            }
        }
        let only_known_keys = env.keys().all(|k| {
            inherited.contains_key(k) || overrides.contains_key(k) || defaults.contains_key(k)
        });
        prop_assert!(only_known_keys);
    }

    /// Every deploy-generated id is a valid record name.
    #[test]
    fn prop_deploy_ids_are_valid(index in 0usize..1000) {
        prop_assert!(validate_instance_id(&DeployRequest::instance_id(index)).is_ok());
    }

    /// Ids containing path separators never validate.
    #[test]
    fn prop_path_ids_rejected(prefix in "[a-z]{0,5}", suffix in "[a-z]{0,5}") {
        let id = format!("{prefix}/{suffix}");
        prop_assert!(validate_instance_id(&id).is_err());
    }

    /// Truncated details never exceed the limit.
    #[test]
    fn prop_truncate_bounded(detail in "\\PC{0,600}", max in 1usize..500) {
        prop_assert!(truncate_detail(&detail, max).chars().count() <= max);
    }
}
