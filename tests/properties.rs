//! Property-based tests for population and value parsing
//!
//! Population must respect union exclusivity and configured container sizes
//! for any seed, and the duration and integer parsers must accept whatever
//! their formatters produce.

use std::sync::Arc;

use chrono::TimeDelta;
use proptest::prelude::*;
use proto_faker::dynamic::format_duration;
use proto_faker::parse::{parse_duration, parse_int, parse_uint};
use proto_faker::schema::SchemaFile;
use proto_faker::{Config, Faker, ProtoFaker, Registry};

const SCHEMA: &str = r#"{
    "package": "prop",
    "messages": {
        "Choice": { "fields": [
            { "name": "text", "type": "string", "oneof": "value" },
            { "name": "number", "type": "int64", "oneof": "value" },
            { "name": "nested", "type": "Choice", "oneof": "value" },
            { "name": "names", "type": "string", "repeated": true },
            { "name": "labels", "map": { "key": "string", "value": "uint32" } }
        ] }
    }
}"#;

fn registry() -> Arc<Registry> {
    let schema: SchemaFile = serde_json::from_str(SCHEMA).expect("schema should parse");
    Arc::new(Registry::compile(&schema).expect("schema should compile"))
}

// Strategy: Inclusive size ranges small enough to keep messages cheap
fn arb_size() -> impl Strategy<Value = (usize, usize)> {
    (0usize..6, 0usize..6).prop_map(|(min, extra)| (min, min + extra))
}

proptest! {
    /// Property: at most one union member is set, at every nesting level
    #[test]
    fn proptest_oneof_exclusive(seed in any::<u64>(), depth in 1usize..6) {
        let registry = registry();
        let config = Config::default().with_max_depth(depth);
        let mut faker = ProtoFaker::with_config(Faker::seeded(seed), config)
            .expect("config should be valid");
        let msg = faker.fake_message(&registry, "Choice").expect("population should succeed");

        let mut current = Some(&msg);
        let mut level = 0;
        while let Some(m) = current {
            let set = ["text", "number", "nested"].iter().filter(|f| m.has(f)).count();
            prop_assert!(set <= 1, "level {}: {} members set", level, set);
            current = m.get_message("nested");
            level += 1;
        }
        prop_assert!(level <= depth);
    }

    /// Property: lists and maps stay within the configured size range
    #[test]
    fn proptest_container_sizes(seed in any::<u64>(), list in arb_size(), map in arb_size()) {
        let registry = registry();
        let config = Config::default()
            .with_max_depth(2)
            .with_list_size(list.0, list.1)
            .with_map_size(map.0, map.1);
        let mut faker = ProtoFaker::with_config(Faker::seeded(seed), config)
            .expect("config should be valid");
        let msg = faker.fake_message(&registry, "Choice").expect("population should succeed");

        let names = msg.get_list("names").len();
        prop_assert!(list.0 <= names && names <= list.1);

        // Colliding random keys can only shrink a map
        let labels = msg.get_map("labels").map_or(0, |m| m.len());
        prop_assert!(labels <= map.1);
    }

    /// Property: the same seed always yields the same message
    #[test]
    fn proptest_seed_determinism(seed in any::<u64>()) {
        let registry = registry();
        let a = ProtoFaker::seeded(seed).fake_message(&registry, "Choice")
            .expect("population should succeed");
        let b = ProtoFaker::seeded(seed).fake_message(&registry, "Choice")
            .expect("population should succeed");
        prop_assert_eq!(a, b);
    }

    /// Property: formatted durations parse back to the same value
    #[test]
    fn proptest_duration_roundtrip(nanos in any::<i64>()) {
        let d = TimeDelta::nanoseconds(nanos);
        let text = format_duration(d);
        let parsed = parse_duration(&text).expect("formatted duration should parse");
        prop_assert_eq!(parsed, d, "{}", text);
    }

    /// Property: decimal and hex renderings parse back within their width
    #[test]
    fn proptest_int_roundtrip(n in any::<i32>(), u in any::<u64>()) {
        prop_assert_eq!(parse_int(&n.to_string(), 32), Ok(i64::from(n)));
        prop_assert_eq!(parse_uint(&u.to_string(), 64), Ok(u));
        prop_assert_eq!(parse_uint(&format!("0x{u:x}"), 64), Ok(u));
    }

    /// Property: values one past a 32-bit bound are rejected
    #[test]
    fn proptest_int_out_of_range(extra in 1i64..1_000_000) {
        let over = i64::from(i32::MAX) + extra;
        prop_assert!(parse_int(&over.to_string(), 32).is_err());
        let under = i64::from(i32::MIN) - extra;
        prop_assert!(parse_int(&under.to_string(), 32).is_err());
    }
}
