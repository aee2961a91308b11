//! Comprehensive tests for the serde bridge
//!
//! Coverage targets:
//! - serde data model mapping (options, units, newtypes, enums)
//! - Map key handling
//! - Error reporting for values outside the node set
//! - Builder state after a failed serialization

use std::collections::{BTreeMap, HashMap};

use flatdoc::{ArenaBuilder, Error, Node, StringTable, to_arena};
use serde::Serialize;

fn render<T: Serialize + ?Sized>(value: &T) -> flatdoc::Result<String> {
    let mut b = ArenaBuilder::new().with_string_table(StringTable::new());
    let root = to_arena(&mut b, value)?;
    Ok(b.build_batch(&[root]).to_ndjson())
}

fn assert_matches_serde_json<T: Serialize + ?Sized>(value: &T) {
    let expected = serde_json::to_string(value).unwrap() + "\n";
    assert_eq!(render(value).unwrap(), expected);
}

// ============================================================================
// Data Model Mapping
// ============================================================================

mod data_model_tests {
    use super::*;

    #[derive(Serialize)]
    struct Unit;

    #[derive(Serialize)]
    struct Meters(f64);

    #[derive(Serialize)]
    struct Pair(i32, String);

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Renamed {
        first_name: &'static str,
        #[serde(skip)]
        _hidden: u8,
        #[serde(flatten)]
        extra: BTreeMap<String, i32>,
    }

    #[test]
    fn test_scalars() {
        assert_matches_serde_json(&true);
        assert_matches_serde_json(&-17i16);
        assert_matches_serde_json(&u32::MAX);
        assert_matches_serde_json(&0.25f32);
        assert_matches_serde_json(&1.1f32);
        assert_matches_serde_json(&0.1f32);
        assert_matches_serde_json(&vec![16777217.0f32, -3.3e-7, f32::MIN_POSITIVE]);
        assert_matches_serde_json(&'λ');
        assert_matches_serde_json("plain");
    }

    #[test]
    fn test_units_and_newtypes() {
        assert_matches_serde_json(&());
        assert_matches_serde_json(&Unit);
        assert_matches_serde_json(&Meters(2.5));
        assert_matches_serde_json(&Pair(1, "x".into()));
        assert_matches_serde_json(&Some(Some(3)));
        assert_matches_serde_json(&None::<i32>);
    }

    #[test]
    fn test_serde_attributes() {
        let mut extra = BTreeMap::new();
        extra.insert("k".to_string(), 9);
        assert_matches_serde_json(&Renamed {
            first_name: "Ada",
            _hidden: 1,
            extra,
        });
    }

    #[test]
    fn test_json_value_passthrough() {
        let value = serde_json::json!({
            "a": [1, 2.5, null, true, "s"],
            "b": {"nested": {"deeper": []}},
            "c": {}
        });
        assert_matches_serde_json(&value);
    }
}

// ============================================================================
// Enums
// ============================================================================

mod enum_tests {
    use super::*;

    #[derive(Serialize)]
    enum Event {
        Started,
        Progress(u8),
        Moved(i32, i32),
        Failed { code: u16, reason: String },
    }

    #[derive(Serialize)]
    #[serde(tag = "type")]
    enum Tagged {
        Ping { seq: u32 },
    }

    #[test]
    fn test_externally_tagged_variants() {
        assert_matches_serde_json(&Event::Started);
        assert_matches_serde_json(&Event::Progress(50));
        assert_matches_serde_json(&Event::Moved(-1, 1));
        assert_matches_serde_json(&Event::Failed {
            code: 500,
            reason: "boom".into(),
        });
    }

    #[test]
    fn test_internally_tagged_variant() {
        assert_matches_serde_json(&Tagged::Ping { seq: 3 });
    }

    #[test]
    fn test_variants_in_sequence() {
        let events = vec![Event::Started, Event::Progress(1), Event::Moved(0, 0)];
        assert_matches_serde_json(&events);
    }
}

// ============================================================================
// Map Keys
// ============================================================================

mod map_key_tests {
    use super::*;

    #[derive(Serialize, PartialEq, Eq, PartialOrd, Ord)]
    enum Color {
        Red,
        Green,
    }

    #[test]
    fn test_integer_and_bool_keys() {
        let mut ints = BTreeMap::new();
        ints.insert(-1i64, "neg");
        ints.insert(7i64, "pos");
        assert_matches_serde_json(&ints);

        let mut bools = BTreeMap::new();
        bools.insert(false, 0);
        bools.insert(true, 1);
        assert_eq!(render(&bools).unwrap(), "{\"false\":0,\"true\":1}\n");
    }

    #[test]
    fn test_unit_variant_keys() {
        let mut colors = BTreeMap::new();
        colors.insert(Color::Red, 1);
        colors.insert(Color::Green, 2);
        assert_matches_serde_json(&colors);
    }

    #[test]
    fn test_keys_interned_once_across_documents() {
        let mut b = ArenaBuilder::new().with_string_table(StringTable::new());
        let mut roots = Vec::new();
        for i in 0..5 {
            let mut doc = HashMap::new();
            doc.insert("id", i);
            roots.push(to_arena(&mut b, &doc).unwrap());
        }
        assert_eq!(b.string_table().map(StringTable::len), Some(1));
        assert_eq!(b.build_batch(&roots).len(), 5);
    }

    /// Map with a single float key
    struct FloatKey<F>(F);

    impl<F: Serialize> Serialize for FloatKey<F> {
        fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            use serde::ser::SerializeMap;
            let mut map = s.serialize_map(Some(1))?;
            map.serialize_entry(&self.0, &1)?;
            map.end()
        }
    }

    #[test]
    fn test_finite_float_keys_stringified() {
        assert_matches_serde_json(&FloatKey(1.5f64));
        assert_matches_serde_json(&FloatKey(1.0f64));
        assert_matches_serde_json(&FloatKey(1e20f64));
        assert_matches_serde_json(&FloatKey(-0.25f64));
        assert_matches_serde_json(&FloatKey(1.1f32));
        assert_eq!(render(&FloatKey(1.5f64)).unwrap(), "{\"1.5\":1}\n");
    }

    #[test]
    fn test_non_finite_float_key_rejected() {
        assert!(matches!(render(&FloatKey(f64::NAN)), Err(Error::Serialize(_))));
        assert!(matches!(render(&FloatKey(f32::INFINITY)), Err(Error::Serialize(_))));
        assert!(serde_json::to_string(&FloatKey(f64::NAN)).is_err());
    }
}

// ============================================================================
// Errors
// ============================================================================

mod error_tests {
    use super::*;

    #[derive(Serialize)]
    struct Wide {
        big: u64,
    }

    #[test]
    fn test_u64_in_range_accepted() {
        assert_matches_serde_json(&Wide { big: 1 << 62 });
    }

    #[test]
    fn test_u64_out_of_range_rejected() {
        let err = render(&Wide { big: u64::MAX }).unwrap_err();
        assert!(matches!(err, Error::IntegerOutOfRange(_)));
        assert!(err.to_string().contains("18446744073709551615"));
    }

    #[test]
    fn test_custom_error_propagates() {
        struct Refuses;
        impl Serialize for Refuses {
            fn serialize<S: serde::Serializer>(&self, _s: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("not today"))
            }
        }
        let err = render(&vec![Refuses]).unwrap_err();
        assert!(matches!(err, Error::Serialize(ref msg) if msg == "not today"));
    }

    #[test]
    fn test_builder_usable_after_reset_following_error() {
        let mut b = ArenaBuilder::new().with_string_table(StringTable::new());
        assert!(to_arena(&mut b, &vec![Wide { big: u64::MAX }]).is_err());
        assert!(b.depth() > 0);

        b.reset_all();
        let root = to_arena(&mut b, &Wide { big: 5 }).unwrap();
        assert!(matches!(b.node(root), Node::Object(_)));
        assert_eq!(b.build_batch(&[root]).to_ndjson(), "{\"big\":5}\n");
    }
}
