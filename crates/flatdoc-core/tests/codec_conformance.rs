//! Conformance tests: batch decode against serde_json
//!
//! Coverage targets:
//! - Hand-written `ArenaEncode` impls produce serde_json's bytes
//! - The serde bridge produces serde_json's bytes
//! - Optional fields skipped on both sides
//! - Multi-document batches and the owned/borrowed finalize paths

use flatdoc::{
    ArenaBuilder, ArenaEncode, BuilderPool, Idx, StringTable,
    encode::{append_field, append_optional_field},
    to_arena,
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
struct Nested {
    nested_int: i32,
}

#[derive(Debug, Clone, Serialize)]
struct MyStruct {
    my_int: i64,
    my_float: f64,
    my_string: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    my_nested: Option<Nested>,
    my_list: Vec<String>,
}

impl ArenaEncode for Nested {
    fn append_to_arena(&self, b: &mut ArenaBuilder) -> Idx {
        b.object_start_reserve(1);
        append_field(b, "nested_int", &self.nested_int);
        b.object_end()
    }
}

impl ArenaEncode for MyStruct {
    fn append_to_arena(&self, b: &mut ArenaBuilder) -> Idx {
        b.object_start_reserve(5);
        append_field(b, "my_int", &self.my_int);
        append_field(b, "my_float", &self.my_float);
        append_field(b, "my_string", &self.my_string);
        append_optional_field(b, "my_nested", self.my_nested.as_ref());
        append_field(b, "my_list", &self.my_list);
        b.object_end()
    }
}

fn sample() -> MyStruct {
    MyStruct {
        my_int: 42,
        my_float: 3.5,
        my_string: "hello".into(),
        my_nested: Some(Nested { nested_int: 7 }),
        my_list: vec!["a".into(), "b".into()],
    }
}

fn expected_line<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap() + "\n"
}

fn encode_direct(values: &[MyStruct]) -> String {
    let mut b = ArenaBuilder::new().with_string_table(StringTable::new());
    let roots: Vec<Idx> = values.iter().map(|v| v.append_to_arena(&mut b)).collect();
    b.build_batch(&roots).to_ndjson()
}

fn encode_serde(values: &[MyStruct]) -> String {
    let mut b = ArenaBuilder::new().with_string_table(StringTable::new());
    let roots: Vec<Idx> = values
        .iter()
        .map(|v| to_arena(&mut b, v).unwrap())
        .collect();
    b.build_batch(&roots).to_ndjson()
}

// ============================================================================
// Single Document
// ============================================================================

mod single_document_tests {
    use super::*;

    #[test]
    fn test_reference_document() {
        let expected = "{\"my_int\":42,\"my_float\":3.5,\"my_string\":\"hello\",\
                        \"my_nested\":{\"nested_int\":7},\"my_list\":[\"a\",\"b\"]}\n";
        assert_eq!(expected_line(&sample()), expected);
        assert_eq!(encode_direct(&[sample()]), expected);
        assert_eq!(encode_serde(&[sample()]), expected);
    }

    #[test]
    fn test_absent_optional_drops_one_field() {
        let mut value = sample();
        value.my_nested = None;

        let mut b = ArenaBuilder::new().with_string_table(StringTable::new());
        let full = sample().append_to_arena(&mut b);
        let partial = value.append_to_arena(&mut b);
        assert_eq!(
            b.object_fields(partial).unwrap().len() + 1,
            b.object_fields(full).unwrap().len()
        );

        assert_eq!(encode_direct(&[value.clone()]), expected_line(&value));
        assert_eq!(encode_serde(&[value.clone()]), expected_line(&value));
    }

    #[test]
    fn test_special_strings_and_floats() {
        let value = MyStruct {
            my_int: i64::MIN,
            my_float: 1e-7,
            my_string: "tab\tquote\"slash\\nul\u{0}é🦀".into(),
            my_nested: None,
            my_list: vec![String::new(), "\u{7f}".into()],
        };
        assert_eq!(encode_direct(&[value.clone()]), expected_line(&value));
        assert_eq!(encode_serde(&[value.clone()]), expected_line(&value));
    }
}

// ============================================================================
// Batches
// ============================================================================

mod batch_tests {
    use super::*;

    #[test]
    fn test_many_documents_share_keys() {
        let values: Vec<MyStruct> = (0..20)
            .map(|i| MyStruct {
                my_int: i,
                my_nested: (i % 2 == 0).then_some(Nested { nested_int: -i as i32 }),
                ..sample()
            })
            .collect();
        let expected: String = values.iter().map(expected_line).collect();

        assert_eq!(encode_direct(&values), expected);
        assert_eq!(encode_serde(&values), expected);

        let pool = BuilderPool::default();
        let batch = flatdoc::encode_serialize_batch(&pool, &values).unwrap();
        assert_eq!(batch.strings().len(), 6);
        assert_eq!(batch.to_ndjson(), expected);
    }

    #[test]
    fn test_view_and_owned_decode_identically() {
        let mut b = ArenaBuilder::new().with_string_table(StringTable::new());
        let roots = [sample().append_to_arena(&mut b)];

        let borrowed = flatdoc::to_ndjson_vec(&b.build_batch_view(&roots));
        let owned = b.build_batch(&roots).to_ndjson();
        assert_eq!(borrowed, owned.into_bytes());
    }

    #[test]
    fn test_deserialized_batch_decodes_the_same() {
        let mut b = ArenaBuilder::new().with_string_table(StringTable::new());
        let roots = [sample().append_to_arena(&mut b)];
        let batch = b.build_batch(&roots);

        let wire = serde_json::to_vec(&batch).unwrap();
        let received: flatdoc::Batch = serde_json::from_slice(&wire).unwrap();
        received.validate().unwrap();
        assert_eq!(received.to_ndjson(), expected_line(&sample()));
    }

    #[test]
    fn test_write_ndjson_to_writer() {
        let mut b = ArenaBuilder::new().with_string_table(StringTable::new());
        let roots = [sample().append_to_arena(&mut b)];
        let mut out = Vec::new();
        flatdoc::write_ndjson(&b.build_batch_view(&roots), &mut out).unwrap();
        assert_eq!(out, expected_line(&sample()).into_bytes());
    }
}
