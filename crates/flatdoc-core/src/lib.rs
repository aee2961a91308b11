//! # flatdoc
//!
//! Flat arena document builder. Documents are appended bottom-up into a
//! single node arena: scalars first, then the objects and arrays that refer
//! to them by integer index. Object keys are interned once per batch. When a
//! compound node closes its staged children are copied into frozen storage
//! and the node keeps only a span into it.
//!
//! A finished batch carries the key table, the arena, the frozen buffers and
//! one root per document. It decodes to NDJSON that is byte-identical to
//! `serde_json` output for the same values.
//!
//! ```
//! use flatdoc::prelude::*;
//!
//! let mut b = ArenaBuilder::new().with_string_table(StringTable::new());
//! b.object_start();
//! let n = b.append_int(42);
//! b.object_add_key("answer", n);
//! let root = b.object_end();
//!
//! let batch = b.build_batch(&[root]);
//! assert_eq!(batch.to_ndjson(), "{\"answer\":42}\n");
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod assembly;
pub mod batch;
pub mod builder;
pub mod codec;
pub mod config;
pub mod encode;
pub mod error;
pub mod node;
pub mod pipeline;
pub mod pool;
pub mod ser;
pub mod strings;

pub use batch::{Batch, BatchView};
pub use builder::ArenaBuilder;
pub use codec::{
    append_ndjson, node_to_string, to_json_value, to_ndjson_string, to_ndjson_vec, write_ndjson,
    write_ndjson_pretty,
};
pub use config::{BuilderConfig, PoolConfig};
pub use encode::{ArenaEncode, Blob};
pub use error::{Error, Result};
pub use node::{ElementSpan, Field, FieldSpan, FrozenSpan, Idx, KeyId, Node};
pub use pipeline::{encode_batch, encode_ndjson, encode_serialize_batch};
pub use pool::{BuilderPool, PoolStats, PooledBuilder};
pub use ser::{ArenaSerializer, to_arena};
pub use strings::StringTable;

/// Re-export commonly used types
pub mod prelude {
    pub use super::{
        ArenaBuilder, ArenaEncode, Batch, BatchView, BuilderConfig, BuilderPool, Error, Idx,
        KeyId, Node, PoolConfig, Result, StringTable, to_arena,
    };
}
