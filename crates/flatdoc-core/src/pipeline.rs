//! Batch pipeline: records in, batch or NDJSON out
//!
//! Each call borrows one builder from the pool for the whole batch, so all
//! documents share one arena and one key table. A failing record abandons
//! the batch; the builder still goes back to the pool.

use std::fmt;

use serde::Serialize;

use crate::{
    Error, Result,
    batch::Batch,
    builder::ArenaBuilder,
    codec,
    node::Idx,
    pool::BuilderPool,
    ser::to_arena,
};

/// Run `handler` on every record and package the roots as an owned batch.
///
/// `handler` appends one document per record and returns its root. The
/// first handler error aborts the batch as [`Error::Handler`].
pub fn encode_batch<I, F, E>(pool: &BuilderPool, records: I, handler: F) -> Result<Batch>
where
    I: IntoIterator,
    F: FnMut(&mut ArenaBuilder, I::Item) -> std::result::Result<Idx, E>,
    E: fmt::Display,
{
    let mut builder = pool.acquire();
    let roots = append_records(&mut builder, records, handler)?;
    Ok(builder.build_batch(&roots))
}

/// Serialize every value through serde into one owned batch
pub fn encode_serialize_batch<'v, T, I>(pool: &BuilderPool, values: I) -> Result<Batch>
where
    T: Serialize + ?Sized + 'v,
    I: IntoIterator<Item = &'v T>,
{
    let mut builder = pool.acquire();
    let mut roots = Vec::new();
    for (record, value) in values.into_iter().enumerate() {
        match to_arena(&mut builder, value) {
            Ok(root) => roots.push(root),
            Err(err) => {
                tracing::warn!(record, error = %err, "serialization failed, batch abandoned");
                return Err(err);
            }
        }
    }
    tracing::debug!(documents = roots.len(), nodes = builder.len(), "batch encoded");
    Ok(builder.build_batch(&roots))
}

/// Run `handler` on every record and render the batch as NDJSON, one line
/// per record.
///
/// The batch is decoded straight from the pooled builder without an
/// intermediate copy.
pub fn encode_ndjson<I, F, E>(pool: &BuilderPool, records: I, handler: F) -> Result<Vec<u8>>
where
    I: IntoIterator,
    F: FnMut(&mut ArenaBuilder, I::Item) -> std::result::Result<Idx, E>,
    E: fmt::Display,
{
    let mut builder = pool.acquire();
    let roots = append_records(&mut builder, records, handler)?;
    Ok(codec::to_ndjson_vec(&builder.build_batch_view(&roots)))
}

fn append_records<I, F, E>(
    builder: &mut ArenaBuilder,
    records: I,
    mut handler: F,
) -> Result<Vec<Idx>>
where
    I: IntoIterator,
    F: FnMut(&mut ArenaBuilder, I::Item) -> std::result::Result<Idx, E>,
    E: fmt::Display,
{
    let records = records.into_iter();
    let mut roots = Vec::with_capacity(records.size_hint().0);
    for (record, item) in records.enumerate() {
        match handler(builder, item) {
            Ok(root) => roots.push(root),
            Err(err) => {
                tracing::warn!(record, error = %err, "handler failed, batch abandoned");
                return Err(Error::handler(record, err));
            }
        }
    }
    tracing::debug!(documents = roots.len(), nodes = builder.len(), "batch encoded");
    Ok(roots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;

    fn log_line(b: &mut ArenaBuilder, line: &str) -> std::result::Result<Idx, String> {
        let (level, msg) = line.split_once(' ').ok_or_else(|| format!("malformed line {line:?}"))?;
        b.object_start();
        let l = b.append_string(level);
        b.object_add_key("level", l);
        let m = b.append_string(msg);
        b.object_add_key("msg", m);
        Ok(b.object_end())
    }

    #[test]
    fn test_encode_ndjson_one_line_per_record() {
        let pool = BuilderPool::default();
        let out = encode_ndjson(&pool, ["INFO started", "WARN slow"], log_line).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"level\":\"INFO\",\"msg\":\"started\"}\n{\"level\":\"WARN\",\"msg\":\"slow\"}\n"
        );
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn test_handler_error_reports_record_and_releases() {
        let pool = BuilderPool::new(PoolConfig::low_memory());
        let err = encode_batch(&pool, ["INFO ok", "broken"], log_line).unwrap_err();
        match err {
            Error::Handler { record, message } => {
                assert_eq!(record, 1);
                assert!(message.contains("broken"));
            }
            other => panic!("unexpected error {other:?}"),
        }

        let stats = pool.stats();
        assert_eq!(stats.returned, 1);
        assert!(pool.acquire().is_empty());
    }

    #[test]
    fn test_serialize_batch_shares_keys() {
        #[derive(Serialize)]
        struct Row {
            id: u32,
        }

        let pool = BuilderPool::default();
        let rows = [Row { id: 1 }, Row { id: 2 }];
        let batch = encode_serialize_batch(&pool, &rows).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.strings().len(), 1);
        assert_eq!(batch.to_ndjson(), "{\"id\":1}\n{\"id\":2}\n");
    }

    #[test]
    fn test_empty_input() {
        let pool = BuilderPool::default();
        let out = encode_ndjson(&pool, Vec::<&str>::new(), log_line).unwrap();
        assert!(out.is_empty());
    }
}
