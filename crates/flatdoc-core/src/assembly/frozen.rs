//! Append-only storage for finished compound children

use crate::node::FrozenSpan;

/// Children of finished objects or arrays.
///
/// A segment is written once by [`freeze`](Self::freeze) and never touched
/// again until [`clear`](Self::clear) ends the cycle, so spans handed out
/// stay valid while scratch buffers are reused for siblings.
#[derive(Debug, Clone)]
pub struct Frozen<T> {
    items: Vec<T>,
}

impl<T: Copy> Frozen<T> {
    /// Create storage with room for `capacity` children
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Copy `segment` in with one bulk append and return its span
    pub fn freeze(&mut self, segment: &[T]) -> FrozenSpan<T> {
        let start = self.items.len();
        self.items.extend_from_slice(segment);
        FrozenSpan::new(to_u32(start), to_u32(segment.len()))
    }

    /// Children covered by `span`.
    ///
    /// Panics if the span does not belong to this storage.
    pub fn resolve(&self, span: FrozenSpan<T>) -> &[T] {
        resolve_span(&self.items, span)
    }

    /// Every frozen child in write order
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Number of frozen children
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is frozen
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// End the cycle, keeping capacity
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Copy> Default for Frozen<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

/// Slice `items` by `span`, failing fast on a span that does not fit.
pub(crate) fn resolve_span<T>(items: &[T], span: FrozenSpan<T>) -> &[T] {
    let start = span.start() as usize;
    let end = usize::try_from(span.end()).ok();
    match end.and_then(|end| items.get(start..end)) {
        Some(children) => children,
        None => panic!(
            "frozen span {:?} out of bounds for storage of length {}",
            span,
            items.len()
        ),
    }
}

fn to_u32(n: usize) -> u32 {
    match u32::try_from(n) {
        Ok(n) => n,
        Err(_) => panic!("frozen storage exceeds u32 addressing"),
    }
}
