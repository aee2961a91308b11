//! Stack-disciplined staging buffers for in-progress compound values

use smallvec::SmallVec;

use super::frozen::Frozen;
use crate::node::FrozenSpan;

/// Reusable child buffer shared by every open compound value of one kind.
///
/// `open` records where the current scope's children begin; children of
/// nested scopes sit above it. Closing a scope copies its segment into
/// [`Frozen`] storage and truncates the buffer back to the scope start, so a
/// sibling opened next reuses the same memory.
#[derive(Debug, Clone)]
pub struct Scratch<T> {
    items: Vec<T>,
    starts: SmallVec<[usize; 8]>,
}

impl<T: Copy> Scratch<T> {
    /// Create a buffer with room for `capacity` pending children and
    /// `depth` open scopes
    pub fn with_capacity(capacity: usize, depth: usize) -> Self {
        let mut starts = SmallVec::new();
        starts.reserve(depth);
        Self {
            items: Vec::with_capacity(capacity),
            starts,
        }
    }

    /// Open a new scope
    pub fn open(&mut self) {
        self.starts.push(self.items.len());
    }

    /// Open a new scope and make sure the next `additional` pushes fit
    /// without reallocating
    pub fn open_reserve(&mut self, additional: usize) {
        self.open();
        // `reserve` is a no-op when spare capacity already suffices and
        // grows once otherwise.
        self.items.reserve(additional);
    }

    /// Stage a child in the innermost open scope
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Close the innermost scope, freezing its children.
    ///
    /// Returns `None` when no scope is open; callers turn that into a panic
    /// naming the operation.
    pub fn close_into(&mut self, frozen: &mut Frozen<T>) -> Option<FrozenSpan<T>> {
        let start = self.starts.pop()?;
        let span = frozen.freeze(&self.items[start..]);
        self.items.truncate(start);
        Some(span)
    }

    /// Number of open scopes
    pub fn depth(&self) -> usize {
        self.starts.len()
    }

    /// Number of staged children across all open scopes
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no child is staged
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Staged children that belong to the innermost open scope
    pub fn pending(&self) -> &[T] {
        match self.starts.last() {
            Some(&start) => &self.items[start..],
            None => &[],
        }
    }

    /// Spare room before the next reallocation
    pub fn spare_capacity(&self) -> usize {
        self.items.capacity() - self.items.len()
    }

    /// Drop every scope and child, keeping capacity
    pub fn clear(&mut self) {
        self.items.clear();
        self.starts.clear();
    }
}

impl<T: Copy> Default for Scratch<T> {
    fn default() -> Self {
        Self::with_capacity(0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_freezes_segment_and_truncates() {
        let mut scratch: Scratch<u32> = Scratch::with_capacity(8, 2);
        let mut frozen = Frozen::with_capacity(8);

        scratch.open();
        scratch.push(1);
        scratch.open();
        scratch.push(2);
        scratch.push(3);
        assert_eq!(scratch.pending(), &[2, 3]);

        let inner = scratch.close_into(&mut frozen).unwrap();
        assert_eq!(frozen.resolve(inner), &[2, 3]);
        assert_eq!(scratch.pending(), &[1]);

        let outer = scratch.close_into(&mut frozen).unwrap();
        assert_eq!(frozen.resolve(outer), &[1]);
        assert!(scratch.is_empty());
        assert_eq!(scratch.depth(), 0);
    }

    #[test]
    fn test_close_without_open_scope() {
        let mut scratch: Scratch<u32> = Scratch::default();
        let mut frozen = Frozen::default();
        assert!(scratch.close_into(&mut frozen).is_none());
    }

    #[test]
    fn test_open_reserve_prevents_reallocation() {
        let mut scratch: Scratch<u64> = Scratch::with_capacity(1, 1);
        scratch.open();
        scratch.push(0);
        scratch.open_reserve(100);
        assert!(scratch.spare_capacity() >= 100);

        let before = scratch.items.as_ptr();
        for i in 0..100 {
            scratch.push(i);
        }
        assert_eq!(before, scratch.items.as_ptr());
    }

    #[test]
    fn test_capacity_retained_after_clear() {
        let mut scratch: Scratch<u32> = Scratch::with_capacity(0, 0);
        scratch.open();
        for i in 0..64 {
            scratch.push(i);
        }
        let capacity = scratch.items.capacity();
        scratch.clear();
        assert_eq!(scratch.len(), 0);
        assert_eq!(scratch.depth(), 0);
        assert_eq!(scratch.items.capacity(), capacity);
    }
}
