//! Reorder buffer restoring input order after parallel processing

use std::collections::BTreeMap;

/// Streaming reorder buffer
///
/// Items arrive tagged with their input position in any order and leave in
/// position order as soon as every earlier position has arrived. Memory is
/// bounded by how far completion runs ahead of the slowest item.
#[derive(Debug)]
pub struct Resequencer<T> {
    next: usize,
    pending: BTreeMap<usize, T>,
}

impl<T> Default for Resequencer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Resequencer<T> {
    /// Create an empty buffer expecting position 0 first
    pub fn new() -> Self {
        Self {
            next: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Accept an item; returns every item now ready, in order
    pub fn push(&mut self, position: usize, item: T) -> Vec<T> {
        self.pending.insert(position, item);

        let mut ready = Vec::new();
        while let Some(item) = self.pending.remove(&self.next) {
            ready.push(item);
            self.next += 1;
        }
        ready
    }

    /// Items held back waiting for an earlier position
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Release everything still held once no more items will arrive
    ///
    /// Walks every position up to `expected` (or past the last held item,
    /// whichever is later) in order. A position that never arrived comes back
    /// as `Err(position)`.
    pub fn finish(&mut self, expected: usize) -> Vec<Result<T, usize>> {
        let mut rest = std::mem::take(&mut self.pending);
        let end = rest
            .keys()
            .next_back()
            .map_or(expected, |last| expected.max(last + 1));
        let slots = (self.next..end)
            .map(|position| rest.remove(&position).ok_or(position))
            .collect();
        self.next = end;
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_order_passes_straight_through() {
        let mut r = Resequencer::new();
        assert_eq!(r.push(0, 'a'), vec!['a']);
        assert_eq!(r.push(1, 'b'), vec!['b']);
        assert_eq!(r.pending(), 0);
    }

    #[test]
    fn test_out_of_order_is_held_then_released() {
        let mut r = Resequencer::new();
        assert!(r.push(2, 'c').is_empty());
        assert!(r.push(1, 'b').is_empty());
        assert_eq!(r.pending(), 2);
        assert_eq!(r.push(0, 'a'), vec!['a', 'b', 'c']);
        assert_eq!(r.push(3, 'd'), vec!['d']);
    }

    #[test]
    fn test_finish_reports_missing_positions() {
        let mut r = Resequencer::new();
        r.push(0, 'a');
        r.push(3, 'd');
        r.push(2, 'c');
        assert_eq!(r.finish(5), vec![Err(1), Ok('c'), Ok('d'), Err(4)]);
        assert_eq!(r.push(5, 'f'), vec!['f']);
    }

    #[test]
    fn test_finish_with_nothing_held() {
        let mut r = Resequencer::new();
        r.push(0, 'a');
        assert!(r.finish(1).is_empty());
    }
}
