use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use super::ids::LabelIdx;

/// One entry in the queue: a key to sort by and the label index it carries. Mirrors the
/// teacher's `CostNode` (`src/routing/astar.rs`), whose `Ord` is reversed so a max-heap
/// `BinaryHeap` behaves as a min-heap, with ties broken on the payload for determinism.
#[derive(Debug, Clone, Copy)]
struct CostNode {
    key: f64,
    payload: LabelIdx,
}

impl Ord for CostNode {
    fn cmp(&self, other: &CostNode) -> Ordering {
        other
            .key
            .partial_cmp(&self.key)
            .expect("queue key must never be NaN")
            .then_with(|| other.payload.cmp(&self.payload))
    }
}

impl PartialOrd for CostNode {
    fn partial_cmp(&self, other: &CostNode) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CostNode {
    fn eq(&self, other: &CostNode) -> bool {
        self.key == other.key && self.payload == other.payload
    }
}

impl Eq for CostNode {}

/// Min-ordered queue over `(key, payload)` with true decrease-key by payload identity (only one
/// entry per payload is ever logically live). Grounded on
/// `examples/original_source/priority_queue.py`'s `PriorityQueue`, reimplemented over a
/// `BinaryHeap` with lazy deletion of stale entries rather than the original's bisect-on-array
/// approach, since Rust's standard heap has no efficient arbitrary-position update.
#[derive(Debug, Default)]
pub struct PriorityQueue {
    heap: BinaryHeap<CostNode>,
    /// Authoritative current key per payload; an entry popped off `heap` whose key disagrees
    /// with this map is stale and is silently discarded.
    current_key: HashMap<LabelIdx, f64>,
}

impl PriorityQueue {
    pub fn new() -> Self {
        PriorityQueue {
            heap: BinaryHeap::new(),
            current_key: HashMap::new(),
        }
    }

    /// Inserts `payload` at `key`, or moves it to `key` if already present. A no-op if `payload`
    /// is already queued at exactly `key`.
    pub fn insert(&mut self, key: f64, payload: LabelIdx) {
        if let Some(&existing) = self.current_key.get(&payload) {
            if existing == key {
                return;
            }
        }
        self.current_key.insert(payload, key);
        self.heap.push(CostNode { key, payload });
    }

    /// Removes and returns the minimum-key `(key, payload)` pair, skipping stale entries left
    /// behind by `insert`. Returns `None` once genuinely empty.
    pub fn pop(&mut self) -> Option<(f64, LabelIdx)> {
        while let Some(node) = self.heap.pop() {
            match self.current_key.get(&node.payload) {
                Some(&k) if k == node.key => {
                    self.current_key.remove(&node.payload);
                    return Some((node.key, node.payload));
                }
                _ => continue,
            }
        }
        None
    }

    /// Peeks the minimum-key `(key, payload)` pair without removing it.
    pub fn peek(&mut self) -> Option<(f64, LabelIdx)> {
        while let Some(node) = self.heap.peek().copied() {
            match self.current_key.get(&node.payload) {
                Some(&k) if k == node.key => return Some((node.key, node.payload)),
                _ => {
                    self.heap.pop();
                }
            }
        }
        None
    }

    /// Number of payloads currently live in the queue (excludes stale entries pending
    /// lazy-collection).
    pub fn len(&self) -> usize {
        self.current_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_returns_minimum_key_first() {
        let mut q = PriorityQueue::new();
        q.insert(10.0, 1);
        q.insert(5.0, 2);
        q.insert(7.0, 3);
        assert_eq!(q.pop(), Some((5.0, 2)));
        assert_eq!(q.pop(), Some((7.0, 3)));
        assert_eq!(q.pop(), Some((10.0, 1)));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn decrease_key_relocates_single_logical_entry() {
        let mut q = PriorityQueue::new();
        q.insert(100.0, 1);
        q.insert(50.0, 2);
        // payload 1 is relaxed to a cheaper key: exactly one entry for it must pop.
        q.insert(10.0, 1);
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some((10.0, 1)));
        assert_eq!(q.pop(), Some((50.0, 2)));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn increase_key_also_relocates() {
        let mut q = PriorityQueue::new();
        q.insert(1.0, 1);
        q.insert(1.0, 1); // same key: no-op
        q.insert(99.0, 1);
        assert_eq!(q.pop(), Some((99.0, 1)));
    }
}
