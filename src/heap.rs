//! Addressable binary max-heap over dense item ids.
//!
//! Items are `0..capacity` and double as handles: `positions[item]` locates the item inside the
//! heap array, so keys can be changed or items removed in `O(log n)` without searching. Use
//! [`std::cmp::Reverse`] keys for a min-heap.

const ABSENT: usize = usize::MAX;

/// Max-heap of `(item, key)` pairs addressable by item id.
#[derive(Clone, Debug)]
pub struct IndexedHeap<K> {
    heap: Vec<usize>,
    positions: Vec<usize>,
    keys: Vec<Option<K>>,
}

impl<K: Ord> IndexedHeap<K> {
    /// Creates an empty heap accepting items `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            positions: vec![ABSENT; capacity],
            keys: std::iter::repeat_with(|| None).take(capacity).collect(),
        }
    }

    /// Number of items in the heap.
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// `true` iff the heap holds no item.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// `true` iff `item` is in the heap.
    #[inline]
    pub fn contains(&self, item: usize) -> bool {
        self.positions[item] != ABSENT
    }

    /// Key of `item`, if present.
    #[inline]
    pub fn key(&self, item: usize) -> Option<&K> {
        self.keys[item].as_ref()
    }

    /// Inserts `item` with `key`. If `item` is already present its key is replaced.
    pub fn push(&mut self, item: usize, key: K) {
        if self.contains(item) {
            self.update(item, key);
            return;
        }
        self.keys[item] = Some(key);
        self.positions[item] = self.heap.len();
        self.heap.push(item);
        self.sift_up(self.heap.len() - 1);
    }

    /// Item with the largest key.
    pub fn peek(&self) -> Option<(usize, &K)> {
        let &item = self.heap.first()?;
        self.keys[item].as_ref().map(|k| (item, k))
    }

    /// Removes and returns the item with the largest key.
    pub fn pop(&mut self) -> Option<(usize, K)> {
        let &item = self.heap.first()?;
        self.remove(item).map(|k| (item, k))
    }

    /// Removes `item`, returning its key.
    pub fn remove(&mut self, item: usize) -> Option<K> {
        let pos = self.positions[item];
        if pos == ABSENT {
            return None;
        }
        let last = self.heap.len() - 1;
        self.swap(pos, last);
        self.heap.pop();
        self.positions[item] = ABSENT;
        if pos < self.heap.len() {
            self.sift_down(pos);
            self.sift_up(pos);
        }
        self.keys[item].take()
    }

    /// Changes the key of a present `item` and restores heap order.
    pub fn update(&mut self, item: usize, key: K) {
        let pos = self.positions[item];
        debug_assert!(pos != ABSENT, "update of absent item {item}");
        if pos == ABSENT {
            return;
        }
        self.keys[item] = Some(key);
        self.sift_up(pos);
        self.sift_down(self.positions[item]);
    }

    /// All items whose key equals the maximum, in heap order.
    ///
    /// Only descends through entries tied with the root, so the cost is proportional to the
    /// number of ties rather than the heap size.
    pub fn ties_with_top(&self) -> Vec<usize> {
        let Some((_, top)) = self.peek() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut stack = vec![0usize];
        while let Some(pos) = stack.pop() {
            let item = self.heap[pos];
            if self.keys[item].as_ref() != Some(top) {
                continue;
            }
            out.push(item);
            for child in [2 * pos + 1, 2 * pos + 2] {
                if child < self.heap.len() {
                    stack.push(child);
                }
            }
        }
        out
    }

    /// Iterates all `(item, key)` pairs in heap order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &K)> + '_ {
        self.heap.iter().filter_map(move |&item| self.keys[item].as_ref().map(|k| (item, k)))
    }

    fn less(&self, a: usize, b: usize) -> bool {
        self.keys[self.heap[a]] < self.keys[self.heap[b]]
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.positions[self.heap[a]] = a;
        self.positions[self.heap[b]] = b;
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.less(parent, pos) {
                break;
            }
            self.swap(parent, pos);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut largest = pos;
            if left < self.heap.len() && self.less(largest, left) {
                largest = left;
            }
            if right < self.heap.len() && self.less(largest, right) {
                largest = right;
            }
            if largest == pos {
                break;
            }
            self.swap(pos, largest);
            pos = largest;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
