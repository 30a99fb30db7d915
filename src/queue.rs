//! Binary max-heap of prioritized entries.
//!
//! Positions are 1-based: the root is at position 1 and the children of
//! position `i` are `2i` and `2i + 1`. Slot `i` lives at `nodes[i - 1]`.
//! Storage grows by doubling, starting from [`INIT_SIZE`] slots.

use log::debug;

pub const INIT_SIZE: usize = 20;

#[derive(Debug, Clone)]
struct Node<T> {
    priority: f64,
    data: T,
}

#[derive(Debug, Clone)]
pub struct PriorityQueue<T> {
    nodes: Vec<Node<T>>,
    size: usize,
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PriorityQueue<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            size: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current slot capacity.
    pub fn size(&self) -> usize {
        self.size
    }

    fn priority(&self, i: usize) -> f64 {
        self.nodes[i - 1].priority
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.nodes.swap(i - 1, j - 1);
    }

    pub fn push(&mut self, priority: f64, data: T) {
        if self.len() + 1 >= self.size {
            self.size = if self.size == 0 { INIT_SIZE } else { self.size * 2 };
            self.nodes.reserve_exact(self.size - self.nodes.len());
            debug!("queue grown to {} slots", self.size);
        }

        self.nodes.push(Node { priority, data });

        let mut i = self.len();
        while i > 1 && self.priority(i / 2) < priority {
            self.swap(i, i / 2);
            i /= 2;
        }
    }

    /// Remove and return the entry with the highest priority.
    pub fn pop(&mut self) -> Option<T> {
        if self.nodes.is_empty() {
            return None;
        }

        // The last entry takes the root's place.
        let root = self.nodes.swap_remove(0);

        let len = self.len();
        let mut i = 1;
        loop {
            let j = 2 * i;
            let mut k = i;
            if j <= len && self.priority(j) > self.priority(k) {
                k = j;
            }
            if j < len && self.priority(j + 1) > self.priority(k) {
                k = j + 1;
            }
            if k == i {
                break;
            }
            self.swap(i, k);
            i = k;
        }

        Some(root.data)
    }

    /// Entries in storage order (not priority order).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.nodes.iter().map(|n| &n.data)
    }

    /// Mutable access to every stored entry, for in-place invalidation.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.nodes.iter_mut().map(|n| &mut n.data)
    }

    /// Drop every remaining entry, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let n = self.nodes.len();
        self.nodes.clear();
        n
    }
}
