//! The Boolean-function engine.
//!
//! Functions are reduced ordered BDDs with complement edges, stored in a
//! fixed-capacity [`Table`] that enforces canonicity through hash-consing:
//! two equal functions always get the same [`Ref`]. All operations go through
//! the [`Bdd`] manager, which owns the node arena and the computed table.
//!
//! The arena is sized once, when the manager is created, and is never
//! resized. Dead nodes are reclaimed only by an explicit
//! [`collect_garbage`][Bdd::collect_garbage] call naming the live roots.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::fmt::Debug;

use log::debug;

use crate::cache::Cache;
use crate::reference::Ref;
use crate::table::Table;
use crate::utils::{pairing3, MyHash};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Node {
    variable: u32,
    low: Ref,
    high: Ref,
}

#[allow(clippy::derivable_impls)]
impl Default for Node {
    fn default() -> Self {
        Self {
            variable: 0,
            low: Ref::new(0),
            high: Ref::new(0),
        }
    }
}

impl MyHash for Node {
    fn hash(&self) -> u64 {
        pairing3(
            self.variable as u64,
            self.low.unsigned() as u64,
            self.high.unsigned() as u64,
        )
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct IteKey(Ref, Ref, Ref);

impl MyHash for IteKey {
    fn hash(&self) -> u64 {
        pairing3(
            self.0.unsigned() as u64,
            self.1.unsigned() as u64,
            self.2.unsigned() as u64,
        )
    }
}

/// Sizing of the node arena and the computed table.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BddConfig {
    /// The arena holds `2^storage_bits` nodes.
    pub storage_bits: usize,
    /// The computed table holds `2^cache_bits` entries.
    pub cache_bits: usize,
}

impl Default for BddConfig {
    fn default() -> Self {
        Self {
            storage_bits: 20,
            cache_bits: 16,
        }
    }
}

impl BddConfig {
    /// Sizing heuristic for a session over `num_inputs` variables.
    pub fn for_inputs(num_inputs: usize) -> Self {
        let storage_bits = (16 + num_inputs / 2).clamp(16, 22);
        Self {
            storage_bits,
            cache_bits: storage_bits.min(18),
        }
    }

    pub fn with_storage_bits(mut self, storage_bits: usize) -> Self {
        self.storage_bits = storage_bits;
        self
    }
}

pub struct Bdd {
    storage: RefCell<Table<Node>>,
    cache: RefCell<Cache<IteKey, Ref>>,
    one: Ref,
}

impl Bdd {
    pub fn new(config: BddConfig) -> Self {
        assert!(
            config.storage_bits <= 31,
            "Storage bits should be in the range 0..=31"
        );

        let mut storage = Table::new(config.storage_bits);

        // The terminal lives in cell (1) and is never put into a bucket,
        // so garbage collection never sees it.
        let one = storage.alloc();
        assert_eq!(one, 1);

        Self {
            storage: RefCell::new(storage),
            cache: RefCell::new(Cache::new(config.cache_bits.min(config.storage_bits))),
            one: Ref::positive(one as u32),
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::new(BddConfig::default())
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let storage = self.storage.borrow();
        f.debug_struct("Bdd")
            .field("capacity", &storage.capacity())
            .field("size", &storage.size())
            .field("real_size", &storage.real_size())
            .finish()
    }
}

impl Bdd {
    /// The tautology.
    pub fn one(&self) -> Ref {
        self.one
    }
    /// The contradiction.
    pub fn zero(&self) -> Ref {
        -self.one
    }

    pub fn is_one(&self, node: Ref) -> bool {
        node == self.one
    }
    pub fn is_zero(&self, node: Ref) -> bool {
        node == -self.one
    }
    pub fn is_terminal(&self, node: Ref) -> bool {
        node.index() == self.one.index()
    }

    /// Number of live nodes in the arena (terminal included).
    pub fn num_nodes(&self) -> usize {
        self.storage.borrow().real_size()
    }

    /// Computed-table (hits, misses).
    pub fn cache_stats(&self) -> (usize, usize) {
        let cache = self.cache.borrow();
        (cache.hits(), cache.misses())
    }

    pub fn variable(&self, index: u32) -> u32 {
        self.storage.borrow().value(index as usize).variable
    }
    fn low(&self, index: u32) -> Ref {
        self.storage.borrow().value(index as usize).low
    }
    fn high(&self, index: u32) -> Ref {
        self.storage.borrow().value(index as usize).high
    }

    pub fn low_node(&self, node: Ref) -> Ref {
        let low = self.low(node.index());
        if node.is_negated() {
            -low
        } else {
            low
        }
    }
    pub fn high_node(&self, node: Ref) -> Ref {
        let high = self.high(node.index());
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");

        if low == high {
            return low;
        }

        // The high edge of a stored node is never complemented.
        if high.is_negated() {
            return -self.mk_node(v, -low, -high);
        }

        let i = self.storage.borrow_mut().put(Node {
            variable: v,
            low,
            high,
        });
        Ref::positive(i as u32)
    }

    /// The projection function of variable `v` (1-indexed).
    pub fn mk_var(&self, v: u32) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");
        self.mk_node(v, self.zero(), self.one)
    }

    /// Conjunction of DIMACS-style literals (`-v` is the negation of `v`).
    pub fn mk_cube(&self, literals: impl IntoIterator<Item = i32>) -> Ref {
        let mut literals = literals.into_iter().collect::<Vec<_>>();
        literals.sort_by_key(|&lit| std::cmp::Reverse(lit.unsigned_abs()));
        let mut current = self.one;
        for lit in literals {
            assert_ne!(lit, 0, "Variable index should not be zero");
            let v = lit.unsigned_abs();
            current = if lit < 0 {
                self.mk_node(v, current, self.zero())
            } else {
                self.mk_node(v, self.zero(), current)
            };
        }
        current
    }

    fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        if self.is_terminal(node) || v < self.variable(node.index()) {
            return (node, node);
        }
        debug_assert_eq!(v, self.variable(node.index()));
        (self.low_node(node), self.high_node(node))
    }

    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(f, g, h) = (f ∧ g) ∨ (¬f ∧ h)
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Ref {
        // Base cases:
        //   ite(1,G,H) => G
        //   ite(0,G,H) => H
        //   ite(F,G,G) => G
        //   ite(F,1,0) => F
        //   ite(F,0,1) => ~F
        if self.is_one(f) {
            return g;
        }
        if self.is_zero(f) {
            return h;
        }
        if g == h {
            return g;
        }
        if self.is_one(g) && self.is_zero(h) {
            return f;
        }
        if self.is_zero(g) && self.is_one(h) {
            return -f;
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,G,~F) => ite(F,G,1)
        if g == f {
            return self.apply_ite(f, self.one, h);
        }
        if g == -f {
            return self.apply_ite(f, self.zero(), h);
        }
        if h == f {
            return self.apply_ite(f, g, self.zero());
        }
        if h == -f {
            return self.apply_ite(f, g, self.one);
        }

        // ite(~F,G,H) => ite(F,H,G)
        let (mut f, mut g, mut h) = (f, g, h);
        if f.is_negated() {
            f = -f;
            std::mem::swap(&mut g, &mut h);
        }
        // ite(F,~G,H) => ~ite(F,G,~H)
        let negate = g.is_negated();
        if negate {
            g = -g;
            h = -h;
        }

        let key = IteKey(f, g, h);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return if negate { -res } else { res };
        }

        let m = [f, g, h]
            .into_iter()
            .filter(|&r| !self.is_terminal(r))
            .map(|r| self.variable(r.index()))
            .min()
            .expect("f is not a terminal");

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let e = self.apply_ite(f0, g0, h0);
        let t = self.apply_ite(f1, g1, h1);
        let res = self.mk_node(m, e, t);

        self.cache.borrow_mut().insert(key, res);

        if negate {
            -res
        } else {
            res
        }
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.zero())
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, self.one, v)
    }

    pub fn apply_xor(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, -v, v)
    }

    pub fn apply_or_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        nodes
            .into_iter()
            .fold(self.zero(), |acc, node| self.apply_or(acc, node))
    }

    /// Subset test: every assignment satisfying `f` satisfies `g`.
    pub fn is_implies(&self, f: Ref, g: Ref) -> bool {
        self.is_zero(self.apply_and(f, -g))
    }

    /// Indices of all nodes reachable from `nodes`, terminal included.
    pub fn descendants(&self, nodes: impl IntoIterator<Item = Ref>) -> HashSet<u32> {
        let mut visited = HashSet::new();
        visited.insert(self.one.index());
        let mut queue = VecDeque::from_iter(nodes);

        while let Some(node) = queue.pop_front() {
            let i = node.index();
            if visited.insert(i) {
                queue.push_back(self.low(i));
                queue.push_back(self.high(i));
            }
        }

        visited
    }

    /// Number of nodes in the graph of `f`, terminal included.
    pub fn size(&self, f: Ref) -> usize {
        self.descendants([f]).len()
    }

    /// Reclaim every node not reachable from `roots`.
    ///
    /// Handles to reclaimed nodes become dangling: callers must list every
    /// function they still own. Returns the number of reclaimed nodes.
    pub fn collect_garbage(&self, roots: &[Ref]) -> usize {
        self.cache.borrow_mut().clear();

        let alive = self.descendants(roots.iter().copied());
        let mut storage = self.storage.borrow_mut();
        let mut collected = 0;

        for b in 0..storage.num_buckets() {
            let mut index = storage.bucket(b);
            let mut head = 0;
            let mut tail = 0;

            while index != 0 {
                let next = storage.next(index);
                if alive.contains(&(index as u32)) {
                    if tail == 0 {
                        head = index;
                    } else {
                        storage.set_next(tail, index);
                    }
                    tail = index;
                } else {
                    storage.drop(index);
                    collected += 1;
                }
                index = next;
            }

            if tail != 0 {
                storage.set_next(tail, 0);
            }
            storage.set_bucket(b, head);
        }

        debug!(
            "collect_garbage: reclaimed {} nodes, {} alive",
            collected,
            storage.real_size()
        );
        collected
    }
}
