use std::collections::HashMap;

use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::reference::Ref;

impl Bdd {
    /// Number of assignments over `num_vars` variables that satisfy `node`.
    ///
    /// Every variable in the support of `node` must be at most `num_vars`.
    pub fn sat_count(&self, node: Ref, num_vars: usize) -> BigUint {
        let max = BigUint::from(1u32) << num_vars;
        let mut cache = HashMap::new();
        self.sat_count_(node, &max, &mut cache)
    }

    fn sat_count_(&self, node: Ref, max: &BigUint, cache: &mut HashMap<u32, BigUint>) -> BigUint {
        if self.is_zero(node) {
            return BigUint::ZERO;
        } else if self.is_one(node) {
            return max.clone();
        }

        // Counts are cached for the regular (non-complemented) node.
        let count = match cache.get(&node.index()) {
            Some(count) => count.clone(),
            None => {
                let regular = if node.is_negated() { -node } else { node };
                let low = self.sat_count_(self.low_node(regular), max, cache);
                let high = self.sat_count_(self.high_node(regular), max, cache);
                let count: BigUint = (low + high) >> 1;
                cache.insert(node.index(), count.clone());
                count
            }
        };

        if node.is_negated() {
            max - count
        } else {
            count
        }
    }
}
