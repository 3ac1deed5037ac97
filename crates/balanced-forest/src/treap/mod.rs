//! Heap-ordered balancing: keys are BST-ordered while priorities form a
//! min-heap.
//!
//! [`Treap`] draws a random priority for every new node; [`Cartesian`]
//! takes priorities from the caller (or numbers nodes by arrival when none
//! is given). Both share the bubble-up/trickle-down logic below.

use rand::{rngs::OsRng, Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use tracing::trace;

use crate::bst::{default_less, Bst, TreeOptions};
use crate::error::{Result, TreeError};
use crate::policy::Balance;
use crate::types::Augment;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub i64);

impl Augment for Priority {}

/// Randomized treap. Seed it for reproducible shapes.
#[derive(Clone, Debug)]
pub struct Treap {
    rng: Xoshiro256StarStar,
}

impl Treap {
    /// Seeds the priority generator from the operating system.
    pub fn new() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Self {
            rng: Xoshiro256StarStar::from_seed(seed),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Xoshiro256StarStar::seed_from_u64(seed),
        }
    }
}

impl Default for Treap {
    fn default() -> Self {
        Self::new()
    }
}

/// Cartesian tree: priorities come from the caller.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cartesian {
    arrivals: i64,
}

/// Rotates `node` upward while its priority is below its parent's.
fn bubble_up<K, V, P, C>(tree: &mut Bst<K, V, P, C>, node: u32) -> Result<()>
where
    P: Balance<Meta = Priority>,
    C: Fn(&K, &K) -> bool,
{
    while let Some(p) = tree.parent(node) {
        if tree.store[node].meta >= tree.store[p].meta {
            break;
        }
        if tree.left(p) == Some(node) {
            tree.right_rotate(p, node)?;
        } else {
            tree.left_rotate(p, node)?;
        }
    }
    Ok(())
}

/// Rotates `node` down below its lower-priority child until it is a leaf,
/// then unlinks it.
fn trickle_down_and_remove<K, V, P, C>(tree: &mut Bst<K, V, P, C>, node: u32) -> Result<V>
where
    P: Balance<Meta = Priority>,
    C: Fn(&K, &K) -> bool,
{
    let mut rotations = 0usize;
    loop {
        let child = match (tree.left(node), tree.right(node)) {
            (None, None) => break,
            (Some(c), None) | (None, Some(c)) => c,
            (Some(l), Some(r)) => {
                if tree.store[l].meta <= tree.store[r].meta {
                    l
                } else {
                    r
                }
            }
        };
        if tree.left(node) == Some(child) {
            tree.right_rotate(node, child)?;
        } else {
            tree.left_rotate(node, child)?;
        }
        rotations += 1;
    }
    trace!(node, rotations, "trickled down to leaf");
    Ok(tree.detach(node)?.value)
}

fn validate_heap<K, V, P, C>(tree: &Bst<K, V, P, C>) -> Result<()>
where
    P: Balance<Meta = Priority>,
    C: Fn(&K, &K) -> bool,
{
    for (h, node) in tree.store.iter() {
        for child in [node.l, node.r].into_iter().flatten() {
            if tree.store[child].meta < node.meta {
                return Err(TreeError::InvariantViolation(format!(
                    "priority of {child} is below its parent {h}"
                )));
            }
        }
    }
    Ok(())
}

impl Balance for Treap {
    type Meta = Priority;

    fn fresh_meta(&mut self) -> Priority {
        Priority(self.rng.gen())
    }

    fn after_insert<K, V, C>(tree: &mut Bst<K, V, Self, C>, node: u32) -> Result<()>
    where
        C: Fn(&K, &K) -> bool,
    {
        bubble_up(tree, node)
    }

    fn remove<K, V, C>(tree: &mut Bst<K, V, Self, C>, node: u32) -> Result<V>
    where
        C: Fn(&K, &K) -> bool,
    {
        trickle_down_and_remove(tree, node)
    }

    fn validate<K, V, C>(tree: &Bst<K, V, Self, C>) -> Result<()>
    where
        C: Fn(&K, &K) -> bool,
    {
        validate_heap(tree)
    }
}

impl Balance for Cartesian {
    type Meta = Priority;

    fn fresh_meta(&mut self) -> Priority {
        let priority = Priority(self.arrivals);
        self.arrivals = self.arrivals.saturating_add(1);
        priority
    }

    fn after_insert<K, V, C>(tree: &mut Bst<K, V, Self, C>, node: u32) -> Result<()>
    where
        C: Fn(&K, &K) -> bool,
    {
        bubble_up(tree, node)
    }

    fn remove<K, V, C>(tree: &mut Bst<K, V, Self, C>, node: u32) -> Result<V>
    where
        C: Fn(&K, &K) -> bool,
    {
        trickle_down_and_remove(tree, node)
    }

    fn validate<K, V, C>(tree: &Bst<K, V, Self, C>) -> Result<()>
    where
        C: Fn(&K, &K) -> bool,
    {
        validate_heap(tree)
    }
}

impl<K, V> Bst<K, V, Treap>
where
    K: PartialOrd,
{
    /// Natural-order treap with a reproducible priority sequence.
    pub fn seeded(seed: u64) -> Self {
        Self::with_policy(default_less::<K>, TreeOptions::default(), Treap::with_seed(seed))
    }
}

impl<K, V, P, C> Bst<K, V, P, C>
where
    P: Balance<Meta = Priority>,
    C: Fn(&K, &K) -> bool,
{
    /// Inserts with an explicit priority. An existing key only gets its
    /// payload overwritten; its priority is left alone.
    pub fn insert_with_priority(&mut self, key: K, value: V, priority: i64) -> Result<u32> {
        let (h, created) = self.insert_entry(key, value, Some(Priority(priority)));
        if created {
            P::after_insert(self, h)?;
        }
        Ok(h)
    }

    pub fn priority(&self, h: u32) -> Option<i64> {
        self.store.get(h).map(|n| n.meta.0)
    }

    /// Lowers the priority of `key` and restores heap order.
    pub fn decrease_priority(&mut self, key: &K, priority: i64) -> Result<u32> {
        let h = self.find(key).ok_or(TreeError::NotFound)?;
        let current = self.store[h].meta.0;
        if priority >= current {
            return Err(TreeError::InvalidArgument(format!(
                "priority {priority} does not decrease {current}"
            )));
        }
        self.store[h].meta = Priority(priority);
        bubble_up(self, h)?;
        Ok(h)
    }
}

#[cfg(test)]
mod tests {
    use super::{Cartesian, Priority};
    use crate::policy::Balance;
    use crate::{CartesianTree, TreapTree};

    #[test]
    fn seeded_treaps_have_identical_shapes() {
        let build = || {
            let mut tree = TreapTree::seeded(7);
            for k in 0..64 {
                tree.insert(k, ()).unwrap();
            }
            tree
        };
        let (a, b) = (build(), build());
        assert_eq!(a.key(a.root().unwrap()), b.key(b.root().unwrap()));
        assert_eq!(a.height(), b.height());
        a.assert_valid().unwrap();
    }

    #[test]
    fn cartesian_arrival_order_builds_a_chain() {
        let mut tree = CartesianTree::new();
        for k in 0..8 {
            tree.insert(k, ()).unwrap();
        }
        assert_eq!(tree.key(tree.root().unwrap()), Some(&0));
        assert_eq!(tree.height(), 8);
        tree.assert_valid().unwrap();
    }

    #[test]
    fn arrival_counter_saturates() {
        let mut policy = Cartesian {
            arrivals: i64::MAX - 1,
        };
        assert_eq!(policy.fresh_meta(), Priority(i64::MAX - 1));
        assert_eq!(policy.fresh_meta(), Priority(i64::MAX));
        assert_eq!(policy.fresh_meta(), Priority(i64::MAX));

        let mut tree = CartesianTree::with_policy(
            crate::bst::default_less::<i32>,
            crate::TreeOptions::default(),
            policy,
        );
        for k in [3, 1, 2] {
            tree.insert(k, ()).unwrap();
        }
        assert_eq!(tree.len(), 3);
        tree.assert_valid().unwrap();
    }
}
