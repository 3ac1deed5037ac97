//! AVL balancing: every node keeps its subtree height and no node's
//! children differ in height by more than one.

use tracing::trace;

use crate::bst::Bst;
use crate::error::{invariant, Result, TreeError};
use crate::policy::Balance;
use crate::types::Augment;

/// Height of the subtree rooted at a node; a leaf has height 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Height(pub u32);

impl Augment for Height {
    fn refresh(&mut self, l: Option<&Self>, r: Option<&Self>) {
        self.0 = 1 + l.map_or(0, |h| h.0).max(r.map_or(0, |h| h.0));
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Avl;

fn height<K, V, C>(tree: &Bst<K, V, Avl, C>, h: Option<u32>) -> i64
where
    C: Fn(&K, &K) -> bool,
{
    h.map_or(0, |h| i64::from(tree.store[h].meta.0))
}

/// `height(right) - height(left)`.
pub(crate) fn balance_factor<K, V, C>(tree: &Bst<K, V, Avl, C>, h: u32) -> i64
where
    C: Fn(&K, &K) -> bool,
{
    height(tree, tree.right(h)) - height(tree, tree.left(h))
}

/// Rotates at `n` if it is out of balance. Returns the new top of the
/// subtree when a rotation happened.
fn rebalance<K, V, C>(tree: &mut Bst<K, V, Avl, C>, n: u32) -> Result<Option<u32>>
where
    C: Fn(&K, &K) -> bool,
{
    let bf = balance_factor(tree, n);
    if bf < -1 {
        let l = invariant(tree.left(n), "left-heavy node without left child")?;
        if balance_factor(tree, l) > 0 {
            let x = invariant(tree.right(l), "inner-heavy child without right child")?;
            trace!(node = n, "avl left-right case");
            tree.left_right_rotate(n, l, x)?;
            Ok(Some(x))
        } else {
            trace!(node = n, "avl left-left case");
            tree.right_rotate(n, l)?;
            Ok(Some(l))
        }
    } else if bf > 1 {
        let r = invariant(tree.right(n), "right-heavy node without right child")?;
        if balance_factor(tree, r) < 0 {
            let x = invariant(tree.left(r), "inner-heavy child without left child")?;
            trace!(node = n, "avl right-left case");
            tree.right_left_rotate(n, r, x)?;
            Ok(Some(x))
        } else {
            trace!(node = n, "avl right-right case");
            tree.left_rotate(n, r)?;
            Ok(Some(r))
        }
    } else {
        Ok(None)
    }
}

impl Balance for Avl {
    type Meta = Height;

    fn fresh_meta(&mut self) -> Height {
        Height(1)
    }

    fn after_insert<K, V, C>(tree: &mut Bst<K, V, Self, C>, node: u32) -> Result<()>
    where
        C: Fn(&K, &K) -> bool,
    {
        let mut curr = tree.parent(node);
        while let Some(n) = curr {
            tree.refresh(n);
            // One rotation restores the pre-insert height of this subtree, so
            // nothing above it changes.
            if rebalance(tree, n)?.is_some() {
                return Ok(());
            }
            curr = tree.parent(n);
        }
        Ok(())
    }

    fn remove<K, V, C>(tree: &mut Bst<K, V, Self, C>, node: u32) -> Result<V>
    where
        C: Fn(&K, &K) -> bool,
    {
        let detached = tree.detach(node)?;
        let mut curr = detached.parent;
        while let Some(n) = curr {
            tree.refresh(n);
            let top = rebalance(tree, n)?.unwrap_or(n);
            curr = tree.parent(top);
        }
        Ok(detached.value)
    }

    fn validate<K, V, C>(tree: &Bst<K, V, Self, C>) -> Result<()>
    where
        C: Fn(&K, &K) -> bool,
    {
        for (h, _) in tree.depth_first(crate::DepthFirstOrder::Post, None) {
            let expected = 1 + height(tree, tree.left(h)).max(height(tree, tree.right(h)));
            let stored = i64::from(tree.store[h].meta.0);
            if stored != expected {
                return Err(TreeError::InvariantViolation(format!(
                    "height of {h} is {stored}, expected {expected}"
                )));
            }
            let bf = balance_factor(tree, h);
            if bf.abs() > 1 {
                return Err(TreeError::InvariantViolation(format!(
                    "balance factor {bf} at {h}"
                )));
            }
        }
        Ok(())
    }
}

impl<K, V, C> Bst<K, V, Avl, C>
where
    C: Fn(&K, &K) -> bool,
{
    /// Height stored on a node.
    pub fn node_height(&self, h: u32) -> Option<u32> {
        self.store.get(h).map(|n| n.meta.0)
    }
}
