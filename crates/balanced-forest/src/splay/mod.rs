//! Splay balancing: every access moves the touched node to the root.
//!
//! Nodes carry no extra data; the policy is purely structural. Besides the
//! usual operations a splay tree can be joined with a tree of strictly
//! greater keys and split around a key.

use tracing::debug;

use crate::bst::Bst;
use crate::error::{invariant, Result, TreeError};
use crate::policy::Balance;
use crate::store::RemapTable;
use crate::traverse::DepthFirstOrder;

#[derive(Clone, Copy, Debug, Default)]
pub struct Splay;

/// Rotates `x` up until it is the root.
///
/// - zig: the parent is the root, one rotation.
/// - zig-zig: `x` and its parent are same-side children, rotate the
///   grandparent first and then the parent.
/// - zig-zag: opposite sides, one double rotation.
pub(crate) fn splay<K, V, C>(tree: &mut Bst<K, V, Splay, C>, x: u32) -> Result<()>
where
    C: Fn(&K, &K) -> bool,
{
    while let Some(p) = tree.parent(x) {
        let x_left = tree.left(p) == Some(x);
        match tree.parent(p) {
            None => {
                if x_left {
                    tree.right_rotate(p, x)?;
                } else {
                    tree.left_rotate(p, x)?;
                }
            }
            Some(g) => {
                let p_left = tree.left(g) == Some(p);
                match (p_left, x_left) {
                    (true, true) => {
                        tree.right_rotate(g, p)?;
                        tree.right_rotate(p, x)?;
                    }
                    (false, false) => {
                        tree.left_rotate(g, p)?;
                        tree.left_rotate(p, x)?;
                    }
                    (true, false) => tree.left_right_rotate(g, p, x)?,
                    (false, true) => tree.right_left_rotate(g, p, x)?,
                }
            }
        }
    }
    Ok(())
}

impl Balance for Splay {
    type Meta = ();

    fn fresh_meta(&mut self) {}

    fn after_insert<K, V, C>(tree: &mut Bst<K, V, Self, C>, node: u32) -> Result<()>
    where
        C: Fn(&K, &K) -> bool,
    {
        splay(tree, node)
    }

    fn after_access<K, V, C>(tree: &mut Bst<K, V, Self, C>, node: u32) -> Result<()>
    where
        C: Fn(&K, &K) -> bool,
    {
        splay(tree, node)
    }

    fn remove<K, V, C>(tree: &mut Bst<K, V, Self, C>, node: u32) -> Result<V>
    where
        C: Fn(&K, &K) -> bool,
    {
        let detached = tree.detach(node)?;
        if let Some(parent) = detached.parent {
            splay(tree, parent)?;
        }
        Ok(detached.value)
    }
}

impl<K, V, C> Bst<K, V, Splay, C>
where
    C: Fn(&K, &K) -> bool,
{
    /// Moves the node `h` to the root.
    pub fn splay(&mut self, h: u32) -> Result<()> {
        if !self.store.contains(h) {
            return Err(TreeError::NotFound);
        }
        splay(self, h)
    }

    /// Appends every entry of `other`, whose keys must all be greater than
    /// every key of `self`.
    ///
    /// `other`'s nodes move into this tree's arena; the returned table maps
    /// their old handles to the new ones.
    pub fn join(&mut self, other: Self) -> Result<RemapTable> {
        if let (Some(max), Some(min)) = (self.last(), other.first()) {
            if !(self.less)(&self.store[max].k, &other.store[min].k) {
                return Err(TreeError::UnsupportedOperation(
                    "join needs every key of the left tree below every key of the right tree"
                        .to_string(),
                ));
            }
        }
        let Some(other_root) = other.root else {
            return Ok(RemapTable::default());
        };
        let other_sized = other.order_statistics;
        let max = self.last();

        let remap = self.store.absorb(other.store);
        let grafted = invariant(remap.get(other_root), "joined root lost in absorb")?;
        self.store[grafted].is_root = false;

        match max {
            None => self.set_root(Some(grafted)),
            Some(max) => {
                splay(self, max)?;
                self.store[max].r = Some(grafted);
                self.store[grafted].p = Some(max);
            }
        }

        if self.order_statistics && !other_sized {
            let order: Vec<u32> = self
                .depth_first(DepthFirstOrder::Post, Some(grafted))
                .map(|(h, _)| h)
                .collect();
            for h in order {
                self.refresh(h);
            }
        }
        if let Some(root) = self.root {
            self.refresh(root);
        }
        debug!(moved = remap.len(), len = self.len(), "splay join");
        Ok(remap)
    }

    /// Splays `key` to the root and moves every strictly greater entry into a
    /// new tree, which is returned.
    ///
    /// The detached subtree keeps its shape; its nodes move to a fresh arena
    /// in one pass. Handles into the moved entries are invalidated.
    pub fn split(&mut self, key: &K) -> Result<Self>
    where
        C: Clone,
    {
        let h = self.search(key)?;
        let mut right = Self::with_policy(self.less.clone(), self.options(), Splay);
        let Some(r) = self.store[h].r else {
            return Ok(right);
        };

        self.store[h].r = None;
        self.store[r].p = None;
        self.refresh(h);

        let handles: Vec<u32> = self
            .depth_first(DepthFirstOrder::Pre, Some(r))
            .map(|(h, _)| h)
            .collect();
        let (store, moved, remap) = self.store.extract(&handles)?;
        if let Some(remap) = remap {
            self.root = remap.apply(self.root);
            self.record_remap(remap);
        }

        right.store = store;
        right.set_root(moved.get(r));
        debug!(left = self.len(), right = right.len(), "splay split");
        Ok(right)
    }
}

#[cfg(test)]
mod tests {
    use crate::SplayTree;

    #[test]
    fn search_moves_hit_to_root() {
        let mut tree = SplayTree::new();
        for k in 0..32 {
            tree.insert(k, k).unwrap();
        }
        let h = tree.search(&7).unwrap();
        assert_eq!(tree.root(), Some(h));
        tree.assert_valid().unwrap();
    }

    #[test]
    fn miss_splays_last_visited() {
        let mut tree = SplayTree::new();
        for k in [10, 20, 30, 40] {
            tree.insert(k, ()).unwrap();
        }
        assert!(tree.search(&25).is_err());
        let root_key = *tree.key(tree.root().unwrap()).unwrap();
        assert!(root_key == 20 || root_key == 30);
        tree.assert_valid().unwrap();
    }
}
