//! Rotation primitives shared by every balancing policy.
//!
//! Each rotation rewires handles in one pass, moves the root if the rotated
//! subtree was the whole tree, and refreshes the augmented data of the
//! touched nodes bottom-up.
//!
//! ```text
//!     j                 k              j                x
//!    / \   left(j,k)   / \            / \  lr(j,k,x)  /   \
//!   a   k    --->     j   c          k   d   --->    k     j
//!      / \           / \            / \             / \   / \
//!     b   c         a   b          a   x           a   b c   d
//!                                     / \
//!                                    b   c
//! ```

use tracing::trace;

use crate::bst::Bst;
use crate::error::{Result, TreeError};
use crate::policy::Balance;

fn not_child(op: &str, child: u32, parent: u32) -> TreeError {
    TreeError::InvariantViolation(format!("{op}: {child} is not the expected child of {parent}"))
}

impl<K, V, P, C> Bst<K, V, P, C>
where
    P: Balance,
    C: Fn(&K, &K) -> bool,
{
    /// `k`, the right child of `j`, takes `j`'s place; `j` becomes `k`'s left
    /// child and adopts `k`'s former left subtree.
    pub(crate) fn left_rotate(&mut self, j: u32, k: u32) -> Result<()> {
        self.store.try_get(k)?;
        if self.store.try_get(j)?.r != Some(k) {
            return Err(not_child("left_rotate", k, j));
        }
        trace!(j, k, "left rotate");
        let parent = self.store[j].p;
        let inner = self.store[k].l;

        self.store[j].r = inner;
        if let Some(b) = inner {
            self.store[b].p = Some(j);
        }
        self.store[k].l = Some(j);
        self.store[j].p = Some(k);
        self.replace_child(parent, j, Some(k));

        self.refresh(j);
        self.refresh(k);
        Ok(())
    }

    /// `k`, the left child of `j`, takes `j`'s place; `j` becomes `k`'s right
    /// child and adopts `k`'s former right subtree.
    pub(crate) fn right_rotate(&mut self, j: u32, k: u32) -> Result<()> {
        self.store.try_get(k)?;
        if self.store.try_get(j)?.l != Some(k) {
            return Err(not_child("right_rotate", k, j));
        }
        trace!(j, k, "right rotate");
        let parent = self.store[j].p;
        let inner = self.store[k].r;

        self.store[j].l = inner;
        if let Some(b) = inner {
            self.store[b].p = Some(j);
        }
        self.store[k].r = Some(j);
        self.store[j].p = Some(k);
        self.replace_child(parent, j, Some(k));

        self.refresh(j);
        self.refresh(k);
        Ok(())
    }

    /// `x`, the right child of `k` which is the left child of `j`, moves to
    /// the top with `k` on its left and `j` on its right.
    pub(crate) fn left_right_rotate(&mut self, j: u32, k: u32, x: u32) -> Result<()> {
        self.store.try_get(x)?;
        if self.store.try_get(j)?.l != Some(k) {
            return Err(not_child("left_right_rotate", k, j));
        }
        if self.store.try_get(k)?.r != Some(x) {
            return Err(not_child("left_right_rotate", x, k));
        }
        trace!(j, k, x, "left-right rotate");
        let parent = self.store[j].p;
        let (xl, xr) = (self.store[x].l, self.store[x].r);

        self.store[k].r = xl;
        if let Some(b) = xl {
            self.store[b].p = Some(k);
        }
        self.store[j].l = xr;
        if let Some(c) = xr {
            self.store[c].p = Some(j);
        }
        self.store[x].l = Some(k);
        self.store[k].p = Some(x);
        self.store[x].r = Some(j);
        self.store[j].p = Some(x);
        self.replace_child(parent, j, Some(x));

        self.refresh(k);
        self.refresh(j);
        self.refresh(x);
        Ok(())
    }

    /// `x`, the left child of `k` which is the right child of `j`, moves to
    /// the top with `j` on its left and `k` on its right.
    pub(crate) fn right_left_rotate(&mut self, j: u32, k: u32, x: u32) -> Result<()> {
        self.store.try_get(x)?;
        if self.store.try_get(j)?.r != Some(k) {
            return Err(not_child("right_left_rotate", k, j));
        }
        if self.store.try_get(k)?.l != Some(x) {
            return Err(not_child("right_left_rotate", x, k));
        }
        trace!(j, k, x, "right-left rotate");
        let parent = self.store[j].p;
        let (xl, xr) = (self.store[x].l, self.store[x].r);

        self.store[j].r = xl;
        if let Some(b) = xl {
            self.store[b].p = Some(j);
        }
        self.store[k].l = xr;
        if let Some(c) = xr {
            self.store[c].p = Some(k);
        }
        self.store[x].l = Some(j);
        self.store[j].p = Some(x);
        self.store[x].r = Some(k);
        self.store[k].p = Some(x);
        self.replace_child(parent, j, Some(x));

        self.refresh(j);
        self.refresh(k);
        self.refresh(x);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{BinarySearchTree, TreeError};

    fn tree(keys: &[i32]) -> BinarySearchTree<i32, ()> {
        let mut tree = BinarySearchTree::with_order_statistics();
        for &k in keys {
            tree.insert(k, ()).unwrap();
        }
        tree
    }

    fn keys(tree: &BinarySearchTree<i32, ()>) -> Vec<i32> {
        tree.keys().copied().collect()
    }

    #[test]
    fn single_rotations_move_the_root() {
        let mut t = tree(&[2, 1, 4, 3, 5]);
        let j = t.find(&2).unwrap();
        let k = t.find(&4).unwrap();
        t.left_rotate(j, k).unwrap();
        assert_eq!(t.root(), Some(k));
        assert_eq!(t.parent(j), Some(k));
        assert_eq!(t.right(j), t.find(&3));
        assert_eq!(keys(&t), vec![1, 2, 3, 4, 5]);
        t.assert_valid().unwrap();

        t.right_rotate(k, j).unwrap();
        assert_eq!(t.root(), Some(j));
        assert!(t.node(j).unwrap().is_root);
        assert!(!t.node(k).unwrap().is_root);
        t.assert_valid().unwrap();
    }

    #[test]
    fn double_rotation_in_one_pass() {
        let mut t = tree(&[10, 5, 12, 2, 7, 6, 8]);
        let j = t.find(&10).unwrap();
        let k = t.find(&5).unwrap();
        let x = t.find(&7).unwrap();
        t.left_right_rotate(j, k, x).unwrap();
        assert_eq!(t.root(), Some(x));
        assert_eq!(t.left(x), Some(k));
        assert_eq!(t.right(x), Some(j));
        assert_eq!(t.right(k), t.find(&6));
        assert_eq!(t.left(j), t.find(&8));
        assert_eq!(t.node(x).unwrap().size, 7);
        t.assert_valid().unwrap();

        let j = t.find(&7).unwrap();
        let k = t.find(&10).unwrap();
        let x = t.find(&8).unwrap();
        t.right_left_rotate(j, k, x).unwrap();
        assert_eq!(t.root(), Some(x));
        assert_eq!(keys(&t), vec![2, 5, 6, 7, 8, 10, 12]);
        t.assert_valid().unwrap();
    }

    #[test]
    fn rotation_rejects_wrong_child() {
        let mut t = tree(&[2, 1, 3]);
        let j = t.find(&2).unwrap();
        let left = t.find(&1).unwrap();
        assert!(t.left_rotate(j, left).is_err());
        t.assert_valid().unwrap();
    }

    #[test]
    fn rotation_reports_dangling_handle() {
        let mut t = tree(&[2, 1, 3]);
        let j = t.find(&2).unwrap();
        let k = t.find(&3).unwrap();
        for result in [
            t.left_rotate(j, 40),
            t.right_rotate(40, k),
            t.left_right_rotate(j, 40, k),
            t.right_left_rotate(40, k, j),
        ] {
            assert!(matches!(result, Err(TreeError::InvariantViolation(_))));
        }
        t.assert_valid().unwrap();
    }
}
