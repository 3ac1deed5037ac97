//! Bounds, order statistics and lowest-common-ancestor queries.

use crate::error::{invariant, Result, TreeError};
use crate::policy::Balance;

use super::Bst;

/// How [`Bst::lowest_common_ancestor`] finds the answer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LcaAlgorithm {
    /// Compare the root-to-node paths of both keys and keep the last shared
    /// node.
    #[default]
    Path,
    /// Walk down from the root while both keys lie strictly on the same side.
    Descent,
}

impl<K, V, P, C> Bst<K, V, P, C>
where
    P: Balance,
    C: Fn(&K, &K) -> bool,
{
    /// Node with the least key not less than `key`.
    pub fn lower_bound(&self, key: &K) -> Option<u32> {
        self.lower_bound_from(self.root, key)
    }

    fn lower_bound_from(&self, node: Option<u32>, key: &K) -> Option<u32> {
        let h = node?;
        let n = &self.store[h];
        if (self.less)(&n.k, key) {
            self.lower_bound_from(n.r, key)
        } else {
            self.lower_bound_from(n.l, key).or(Some(h))
        }
    }

    /// Node with the least key strictly greater than `key`.
    pub fn upper_bound(&self, key: &K) -> Option<u32> {
        self.upper_bound_from(self.root, key)
    }

    fn upper_bound_from(&self, node: Option<u32>, key: &K) -> Option<u32> {
        let h = node?;
        let n = &self.store[h];
        if (self.less)(key, &n.k) {
            self.upper_bound_from(n.l, key).or(Some(h))
        } else {
            self.upper_bound_from(n.r, key)
        }
    }

    fn require_order_statistics(&self, op: &str) -> Result<()> {
        if self.order_statistics {
            Ok(())
        } else {
            Err(TreeError::InvalidArgument(format!(
                "{op} needs a tree built with order statistics"
            )))
        }
    }

    /// Node holding the `(i + 1)`-th smallest key.
    pub fn select(&self, i: usize) -> Result<u32> {
        self.require_order_statistics("select")?;
        if i >= self.len() {
            return Err(TreeError::InvalidArgument(format!(
                "index {i} outside 0..{}",
                self.len()
            )));
        }

        let mut i = i;
        let mut curr = self.root;
        while let Some(h) = curr {
            let node = &self.store[h];
            let left = self.size_of(node.l);
            curr = match i.cmp(&left) {
                std::cmp::Ordering::Less => node.l,
                std::cmp::Ordering::Equal => return Ok(h),
                std::cmp::Ordering::Greater => {
                    i -= left + 1;
                    node.r
                }
            };
        }
        Err(TreeError::InvariantViolation(
            "subtree sizes disagree with the node count".to_string(),
        ))
    }

    /// 1-based position of `key` in comparator order.
    pub fn rank(&self, key: &K) -> Result<usize> {
        self.require_order_statistics("rank")?;
        let h = self.find(key).ok_or(TreeError::NotFound)?;

        let mut rank = self.size_of(self.store[h].l) + 1;
        let mut curr = h;
        while let Some(p) = self.store[curr].p {
            if self.store[p].r == Some(curr) {
                rank += self.size_of(self.store[p].l) + 1;
            }
            curr = p;
        }
        Ok(rank)
    }

    /// Lowest node that has both `j` and `k` in its subtree.
    pub fn lowest_common_ancestor(&self, j: &K, k: &K, algorithm: LcaAlgorithm) -> Result<u32> {
        let hj = self.find(j).ok_or(TreeError::NotFound)?;
        let hk = self.find(k).ok_or(TreeError::NotFound)?;
        match algorithm {
            LcaAlgorithm::Path => self.lca_by_path(hj, hk),
            LcaAlgorithm::Descent => self.lca_by_descent(j, k),
        }
    }

    /// Handles from the root down to `h`, inclusive.
    pub(crate) fn path_to(&self, h: u32) -> Vec<u32> {
        let mut path = vec![h];
        let mut curr = h;
        while let Some(p) = self.store[curr].p {
            path.push(p);
            curr = p;
        }
        path.reverse();
        path
    }

    fn lca_by_path(&self, hj: u32, hk: u32) -> Result<u32> {
        let pj = self.path_to(hj);
        let pk = self.path_to(hk);
        let shared = pj
            .iter()
            .zip(&pk)
            .take_while(|(a, b)| a == b)
            .last()
            .map(|(a, _)| *a);
        invariant(shared, "nodes share no ancestor")
    }

    fn lca_by_descent(&self, j: &K, k: &K) -> Result<u32> {
        let mut curr = invariant(self.root, "lca on an empty tree")?;
        loop {
            let n = &self.store[curr];
            let next = if (self.less)(j, &n.k) && (self.less)(k, &n.k) {
                n.l
            } else if (self.less)(&n.k, j) && (self.less)(&n.k, k) {
                n.r
            } else {
                return Ok(curr);
            };
            curr = invariant(next, "lca descent fell off the tree")?;
        }
    }
}
