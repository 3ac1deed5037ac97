//! Node definitions.
//!
//! Every "pointer" between nodes is an `Option<u32>` handle into the
//! [`NodeStore`](crate::store::NodeStore) arena that owns all nodes of a tree.

/// Parent/child links (`p`, `l`, `r`).
///
/// The arena uses this to rewrite links when it renumbers handles.
pub trait Node {
    fn p(&self) -> Option<u32>;
    fn l(&self) -> Option<u32>;
    fn r(&self) -> Option<u32>;
    fn set_p(&mut self, v: Option<u32>);
    fn set_l(&mut self, v: Option<u32>);
    fn set_r(&mut self, v: Option<u32>);
}

/// Policy-specific data carried by every node.
///
/// `refresh` recomputes derived data (such as an AVL height) from the
/// children's data. It runs bottom-up after every rotation and along the
/// path touched by a structural change.
pub trait Augment: Clone + std::fmt::Debug {
    fn refresh(&mut self, _l: Option<&Self>, _r: Option<&Self>) {}
}

impl Augment for () {}

/// Tree node stored in the arena.
#[derive(Clone, Debug)]
pub struct BstNode<K, V, M> {
    pub p: Option<u32>,
    pub l: Option<u32>,
    pub r: Option<u32>,
    pub k: K,
    pub v: V,
    pub is_root: bool,
    /// Number of nodes in the subtree rooted here. Only maintained when the
    /// tree has order statistics enabled.
    pub size: usize,
    pub meta: M,
}

impl<K, V, M> BstNode<K, V, M> {
    pub fn new(k: K, v: V, meta: M) -> Self {
        Self {
            p: None,
            l: None,
            r: None,
            k,
            v,
            is_root: false,
            size: 1,
            meta,
        }
    }

    pub fn key(&self) -> &K {
        &self.k
    }

    pub fn value(&self) -> &V {
        &self.v
    }

    pub fn is_leaf(&self) -> bool {
        self.l.is_none() && self.r.is_none()
    }
}

impl<K, V, M> Node for BstNode<K, V, M> {
    fn p(&self) -> Option<u32> {
        self.p
    }

    fn l(&self) -> Option<u32> {
        self.l
    }

    fn r(&self) -> Option<u32> {
        self.r
    }

    fn set_p(&mut self, v: Option<u32>) {
        self.p = v;
    }

    fn set_l(&mut self, v: Option<u32>) {
        self.l = v;
    }

    fn set_r(&mut self, v: Option<u32>) {
        self.r = v;
    }
}
