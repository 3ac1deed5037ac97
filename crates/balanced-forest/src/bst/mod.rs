//! Shared binary-search-tree core.
//!
//! [`Bst`] owns a [`NodeStore`] and a strict-less-than comparator. Search,
//! insertion, structural removal, bounds, order statistics and LCA queries
//! live here; the balancing policy `P` only decides what happens around them.

mod order;
mod validate;

use tracing::trace;

use crate::error::{Result, TreeError};
use crate::policy::Balance;
use crate::store::{NodeStore, RemapTable};
use crate::types::{Augment, BstNode};

pub use order::LcaAlgorithm;

pub(crate) fn default_less<K: PartialOrd>(a: &K, b: &K) -> bool {
    a < b
}

/// Construction options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeOptions {
    /// Maintain subtree sizes, enabling `select` and `rank`.
    pub order_statistics: bool,
}

impl TreeOptions {
    pub fn order_statistics(mut self, enabled: bool) -> Self {
        self.order_statistics = enabled;
        self
    }
}

/// What a structural removal left behind. Handles are already remapped if
/// the removal compacted the arena.
#[derive(Debug)]
pub(crate) struct Detached<V, M> {
    pub value: V,
    /// Metadata of the node that was physically unlinked. With two children
    /// this is the in-order successor, whose key/payload were swapped in.
    pub meta: M,
    /// Parent of the vacated position.
    pub parent: Option<u32>,
    /// Node now occupying the vacated position.
    pub child: Option<u32>,
    /// Whether the vacated position was the parent's left slot.
    pub was_left: bool,
}

/// Arena-backed binary search tree balanced by policy `P`.
pub struct Bst<K, V, P, C = fn(&K, &K) -> bool>
where
    P: Balance,
    C: Fn(&K, &K) -> bool,
{
    pub(crate) store: NodeStore<BstNode<K, V, P::Meta>>,
    pub(crate) root: Option<u32>,
    pub(crate) less: C,
    pub(crate) order_statistics: bool,
    pub(crate) policy: P,
    /// One table per compaction not yet drained, oldest first.
    remaps: Vec<RemapTable>,
    /// Number of compaction epochs drained or discarded so far.
    epoch_base: u64,
}

impl<K, V, P> Bst<K, V, P>
where
    K: PartialOrd,
    P: Balance + Default,
{
    pub fn new() -> Self {
        Self::with_comparator(default_less::<K>)
    }

    /// Natural-order tree with subtree sizes maintained.
    pub fn with_order_statistics() -> Self {
        Self::with_options(default_less::<K>, TreeOptions::default().order_statistics(true))
    }
}

impl<K, V, P> Default for Bst<K, V, P>
where
    K: PartialOrd,
    P: Balance + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, P, C> Bst<K, V, P, C>
where
    P: Balance,
    C: Fn(&K, &K) -> bool,
{
    pub fn with_comparator(less: C) -> Self
    where
        P: Default,
    {
        Self::with_options(less, TreeOptions::default())
    }

    pub fn with_options(less: C, options: TreeOptions) -> Self
    where
        P: Default,
    {
        Self::with_policy(less, options, P::default())
    }

    pub fn with_policy(less: C, options: TreeOptions, policy: P) -> Self {
        Self {
            store: NodeStore::new(),
            root: None,
            less,
            order_statistics: options.order_statistics,
            policy,
            remaps: Vec::new(),
            epoch_base: 0,
        }
    }

    /// Tree holding one initial entry.
    pub fn with_entry(less: C, options: TreeOptions, key: K, value: V) -> Result<Self>
    where
        P: Default,
    {
        let mut tree = Self::with_options(less, options);
        tree.insert(key, value)?;
        Ok(tree)
    }

    pub fn options(&self) -> TreeOptions {
        TreeOptions {
            order_statistics: self.order_statistics,
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn root(&self) -> Option<u32> {
        self.root
    }

    pub fn store(&self) -> &NodeStore<BstNode<K, V, P::Meta>> {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn clear(&mut self) {
        self.store.clear();
        self.root = None;
        // Every handle dies with the nodes; skip past any epoch they held.
        self.epoch_base = self.epoch() + 1;
        self.remaps.clear();
    }

    pub fn node(&self, h: u32) -> Option<&BstNode<K, V, P::Meta>> {
        self.store.get(h)
    }

    pub fn key(&self, h: u32) -> Option<&K> {
        self.store.get(h).map(|n| &n.k)
    }

    pub fn value(&self, h: u32) -> Option<&V> {
        self.store.get(h).map(|n| &n.v)
    }

    pub fn value_mut(&mut self, h: u32) -> Option<&mut V> {
        self.store.get_mut(h).map(|n| &mut n.v)
    }

    /// Current handle-numbering epoch. It advances by one on every arena
    /// compaction; a handle is only meaningful together with the epoch it
    /// was obtained in.
    pub fn epoch(&self) -> u64 {
        self.epoch_base + self.remaps.len() as u64
    }

    /// Renumbering for a handle obtained in `epoch`: the composition of
    /// every compaction since then, or `None` if there was none.
    ///
    /// Epochs already drained by [`Bst::drain_remaps`] or invalidated by
    /// [`Bst::clear`] are `InvalidArgument`.
    pub fn remap_since(&self, epoch: u64) -> Result<Option<RemapTable>> {
        if epoch < self.epoch_base || epoch > self.epoch() {
            return Err(TreeError::InvalidArgument(format!(
                "epoch {epoch} outside {}..={}",
                self.epoch_base,
                self.epoch()
            )));
        }
        let pending = &self.remaps[(epoch - self.epoch_base) as usize..];
        Ok(pending.split_first().map(|(first, rest)| {
            rest.iter().fold(first.clone(), |acc, next| acc.then(next))
        }))
    }

    /// Hands out the pending compaction tables, oldest first. Table `i`
    /// renumbers handles from epoch `epoch() - len + i`.
    pub fn drain_remaps(&mut self) -> Vec<RemapTable> {
        self.epoch_base = self.epoch();
        std::mem::take(&mut self.remaps)
    }

    pub(crate) fn record_remap(&mut self, remap: RemapTable) {
        self.remaps.push(remap);
    }

    // ── links ──────────────────────────────────────────────────────────────

    #[inline]
    pub(crate) fn parent(&self, h: u32) -> Option<u32> {
        self.store[h].p
    }

    #[inline]
    pub(crate) fn left(&self, h: u32) -> Option<u32> {
        self.store[h].l
    }

    #[inline]
    pub(crate) fn right(&self, h: u32) -> Option<u32> {
        self.store[h].r
    }

    #[inline]
    pub(crate) fn size_of(&self, h: Option<u32>) -> usize {
        h.map_or(0, |h| self.store[h].size)
    }

    pub(crate) fn set_root(&mut self, root: Option<u32>) {
        if let Some(old) = self.root {
            if let Some(node) = self.store.get_mut(old) {
                node.is_root = false;
            }
        }
        self.root = root;
        if let Some(root) = root {
            let node = &mut self.store[root];
            node.is_root = true;
            node.p = None;
        }
    }

    /// Puts `new` into the slot of `parent` that currently holds `old`, or
    /// makes it the root when `parent` is absent.
    pub(crate) fn replace_child(&mut self, parent: Option<u32>, old: u32, new: Option<u32>) {
        match parent {
            Some(p) => {
                if self.store[p].l == Some(old) {
                    self.store[p].l = new;
                } else {
                    self.store[p].r = new;
                }
                if let Some(n) = new {
                    self.store[n].p = Some(p);
                }
            }
            None => self.set_root(new),
        }
    }

    /// Recomputes the augmented data of `h` from its children.
    pub(crate) fn refresh(&mut self, h: u32) {
        let (l, r) = (self.store[h].l, self.store[h].r);
        if self.order_statistics {
            self.store[h].size = 1 + self.size_of(l) + self.size_of(r);
        }
        let lm = l.map(|l| self.store[l].meta.clone());
        let rm = r.map(|r| self.store[r].meta.clone());
        self.store[h].meta.refresh(lm.as_ref(), rm.as_ref());
    }

    pub(crate) fn recount_upward(&mut self, mut curr: Option<u32>) {
        while let Some(h) = curr {
            let node = &self.store[h];
            let size = 1 + self.size_of(node.l) + self.size_of(node.r);
            self.store[h].size = size;
            curr = self.store[h].p;
        }
    }

    // ── navigation ─────────────────────────────────────────────────────────

    pub(crate) fn leftmost(&self, mut h: u32) -> u32 {
        while let Some(l) = self.store[h].l {
            h = l;
        }
        h
    }

    pub(crate) fn rightmost(&self, mut h: u32) -> u32 {
        while let Some(r) = self.store[h].r {
            h = r;
        }
        h
    }

    /// Node with the smallest key.
    pub fn first(&self) -> Option<u32> {
        self.root.map(|r| self.leftmost(r))
    }

    /// Node with the largest key.
    pub fn last(&self) -> Option<u32> {
        self.root.map(|r| self.rightmost(r))
    }

    /// In-order successor.
    pub fn next(&self, h: u32) -> Option<u32> {
        if let Some(r) = self.store.get(h)?.r {
            return Some(self.leftmost(r));
        }
        let mut curr = h;
        let mut p = self.store[h].p;
        while let Some(pi) = p {
            if self.store[pi].r == Some(curr) {
                curr = pi;
                p = self.store[pi].p;
            } else {
                return Some(pi);
            }
        }
        None
    }

    /// In-order predecessor.
    pub fn prev(&self, h: u32) -> Option<u32> {
        if let Some(l) = self.store.get(h)?.l {
            return Some(self.rightmost(l));
        }
        let mut curr = h;
        let mut p = self.store[h].p;
        while let Some(pi) = p {
            if self.store[pi].l == Some(curr) {
                curr = pi;
                p = self.store[pi].p;
            } else {
                return Some(pi);
            }
        }
        None
    }

    // ── lookup ─────────────────────────────────────────────────────────────

    /// Descends toward `key`. Returns the matching node, if any, and the last
    /// node visited.
    fn descend(&self, key: &K) -> (Option<u32>, Option<u32>) {
        let mut curr = self.root;
        let mut last = None;
        while let Some(h) = curr {
            last = Some(h);
            let node = &self.store[h];
            curr = if (self.less)(key, &node.k) {
                node.l
            } else if (self.less)(&node.k, key) {
                node.r
            } else {
                return (Some(h), last);
            };
        }
        (None, last)
    }

    /// Read-only lookup; never restructures the tree.
    pub fn find(&self, key: &K) -> Option<u32> {
        self.descend(key).0
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|h| &self.store[h].v)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.find(key).map(|h| &mut self.store[h].v)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Policy-aware lookup: a splay tree moves the hit (or the last visited
    /// node on a miss) to the root.
    pub fn search(&mut self, key: &K) -> Result<u32> {
        let (hit, last) = self.descend(key);
        if let Some(h) = hit.or(last) {
            P::after_access(self, h)?;
        }
        hit.ok_or(TreeError::NotFound)
    }

    /// Parent of the node holding `key`; `Ok(None)` for the root.
    pub fn search_parent(&self, key: &K) -> Result<Option<u32>> {
        let h = self.find(key).ok_or(TreeError::NotFound)?;
        Ok(self.store[h].p)
    }

    // ── mutation ───────────────────────────────────────────────────────────

    /// Inserts or overwrites. An existing key keeps its node and handle; only
    /// the payload changes.
    pub fn insert(&mut self, key: K, value: V) -> Result<u32> {
        let (h, created) = self.insert_entry(key, value, None);
        if created {
            P::after_insert(self, h)?;
        } else {
            P::after_access(self, h)?;
        }
        trace!(handle = h, created, len = self.len(), "insert");
        Ok(h)
    }

    /// Links a new leaf (or overwrites an existing payload) without running
    /// any policy fixup. Returns the handle and whether a node was created.
    pub(crate) fn insert_entry(&mut self, key: K, value: V, meta: Option<P::Meta>) -> (u32, bool) {
        let Some(mut curr) = self.root else {
            let meta = meta.unwrap_or_else(|| self.policy.fresh_meta());
            let h = self.store.append(BstNode::new(key, value, meta));
            self.set_root(Some(h));
            return (h, true);
        };

        let go_left = loop {
            let node = &self.store[curr];
            let (go_left, next) = if (self.less)(&key, &node.k) {
                (true, node.l)
            } else if (self.less)(&node.k, &key) {
                (false, node.r)
            } else {
                self.store[curr].v = value;
                return (curr, false);
            };
            match next {
                Some(next) => curr = next,
                None => break go_left,
            }
        };

        let meta = meta.unwrap_or_else(|| self.policy.fresh_meta());
        let mut node = BstNode::new(key, value, meta);
        node.p = Some(curr);
        let h = self.store.append(node);
        if go_left {
            self.store[curr].l = Some(h);
        } else {
            self.store[curr].r = Some(h);
        }
        if self.order_statistics {
            let mut ancestor = Some(curr);
            while let Some(a) = ancestor {
                self.store[a].size += 1;
                ancestor = self.store[a].p;
            }
        }
        (h, true)
    }

    /// Removes `key`, returning its payload.
    pub fn delete(&mut self, key: &K) -> Result<V> {
        let (hit, last) = self.descend(key);
        let Some(h) = hit else {
            if let Some(last) = last {
                P::after_access(self, last)?;
            }
            return Err(TreeError::NotFound);
        };
        let value = P::remove(self, h)?;
        trace!(handle = h, len = self.len(), "delete");
        Ok(value)
    }

    /// Structural BST removal of `h`.
    ///
    /// Leaf and one-child nodes are unlinked directly. A node with two
    /// children swaps key and payload with its in-order successor, which is
    /// then unlinked instead. Ancestor sizes are recounted, the node is freed
    /// from the arena, and any resulting compaction is applied to the root
    /// and to the handles in the returned [`Detached`].
    pub(crate) fn detach(&mut self, h: u32) -> Result<Detached<V, P::Meta>> {
        let mut h = h;
        if let (Some(_), Some(r)) = (self.store[h].l, self.store[h].r) {
            let succ = self.leftmost(r);
            let (node, succ_node) = self.store.pair_mut(h, succ)?;
            std::mem::swap(&mut node.k, &mut succ_node.k);
            std::mem::swap(&mut node.v, &mut succ_node.v);
            h = succ;
        }

        let node = &self.store[h];
        let parent = node.p;
        let child = node.l.or(node.r);
        let was_left = parent.is_some_and(|p| self.store[p].l == Some(h));
        self.replace_child(parent, h, child);

        let node = &mut self.store[h];
        node.p = None;
        node.l = None;
        node.r = None;
        node.is_root = false;
        if self.order_statistics {
            self.recount_upward(parent);
        }

        let (node, remap) = self.store.delete(h)?;
        let (mut parent, mut child) = (parent, child);
        if let Some(remap) = remap {
            self.root = remap.apply(self.root);
            parent = remap.apply(parent);
            child = remap.apply(child);
            self.record_remap(remap);
        }

        Ok(Detached {
            value: node.v,
            meta: node.meta,
            parent,
            child,
            was_left,
        })
    }
}
