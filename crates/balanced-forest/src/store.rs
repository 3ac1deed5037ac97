//! Array arena owning every node of a tree.
//!
//! Handles are `u32` slot indices. A handle stays valid until the node is
//! deleted or until a compaction renumbers the arena; compactions return a
//! [`RemapTable`] which every holder of a handle must apply before its next
//! dereference. Links stored inside the nodes themselves are rewritten by the
//! store.

use std::ops::{Index, IndexMut};

use tracing::debug;

use crate::error::{Result, TreeError};
use crate::types::Node;

/// Smallest logical capacity; the arena never shrinks below it.
pub const MIN_CAPACITY: usize = 4;

/// Mapping from pre-compaction handles to post-compaction handles.
///
/// Handles that do not survive (the deleted node, freed slack) map to `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemapTable {
    map: Vec<Option<u32>>,
}

impl RemapTable {
    fn from_live<N>(slots: &[Option<N>], base: u32) -> Self {
        let mut next = base;
        let map = slots
            .iter()
            .map(|slot| {
                slot.as_ref().map(|_| {
                    let h = next;
                    next += 1;
                    h
                })
            })
            .collect();
        Self { map }
    }

    /// New handle for `old`, `None` if it did not survive.
    pub fn get(&self, old: u32) -> Option<u32> {
        self.map.get(old as usize).copied().flatten()
    }

    /// Rewrites an optional handle through the table.
    pub fn apply(&self, handle: Option<u32>) -> Option<u32> {
        handle.and_then(|h| self.get(h))
    }

    /// Composes two consecutive tables: `self` first, then `next`.
    pub fn then(&self, next: &RemapTable) -> RemapTable {
        Self {
            map: self.map.iter().map(|h| next.apply(*h)).collect(),
        }
    }

    /// Number of surviving handles.
    pub fn len(&self) -> usize {
        self.map.iter().filter(|h| h.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(old, new)` pairs in old-handle order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.map
            .iter()
            .enumerate()
            .filter_map(|(old, new)| new.map(|new| (old as u32, new)))
    }
}

fn dangling(h: u32) -> TreeError {
    TreeError::InvariantViolation(format!("dangling node handle {h}"))
}

fn remap_links<N: Node>(node: &mut N, remap: &RemapTable) {
    node.set_p(remap.apply(node.p()));
    node.set_l(remap.apply(node.l()));
    node.set_r(remap.apply(node.r()));
}

/// Growable arena with load-factor driven compaction.
#[derive(Clone, Debug)]
pub struct NodeStore<N> {
    slots: Vec<Option<N>>,
    live: usize,
    capacity: usize,
}

impl<N: Node> Default for NodeStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Node> NodeStore<N> {
    pub fn new() -> Self {
        Self::with_capacity(MIN_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        Self {
            slots: Vec::with_capacity(capacity),
            live: 0,
            capacity,
        }
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Logical capacity used for the load-factor computation.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots issued so far, live or vacant.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Stores `node` in a new slot; the handle is the new slot count minus one.
    pub fn append(&mut self, node: N) -> u32 {
        if self.slots.len() == self.capacity {
            self.capacity *= 2;
            self.slots.reserve_exact(self.capacity - self.slots.len());
        }
        self.slots.push(Some(node));
        self.live += 1;
        (self.slots.len() - 1) as u32
    }

    pub fn get(&self, h: u32) -> Option<&N> {
        self.slots.get(h as usize).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, h: u32) -> Option<&mut N> {
        self.slots.get_mut(h as usize).and_then(Option::as_mut)
    }

    /// Like [`NodeStore::get`], for handles that must be live. A dangling
    /// handle is an internal inconsistency.
    pub fn try_get(&self, h: u32) -> Result<&N> {
        self.get(h).ok_or_else(|| dangling(h))
    }

    pub fn try_get_mut(&mut self, h: u32) -> Result<&mut N> {
        self.get_mut(h).ok_or_else(|| dangling(h))
    }

    pub fn contains(&self, h: u32) -> bool {
        self.get(h).is_some()
    }

    /// Replaces the node stored under a live handle.
    pub fn set(&mut self, h: u32, node: N) -> Result<N> {
        let slot = self.get_mut(h).ok_or(TreeError::NotFound)?;
        Ok(std::mem::replace(slot, node))
    }

    /// Mutable access to two distinct live nodes at once.
    pub fn pair_mut(&mut self, a: u32, b: u32) -> Result<(&mut N, &mut N)> {
        if a == b {
            return Err(TreeError::InvalidArgument(format!(
                "pair_mut needs distinct handles, got {a} twice"
            )));
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        if hi as usize >= self.slots.len() {
            return Err(TreeError::NotFound);
        }
        let (head, tail) = self.slots.split_at_mut(hi as usize);
        let lo_node = head[lo as usize].as_mut().ok_or(TreeError::NotFound)?;
        let hi_node = tail[0].as_mut().ok_or(TreeError::NotFound)?;
        Ok(if a < b {
            (lo_node, hi_node)
        } else {
            (hi_node, lo_node)
        })
    }

    /// Removes a node. If occupancy drops below a quarter of the capacity the
    /// arena is rebuilt into half the capacity and the remap table is
    /// returned; every handle not present in it is now invalid.
    ///
    /// The caller must have unlinked the node from its neighbours first.
    pub fn delete(&mut self, h: u32) -> Result<(N, Option<RemapTable>)> {
        let node = self
            .slots
            .get_mut(h as usize)
            .and_then(Option::take)
            .ok_or(TreeError::NotFound)?;
        self.live -= 1;
        let remap = if self.should_compact() {
            Some(self.compact())
        } else {
            None
        };
        Ok((node, remap))
    }

    /// Appends every live node of `other`, rewriting its internal links.
    /// Returns the mapping from `other`'s handles to handles in `self`.
    pub fn absorb(&mut self, other: NodeStore<N>) -> RemapTable {
        let remap = RemapTable::from_live(&other.slots, self.slots.len() as u32);
        let moved = other.live;
        for mut node in other.slots.into_iter().flatten() {
            remap_links(&mut node, &remap);
            self.append(node);
        }
        debug!(moved, live = self.live, "node store absorbed another arena");
        remap
    }

    /// Moves the given nodes into a fresh store, in the given order.
    ///
    /// Links between moved nodes are rewritten; links leaving the moved set
    /// become `None`. Nodes left behind must not link into the moved set.
    /// Returns the new store, the mapping into it, and the compaction table
    /// of `self` if the removal triggered one.
    pub fn extract(
        &mut self,
        handles: &[u32],
    ) -> Result<(NodeStore<N>, RemapTable, Option<RemapTable>)> {
        let mut map = vec![None; self.slots.len()];
        for (i, &h) in handles.iter().enumerate() {
            if !self.contains(h) || map[h as usize].is_some() {
                return Err(TreeError::InvalidArgument(format!(
                    "cannot extract handle {h}"
                )));
            }
            map[h as usize] = Some(i as u32);
        }
        let moved = RemapTable { map };

        let mut out = NodeStore::with_capacity(handles.len().next_power_of_two());
        for &h in handles {
            let Some(mut node) = self.slots[h as usize].take() else {
                return Err(TreeError::NotFound);
            };
            self.live -= 1;
            remap_links(&mut node, &moved);
            out.append(node);
        }
        debug!(moved = handles.len(), live = self.live, "node store extracted nodes");

        let remap = if self.should_compact() {
            Some(self.compact())
        } else {
            None
        };
        Ok((out, moved, remap))
    }

    /// Live `(handle, node)` pairs in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &N)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(h, slot)| slot.as_ref().map(|n| (h as u32, n)))
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.live = 0;
        self.capacity = MIN_CAPACITY;
    }

    fn should_compact(&self) -> bool {
        self.capacity > MIN_CAPACITY && self.live * 4 < self.capacity
    }

    fn compact(&mut self) -> RemapTable {
        let remap = RemapTable::from_live(&self.slots, 0);
        let before = self.capacity;
        self.capacity = (self.capacity / 2).max(MIN_CAPACITY);
        let mut slots = Vec::with_capacity(self.capacity);
        for mut node in self.slots.drain(..).flatten() {
            remap_links(&mut node, &remap);
            slots.push(Some(node));
        }
        self.slots = slots;
        debug!(
            live = self.live,
            from = before,
            to = self.capacity,
            "node store compacted"
        );
        remap
    }
}

impl<N> Index<u32> for NodeStore<N> {
    type Output = N;

    fn index(&self, h: u32) -> &N {
        match self.slots.get(h as usize) {
            Some(Some(node)) => node,
            _ => panic!("dangling node handle {h}"),
        }
    }
}

impl<N> IndexMut<u32> for NodeStore<N> {
    fn index_mut(&mut self, h: u32) -> &mut N {
        match self.slots.get_mut(h as usize) {
            Some(Some(node)) => node,
            _ => panic!("dangling node handle {h}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BstNode;

    type TestNode = BstNode<u32, (), ()>;

    fn node(k: u32) -> TestNode {
        BstNode::new(k, (), ())
    }

    #[test]
    fn append_issues_sequential_handles_and_doubles() {
        let mut store = NodeStore::new();
        for k in 0..5 {
            assert_eq!(store.append(node(k)), k);
        }
        assert_eq!(store.len(), 5);
        assert_eq!(store.capacity(), 8);
        assert_eq!(store[3].k, 3);
    }

    #[test]
    fn delete_without_compaction_returns_none() {
        let mut store = NodeStore::new();
        for k in 0..4 {
            store.append(node(k));
        }
        let (removed, remap) = store.delete(1).unwrap();
        assert_eq!(removed.k, 1);
        assert!(remap.is_none());
        assert!(store.get(1).is_none());
        assert!(matches!(store.delete(1), Err(TreeError::NotFound)));
    }

    #[test]
    fn compaction_remaps_links() {
        let mut store: NodeStore<TestNode> = NodeStore::new();
        for k in 0..9 {
            store.append(node(k));
        }
        assert_eq!(store.capacity(), 16);
        store[8].p = Some(2);
        store[2].r = Some(8);

        let mut remap = None;
        for h in [0, 1, 3, 4, 5, 6, 7] {
            let (_, r) = store.delete(h).unwrap();
            if r.is_some() {
                remap = r;
                break;
            }
        }
        let remap = remap.expect("occupancy fell below a quarter");
        let new_parent = remap.get(2).unwrap();
        let new_child = remap.get(8).unwrap();
        assert_eq!(store[new_child].p, Some(new_parent));
        assert_eq!(store[new_parent].r, Some(new_child));
        assert_eq!(store.capacity(), 8);
        assert_eq!(remap.get(0), None);
    }

    #[test]
    fn absorb_offsets_handles() {
        let mut a: NodeStore<TestNode> = NodeStore::new();
        a.append(node(1));
        let mut b: NodeStore<TestNode> = NodeStore::new();
        let b0 = b.append(node(10));
        let b1 = b.append(node(20));
        b[b1].p = Some(b0);
        b[b0].r = Some(b1);

        let remap = a.absorb(b);
        assert_eq!(remap.get(b0), Some(1));
        assert_eq!(remap.get(b1), Some(2));
        assert_eq!(a[2].p, Some(1));
        assert_eq!(a[1].r, Some(2));
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn extract_detaches_outside_links() {
        let mut store: NodeStore<TestNode> = NodeStore::new();
        let root = store.append(node(5));
        let child = store.append(node(7));
        let grandchild = store.append(node(6));
        store[child].p = Some(root);
        store[grandchild].p = Some(child);
        store[child].l = Some(grandchild);
        store[root].r = None;

        let (out, moved, _) = store.extract(&[child, grandchild]).unwrap();
        assert_eq!(moved.get(child), Some(0));
        assert_eq!(out[0].p, None);
        assert_eq!(out[0].l, Some(1));
        assert_eq!(out[1].p, Some(0));
        assert_eq!(store.len(), 1);
        assert!(store.extract(&[root, root]).is_err());
    }

    #[test]
    fn try_get_reports_dangling_handles() {
        let mut store: NodeStore<TestNode> = NodeStore::new();
        let h = store.append(node(1));
        assert_eq!(store.try_get(h).unwrap().k, 1);
        store.try_get_mut(h).unwrap().k = 2;
        assert_eq!(store[h].k, 2);
        store.delete(h).unwrap();
        assert!(matches!(store.try_get(h), Err(TreeError::InvariantViolation(_))));
        assert!(matches!(store.try_get_mut(7), Err(TreeError::InvariantViolation(_))));
    }

    #[test]
    fn pair_mut_rejects_same_handle() {
        let mut store: NodeStore<TestNode> = NodeStore::new();
        let a = store.append(node(1));
        let b = store.append(node(2));
        {
            let (x, y) = store.pair_mut(b, a).unwrap();
            std::mem::swap(&mut x.k, &mut y.k);
        }
        assert_eq!(store[a].k, 2);
        assert!(store.pair_mut(a, a).is_err());
    }
}
