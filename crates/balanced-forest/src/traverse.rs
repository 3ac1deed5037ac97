//! Iterative tree walks.
//!
//! Each walk borrows the tree, so no mutation (and therefore no compaction)
//! can happen while it is in flight.

use std::collections::VecDeque;

use crate::bst::Bst;
use crate::policy::Balance;
use crate::store::NodeStore;
use crate::types::BstNode;

/// Visit order of a depth-first walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthFirstOrder {
    /// Node, left, right.
    Pre,
    /// Left, node, right: ascending key order.
    In,
    /// Left, right, node.
    Post,
    /// Right, node, left: descending key order.
    Out,
}

/// Stack-driven depth-first walk yielding `(handle, node)` pairs.
pub struct DepthFirst<'a, K, V, M> {
    store: &'a NodeStore<BstNode<K, V, M>>,
    order: DepthFirstOrder,
    /// `(handle, expanded)`: expanded entries are yielded when popped,
    /// unexpanded ones push their children first.
    stack: Vec<(u32, bool)>,
}

impl<'a, K, V, M> DepthFirst<'a, K, V, M> {
    fn new(
        store: &'a NodeStore<BstNode<K, V, M>>,
        order: DepthFirstOrder,
        start: Option<u32>,
    ) -> Self {
        Self {
            store,
            order,
            stack: start.map(|h| (h, false)).into_iter().collect(),
        }
    }
}

impl<'a, K, V, M> Iterator for DepthFirst<'a, K, V, M> {
    type Item = (u32, &'a BstNode<K, V, M>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((h, expanded)) = self.stack.pop() {
            let node = self.store.get(h)?;
            if expanded {
                return Some((h, node));
            }
            let (l, r) = (node.l.map(|l| (l, false)), node.r.map(|r| (r, false)));
            let this = Some((h, true));
            // Pushed in reverse visit order.
            let pushes = match self.order {
                DepthFirstOrder::Pre => [r, l, this],
                DepthFirstOrder::In => [r, this, l],
                DepthFirstOrder::Post => [this, r, l],
                DepthFirstOrder::Out => [l, this, r],
            };
            self.stack.extend(pushes.into_iter().flatten());
        }
        None
    }
}

/// Queue-driven level-order walk yielding `(handle, node)` pairs.
pub struct BreadthFirst<'a, K, V, M> {
    store: &'a NodeStore<BstNode<K, V, M>>,
    queue: VecDeque<u32>,
}

impl<'a, K, V, M> Iterator for BreadthFirst<'a, K, V, M> {
    type Item = (u32, &'a BstNode<K, V, M>);

    fn next(&mut self) -> Option<Self::Item> {
        let h = self.queue.pop_front()?;
        let node = self.store.get(h)?;
        self.queue.extend(node.l);
        self.queue.extend(node.r);
        Some((h, node))
    }
}

impl<K, V, P, C> Bst<K, V, P, C>
where
    P: Balance,
    C: Fn(&K, &K) -> bool,
{
    fn walk_start(&self, start: Option<u32>) -> Option<u32> {
        start.or(self.root).filter(|&h| self.store.contains(h))
    }

    /// Depth-first walk of the subtree at `start` (the whole tree for `None`).
    pub fn depth_first(
        &self,
        order: DepthFirstOrder,
        start: Option<u32>,
    ) -> DepthFirst<'_, K, V, P::Meta> {
        DepthFirst::new(&self.store, order, self.walk_start(start))
    }

    /// Level-order walk of the subtree at `start` (the whole tree for `None`).
    pub fn breadth_first(&self, start: Option<u32>) -> BreadthFirst<'_, K, V, P::Meta> {
        BreadthFirst {
            store: &self.store,
            queue: self.walk_start(start).into_iter().collect(),
        }
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.depth_first(DepthFirstOrder::In, None)
            .map(|(_, n)| (&n.k, &n.v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::DepthFirstOrder;
    use crate::BinarySearchTree;

    fn sample() -> BinarySearchTree<i32, ()> {
        let mut tree = BinarySearchTree::new();
        for k in [4, 2, 6, 1, 3, 5, 7] {
            tree.insert(k, ()).unwrap();
        }
        tree
    }

    fn walk(tree: &BinarySearchTree<i32, ()>, order: DepthFirstOrder) -> Vec<i32> {
        tree.depth_first(order, None).map(|(_, n)| n.k).collect()
    }

    #[test]
    fn depth_first_orders() {
        let tree = sample();
        assert_eq!(walk(&tree, DepthFirstOrder::Pre), vec![4, 2, 1, 3, 6, 5, 7]);
        assert_eq!(walk(&tree, DepthFirstOrder::In), vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(walk(&tree, DepthFirstOrder::Post), vec![1, 3, 2, 5, 7, 6, 4]);
        assert_eq!(walk(&tree, DepthFirstOrder::Out), vec![7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn breadth_first_from_subtree() {
        let tree = sample();
        let all: Vec<i32> = tree.breadth_first(None).map(|(_, n)| n.k).collect();
        assert_eq!(all, vec![4, 2, 6, 1, 3, 5, 7]);

        let six = tree.find(&6);
        let sub: Vec<i32> = tree.breadth_first(six).map(|(_, n)| n.k).collect();
        assert_eq!(sub, vec![6, 5, 7]);
        let pre: Vec<i32> = tree
            .depth_first(DepthFirstOrder::Pre, six)
            .map(|(_, n)| n.k)
            .collect();
        assert_eq!(pre, vec![6, 5, 7]);
    }

    #[test]
    fn walks_over_empty_tree_are_empty() {
        let tree: BinarySearchTree<i32, ()> = BinarySearchTree::new();
        assert_eq!(tree.depth_first(DepthFirstOrder::In, None).count(), 0);
        assert_eq!(tree.breadth_first(None).count(), 0);
        assert_eq!(tree.depth_first(DepthFirstOrder::Pre, Some(42)).count(), 0);
    }
}
