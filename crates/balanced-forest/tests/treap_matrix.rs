use balanced_forest::{CartesianTree, DepthFirstOrder, TreapTree, TreeError};

fn assert_heap_ordered<K, V, P, C>(tree: &balanced_forest::Bst<K, V, P, C>)
where
    P: balanced_forest::Balance<Meta = balanced_forest::Priority>,
    C: Fn(&K, &K) -> bool,
{
    for (h, node) in tree.depth_first(DepthFirstOrder::Pre, None) {
        for c in [node.l, node.r].into_iter().flatten() {
            assert!(tree.priority(c) >= tree.priority(h));
        }
    }
}

#[test]
fn treap_random_priorities_keep_heap_order_matrix() {
    let mut tree = TreapTree::seeded(42);
    for k in 0..512 {
        tree.insert(k, k).unwrap();
    }
    tree.assert_valid().unwrap();
    assert_heap_ordered(&tree);
    // Random priorities make a sorted insert sequence shallow.
    assert!(tree.height() < 64);

    for k in (0..512).filter(|k| k % 3 == 0) {
        assert_eq!(tree.delete(&k), Ok(k));
    }
    tree.assert_valid().unwrap();
    assert_heap_ordered(&tree);
    assert_eq!(tree.len(), 512 - 171);
}

#[test]
fn treap_root_has_minimum_priority_matrix() {
    let mut tree = TreapTree::seeded(3);
    for k in [50, 20, 80, 10, 30, 70, 90] {
        tree.insert(k, ()).unwrap();
    }
    let root = tree.root().unwrap();
    let min = tree
        .depth_first(DepthFirstOrder::In, None)
        .filter_map(|(h, _)| tree.priority(h))
        .min();
    assert_eq!(tree.priority(root), min);
}

#[test]
fn cartesian_caller_priorities_matrix() {
    // Keys with explicit priorities: the root is the minimum priority and
    // the shape is fully determined.
    let mut tree = CartesianTree::new();
    for (k, p) in [(1, 5), (2, 3), (3, 9), (4, 1), (5, 7)] {
        tree.insert_with_priority(k, (), p).unwrap();
        tree.assert_valid().unwrap();
    }
    let root = tree.root().unwrap();
    assert_eq!(tree.key(root), Some(&4));
    let pre: Vec<i32> = tree
        .depth_first(DepthFirstOrder::Pre, None)
        .map(|(_, n)| n.k)
        .collect();
    assert_eq!(pre, vec![4, 2, 1, 3, 5]);
}

#[test]
fn cartesian_decrease_priority_matrix() {
    let mut tree = CartesianTree::new();
    for (k, p) in [(1, 10), (2, 20), (3, 30), (4, 40)] {
        tree.insert_with_priority(k, k * 100, p).unwrap();
    }
    assert_eq!(tree.key(tree.root().unwrap()), Some(&1));

    let h = tree.decrease_priority(&4, 0).unwrap();
    assert_eq!(tree.root(), Some(h));
    assert_eq!(tree.priority(h), Some(0));
    assert_eq!(tree.get(&4), Some(&400));
    tree.assert_valid().unwrap();

    assert!(matches!(
        tree.decrease_priority(&2, 20),
        Err(TreeError::InvalidArgument(_))
    ));
    assert!(matches!(
        tree.decrease_priority(&2, 25),
        Err(TreeError::InvalidArgument(_))
    ));
    assert_eq!(tree.decrease_priority(&9, 1), Err(TreeError::NotFound));
}

#[test]
fn cartesian_insert_existing_key_keeps_priority_matrix() {
    let mut tree = CartesianTree::new();
    tree.insert_with_priority(1, "a", 5).unwrap();
    tree.insert_with_priority(2, "b", 2).unwrap();
    let h = tree.insert_with_priority(1, "c", 0).unwrap();
    assert_eq!(tree.priority(h), Some(5));
    assert_eq!(tree.get(&1), Some(&"c"));
    assert_eq!(tree.key(tree.root().unwrap()), Some(&2));
    tree.assert_valid().unwrap();
}

#[test]
fn cartesian_delete_trickles_down_matrix() {
    let mut tree = CartesianTree::with_order_statistics();
    for (k, p) in [(5, 0), (2, 4), (8, 1), (1, 6), (3, 5), (7, 3), (9, 2)] {
        tree.insert_with_priority(k, (), p).unwrap();
    }
    tree.delete(&5).unwrap();
    tree.assert_valid().unwrap();
    assert_eq!(tree.key(tree.root().unwrap()), Some(&8));
    let keys: Vec<i32> = tree.keys().copied().collect();
    assert_eq!(keys, vec![1, 2, 3, 7, 8, 9]);
    assert_eq!(tree.rank(&8), Ok(5));
}
