use std::collections::BTreeSet;

use balanced_forest::{Color, DepthFirstOrder, RbTree, TreeError};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

fn black_height(tree: &RbTree<i32, ()>) -> usize {
    let mut h = tree.first();
    let mut count = 0;
    while let Some(n) = h {
        if tree.color(n) == Some(Color::Black) {
            count += 1;
        }
        h = tree.node(n).unwrap().p;
    }
    count
}

#[test]
fn red_black_smoke_matrix() {
    let mut tree = RbTree::new();
    for k in [10, 20, 30, 15, 25, 5, 1] {
        tree.insert(k, ()).unwrap();
        tree.assert_valid().unwrap();
    }
    let root = tree.root().unwrap();
    assert_eq!(tree.color(root), Some(Color::Black));
    let keys: Vec<i32> = tree.keys().copied().collect();
    assert_eq!(keys, vec![1, 5, 10, 15, 20, 25, 30]);
}

#[test]
fn red_black_no_red_red_after_ascending_inserts_matrix() {
    let mut tree = RbTree::new();
    for k in 0..255 {
        tree.insert(k, ()).unwrap();
    }
    tree.assert_valid().unwrap();
    for (h, node) in tree.depth_first(DepthFirstOrder::Pre, None) {
        if tree.color(h) == Some(Color::Red) {
            for c in [node.l, node.r].into_iter().flatten() {
                assert_eq!(tree.color(c), Some(Color::Black));
            }
        }
    }
    // Height never exceeds twice the black height.
    assert!(tree.height() <= 2 * black_height(&tree));
}

#[test]
fn red_black_delete_every_shape_matrix() {
    for victim in 0..32 {
        let mut tree = RbTree::new();
        for k in 0..32 {
            tree.insert(k, ()).unwrap();
        }
        tree.delete(&victim).unwrap();
        tree.assert_valid().unwrap();
        assert_eq!(tree.len(), 31);
        assert!(!tree.contains_key(&victim));
    }
}

#[test]
fn red_black_random_operations_match_btree_set_matrix() {
    let mut rng = Xoshiro256StarStar::seed_from_u64(0xB1AC);
    let mut tree = RbTree::with_order_statistics();
    let mut model = BTreeSet::new();
    for _ in 0..2000 {
        let k: i32 = rng.gen_range(-100..100);
        if rng.gen_bool(0.55) {
            tree.insert(k, ()).unwrap();
            model.insert(k);
        } else {
            let expected = if model.remove(&k) {
                Ok(())
            } else {
                Err(TreeError::NotFound)
            };
            assert_eq!(tree.delete(&k), expected);
        }
        tree.assert_valid().unwrap();
    }
    let keys: Vec<i32> = tree.keys().copied().collect();
    assert_eq!(keys, model.iter().copied().collect::<Vec<_>>());
    if let Ok(h) = tree.select(0) {
        assert_eq!(tree.key(h), model.first());
    }
}

#[test]
fn red_black_drain_to_empty_matrix() {
    let mut tree = RbTree::new();
    for k in 0..100 {
        tree.insert(k, ()).unwrap();
    }
    for k in (0..100).rev() {
        tree.delete(&k).unwrap();
        tree.assert_valid().unwrap();
    }
    assert!(tree.is_empty());
    assert_eq!(tree.root(), None);
    assert_eq!(tree.store().capacity(), balanced_forest::store::MIN_CAPACITY);
}
