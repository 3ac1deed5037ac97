//! Arena-backed self-balancing binary search trees.
//!
//! One shared core ([`Bst`]) handles search, insertion, structural removal,
//! bounds, order statistics and lowest-common-ancestor queries. A balancing
//! policy type parameter decides how the tree is restructured around those
//! operations:
//!
//! - [`Unbalanced`]: plain BST.
//! - [`Avl`]: height balanced.
//! - [`RedBlack`]: color balanced.
//! - [`Splay`]: move-to-root on every access, plus `join`/`split`.
//! - [`Treap`] / [`Cartesian`]: min-heap over node priorities.
//!
//! All nodes live in a [`NodeStore`] arena and refer to each other through
//! `u32` handles. Deleting can compact the arena, which starts a new
//! [`Bst::epoch`]. A handle held across a compaction must be rewritten with
//! [`Bst::remap_since`] for the epoch it was obtained in.
//!
//! # Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`store`] | [`NodeStore`] arena and [`RemapTable`] |
//! | [`types`] | [`BstNode`], [`Node`] links, [`Augment`] |
//! | [`bst`] | [`Bst`] core, [`TreeOptions`], [`LcaAlgorithm`] |
//! | `rotate` | rotation primitives shared by all policies |
//! | [`policy`] | [`Balance`] contract, [`Unbalanced`] |
//! | [`avl`], [`red_black`], [`splay`], [`treap`] | balancing policies |
//! | [`traverse`] | depth-first and breadth-first walks |

pub mod avl;
pub mod bst;
pub mod error;
pub mod policy;
pub mod red_black;
mod rotate;
pub mod splay;
pub mod store;
pub mod traverse;
pub mod treap;
pub mod types;

pub use avl::{Avl, Height};
pub use bst::{Bst, LcaAlgorithm, TreeOptions};
pub use error::{Result, TreeError};
pub use policy::{Balance, Unbalanced};
pub use red_black::{Color, RedBlack};
pub use splay::Splay;
pub use store::{NodeStore, RemapTable};
pub use traverse::{BreadthFirst, DepthFirst, DepthFirstOrder};
pub use treap::{Cartesian, Priority, Treap};
pub use types::{Augment, BstNode, Node};

pub type BinarySearchTree<K, V, C = fn(&K, &K) -> bool> = Bst<K, V, Unbalanced, C>;
pub type AvlTree<K, V, C = fn(&K, &K) -> bool> = Bst<K, V, Avl, C>;
pub type RbTree<K, V, C = fn(&K, &K) -> bool> = Bst<K, V, RedBlack, C>;
pub type SplayTree<K, V, C = fn(&K, &K) -> bool> = Bst<K, V, Splay, C>;
pub type TreapTree<K, V, C = fn(&K, &K) -> bool> = Bst<K, V, Treap, C>;
pub type CartesianTree<K, V, C = fn(&K, &K) -> bool> = Bst<K, V, Cartesian, C>;
