//! Balancing strategy contract.
//!
//! A policy is a type parameter of [`Bst`], so the rebalancing code is
//! selected statically. The core calls into the policy at three points: after
//! a new leaf has been linked, after a lookup touched a node, and to remove a
//! node.

use crate::bst::Bst;
use crate::error::Result;
use crate::types::Augment;

pub trait Balance: Sized {
    /// Per-node data the policy needs (height, color, priority, ...).
    type Meta: Augment;

    /// Metadata for a node that is about to be created by `insert`.
    fn fresh_meta(&mut self) -> Self::Meta;

    /// Restores the policy's invariants after `node` was linked as a leaf.
    fn after_insert<K, V, C>(tree: &mut Bst<K, V, Self, C>, node: u32) -> Result<()>
    where
        C: Fn(&K, &K) -> bool;

    /// `node` was the target of a lookup, or the last node visited by one
    /// that missed.
    fn after_access<K, V, C>(_tree: &mut Bst<K, V, Self, C>, _node: u32) -> Result<()>
    where
        C: Fn(&K, &K) -> bool,
    {
        Ok(())
    }

    /// Removes `node` from the tree and returns its payload.
    fn remove<K, V, C>(tree: &mut Bst<K, V, Self, C>, node: u32) -> Result<V>
    where
        C: Fn(&K, &K) -> bool;

    /// Checks the policy-specific invariants of the whole tree.
    fn validate<K, V, C>(_tree: &Bst<K, V, Self, C>) -> Result<()>
    where
        C: Fn(&K, &K) -> bool,
    {
        Ok(())
    }
}

/// Plain binary search tree: no rebalancing at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unbalanced;

impl Balance for Unbalanced {
    type Meta = ();

    fn fresh_meta(&mut self) {}

    fn after_insert<K, V, C>(_tree: &mut Bst<K, V, Self, C>, _node: u32) -> Result<()>
    where
        C: Fn(&K, &K) -> bool,
    {
        Ok(())
    }

    fn remove<K, V, C>(tree: &mut Bst<K, V, Self, C>, node: u32) -> Result<V>
    where
        C: Fn(&K, &K) -> bool,
    {
        Ok(tree.detach(node)?.value)
    }
}
