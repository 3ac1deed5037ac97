//! Red-black balancing.
//!
//! Absent children count as black. The root is always black, no red node
//! has a red child, and every root-to-leaf path crosses the same number of
//! black nodes.

use tracing::trace;

use crate::bst::Bst;
use crate::error::{invariant, Result, TreeError};
use crate::policy::Balance;
use crate::types::Augment;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

impl Augment for Color {}

#[derive(Clone, Copy, Debug, Default)]
pub struct RedBlack;

type Tree<K, V, C> = Bst<K, V, RedBlack, C>;

#[inline]
fn is_red<K, V, C>(tree: &Tree<K, V, C>, h: Option<u32>) -> bool
where
    C: Fn(&K, &K) -> bool,
{
    h.is_some_and(|h| tree.store[h].meta == Color::Red)
}

#[inline]
fn color<K, V, C>(tree: &Tree<K, V, C>, h: u32) -> Color
where
    C: Fn(&K, &K) -> bool,
{
    tree.store[h].meta
}

#[inline]
fn paint<K, V, C>(tree: &mut Tree<K, V, C>, h: u32, color: Color)
where
    C: Fn(&K, &K) -> bool,
{
    tree.store[h].meta = color;
}

fn insert_fixup<K, V, C>(tree: &mut Tree<K, V, C>, node: u32) -> Result<()>
where
    C: Fn(&K, &K) -> bool,
{
    let mut x = node;
    while let Some(p) = tree.parent(x) {
        if !is_red(tree, Some(p)) {
            break;
        }
        // A red parent without a grandparent is the root; painted below.
        let Some(g) = tree.parent(p) else {
            break;
        };
        let parent_left = tree.left(g) == Some(p);
        let uncle = if parent_left { tree.right(g) } else { tree.left(g) };

        if let Some(u) = uncle.filter(|&u| is_red(tree, Some(u))) {
            paint(tree, p, Color::Black);
            paint(tree, u, Color::Black);
            paint(tree, g, Color::Red);
            x = g;
            continue;
        }

        let x_left = tree.left(p) == Some(x);
        trace!(node = x, parent_left, x_left, "red-black insert rotation");
        let top = match (parent_left, x_left) {
            (true, true) => {
                tree.right_rotate(g, p)?;
                p
            }
            (true, false) => {
                tree.left_right_rotate(g, p, x)?;
                x
            }
            (false, false) => {
                tree.left_rotate(g, p)?;
                p
            }
            (false, true) => {
                tree.right_left_rotate(g, p, x)?;
                x
            }
        };
        paint(tree, top, Color::Black);
        paint(tree, g, Color::Red);
        break;
    }
    if let Some(root) = tree.root {
        paint(tree, root, Color::Black);
    }
    Ok(())
}

/// Resolves the extra black left at `x` (possibly absent) under `parent`.
fn delete_fixup<K, V, C>(
    tree: &mut Tree<K, V, C>,
    mut x: Option<u32>,
    mut parent: Option<u32>,
    mut x_left: bool,
) -> Result<()>
where
    C: Fn(&K, &K) -> bool,
{
    while x != tree.root && !is_red(tree, x) {
        let Some(p) = parent else {
            break;
        };
        if x_left {
            let mut w = invariant(tree.right(p), "double-black node without sibling")?;
            if is_red(tree, Some(w)) {
                paint(tree, w, Color::Black);
                paint(tree, p, Color::Red);
                tree.left_rotate(p, w)?;
                w = invariant(tree.right(p), "double-black node without sibling")?;
            }
            if !is_red(tree, tree.left(w)) && !is_red(tree, tree.right(w)) {
                paint(tree, w, Color::Red);
                x = Some(p);
                parent = tree.parent(p);
                x_left = parent.is_some_and(|pp| tree.left(pp) == Some(p));
                continue;
            }
            if !is_red(tree, tree.right(w)) {
                let wl = invariant(tree.left(w), "red nephew missing")?;
                paint(tree, wl, Color::Black);
                paint(tree, w, Color::Red);
                tree.right_rotate(w, wl)?;
                w = wl;
            }
            let pc = color(tree, p);
            paint(tree, w, pc);
            paint(tree, p, Color::Black);
            if let Some(wr) = tree.right(w) {
                paint(tree, wr, Color::Black);
            }
            tree.left_rotate(p, w)?;
        } else {
            let mut w = invariant(tree.left(p), "double-black node without sibling")?;
            if is_red(tree, Some(w)) {
                paint(tree, w, Color::Black);
                paint(tree, p, Color::Red);
                tree.right_rotate(p, w)?;
                w = invariant(tree.left(p), "double-black node without sibling")?;
            }
            if !is_red(tree, tree.left(w)) && !is_red(tree, tree.right(w)) {
                paint(tree, w, Color::Red);
                x = Some(p);
                parent = tree.parent(p);
                x_left = parent.is_some_and(|pp| tree.left(pp) == Some(p));
                continue;
            }
            if !is_red(tree, tree.left(w)) {
                let wr = invariant(tree.right(w), "red nephew missing")?;
                paint(tree, wr, Color::Black);
                paint(tree, w, Color::Red);
                tree.left_rotate(w, wr)?;
                w = wr;
            }
            let pc = color(tree, p);
            paint(tree, w, pc);
            paint(tree, p, Color::Black);
            if let Some(wl) = tree.left(w) {
                paint(tree, wl, Color::Black);
            }
            tree.right_rotate(p, w)?;
        }
        x = tree.root;
        break;
    }
    if let Some(x) = x {
        paint(tree, x, Color::Black);
    }
    Ok(())
}

/// Black-height of the subtree at `h`, counting the absent leaves.
fn black_height<K, V, C>(tree: &Tree<K, V, C>, h: Option<u32>) -> Result<usize>
where
    C: Fn(&K, &K) -> bool,
{
    let Some(h) = h else {
        return Ok(1);
    };
    let (l, r) = (tree.left(h), tree.right(h));
    if is_red(tree, Some(h)) && (is_red(tree, l) || is_red(tree, r)) {
        return Err(TreeError::InvariantViolation(format!(
            "red node {h} has a red child"
        )));
    }
    let lh = black_height(tree, l)?;
    let rh = black_height(tree, r)?;
    if lh != rh {
        return Err(TreeError::InvariantViolation(format!(
            "black-height mismatch at {h}: {lh} vs {rh}"
        )));
    }
    Ok(lh + usize::from(!is_red(tree, Some(h))))
}

impl Balance for RedBlack {
    type Meta = Color;

    fn fresh_meta(&mut self) -> Color {
        Color::Red
    }

    fn after_insert<K, V, C>(tree: &mut Bst<K, V, Self, C>, node: u32) -> Result<()>
    where
        C: Fn(&K, &K) -> bool,
    {
        insert_fixup(tree, node)
    }

    fn remove<K, V, C>(tree: &mut Bst<K, V, Self, C>, node: u32) -> Result<V>
    where
        C: Fn(&K, &K) -> bool,
    {
        let detached = tree.detach(node)?;
        if detached.meta == Color::Black {
            delete_fixup(tree, detached.child, detached.parent, detached.was_left)?;
        }
        Ok(detached.value)
    }

    fn validate<K, V, C>(tree: &Bst<K, V, Self, C>) -> Result<()>
    where
        C: Fn(&K, &K) -> bool,
    {
        if is_red(tree, tree.root) {
            return Err(TreeError::InvariantViolation("red root".to_string()));
        }
        black_height(tree, tree.root).map(|_| ())
    }
}

impl<K, V, C> Bst<K, V, RedBlack, C>
where
    C: Fn(&K, &K) -> bool,
{
    pub fn color(&self, h: u32) -> Option<Color> {
        self.store.get(h).map(|n| n.meta)
    }
}
