use crate::error::{Result, TreeError};
use crate::policy::Balance;

use super::Bst;

fn violation(msg: impl Into<String>) -> TreeError {
    TreeError::InvariantViolation(msg.into())
}

impl<K, V, P, C> Bst<K, V, P, C>
where
    P: Balance,
    C: Fn(&K, &K) -> bool,
{
    /// Number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack: Vec<(u32, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((h, depth)) = stack.pop() {
            height = height.max(depth);
            let node = &self.store[h];
            stack.extend(node.l.map(|l| (l, depth + 1)));
            stack.extend(node.r.map(|r| (r, depth + 1)));
        }
        height
    }

    /// Checks links, root bookkeeping, key order, subtree sizes and the
    /// policy's own invariants.
    pub fn assert_valid(&self) -> Result<()> {
        let Some(root) = self.root else {
            return if self.store.is_empty() {
                Ok(())
            } else {
                Err(violation("empty tree still owns nodes"))
            };
        };

        let root_node = self
            .store
            .get(root)
            .ok_or_else(|| violation("root handle is dangling"))?;
        if root_node.p.is_some() {
            return Err(violation("root has a parent"));
        }
        let roots = self.store.iter().filter(|(_, n)| n.is_root).count();
        if roots != 1 || !root_node.is_root {
            return Err(violation(format!("expected exactly one root flag, found {roots}")));
        }

        let mut reached = 0;
        let mut stack = vec![root];
        while let Some(h) = stack.pop() {
            reached += 1;
            let node = &self.store[h];
            for child in [node.l, node.r].into_iter().flatten() {
                let child_node = self
                    .store
                    .get(child)
                    .ok_or_else(|| violation(format!("node {h} links to dangling {child}")))?;
                if child_node.p != Some(h) {
                    return Err(violation(format!("broken parent link on {child}")));
                }
                stack.push(child);
            }
            if self.order_statistics {
                let expected = 1 + self.size_of(node.l) + self.size_of(node.r);
                if node.size != expected {
                    return Err(violation(format!(
                        "size of {h} is {}, expected {expected}",
                        node.size
                    )));
                }
            }
        }
        if reached != self.store.len() {
            return Err(violation(format!(
                "{} live nodes but only {reached} reachable",
                self.store.len()
            )));
        }

        let mut prev = self.first();
        while let Some(p) = prev {
            let next = self.next(p);
            if let Some(n) = next {
                if !(self.less)(&self.store[p].k, &self.store[n].k) {
                    return Err(violation("in-order walk is not strictly increasing"));
                }
            }
            prev = next;
        }

        P::validate(self)
    }
}
