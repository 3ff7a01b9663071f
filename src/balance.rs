//! Depth balancing.
//!
//! [`Slp::balance`] decomposes the grammar into heavy paths and rewrites every
//! node on each path so it reaches the path's tail in two hops, through
//! suffix shortcuts over the light siblings. The generated string is
//! unchanged; the derivation depth drops to `O(log n)`.
//!
//! [`Slp::balance_longest_path`] applies the same rewrite to the single longest
//! root-to-leaf path only.

use crate::error::{Result, SlpError};
use crate::heavy_path::{heavy_paths, HeavyPath};
use crate::rule::{NonTerminal, Rule};
use crate::shortcuts::{make_shortcuts, Concat};
use crate::slp::Slp;

/// Which balancing pass [`Slp::balance_with`] runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BalanceStrategy {
    /// Full heavy-path decomposition; depth becomes `O(log n)`.
    #[default]
    HeavyPaths,

    /// Flatten only the longest root-to-leaf path.
    LongestPath,
}

/// Verifies that `path` is a chain of binary rules with one light sibling per step.
fn check_path<T>(slp: &Slp<T>, path: &HeavyPath) -> Result<()> {
    let steps = path.nodes.len().saturating_sub(1);
    if path.left.len() != steps || path.right.len() != steps {
        return Err(SlpError::MalformedPath {
            position: path.left.len().min(path.right.len()),
        });
    }

    for position in 0..steps {
        let child = path.nodes[position + 1];
        let expected = match (path.left[position], path.right[position]) {
            (None, Some(sibling)) => (child, sibling),
            (Some(sibling), None) => (sibling, child),
            _ => return Err(SlpError::MalformedPath { position }),
        };
        if slp.rule(path.nodes[position]).and_then(Rule::as_binary) != Some(expected) {
            return Err(SlpError::MalformedPath { position });
        }
    }

    Ok(())
}

/// Fills every hole of `suffixes` with the shortcut that follows it.
fn fill_holes(original: &[Option<NonTerminal>], suffixes: &mut [Option<NonTerminal>]) {
    for i in (0..original.len().saturating_sub(1)).rev() {
        if original[i].is_none() {
            debug_assert!(suffixes[i].is_none());
            suffixes[i] = suffixes[i + 1];
        }
    }
}

/// Rewrites every node of `path` except its tail to reference the tail directly.
///
/// Paths of at most two nodes are left untouched. Each rewrite must preserve
/// the node's length; a mismatch is reported as
/// [`SlpError::ConstructionInconsistency`].
pub fn balance_path<T>(slp: &mut Slp<T>, path: &HeavyPath) -> Result<()> {
    check_path(slp, path)?;
    let Some(tail) = path.tail() else {
        return Ok(());
    };
    if path.len() <= 2 {
        return Ok(());
    }

    let mut left = make_shortcuts(slp, &path.left, Concat::Forward)?;
    let mut right = make_shortcuts(slp, &path.right, Concat::Reversed)?;
    fill_holes(&path.left, &mut left);
    fill_holes(&path.right, &mut right);

    for (i, &node) in path.nodes[..path.len() - 1].iter().enumerate() {
        match (left[i], right[i]) {
            (Some(before), None) => slp.set_binary(node, before, tail)?,
            (None, Some(after)) => slp.set_binary(node, tail, after)?,
            (Some(before), Some(after)) => {
                let joined = slp.new_binary(before, tail)?;
                slp.set_binary(node, joined, after)?;
            }
            (None, None) => unreachable!("every step has a light sibling"),
        }
    }

    log::trace!("balanced path of {} nodes ending at {tail}", path.len());
    Ok(())
}

/// Returns the longest root-to-leaf path from the start symbol.
///
/// Ties go to the left operand. Requires a grammar of terminal and binary
/// rules only.
pub fn longest_path<T>(slp: &Slp<T>) -> Result<HeavyPath> {
    let start = slp.start().ok_or(SlpError::EmptyGrammar)?;
    if let Some((id, _)) = slp.rules().find(|(_, rule)| matches!(rule, Rule::Run(..))) {
        return Err(SlpError::UnsupportedRuleKind { id });
    }

    let heights = slp.subtree_depths(start)?;
    let height = |id: NonTerminal| heights[id.index()].unwrap_or_default();

    let mut path = HeavyPath::singleton(start);
    let mut node = start;
    while let Some(&Rule::Binary(left, right)) = slp.rule(node) {
        if height(left) >= height(right) {
            path.push_left(left, right);
            node = left;
        } else {
            path.push_right(left, right);
            node = right;
        }
    }

    Ok(path)
}

impl<T> Slp<T> {
    /// Rebalances the grammar so its depth is logarithmic in its length.
    ///
    /// Requires topologically numbered ids (every operand below its parent,
    /// start is the highest id), full reachability from the start, and no run
    /// rules. On error the grammar must be treated as unusable.
    pub fn balance(&mut self) -> Result<&mut Self> {
        if self.start().is_none() && self.size() == 0 {
            return Ok(self);
        }

        let size = self.size();
        let paths = heavy_paths(self)?;
        for path in &paths {
            balance_path(self, path)?;
        }

        log::debug!(
            "balanced {} heavy paths, {} nonterminals added",
            paths.len(),
            self.size() - size
        );
        Ok(self)
    }

    /// Flattens only the longest root-to-leaf path.
    pub fn balance_longest_path(&mut self) -> Result<&mut Self> {
        if self.start().is_none() && self.size() == 0 {
            return Ok(self);
        }

        let size = self.size();
        let path = longest_path(self)?;
        balance_path(self, &path)?;

        log::debug!(
            "balanced longest path of {} nodes, {} nonterminals added",
            path.len(),
            self.size() - size
        );
        Ok(self)
    }

    /// Runs the balancing pass selected by `strategy`.
    pub fn balance_with(&mut self, strategy: BalanceStrategy) -> Result<&mut Self> {
        match strategy {
            BalanceStrategy::HeavyPaths => self.balance(),
            BalanceStrategy::LongestPath => self.balance_longest_path(),
        }
    }
}
