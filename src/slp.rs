//! Grammar store for straight-line programs.
//!
//! An [`Slp`] is an append-only arena of rules indexed by [`NonTerminal`] id.
//! Every nonterminal generates exactly one string; the start symbol stands for
//! the string the whole grammar represents.
//!
//! # Example
//!
//! ```
//! use slp_rs::Slp;
//!
//! let mut slp = Slp::new();
//! let a = slp.get_or_create_preterminal('a');
//! let b = slp.get_or_create_preterminal('b');
//! let ab = slp.new_binary(a, b).unwrap();
//! let abab = slp.new_run(ab, 2).unwrap();
//! slp.set_start(abab).unwrap();
//!
//! assert_eq!(slp.length().unwrap(), 4);
//! assert_eq!(*slp.access(2).unwrap(), 'a');
//! assert_eq!(slp.depth().unwrap(), 2);
//! ```

use crate::error::{Result, SlpError};
use crate::rule::{NonTerminal, Rule};
use ahash::AHashMap as HashMap;
use std::hash::Hash;

/// Number of bits needed to write `value` (0 for 0).
#[inline]
pub(crate) fn bit_length(value: u64) -> u32 {
    u64::BITS - value.leading_zeros()
}

/// A straight-line program, optionally with run-length rules.
#[derive(Debug, Clone)]
pub struct Slp<T> {
    /// Rules indexed by `id - 1`
    rules: Vec<Rule<T>>,

    /// Expansion lengths, resolved when a rule is installed
    lengths: Vec<Option<u64>>,

    /// Start symbol; `None` stands for the empty string
    start: Option<NonTerminal>,

    /// Maps terminal values to their preterminal nonterminal
    preterminals: HashMap<T, NonTerminal>,
}

impl<T> Slp<T> {
    /// Creates an empty grammar.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            lengths: Vec::new(),
            start: None,
            preterminals: HashMap::default(),
        }
    }

    /// Allocates a fresh nonterminal with an empty rule.
    ///
    /// Ids are handed out in strictly increasing order.
    pub fn allocate(&mut self) -> NonTerminal {
        self.rules.push(Rule::Empty);
        self.lengths.push(None);
        NonTerminal::from_index(self.rules.len() - 1)
    }

    /// Installs `id -> value`.
    pub fn set_terminal(&mut self, id: NonTerminal, value: T) -> Result<()> {
        self.install(id, Rule::Terminal(value), 1)
    }

    /// Installs `id -> left right`.
    ///
    /// If `id` already has a length (it is being rewritten), the new operands
    /// must generate exactly that many symbols.
    pub fn set_binary(
        &mut self,
        id: NonTerminal,
        left: NonTerminal,
        right: NonTerminal,
    ) -> Result<()> {
        let length = self
            .length_of(left)?
            .checked_add(self.length_of(right)?)
            .ok_or(SlpError::LengthOverflow { id })?;
        self.install(id, Rule::Binary(left, right), length)
    }

    /// Installs `id -> base^count`.
    ///
    /// A rewrite to a run of count 1 must not lead back to `id`.
    pub fn set_run(&mut self, id: NonTerminal, base: NonTerminal, count: u64) -> Result<()> {
        if count == 0 {
            return Err(SlpError::InvalidRunCount { id });
        }
        let length = self
            .length_of(base)?
            .checked_mul(count)
            .ok_or(SlpError::LengthOverflow { id })?;
        if count == 1 && self.reaches_through_unit_runs(base, id) {
            return Err(SlpError::TopologyViolation {
                id,
                detail: "rewrite would make the grammar cyclic",
            });
        }
        self.install(id, Rule::Run(base, count), length)
    }

    /// Whether `target` is `from` or sits below it on a chain of count-1 runs.
    ///
    /// Every other edge strictly shortens the expansion, so these chains are
    /// the only way a length-preserving rewrite can close a cycle.
    fn reaches_through_unit_runs(&self, from: NonTerminal, target: NonTerminal) -> bool {
        let mut node = from;
        loop {
            if node == target {
                return true;
            }
            match self.rules.get(node.index()) {
                Some(&Rule::Run(next, 1)) => node = next,
                _ => return false,
            }
        }
    }

    /// Allocates a nonterminal and installs `left right` on it.
    pub fn new_binary(&mut self, left: NonTerminal, right: NonTerminal) -> Result<NonTerminal> {
        let id = self.allocate();
        self.set_binary(id, left, right)?;
        Ok(id)
    }

    /// Allocates a nonterminal and installs `base^count` on it.
    pub fn new_run(&mut self, base: NonTerminal, count: u64) -> Result<NonTerminal> {
        let id = self.allocate();
        self.set_run(id, base, count)?;
        Ok(id)
    }

    fn install(&mut self, id: NonTerminal, rule: Rule<T>, length: u64) -> Result<()> {
        let slot = self
            .lengths
            .get_mut(id.index())
            .ok_or(SlpError::UndefinedNonTerminal { id })?;

        if let Some(expected) = *slot {
            if expected != length {
                return Err(SlpError::ConstructionInconsistency {
                    id,
                    expected,
                    found: length,
                });
            }
        }

        *slot = Some(length);
        self.rules[id.index()] = rule;
        Ok(())
    }

    /// Sets the start symbol. The id must already have a rule.
    pub fn set_start(&mut self, id: NonTerminal) -> Result<()> {
        self.length_of(id)?;
        self.start = Some(id);
        Ok(())
    }

    /// Returns the start symbol, if any.
    pub fn start(&self) -> Option<NonTerminal> {
        self.start
    }

    /// A grammar without a start symbol generates the empty string, so any
    /// query on it is out of range.
    fn start_or_out_of_range(&self) -> Result<NonTerminal> {
        self.start
            .ok_or(SlpError::IndexOutOfRange { index: 0, length: 0 })
    }

    /// Returns the rule of `id`, or `None` if the id was never allocated.
    pub fn rule(&self, id: NonTerminal) -> Option<&Rule<T>> {
        self.rules.get(id.index())
    }

    pub(crate) fn rule_checked(&self, id: NonTerminal) -> Result<&Rule<T>> {
        match self.rules.get(id.index()) {
            Some(Rule::Empty) | None => Err(SlpError::UndefinedNonTerminal { id }),
            Some(rule) => Ok(rule),
        }
    }

    /// Iterates over all allocated ids and their rules, lowest id first.
    pub fn rules(&self) -> impl Iterator<Item = (NonTerminal, &Rule<T>)> + '_ {
        self.rules
            .iter()
            .enumerate()
            .map(|(index, rule)| (NonTerminal::from_index(index), rule))
    }

    /// Returns the highest allocated id.
    pub fn highest(&self) -> Option<NonTerminal> {
        self.rules.len().checked_sub(1).map(NonTerminal::from_index)
    }

    /// Number of allocated nonterminals.
    pub fn size(&self) -> usize {
        self.rules.len()
    }

    /// Length of the string generated by the start symbol.
    pub fn length(&self) -> Result<u64> {
        self.length_of(self.start_or_out_of_range()?)
    }

    /// Length of `Exp(id)`.
    pub fn length_of(&self, id: NonTerminal) -> Result<u64> {
        self.lengths
            .get(id.index())
            .copied()
            .flatten()
            .ok_or(SlpError::UndefinedNonTerminal { id })
    }

    /// Symbol at position `index` of the start symbol's expansion.
    ///
    /// A grammar without a start symbol generates the empty string, so every
    /// index is out of range.
    pub fn access(&self, index: u64) -> Result<&T> {
        match self.start {
            Some(start) => self.access_in(start, index),
            None => Err(SlpError::IndexOutOfRange { index, length: 0 }),
        }
    }

    /// Symbol at position `index` of `Exp(id)`.
    pub fn access_in(&self, id: NonTerminal, index: u64) -> Result<&T> {
        let length = self.length_of(id)?;
        if index >= length {
            return Err(SlpError::IndexOutOfRange { index, length });
        }

        let mut node = id;
        let mut offset = index;
        loop {
            match self.rule_checked(node)? {
                Rule::Terminal(value) => return Ok(value),
                Rule::Binary(left, right) => {
                    let left_length = self.length_of(*left)?;
                    if offset < left_length {
                        node = *left;
                    } else {
                        offset -= left_length;
                        node = *right;
                    }
                }
                Rule::Run(base, _) => {
                    offset %= self.length_of(*base)?;
                    node = *base;
                }
                Rule::Empty => unreachable!("rule_checked rejects empty rules"),
            }
        }
    }

    /// Height of the start symbol's derivation tree.
    pub fn depth(&self) -> Result<usize> {
        self.depth_of(self.start_or_out_of_range()?)
    }

    /// Height of the derivation tree of `id` (0 for a terminal).
    pub fn depth_of(&self, id: NonTerminal) -> Result<usize> {
        let depths = self.subtree_depths(id)?;
        Ok(depths[id.index()].unwrap_or_default())
    }

    /// Derivation heights of every node reachable from `root`.
    ///
    /// Walks the DAG with an explicit stack so unbalanced grammars of linear
    /// depth cannot exhaust the call stack.
    pub(crate) fn subtree_depths(&self, root: NonTerminal) -> Result<Vec<Option<usize>>> {
        let mut depths: Vec<Option<usize>> = vec![None; self.rules.len()];
        let mut stack = vec![root];

        while let Some(&node) = stack.last() {
            if depths[node.index()].is_some() {
                stack.pop();
                continue;
            }

            match self.rule_checked(node)? {
                Rule::Terminal(_) => {
                    depths[node.index()] = Some(0);
                    stack.pop();
                }
                Rule::Binary(left, right) => {
                    match (depths[left.index()], depths[right.index()]) {
                        (Some(l), Some(r)) => {
                            depths[node.index()] = Some(l.max(r) + 1);
                            stack.pop();
                        }
                        (l, r) => {
                            if l.is_none() {
                                stack.push(*left);
                            }
                            if r.is_none() {
                                stack.push(*right);
                            }
                        }
                    }
                }
                Rule::Run(base, _) => match depths[base.index()] {
                    Some(d) => {
                        depths[node.index()] = Some(d + 1);
                        stack.pop();
                    }
                    None => stack.push(*base),
                },
                Rule::Empty => unreachable!("rule_checked rejects empty rules"),
            }
        }

        Ok(depths)
    }

    /// Returns size, length and depth in one go.
    pub fn stats(&self) -> Result<SlpStats> {
        let (length, depth) = match self.start {
            Some(start) => (self.length_of(start)?, self.depth_of(start)?),
            None => (0, 0),
        };

        Ok(SlpStats {
            length,
            size: self.size(),
            depth,
        })
    }
}

impl<T: Hash + Eq + Clone> Slp<T> {
    /// Returns the preterminal for `value`, creating it on first use.
    pub fn get_or_create_preterminal(&mut self, value: T) -> NonTerminal {
        if let Some(&id) = self.preterminals.get(&value) {
            return id;
        }

        let id = self.allocate();
        self.rules[id.index()] = Rule::Terminal(value.clone());
        self.lengths[id.index()] = Some(1);
        self.preterminals.insert(value, id);
        id
    }

    /// Looks up the preterminal for `value` without creating it.
    pub fn preterminal(&self, value: &T) -> Option<NonTerminal> {
        self.preterminals.get(value).copied()
    }
}

impl<T> Default for Slp<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Size metrics of a grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlpStats {
    /// Length of the generated string
    pub length: u64,
    /// Number of nonterminals
    pub size: usize,
    /// Height of the derivation tree
    pub depth: usize,
}
