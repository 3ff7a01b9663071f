//! RePair-style producer.
//!
//! RePair is a greedy grammar compressor that repeatedly replaces the most
//! frequent pair of adjacent symbols with a new rule. The grammar it emits is
//! exactly what [`Slp::balance`] expects: only terminal and binary rules,
//! operands numbered below their parents, the start symbol allocated last,
//! and every rule reachable.
//!
//! # Example
//!
//! ```
//! use slp_rs::compress_repair;
//!
//! let mut slp = compress_repair("abcabcabcabc".chars()).unwrap();
//! slp.balance().unwrap();
//!
//! let reconstructed: String = slp.iter().collect();
//! assert_eq!(reconstructed, "abcabcabcabc");
//! ```

use crate::error::{Result, SlpError};
use crate::rule::NonTerminal;
use crate::slp::Slp;
use ahash::AHashMap as HashMap;
use slotmap::{DefaultKey, SlotMap};
use std::hash::Hash;

type Pair = (NonTerminal, NonTerminal);

/// A node of the working sequence (singly linked list).
#[derive(Debug)]
struct SequenceNode {
    id: NonTerminal,
    next: Option<DefaultKey>,
}

/// The sequence being compressed, stored as a linked list so pair
/// replacement does not shift the remainder.
#[derive(Debug, Default)]
struct Sequence {
    nodes: SlotMap<DefaultKey, SequenceNode>,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
    len: usize,
}

impl Sequence {
    fn push(&mut self, id: NonTerminal) {
        let key = self.nodes.insert(SequenceNode { id, next: None });
        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        self.len += 1;
    }

    /// Returns the most frequent adjacent pair and its frequency.
    ///
    /// Ties go to the pair seen first.
    fn most_frequent_pair(&self) -> Option<(Pair, usize)> {
        let mut order: Vec<(Pair, usize)> = Vec::new();
        let mut index: HashMap<Pair, usize> = HashMap::default();

        let mut current = self.head;
        while let Some(key) = current {
            let next = self.nodes[key].next;
            if let Some(next_key) = next {
                let pair = (self.nodes[key].id, self.nodes[next_key].id);
                let slot = *index.entry(pair).or_insert_with(|| {
                    order.push((pair, 0));
                    order.len() - 1
                });
                order[slot].1 += 1;
            }
            current = next;
        }

        let mut best: Option<(Pair, usize)> = None;
        for (pair, frequency) in order {
            if best.map_or(true, |(_, top)| frequency > top) {
                best = Some((pair, frequency));
            }
        }
        best
    }

    /// Replaces every non-overlapping occurrence of `pair`, left to right.
    fn replace_pair(&mut self, (first, second): Pair, with: NonTerminal) {
        let mut current = self.head;
        while let Some(key) = current {
            let next = self.nodes[key].next;
            match next {
                Some(next_key)
                    if self.nodes[key].id == first && self.nodes[next_key].id == second =>
                {
                    let after = self.nodes[next_key].next;
                    self.nodes[key].id = with;
                    self.nodes[key].next = after;
                    if after.is_none() {
                        self.tail = Some(key);
                    }
                    self.nodes.remove(next_key);
                    self.len -= 1;
                    current = after;
                }
                _ => current = next,
            }
        }
    }

    fn to_vec(&self) -> Vec<NonTerminal> {
        let mut ids = Vec::with_capacity(self.len);
        let mut current = self.head;
        while let Some(key) = current {
            ids.push(self.nodes[key].id);
            current = self.nodes[key].next;
        }
        ids
    }
}

/// Compresses `values` into a binary SLP with RePair.
///
/// When no pair repeats any more, the remaining sequence is joined by a
/// balanced tree of fresh rules. An empty input yields a grammar without a
/// start symbol.
pub fn compress_repair<T, I>(values: I) -> Result<Slp<T>>
where
    T: Hash + Eq + Clone,
    I: IntoIterator<Item = T>,
{
    let mut slp = Slp::new();
    let mut sequence = Sequence::default();
    for value in values {
        sequence.push(slp.get_or_create_preterminal(value));
    }

    let input_length = sequence.len;
    while sequence.len >= 2 {
        match sequence.most_frequent_pair() {
            Some(((first, second), frequency)) if frequency >= 2 => {
                let rule = slp.new_binary(first, second)?;
                sequence.replace_pair((first, second), rule);
            }
            _ => break,
        }
    }

    let remaining = sequence.to_vec();
    if !remaining.is_empty() {
        let start = slp.balanced_tree(&remaining)?;
        slp.set_start(start)?;
    }

    log::debug!(
        "repair compressed {} symbols into {} nonterminals",
        input_length,
        slp.size()
    );
    Ok(slp)
}

impl<T> Slp<T> {
    /// Builds a balanced binary tree of new rules whose yield is `ids`.
    ///
    /// A single id is returned as is. The root is allocated after both
    /// halves, so the result stays topologically numbered.
    pub fn balanced_tree(&mut self, ids: &[NonTerminal]) -> Result<NonTerminal> {
        match ids {
            [] => Err(SlpError::EmptyGrammar),
            [single] => Ok(*single),
            _ => {
                let (left, right) = ids.split_at(ids.len() / 2);
                let left = self.balanced_tree(left)?;
                let right = self.balanced_tree(right)?;
                self.new_binary(left, right)
            }
        }
    }
}
