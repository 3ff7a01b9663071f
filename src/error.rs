use crate::rule::NonTerminal;
use thiserror::Error;

/// Errors reported by the grammar store and the balancing routines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlpError {
    /// A rule does not reproduce the length already recorded for its id.
    #[error(
        "Rule for `{id}` generates {found} symbols but its recorded length is {expected}."
    )]
    ConstructionInconsistency {
        id: NonTerminal,
        expected: u64,
        found: u64,
    },

    /// A position outside `[0, length)` was requested.
    #[error("Index {index} is out of range for an expansion of length {length}.")]
    IndexOutOfRange { index: u64, length: u64 },

    /// Balancing or tree building was asked to work on nothing.
    #[error("The grammar is empty or has no start symbol.")]
    EmptyGrammar,

    /// Ids are not topologically numbered or a node is unreachable from the start.
    #[error("Topology violation at `{id}`: {detail}.")]
    TopologyViolation {
        id: NonTerminal,
        detail: &'static str,
    },

    /// A run rule was found where only terminal and binary rules are supported.
    #[error("Run rule on `{id}` is not supported here; only terminal and binary rules are.")]
    UnsupportedRuleKind { id: NonTerminal },

    /// An id was used before a rule was installed on it, or was never allocated.
    #[error("Nonterminal `{id}` has no rule.")]
    UndefinedNonTerminal { id: NonTerminal },

    /// Run rules must repeat their base at least once.
    #[error("Run rule on `{id}` has a repeat count of zero.")]
    InvalidRunCount { id: NonTerminal },

    /// The expansion length does not fit in a `u64`.
    #[error("Length of `{id}` overflows a 64-bit counter.")]
    LengthOverflow { id: NonTerminal },

    /// A path handed to the balancer has inconsistent side lists.
    #[error("Malformed path at position {position}: exactly one light sibling is required.")]
    MalformedPath { position: usize },
}

pub type Result<T, E = SlpError> = std::result::Result<T, E>;
