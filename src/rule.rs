use std::fmt;
use std::num::NonZeroU32;

/// Identifier of a nonterminal in an [`Slp`](crate::Slp).
///
/// Ids start at 1; id 0 is the reserved "empty" sentinel and cannot be
/// constructed, so `Option<NonTerminal>` is the natural "maybe a sibling" slot
/// and costs no more than a bare `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonTerminal(NonZeroU32);

impl NonTerminal {
    /// Creates an id from its raw value. Returns `None` for the sentinel 0.
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// The raw id value (always >= 1).
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Dense arena index of this id.
    #[inline]
    pub(crate) fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }

    /// Inverse of [`index`](Self::index).
    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        let raw = u32::try_from(index + 1).expect("nonterminal id space exhausted");
        Self(NonZeroU32::new(raw).expect("index + 1 is never zero"))
    }
}

impl fmt::Display for NonTerminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// The single production of a nonterminal.
///
/// Replaces the sign-encoded `(a, b)` pair convention with a tagged union so
/// the terminal/binary/run distinction is checked by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule<T> {
    /// Allocated but not yet defined.
    Empty,

    /// Generates exactly one symbol.
    Terminal(T),

    /// Generates `Exp(left) · Exp(right)`.
    Binary(NonTerminal, NonTerminal),

    /// Generates `Exp(base)` repeated `count` times.
    Run(NonTerminal, u64),
}

impl<T> Rule<T> {
    /// Returns true for [`Rule::Terminal`].
    pub fn is_terminal(&self) -> bool {
        matches!(self, Rule::Terminal(_))
    }

    /// Returns the operands of a binary rule.
    pub fn as_binary(&self) -> Option<(NonTerminal, NonTerminal)> {
        match *self {
            Rule::Binary(left, right) => Some((left, right)),
            _ => None,
        }
    }
}
