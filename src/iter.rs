use crate::rule::{NonTerminal, Rule};
use crate::slp::Slp;

/// Work item on the expansion stack.
#[derive(Debug, Clone, Copy)]
enum Pending {
    /// Expand this nonterminal next.
    Node(NonTerminal),

    /// Expand `base` this many more times.
    Repeat(NonTerminal, u64),
}

/// Iterator that reconstructs the generated string by expanding rules.
///
/// Uses an explicit stack instead of recursion, so it is safe on grammars
/// whose derivation depth is linear in the string length.
pub struct SlpIter<'a, T> {
    slp: &'a Slp<T>,
    stack: Vec<Pending>,
}

impl<'a, T> SlpIter<'a, T> {
    pub(crate) fn new(slp: &'a Slp<T>, root: Option<NonTerminal>) -> Self {
        Self {
            slp,
            stack: root.map(Pending::Node).into_iter().collect(),
        }
    }
}

impl<'a, T> Iterator for SlpIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(pending) = self.stack.pop() {
            let node = match pending {
                Pending::Node(node) => node,
                Pending::Repeat(base, remaining) => {
                    if remaining > 1 {
                        self.stack.push(Pending::Repeat(base, remaining - 1));
                    }
                    base
                }
            };

            match self.slp.rule(node)? {
                Rule::Terminal(value) => return Some(value),
                Rule::Binary(left, right) => {
                    self.stack.push(Pending::Node(*right));
                    self.stack.push(Pending::Node(*left));
                }
                Rule::Run(base, count) => self.stack.push(Pending::Repeat(*base, *count)),
                Rule::Empty => return None,
            }
        }
        None
    }
}

impl<T> Slp<T> {
    /// Returns an iterator over the string generated by the start symbol.
    pub fn iter(&self) -> SlpIter<'_, T> {
        SlpIter::new(self, self.start())
    }

    /// Returns an iterator over `Exp(id)`.
    pub fn iter_from(&self, id: NonTerminal) -> SlpIter<'_, T> {
        SlpIter::new(self, Some(id))
    }
}

impl<'a, T> IntoIterator for &'a Slp<T> {
    type Item = &'a T;
    type IntoIter = SlpIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
