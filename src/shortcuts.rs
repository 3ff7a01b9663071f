//! Suffix shortcuts over a sparse sibling sequence.
//!
//! Given siblings `s[0..m]` hanging off a path (some positions empty),
//! [`make_shortcuts`] creates nonterminals `U[i]` with
//! `Exp(U[i]) = Exp(s[i]) · Exp(s[i+1]) · … ` over the present entries, using
//! a weight-balanced split so each entry is reached in a logarithmic number
//! of hops.

use crate::error::Result;
use crate::rule::NonTerminal;
use crate::slp::{bit_length, Slp};

/// Order in which two partial concatenations are joined.
///
/// Siblings to the left of a path appear in text order from the root down;
/// siblings to the right appear in reverse text order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concat {
    /// `join(head, tail) = head · tail`
    Forward,

    /// `join(head, tail) = tail · head`
    Reversed,
}

impl Concat {
    fn join<T>(
        self,
        slp: &mut Slp<T>,
        head: NonTerminal,
        tail: NonTerminal,
    ) -> Result<NonTerminal> {
        match self {
            Concat::Forward => slp.new_binary(head, tail),
            Concat::Reversed => slp.new_binary(tail, head),
        }
    }
}

fn weight<T>(slp: &Slp<T>, slot: Option<NonTerminal>) -> Result<u64> {
    slot.map_or(Ok(0), |id| slp.length_of(id))
}

/// Builds suffix shortcuts for `s`.
///
/// Returns a sequence of the same length: every present `s[i]` is replaced by
/// a nonterminal generating the concatenation (in `order`) of all present
/// entries from `i` to the end; holes stay holes. With at most one present
/// entry the input is returned unchanged.
pub fn make_shortcuts<T>(
    slp: &mut Slp<T>,
    s: &[Option<NonTerminal>],
    order: Concat,
) -> Result<Vec<Option<NonTerminal>>> {
    if s.iter().flatten().count() <= 1 {
        return Ok(s.to_vec());
    }

    let mut total = 0;
    for &slot in s {
        total += weight(slp, slot)?;
    }

    // Smallest suffix whose weight reaches the magnitude of the total.
    let mut split = s.len() - 1;
    let mut suffix_weight = weight(slp, s[split])?;
    while bit_length(suffix_weight) < bit_length(total) {
        split -= 1;
        suffix_weight += weight(slp, s[split])?;
    }

    let Some(pivot) = s[split] else {
        unreachable!("the split always lands on a present entry");
    };
    let (head, rest) = s.split_at(split);
    let tail = &rest[1..];

    // Pair up consecutive present entries of the head so the recursion on it
    // shrinks geometrically.
    let mut merged = head.to_vec();
    let mut open: Option<usize> = None;
    for i in 0..merged.len() {
        let Some(current) = merged[i] else {
            continue;
        };
        match open.take() {
            None => open = Some(i),
            Some(first) => {
                if let Some(survivor) = merged[first] {
                    merged[first] = Some(order.join(slp, survivor, current)?);
                }
                merged[i] = None;
            }
        }
    }

    let mut shortcuts = make_shortcuts(slp, &merged, order)?;
    let tail_shortcuts = make_shortcuts(slp, tail, order)?;

    let pivot_suffix = match tail_shortcuts.iter().flatten().next() {
        Some(&rest) => order.join(slp, pivot, rest)?,
        None => pivot,
    };

    let mut last = None;
    for i in (0..head.len()).rev() {
        let Some(original) = head[i] else {
            continue;
        };

        if merged[i].is_some() {
            let Some(partial) = shortcuts[i] else {
                unreachable!("every merged entry has a shortcut");
            };
            let full = order.join(slp, partial, pivot_suffix)?;
            shortcuts[i] = Some(full);
            last = Some(full);
        } else {
            let rest = last.unwrap_or(pivot_suffix);
            shortcuts[i] = Some(order.join(slp, original, rest)?);
        }
    }

    shortcuts.push(Some(pivot_suffix));
    shortcuts.extend(tail_shortcuts);
    Ok(shortcuts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(slp: &Slp<char>, id: NonTerminal) -> String {
        slp.iter_from(id).collect()
    }

    fn letters(slp: &mut Slp<char>, word: &str) -> Vec<Option<NonTerminal>> {
        word.chars()
            .map(|c| match c {
                '_' => None,
                c => Some(slp.get_or_create_preterminal(c)),
            })
            .collect()
    }

    fn expected_suffixes(word: &str, order: Concat) -> Vec<Option<String>> {
        let chars: Vec<char> = word.chars().collect();
        (0..chars.len())
            .map(|i| {
                if chars[i] == '_' {
                    return None;
                }
                let suffix: String = chars[i..].iter().filter(|&&c| c != '_').collect();
                Some(match order {
                    Concat::Forward => suffix,
                    Concat::Reversed => suffix.chars().rev().collect(),
                })
            })
            .collect()
    }

    fn check(word: &str, order: Concat) -> usize {
        let mut slp = Slp::new();
        let s = letters(&mut slp, word);
        let before = slp.size();

        let shortcuts = make_shortcuts(&mut slp, &s, order).unwrap();
        assert_eq!(shortcuts.len(), s.len());

        let decoded: Vec<Option<String>> = shortcuts
            .iter()
            .map(|slot| slot.map(|id| expand(&slp, id)))
            .collect();
        assert_eq!(decoded, expected_suffixes(word, order), "input {word:?}");
        slp.size() - before
    }

    #[test]
    fn test_trivial_inputs_unchanged() {
        let mut slp = Slp::new();
        let s = letters(&mut slp, "__a__");
        let before = slp.size();
        assert_eq!(make_shortcuts(&mut slp, &s, Concat::Forward).unwrap(), s);
        assert!(make_shortcuts(&mut slp, &[], Concat::Forward)
            .unwrap()
            .is_empty());
        assert_eq!(slp.size(), before);
    }

    #[test]
    fn test_two_entries() {
        assert_eq!(check("ab", Concat::Forward), 1);
        assert_eq!(check("ab", Concat::Reversed), 1);
    }

    #[test]
    fn test_dense_forward() {
        check("abcdefgh", Concat::Forward);
        check("abcdefghijklmnopq", Concat::Forward);
    }

    #[test]
    fn test_dense_reversed() {
        check("abcdefgh", Concat::Reversed);
        check("abcdefghijklmnopq", Concat::Reversed);
    }

    #[test]
    fn test_sparse() {
        check("a__b_c___d_e", Concat::Forward);
        check("_a_b__cd____e_", Concat::Reversed);
        check("____ab", Concat::Forward);
        check("ab____", Concat::Reversed);
    }

    #[test]
    fn test_new_nonterminals_linear() {
        let word: String = std::iter::repeat("abcdefgh").take(64).collect();
        let created = check(&word, Concat::Forward);
        assert!(created <= 4 * word.len(), "created {created} nonterminals");
    }

    #[test]
    fn test_heavy_last_entry() {
        let mut slp = Slp::new();
        let a = slp.get_or_create_preterminal('a');
        let b = slp.get_or_create_preterminal('b');
        let mut big = b;
        for _ in 0..5 {
            big = slp.new_binary(big, big).unwrap();
        }
        let s = vec![Some(a), None, Some(a), Some(big)];
        let shortcuts = make_shortcuts(&mut slp, &s, Concat::Forward).unwrap();

        let bees = "b".repeat(32);
        assert_eq!(expand(&slp, shortcuts[0].unwrap()), format!("aa{bees}"));
        assert_eq!(shortcuts[1], None);
        assert_eq!(expand(&slp, shortcuts[2].unwrap()), format!("a{bees}"));
        assert_eq!(shortcuts[3], Some(big));
    }
}
