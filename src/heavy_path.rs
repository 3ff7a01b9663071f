//! Heavy-path decomposition of a binary SLP.
//!
//! Every nonterminal gets a signature `(bitlength(paths from the root),
//! bitlength(expansion length))`. An edge to a child is heavy when the child
//! carries its parent's signature; at most one child can. Following heavy
//! edges partitions the grammar into disjoint maximal paths.

use crate::error::{Result, SlpError};
use crate::rule::{NonTerminal, Rule};
use crate::slp::{bit_length, Slp};

/// A root-to-leaf chain of nonterminals together with their light siblings.
///
/// For every `i < nodes.len() - 1`, `nodes[i]` is a binary rule whose heavy
/// operand is `nodes[i + 1]`; the other operand is stored in `left[i]` when it
/// sits to the left of the path and in `right[i]` otherwise. Exactly one of
/// the two slots is filled at each position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeavyPath {
    /// Path nodes, root first.
    pub nodes: Vec<NonTerminal>,

    /// Light siblings to the left of the path, one slot per step.
    pub left: Vec<Option<NonTerminal>>,

    /// Light siblings to the right of the path, one slot per step.
    pub right: Vec<Option<NonTerminal>>,
}

impl HeavyPath {
    pub(crate) fn singleton(node: NonTerminal) -> Self {
        Self {
            nodes: vec![node],
            left: Vec::new(),
            right: Vec::new(),
        }
    }

    /// Extends the path downwards through the left operand of its tail.
    pub(crate) fn push_left(&mut self, child: NonTerminal, sibling: NonTerminal) {
        self.nodes.push(child);
        self.left.push(None);
        self.right.push(Some(sibling));
    }

    /// Extends the path downwards through the right operand of its tail.
    pub(crate) fn push_right(&mut self, sibling: NonTerminal, child: NonTerminal) {
        self.nodes.push(child);
        self.left.push(Some(sibling));
        self.right.push(None);
    }

    /// Number of nodes on the path.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True only for a path with no nodes, which decomposition never returns.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node farthest from the root.
    pub fn tail(&self) -> Option<NonTerminal> {
        self.nodes.last().copied()
    }
}

/// Checks that the grammar can be decomposed and returns its start symbol.
///
/// Requires a start symbol equal to the highest id, only terminal and binary
/// rules, and operands with strictly smaller ids than their parent.
fn check_topology<T>(slp: &Slp<T>) -> Result<NonTerminal> {
    let start = slp.start().ok_or(SlpError::EmptyGrammar)?;
    if Some(start) != slp.highest() {
        return Err(SlpError::TopologyViolation {
            id: start,
            detail: "start symbol is not the highest id",
        });
    }

    for (id, rule) in slp.rules() {
        match *rule {
            Rule::Terminal(_) => {}
            Rule::Binary(left, right) => {
                if left >= id || right >= id {
                    return Err(SlpError::TopologyViolation {
                        id,
                        detail: "operand id is not below its parent",
                    });
                }
            }
            Rule::Run(..) => return Err(SlpError::UnsupportedRuleKind { id }),
            Rule::Empty => return Err(SlpError::UndefinedNonTerminal { id }),
        }
    }

    Ok(start)
}

/// Counts root-to-node derivation paths, with multiplicity, for every id.
///
/// The result is indexed by `id.get() - 1`. A node's count is the number of
/// times it occurs in the derivation tree, which never exceeds the generated
/// length, so `u64` cannot overflow.
pub fn count_paths_from_root<T>(slp: &Slp<T>) -> Result<Vec<u64>> {
    let start = check_topology(slp)?;

    let mut counts = vec![0u64; slp.size()];
    counts[start.index()] = 1;

    for index in (0..slp.size()).rev() {
        if let Some(Rule::Binary(left, right)) = slp.rule(NonTerminal::from_index(index)) {
            let count = counts[index];
            counts[left.index()] += count;
            counts[right.index()] += count;
        }
    }

    if let Some(index) = counts.iter().position(|&count| count == 0) {
        return Err(SlpError::TopologyViolation {
            id: NonTerminal::from_index(index),
            detail: "not reachable from the start symbol",
        });
    }

    Ok(counts)
}

fn signature<T>(slp: &Slp<T>, counts: &[u64], id: NonTerminal) -> Result<(u32, u32)> {
    Ok((
        bit_length(counts[id.index()]),
        bit_length(slp.length_of(id)?),
    ))
}

/// Follows heavy edges downwards from `start` and returns the path it traces.
///
/// `counts` must come from [`count_paths_from_root`] on the same grammar.
pub fn descend_heavy_path<T>(
    slp: &Slp<T>,
    counts: &[u64],
    start: NonTerminal,
) -> Result<HeavyPath> {
    let mut path = HeavyPath::singleton(start);
    let mut node = start;

    while let Rule::Binary(left, right) = *slp.rule_checked(node)? {
        let parent = signature(slp, counts, node)?;
        let left_heavy = signature(slp, counts, left)? == parent;
        let right_heavy = signature(slp, counts, right)? == parent;
        debug_assert!(
            !(left_heavy && right_heavy),
            "both operands of {node} are heavy"
        );

        if left_heavy {
            path.push_left(left, right);
            node = left;
        } else if right_heavy {
            path.push_right(left, right);
            node = right;
        } else {
            break;
        }
    }

    Ok(path)
}

/// Partitions all nonterminals into disjoint maximal heavy paths.
///
/// Paths are returned in the order their topmost node is met when walking ids
/// from highest to lowest, each listed root first.
pub fn heavy_paths<T>(slp: &Slp<T>) -> Result<Vec<HeavyPath>> {
    let counts = count_paths_from_root(slp)?;
    let mut visited = vec![false; slp.size()];
    let mut paths = Vec::new();

    for index in (0..slp.size()).rev() {
        if visited[index] {
            continue;
        }

        let path = descend_heavy_path(slp, &counts, NonTerminal::from_index(index))?;
        for node in &path.nodes {
            debug_assert!(!visited[node.index()], "heavy paths overlap at {node}");
            visited[node.index()] = true;
        }
        paths.push(path);
    }

    log::debug!(
        "decomposed {} nonterminals into {} heavy paths",
        slp.size(),
        paths.len()
    );
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `((a b) c) d` built bottom-up, ids 1..=7.
    fn left_comb() -> Slp<char> {
        let mut slp = Slp::new();
        let a = slp.get_or_create_preterminal('a');
        let b = slp.get_or_create_preterminal('b');
        let c = slp.get_or_create_preterminal('c');
        let d = slp.get_or_create_preterminal('d');
        let ab = slp.new_binary(a, b).unwrap();
        let abc = slp.new_binary(ab, c).unwrap();
        let abcd = slp.new_binary(abc, d).unwrap();
        slp.set_start(abcd).unwrap();
        slp
    }

    fn id(raw: u32) -> NonTerminal {
        NonTerminal::new(raw).unwrap()
    }

    #[test]
    fn test_count_paths_tree() {
        let slp = left_comb();
        let counts = count_paths_from_root(&slp).unwrap();
        assert_eq!(counts, vec![1, 1, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn test_count_paths_shared() {
        let mut slp = Slp::new();
        let a = slp.get_or_create_preterminal('a');
        let aa = slp.new_binary(a, a).unwrap();
        let aaaa = slp.new_binary(aa, aa).unwrap();
        let top = slp.new_binary(aaaa, aa).unwrap();
        slp.set_start(top).unwrap();

        let counts = count_paths_from_root(&slp).unwrap();
        // top: 1, aaaa: 1, aa: 2 + 1, a: 2 * 3
        assert_eq!(counts, vec![6, 3, 1, 1]);
    }

    #[test]
    fn test_start_must_be_highest() {
        let mut slp = left_comb();
        slp.set_start(id(6)).unwrap();
        assert_eq!(
            count_paths_from_root(&slp),
            Err(SlpError::TopologyViolation {
                id: id(6),
                detail: "start symbol is not the highest id",
            })
        );
    }

    #[test]
    fn test_operand_above_parent_rejected() {
        let mut slp = Slp::new();
        let a = slp.get_or_create_preterminal('a');
        let parent = slp.allocate();
        let b = slp.get_or_create_preterminal('b');
        slp.set_binary(parent, a, b).unwrap();
        let top = slp.new_binary(parent, a).unwrap();
        slp.set_start(top).unwrap();

        assert_eq!(
            heavy_paths(&slp),
            Err(SlpError::TopologyViolation {
                id: parent,
                detail: "operand id is not below its parent",
            })
        );
    }

    #[test]
    fn test_run_rule_rejected() {
        let mut slp = Slp::new();
        let a = slp.get_or_create_preterminal('a');
        let run = slp.new_run(a, 3).unwrap();
        slp.set_start(run).unwrap();
        assert_eq!(
            count_paths_from_root(&slp),
            Err(SlpError::UnsupportedRuleKind { id: run })
        );
    }

    #[test]
    fn test_unreachable_rejected() {
        let mut slp = Slp::new();
        let a = slp.get_or_create_preterminal('a');
        let b = slp.get_or_create_preterminal('b');
        let top = slp.new_binary(a, a).unwrap();
        slp.set_start(top).unwrap();
        assert_eq!(
            count_paths_from_root(&slp),
            Err(SlpError::TopologyViolation {
                id: b,
                detail: "not reachable from the start symbol",
            })
        );
    }

    #[test]
    fn test_empty_start_rejected() {
        let mut slp = Slp::<char>::new();
        slp.get_or_create_preterminal('a');
        assert_eq!(count_paths_from_root(&slp), Err(SlpError::EmptyGrammar));
    }

    #[test]
    fn test_descend_left_comb() {
        let slp = left_comb();
        let counts = count_paths_from_root(&slp).unwrap();
        // abcd has length 4 (bitlength 3), abc has length 3 (bitlength 2):
        // the top edge is light, the next one is heavy.
        let top = descend_heavy_path(&slp, &counts, id(7)).unwrap();
        assert_eq!(top, HeavyPath::singleton(id(7)));

        let path = descend_heavy_path(&slp, &counts, id(6)).unwrap();
        assert_eq!(path.nodes, vec![id(6), id(5)]);
        assert_eq!(path.left, vec![None]);
        assert_eq!(path.right, vec![Some(id(3))]);
    }

    #[test]
    fn test_descend_right_heavy() {
        let mut slp = Slp::new();
        let a = slp.get_or_create_preterminal('a');
        let b = slp.get_or_create_preterminal('b');
        let bb = slp.new_binary(b, b).unwrap();
        let bbbb = slp.new_binary(bb, bb).unwrap();
        let six = slp.new_binary(bbbb, bb).unwrap();
        let seven = slp.new_binary(a, six).unwrap();
        slp.set_start(seven).unwrap();

        let counts = count_paths_from_root(&slp).unwrap();
        let path = descend_heavy_path(&slp, &counts, seven).unwrap();
        assert_eq!(path.nodes, vec![seven, six, bbbb]);
        assert_eq!(path.left, vec![Some(a), None]);
        assert_eq!(path.right, vec![None, Some(bb)]);
        assert_eq!(path.tail(), Some(bbbb));
    }

    #[test]
    fn test_heavy_paths_partition() {
        let slp = left_comb();
        let paths = heavy_paths(&slp).unwrap();

        let mut seen: Vec<NonTerminal> = paths.iter().flat_map(|p| p.nodes.clone()).collect();
        seen.sort();
        let all: Vec<NonTerminal> = (1..=7).map(id).collect();
        assert_eq!(seen, all);

        for path in &paths {
            assert_eq!(path.left.len(), path.len() - 1);
            assert_eq!(path.right.len(), path.len() - 1);
            for (l, r) in path.left.iter().zip(&path.right) {
                assert!(l.is_some() != r.is_some());
            }
        }
        assert_eq!(paths[0].nodes, vec![id(7)]);
    }

    #[test]
    fn test_empty_grammar_has_no_paths() {
        let slp = Slp::<char>::new();
        assert_eq!(count_paths_from_root(&slp), Err(SlpError::EmptyGrammar));
    }
}
