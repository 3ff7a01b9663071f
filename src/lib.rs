//! # SLP - Straight-Line Program Balancing
//!
//! A straight-line program is a grammar in which every nonterminal has exactly
//! one rule and the rules form a DAG, so the start symbol generates exactly one
//! string. It is a compressed representation of that string that still
//! supports random access.
//!
//! Compressors such as RePair can produce grammars whose derivation depth is
//! linear in the string length, which makes random access slow. This crate
//! rewrites such grammars in place so their depth becomes `O(log n)` while the
//! generated string stays the same:
//!
//! 1. **Heavy-path decomposition**: split the grammar into disjoint chains
//!    following edges where both the number of root paths and the expansion
//!    length keep their magnitude.
//! 2. **Suffix shortcuts**: for the light siblings along each chain, create a
//!    logarithmic-depth set of rules giving every position one-hop access to
//!    the concatenation of the remaining siblings.
//! 3. **Path rewriting**: point every chain node directly at the chain's tail.
//!
//! ## Example
//!
//! ```
//! use slp_rs::compress_repair;
//!
//! let input = "aabbaabbaabb";
//! let mut slp = compress_repair(input.chars()).unwrap();
//! slp.balance().unwrap();
//!
//! assert_eq!(slp.length().unwrap(), 12);
//! let reconstructed: String = slp.iter().collect();
//! assert_eq!(reconstructed, input);
//! ```
//!
//! ## Preconditions
//!
//! Balancing requires ids numbered so every operand is below its parent, the
//! start symbol allocated last, every nonterminal reachable from the start,
//! and no run rules. [`compress_repair`] always produces such grammars.

mod balance;
mod error;
mod heavy_path;
mod iter;
mod repair;
mod rule;
mod shortcuts;
mod slp;


pub use balance::{balance_path, longest_path, BalanceStrategy};
pub use error::{Result, SlpError};
pub use heavy_path::{count_paths_from_root, descend_heavy_path, heavy_paths, HeavyPath};
pub use iter::SlpIter;
pub use repair::compress_repair;
pub use rule::{NonTerminal, Rule};
pub use shortcuts::{make_shortcuts, Concat};
pub use slp::{Slp, SlpStats};
