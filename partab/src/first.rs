//! FIRST sets: the terminals that can begin a derivation of each
//! nonterminal, plus an epsilon flag for the epsilon-derivable ones.
//!
//! Computed as a plain fixed point: sets only grow, so passes repeat until
//! one changes nothing. Grammars are routinely mutually recursive, which
//! is exactly what the repeated passes resolve; a hard cap turns a
//! non-converging computation into [`FixedPointDivergence`] instead of
//! silent partial sets.

use crate::error::FixedPointDivergence;
use crate::grammar::{is_terminal, Production};
use indexmap::{IndexMap, IndexSet};
use smartstring::alias::String;
use std::fmt;

/// Upper bound on fixed-point passes for FIRST and FOLLOW.
pub const FIXED_POINT_LIMIT: usize = 100;

/// The FIRST set of one nonterminal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstSet {
    /// Terminals that can begin a derivation.
    pub terminals: IndexSet<String>,
    /// `true` when the nonterminal derives the empty string.
    pub epsilon: bool,
}

/// FIRST sets for every nonterminal that appears as a left-hand side.
#[derive(Debug)]
pub struct First {
    sets: IndexMap<String, FirstSet>,
}

impl First {
    /// Runs the fixed point over an augmented production list.
    ///
    /// For `A -> X1 X2 ... Xn`, `FIRST(A)` gains `FIRST(X1)` minus
    /// epsilon; while the scanned symbol is epsilon-derivable the scan
    /// continues with the next one; a terminal contributes itself and
    /// stops the scan. If every symbol is epsilon-derivable, or the
    /// right-hand side is empty, `A` gains epsilon.
    pub fn build(prods: &[Production]) -> Result<First, FixedPointDivergence> {
        let mut first = First {
            sets: IndexMap::new(),
        };
        for p in prods {
            first.sets.entry(p.lhs.clone()).or_default();
        }

        for pass in 0.. {
            if pass == FIXED_POINT_LIMIT {
                return Err(FixedPointDivergence {
                    analysis: "FIRST",
                    limit: FIXED_POINT_LIMIT,
                });
            }
            let mut changed = false;
            for p in prods {
                let mut all_epsilon = true;
                for sym in &p.rhs {
                    if is_terminal(sym) {
                        changed |= first.add_terminal(&p.lhs, sym);
                        all_epsilon = false;
                        break;
                    }
                    changed |= first.add_from(&p.lhs, sym);
                    if !first.epsilon(sym) {
                        all_epsilon = false;
                        break;
                    }
                }
                if all_epsilon {
                    changed |= first.set_epsilon(&p.lhs);
                }
            }
            if !changed {
                break;
            }
        }
        Ok(first)
    }

    fn add_terminal(&mut self, name: &str, terminal: &str) -> bool {
        match self.sets.get_mut(name) {
            Some(set) => set.terminals.insert(terminal.into()),
            None => false,
        }
    }

    /// Unions `FIRST(from)` minus epsilon into `FIRST(name)`.
    fn add_from(&mut self, name: &str, from: &str) -> bool {
        // A snapshot sidesteps holding two entries of the same map.
        let Some(source) = self.sets.get(from).map(|s| s.terminals.clone()) else {
            return false;
        };
        let Some(target) = self.sets.get_mut(name) else {
            return false;
        };
        let before = target.terminals.len();
        target.terminals.extend(source);
        target.terminals.len() != before
    }

    fn set_epsilon(&mut self, name: &str) -> bool {
        match self.sets.get_mut(name) {
            Some(set) if !set.epsilon => {
                set.epsilon = true;
                true
            }
            _ => false,
        }
    }

    /// The terminals of `FIRST(name)`; empty for unknown names.
    pub fn terminals(&self, name: &str) -> impl Iterator<Item = &str> {
        self.sets
            .get(name)
            .into_iter()
            .flat_map(|s| s.terminals.iter().map(|t| t.as_str()))
    }

    /// `true` when `name` is a known epsilon-derivable nonterminal.
    pub fn epsilon(&self, name: &str) -> bool {
        self.sets.get(name).is_some_and(|s| s.epsilon)
    }

    /// The full set for one nonterminal.
    pub fn set(&self, name: &str) -> Option<&FirstSet> {
        self.sets.get(name)
    }

    /// All sets, keyed by nonterminal, in first-appearance order.
    pub fn sets(&self) -> &IndexMap<String, FirstSet> {
        &self.sets
    }
}

impl fmt::Display for First {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, set) in &self.sets {
            write!(f, "FIRST({}) {{ ", name)?;
            for t in &set.terminals {
                write!(f, "{} ", t)?;
            }
            writeln!(f, "}} epsilon={}", set.epsilon)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Grammar, ProductionSpec};

    fn build(specs: Vec<ProductionSpec<(), ()>>) -> First {
        let g = Grammar::build(specs, None).unwrap();
        First::build(g.productions()).unwrap()
    }

    #[test]
    fn leading_terminal_is_first() {
        let first = build(vec![
            ProductionSpec::new("A", ["b", "A"]),
            ProductionSpec::new("A", [""]),
        ]);
        let terms: Vec<&str> = first.terminals("A").collect();
        assert_eq!(terms, vec!["b"]);
        assert!(first.epsilon("A"));
    }

    #[test]
    fn first_propagates_through_unit_chains() {
        let first = build(vec![
            ProductionSpec::new("E", ["T"]),
            ProductionSpec::new("T", ["F"]),
            ProductionSpec::new("F", ["id"]),
        ]);
        assert_eq!(first.terminals("E").collect::<Vec<_>>(), vec!["id"]);
        assert_eq!(first.terminals("T").collect::<Vec<_>>(), vec!["id"]);
    }

    #[test]
    fn epsilon_propagates_up_a_nullable_chain() {
        let first = build(vec![
            ProductionSpec::new("A", ["B"]),
            ProductionSpec::new("B", ["C"]),
            ProductionSpec::new("C", [""]),
        ]);
        assert!(first.epsilon("A"));
        assert!(first.epsilon("B"));
        assert!(first.epsilon("C"));
    }

    #[test]
    fn terminal_after_nullable_prefix_contributes() {
        let first = build(vec![
            ProductionSpec::new("S", ["A", "b"]),
            ProductionSpec::new("A", [""]),
            ProductionSpec::new("A", ["a"]),
        ]);
        let terms: std::collections::BTreeSet<&str> = first.terminals("S").collect();
        assert_eq!(terms, ["a", "b"].into());
        assert!(!first.epsilon("S"));
    }

    #[test]
    fn mutual_recursion_converges() {
        let first = build(vec![
            ProductionSpec::new("A", ["B", "x"]),
            ProductionSpec::new("B", ["A", "y"]),
            ProductionSpec::new("A", ["a"]),
        ]);
        let a: std::collections::BTreeSet<&str> = first.terminals("A").collect();
        assert_eq!(a, ["a"].into());
        let b: std::collections::BTreeSet<&str> = first.terminals("B").collect();
        assert_eq!(b, ["a"].into());
    }

    #[test]
    fn sets_are_stable_at_convergence() {
        let g = Grammar::build(
            vec![
                ProductionSpec::<(), ()>::new("A", ["b", "A"]),
                ProductionSpec::new("A", [""]),
            ],
            None,
        )
        .unwrap();
        let a = First::build(g.productions()).unwrap();
        let b = First::build(g.productions()).unwrap();
        assert_eq!(a.sets(), b.sets());
    }
}
