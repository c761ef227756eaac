//! FOLLOW sets: the terminals that can appear immediately after each
//! nonterminal in some derivation.
//!
//! Seeded with `$` for the augmented start symbol, then iterated to a
//! fixed point under the same pass cap as FIRST. Placement is pairwise:
//! for adjacent right-hand side symbols `(B, next)`, `FOLLOW(B)` gains
//! `next` itself when it is a terminal and `FIRST(next)` minus epsilon
//! when it is a nonterminal; when everything after `B` is
//! epsilon-derivable (including when `B` is last), `FOLLOW(B)` gains
//! `FOLLOW(lhs)`. Only nonterminals carry FOLLOW sets.

use crate::error::FixedPointDivergence;
use crate::first::{First, FIXED_POINT_LIMIT};
use crate::grammar::{is_nonterminal, is_terminal, Production, END_MARKER};
use indexmap::{IndexMap, IndexSet};
use smartstring::alias::String;
use std::fmt;

/// FOLLOW sets for every nonterminal that appears as a left-hand side.
#[derive(Debug)]
pub struct Follow {
    sets: IndexMap<String, IndexSet<String>>,
}

impl Follow {
    /// Runs the fixed point over an augmented production list. `start` is
    /// the augmented start nonterminal, which is seeded with `$`.
    pub fn build(
        prods: &[Production],
        start: &str,
        first: &First,
    ) -> Result<Follow, FixedPointDivergence> {
        let mut follow = Follow {
            sets: IndexMap::new(),
        };
        for p in prods {
            follow.sets.entry(p.lhs.clone()).or_default();
        }
        follow.add(start, END_MARKER);

        for pass in 0.. {
            if pass == FIXED_POINT_LIMIT {
                return Err(FixedPointDivergence {
                    analysis: "FOLLOW",
                    limit: FIXED_POINT_LIMIT,
                });
            }
            let mut changed = false;
            for p in prods {
                for (i, sym) in p.rhs.iter().enumerate() {
                    if is_terminal(sym) {
                        continue;
                    }
                    if let Some(next) = p.rhs.get(i + 1) {
                        if is_terminal(next) {
                            changed |= follow.add(sym, next);
                        } else {
                            let firsts: Vec<String> =
                                first.terminals(next).map(Into::into).collect();
                            changed |= follow.add_all(sym, firsts);
                        }
                    }
                    let suffix_epsilon = p.rhs[i + 1..]
                        .iter()
                        .all(|s| is_nonterminal(s) && first.epsilon(s));
                    if suffix_epsilon {
                        let inherited: Vec<String> = follow
                            .sets
                            .get(p.lhs.as_str())
                            .map(|s| s.iter().cloned().collect())
                            .unwrap_or_default();
                        changed |= follow.add_all(sym, inherited);
                    }
                }
            }
            if !changed {
                break;
            }
        }
        Ok(follow)
    }

    fn add(&mut self, name: &str, terminal: &str) -> bool {
        match self.sets.get_mut(name) {
            Some(set) => set.insert(terminal.into()),
            None => false,
        }
    }

    fn add_all(&mut self, name: &str, terminals: Vec<String>) -> bool {
        let Some(set) = self.sets.get_mut(name) else {
            return false;
        };
        let before = set.len();
        set.extend(terminals);
        set.len() != before
    }

    /// The FOLLOW set of `name`, in insertion order; empty for unknown
    /// names.
    pub fn terminals(&self, name: &str) -> impl Iterator<Item = &str> {
        self.sets
            .get(name)
            .into_iter()
            .flat_map(|s| s.iter().map(|t| t.as_str()))
    }

    /// `true` when `terminal` is in `FOLLOW(name)`.
    pub fn contains(&self, name: &str, terminal: &str) -> bool {
        self.sets.get(name).is_some_and(|s| s.contains(terminal))
    }

    /// All sets, keyed by nonterminal, in first-appearance order.
    pub fn sets(&self) -> &IndexMap<String, IndexSet<String>> {
        &self.sets
    }
}

impl fmt::Display for Follow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, set) in &self.sets {
            write!(f, "FOLLOW({}) {{ ", name)?;
            for t in set {
                write!(f, "{} ", t)?;
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Grammar, ProductionSpec};
    use std::collections::BTreeSet;

    fn build(specs: Vec<ProductionSpec<(), ()>>) -> Follow {
        let g = Grammar::build(specs, None).unwrap();
        let first = First::build(g.productions()).unwrap();
        Follow::build(g.productions(), g.start(), &first).unwrap()
    }

    fn set(follow: &Follow, name: &str) -> BTreeSet<std::string::String> {
        follow.terminals(name).map(str::to_owned).collect()
    }

    #[test]
    fn start_symbol_is_followed_by_end_marker() {
        let follow = build(vec![ProductionSpec::new("A", ["b"])]);
        assert!(follow.contains("S'", "$"));
    }

    #[test]
    fn expression_grammar_follow_sets() {
        let follow = build(vec![
            ProductionSpec::new("E", ["E", "+", "T"]),
            ProductionSpec::new("E", ["T"]),
            ProductionSpec::new("T", ["T", "*", "F"]),
            ProductionSpec::new("T", ["F"]),
            ProductionSpec::new("F", ["id"]),
        ]);
        assert_eq!(set(&follow, "E"), ["$", "+"].map(str::to_owned).into());
        assert_eq!(
            set(&follow, "T"),
            ["$", "+", "*"].map(str::to_owned).into()
        );
        assert_eq!(
            set(&follow, "F"),
            ["$", "+", "*"].map(str::to_owned).into()
        );
    }

    #[test]
    fn nonterminal_neighbor_contributes_its_first_set() {
        let follow = build(vec![
            ProductionSpec::new("S", ["A", "B"]),
            ProductionSpec::new("A", ["a"]),
            ProductionSpec::new("B", ["b"]),
        ]);
        assert_eq!(set(&follow, "A"), ["b"].map(str::to_owned).into());
    }

    #[test]
    fn last_nonterminal_inherits_follow_of_lhs() {
        let follow = build(vec![
            ProductionSpec::new("S", ["a", "A"]),
            ProductionSpec::new("A", ["b"]),
        ]);
        assert_eq!(set(&follow, "A"), ["$"].map(str::to_owned).into());
    }

    #[test]
    fn nullable_suffix_inherits_follow_of_lhs() {
        let follow = build(vec![
            ProductionSpec::new("S", ["A", "B"], ),
            ProductionSpec::new("A", ["a"]),
            ProductionSpec::new("B", [""]),
        ]);
        // B can vanish, so whatever follows S follows A too.
        assert!(follow.contains("A", "$"));
    }

    #[test]
    fn adjacent_first_only_not_chained_through_nullables() {
        let follow = build(vec![
            ProductionSpec::new("S", ["B", "C", "d"]),
            ProductionSpec::new("B", ["b"]),
            ProductionSpec::new("C", ["c"]),
            ProductionSpec::new("C", [""]),
        ]);
        // Placement is pairwise: FOLLOW(B) sees FIRST(C) but does not
        // chain past the nullable C to the trailing `d`.
        assert_eq!(set(&follow, "B"), ["c"].map(str::to_owned).into());
    }

    #[test]
    fn epsilon_production_nonterminal_inherits_caller_follow() {
        let follow = build(vec![
            ProductionSpec::new("A", ["b", "A"]),
            ProductionSpec::new("A", [""]),
        ]);
        assert_eq!(set(&follow, "A"), ["$"].map(str::to_owned).into());
    }
}
