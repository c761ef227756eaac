//! Grammar data model: symbol classification, productions, augmentation.
//!
//! A grammar is an ordered list of productions. Symbols are classified by
//! convention: a name starting with an ASCII uppercase letter is a
//! nonterminal, anything else is a terminal, and `$` is always the terminal
//! end-of-input marker. Building a [`Grammar`] prepends the synthetic
//! augmented production `S' -> start` at id 0 and assigns dense sequential
//! ids, owned by the built value so independent grammars never share
//! counters.

use crate::error::GrammarBuildError;
use crate::parser::Token;
use smartstring::alias::String;
use std::fmt;

/// The terminal end-of-input marker.
pub const END_MARKER: &str = "$";

/// The epsilon marker accepted in production descriptors. An empty
/// right-hand side means the same thing; the marker never survives into a
/// built [`Production`].
pub const EPSILON: &str = "";

/// Left-hand side of the synthetic augmented production.
pub const AUGMENTED_START: &str = "S'";

/// Returns `true` if `symbol` classifies as a nonterminal.
#[inline]
pub fn is_nonterminal(symbol: &str) -> bool {
    symbol
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_uppercase())
}

/// Returns `true` if `symbol` classifies as a terminal. `$` is a terminal.
#[inline]
pub fn is_terminal(symbol: &str) -> bool {
    !is_nonterminal(symbol)
}

/// Error type reduction callbacks may fail with.
pub type SemanticError = Box<dyn std::error::Error + Send + Sync>;

/// A reduction callback: receives the production being reduced, the popped
/// stack entries in left-to-right order, and the caller's context, and
/// returns the semantic value for the new left-hand side entry.
///
/// Invoked exactly once per reduce action, in bottom-up left-to-right
/// order matching the reverse of a rightmost derivation.
pub type ReduceFn<V, C> =
    Box<dyn Fn(&Production, Vec<Token<V>>, &mut C) -> Result<V, SemanticError> + Send + Sync>;

/// A grammar input descriptor: left-hand side, right-hand side, and an
/// optional reduction callback. An empty right-hand side (or the sole
/// epsilon marker `""`) denotes an epsilon production.
pub struct ProductionSpec<V, C> {
    lhs: String,
    rhs: Vec<String>,
    reduce: Option<ReduceFn<V, C>>,
}

impl<V, C> ProductionSpec<V, C> {
    /// Creates a descriptor with no reduction callback.
    pub fn new<S, I>(lhs: S, rhs: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            lhs: lhs.into(),
            rhs: rhs.into_iter().map(Into::into).collect(),
            reduce: None,
        }
    }

    /// Attaches a reduction callback.
    pub fn reduce<F>(mut self, f: F) -> Self
    where
        F: Fn(&Production, Vec<Token<V>>, &mut C) -> Result<V, SemanticError>
            + Send
            + Sync
            + 'static,
    {
        self.reduce = Some(Box::new(f));
        self
    }
}

/// A single production after grammar construction: immutable, with a dense
/// id. Id 0 is the augmented production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    /// Dense id, assigned in input order; 0 is `S' -> start`.
    pub id: usize,
    /// Left-hand side nonterminal.
    pub lhs: String,
    /// Right-hand side symbols; empty for an epsilon production.
    pub rhs: Vec<String>,
}

impl Production {
    /// Returns `true` if the right-hand side is empty.
    #[inline]
    pub fn is_epsilon(&self) -> bool {
        self.rhs.is_empty()
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {} ->", self.id, self.lhs)?;
        for sym in &self.rhs {
            write!(f, " {}", sym)?;
        }
        Ok(())
    }
}

/// An augmented grammar: the caller's productions prefixed by
/// `S' -> start`, with a parallel table of reduction callbacks indexed by
/// production id.
///
/// Immutable once built; lookups by left-hand side name are the primitive
/// that closure construction uses.
pub struct Grammar<V, C> {
    start: String,
    productions: Vec<Production>,
    reducers: Vec<Option<ReduceFn<V, C>>>,
}

impl<V, C> std::fmt::Debug for Grammar<V, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar")
            .field("start", &self.start)
            .field("productions", &self.productions)
            .field("reducers", &self.reducers.len())
            .finish()
    }
}

impl<V, C> Grammar<V, C> {
    /// Builds a grammar from descriptors, validating each shape and
    /// assigning ids. `start` names the goal nonterminal; when `None`,
    /// the first descriptor's left-hand side is used.
    pub fn build(
        specs: Vec<ProductionSpec<V, C>>,
        start: Option<&str>,
    ) -> Result<Self, GrammarBuildError> {
        let goal: String = match start {
            Some(s) => s.into(),
            None => match specs.first() {
                Some(spec) => spec.lhs.clone(),
                None => return Err(GrammarBuildError::Empty),
            },
        };

        let mut productions = Vec::with_capacity(specs.len() + 1);
        let mut reducers: Vec<Option<ReduceFn<V, C>>> = Vec::with_capacity(specs.len() + 1);
        productions.push(Production {
            id: 0,
            lhs: AUGMENTED_START.into(),
            rhs: vec![goal],
        });
        reducers.push(None);

        for spec in specs {
            let ProductionSpec { lhs, mut rhs, reduce } = spec;
            if !is_nonterminal(&lhs) {
                return Err(GrammarBuildError::TerminalLhs { lhs });
            }
            if rhs.iter().any(|s| s == EPSILON) {
                if rhs.len() > 1 {
                    return Err(GrammarBuildError::MisplacedEpsilon { lhs });
                }
                rhs.clear();
            }
            if rhs.iter().any(|s| s == END_MARKER) {
                return Err(GrammarBuildError::ReservedEndMarker { lhs });
            }
            productions.push(Production {
                id: productions.len(),
                lhs,
                rhs,
            });
            reducers.push(reduce);
        }

        Ok(Self {
            start: AUGMENTED_START.into(),
            productions,
            reducers,
        })
    }

    /// The augmented start nonterminal, `S'`.
    pub fn start(&self) -> &str {
        &self.start
    }

    /// All productions, augmented production first, ids dense.
    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    /// The production with the given id.
    ///
    /// # Panics
    /// Panics if `id` is out of range; ids come from this grammar's own
    /// table, so an out-of-range id is a caller bug.
    pub fn production(&self, id: usize) -> &Production {
        &self.productions[id]
    }

    /// All productions whose left-hand side is `name`, in id order.
    pub fn prods_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Production> {
        self.productions.iter().filter(move |p| p.lhs == name)
    }

    /// The reduction callback for a production, if one was supplied.
    pub fn reducer(&self, id: usize) -> Option<&ReduceFn<V, C>> {
        self.reducers.get(id).and_then(|r| r.as_ref())
    }

    /// The grammar's alphabet in canonical order: `$` first, the remaining
    /// terminals lexicographically, then the nonterminals
    /// lexicographically. Collected from right-hand side occurrences, so a
    /// nonterminal only shows up once it is reachable from some rule body
    /// (the goal always is, through the augmented production).
    ///
    /// Used for deterministic table layout and printing only, never for
    /// semantics.
    pub fn sorted_symbols(&self) -> Vec<String> {
        let mut terminals = std::collections::BTreeSet::new();
        let mut nonterminals = std::collections::BTreeSet::new();
        for p in &self.productions {
            for sym in &p.rhs {
                if is_nonterminal(sym) {
                    nonterminals.insert(sym.clone());
                } else {
                    terminals.insert(sym.clone());
                }
            }
        }
        let mut symbols = Vec::with_capacity(1 + terminals.len() + nonterminals.len());
        symbols.push(String::from(END_MARKER));
        symbols.extend(terminals);
        symbols.extend(nonterminals);
        symbols
    }
}

impl<V, C> fmt::Display for Grammar<V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.productions {
            writeln!(f, "{}", p)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(lhs: &str, rhs: &[&str]) -> ProductionSpec<(), ()> {
        ProductionSpec::new(lhs, rhs.iter().copied())
    }

    #[test]
    fn classification_follows_leading_letter() {
        assert!(is_nonterminal("E"));
        assert!(is_nonterminal("Expr"));
        assert!(is_terminal("id"));
        assert!(is_terminal("+"));
        assert!(is_terminal("$"));
        assert!(is_terminal(""));
    }

    #[test]
    fn build_prepends_augmented_production_and_assigns_dense_ids() {
        let g = Grammar::build(vec![spec("E", &["E", "+", "T"]), spec("T", &["id"])], None)
            .unwrap();
        let prods = g.productions();
        assert_eq!(prods.len(), 3);
        assert_eq!(prods[0].lhs, AUGMENTED_START);
        assert_eq!(prods[0].rhs, vec!["E"]);
        for (i, p) in prods.iter().enumerate() {
            assert_eq!(p.id, i);
        }
    }

    #[test]
    fn explicit_start_overrides_first_production() {
        let g = Grammar::build(
            vec![spec("A", &["b"]), spec("S", &["A"])],
            Some("S"),
        )
        .unwrap();
        assert_eq!(g.production(0).rhs, vec!["S"]);
    }

    #[test]
    fn epsilon_marker_normalizes_to_empty_rhs() {
        let g = Grammar::build(vec![spec("A", &[""])], None).unwrap();
        assert!(g.production(1).is_epsilon());
    }

    #[test]
    fn epsilon_marker_mixed_with_symbols_is_rejected() {
        let err = Grammar::build(vec![spec("A", &["b", ""])], None).unwrap_err();
        assert!(matches!(err, GrammarBuildError::MisplacedEpsilon { .. }));
    }

    #[test]
    fn terminal_lhs_is_rejected() {
        let err = Grammar::build(vec![spec("a", &["b"])], None).unwrap_err();
        assert!(matches!(err, GrammarBuildError::TerminalLhs { .. }));
    }

    #[test]
    fn end_marker_in_rhs_is_rejected() {
        let err = Grammar::build(vec![spec("A", &["b", "$"])], None).unwrap_err();
        assert!(matches!(err, GrammarBuildError::ReservedEndMarker { .. }));
    }

    #[test]
    fn empty_grammar_is_rejected() {
        let err = Grammar::<(), ()>::build(Vec::new(), None).unwrap_err();
        assert!(matches!(err, GrammarBuildError::Empty));
    }

    #[test]
    fn sorted_symbols_puts_end_marker_then_terminals_then_nonterminals() {
        let g = Grammar::build(
            vec![
                spec("E", &["E", "+", "T"]),
                spec("E", &["T"]),
                spec("T", &["id"]),
            ],
            None,
        )
        .unwrap();
        let symbols = g.sorted_symbols();
        assert_eq!(symbols, vec!["$", "+", "id", "E", "T"]);
    }

    #[test]
    fn prods_for_returns_all_alternatives_in_order() {
        let g = Grammar::build(
            vec![
                spec("E", &["E", "+", "T"]),
                spec("T", &["id"]),
                spec("E", &["T"]),
            ],
            None,
        )
        .unwrap();
        let ids: Vec<usize> = g.prods_for("E").map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn display_lists_productions_with_ids() {
        let g = Grammar::build(vec![spec("E", &["id"]), spec("A", &[""])], None).unwrap();
        let s = g.to_string();
        assert!(s.contains("0. S' -> E"));
        assert!(s.contains("1. E -> id"));
        assert!(s.contains("2. A ->"));
    }
}
