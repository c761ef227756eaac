//! The action table: a total mapping over `(state, symbol)` built from the
//! canonical collection and the FOLLOW sets.
//!
//! Transitions become `Shift` (terminal) or `Goto` (nonterminal) entries;
//! completed items become `Accept` (the augmented production facing `$`)
//! or `Reduce` entries over `FOLLOW(lhs)`. When two candidates contend for
//! one cell, the first discovered action stays, the loser is recorded as a
//! [`Conflict`] and logged: a deterministic approximation, reported
//! rather than resolved (LR(0) states with FOLLOW-set placement can
//! mis-resolve what a per-state LALR(1) lookahead computation would not).

use crate::follow::Follow;
use crate::grammar::{is_terminal, Production, END_MARKER};
use crate::itemsets::Itemsets;
use indexmap::IndexMap;
use smartstring::alias::String;
use std::fmt;

/// One cell of the action table. A closed union: the parser loop matches
/// it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Consume the lookahead and enter the state.
    Shift(usize),
    /// Post-reduce transition on a nonterminal.
    Goto(usize),
    /// Reduce by the production with this id.
    Reduce(usize),
    /// Successful parse.
    Accept,
    /// No action; encountering this at parse time is a parse error.
    Invalid,
}

impl Action {
    /// Compact cell rendering for table dumps: `s3`, `g5`, `r2`, `acc`,
    /// or an empty cell.
    pub fn nice(&self) -> String {
        match self {
            Action::Shift(s) => format!("s{}", s).into(),
            Action::Goto(s) => format!("g{}", s).into(),
            Action::Reduce(p) => format!("r{}", p).into(),
            Action::Accept => "acc".into(),
            Action::Invalid => String::new(),
        }
    }
}

/// A dropped table entry: two candidates contended for one cell, the
/// first discovered one was kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// State (row) of the contended cell.
    pub state: usize,
    /// Symbol (column) of the contended cell.
    pub symbol: String,
    /// The action that stays in the table.
    pub kept: Action,
    /// The candidate that was discarded.
    pub dropped: Action,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "state {} on {:?}: kept {:?}, dropped {:?}",
            self.state, self.symbol, self.kept, self.dropped
        )
    }
}

/// The built action table. Every `(state, alphabet symbol)` cell is
/// defined; symbols outside the alphabet read as [`Action::Invalid`].
#[derive(Debug)]
pub struct ParseTable {
    symbols: Vec<String>,
    columns: IndexMap<String, usize>,
    rows: Vec<Vec<Action>>,
}

impl ParseTable {
    /// Builds the table for a canonical collection. `symbols` is the
    /// grammar's sorted alphabet and fixes the column layout. Returns the
    /// table plus every conflict encountered, in discovery order.
    pub fn build(
        itemsets: &Itemsets,
        prods: &[Production],
        symbols: Vec<String>,
        follow: &Follow,
    ) -> (ParseTable, Vec<Conflict>) {
        let columns: IndexMap<String, usize> = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();
        let mut table = ParseTable {
            rows: vec![vec![Action::Invalid; symbols.len()]; itemsets.len()],
            symbols,
            columns,
        };
        let mut conflicts = Vec::new();

        for state in itemsets.states() {
            for (sym, &target) in &state.transitions {
                let action = if is_terminal(sym) {
                    Action::Shift(target)
                } else {
                    Action::Goto(target)
                };
                table.place(state.id, sym, action, &mut conflicts);
            }

            for item in state.completed(prods) {
                let prod = &prods[item.prod];
                if prod.id == 0 {
                    table.place(state.id, END_MARKER, Action::Accept, &mut conflicts);
                    continue;
                }
                for terminal in follow.terminals(&prod.lhs) {
                    table.place(state.id, terminal, Action::Reduce(prod.id), &mut conflicts);
                }
            }
        }
        (table, conflicts)
    }

    /// First-discovered-action-wins cell placement.
    fn place(&mut self, state: usize, symbol: &str, action: Action, conflicts: &mut Vec<Conflict>) {
        let Some(&col) = self.columns.get(symbol) else {
            // A FOLLOW terminal can miss the alphabet only if the grammar
            // never mentions it in a right-hand side; nothing to place.
            return;
        };
        let cell = &mut self.rows[state][col];
        match *cell {
            Action::Invalid => *cell = action,
            kept => {
                let conflict = Conflict {
                    state,
                    symbol: symbol.into(),
                    kept,
                    dropped: action,
                };
                log::warn!("table conflict: {}", conflict);
                conflicts.push(conflict);
            }
        }
    }

    /// The action for `(state, symbol)`. Symbols outside the alphabet
    /// yield [`Action::Invalid`], never a panic.
    pub fn action(&self, state: usize, symbol: &str) -> Action {
        match self.columns.get(symbol) {
            Some(&col) => self
                .rows
                .get(state)
                .map_or(Action::Invalid, |row| row[col]),
            None => Action::Invalid,
        }
    }

    /// The column symbols, in table order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Number of states (rows).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` for a table with no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for ParseTable {
    /// CSV-style grid: a header of symbols, one row per state.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ",")?;
        for sym in &self.symbols {
            write!(f, "{},", sym)?;
        }
        writeln!(f)?;
        for (i, row) in self.rows.iter().enumerate() {
            write!(f, "{},", i)?;
            for action in row {
                write!(f, "{},", action.nice())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::first::First;
    use crate::grammar::{Grammar, ProductionSpec};

    fn build_all(
        specs: Vec<ProductionSpec<(), ()>>,
    ) -> (Grammar<(), ()>, ParseTable, Vec<Conflict>) {
        let g = Grammar::build(specs, None).unwrap();
        let sets = Itemsets::build(g.productions());
        let first = First::build(g.productions()).unwrap();
        let follow = Follow::build(g.productions(), g.start(), &first).unwrap();
        let (table, conflicts) =
            ParseTable::build(&sets, g.productions(), g.sorted_symbols(), &follow);
        (g, table, conflicts)
    }

    fn expr_specs() -> Vec<ProductionSpec<(), ()>> {
        vec![
            ProductionSpec::new("E", ["E", "+", "T"]),
            ProductionSpec::new("E", ["T"]),
            ProductionSpec::new("T", ["T", "*", "F"]),
            ProductionSpec::new("T", ["F"]),
            ProductionSpec::new("F", ["id"]),
        ]
    }

    #[test]
    fn expression_grammar_builds_without_conflicts() {
        let (_, table, conflicts) = build_all(expr_specs());
        assert!(conflicts.is_empty());
        assert_eq!(table.len(), 9);
    }

    #[test]
    fn shifts_gotos_and_accept_land_where_expected() {
        let (_, table, _) = build_all(expr_specs());
        // State 0 shifts `id` and gotos on E/T/F.
        assert!(matches!(table.action(0, "id"), Action::Shift(_)));
        assert!(matches!(table.action(0, "E"), Action::Goto(_)));
        // The state reached on E from state 0 accepts at end of input.
        let Action::Goto(e_state) = table.action(0, "E") else {
            panic!("expected goto on E");
        };
        assert_eq!(table.action(e_state, "$"), Action::Accept);
    }

    #[test]
    fn reduce_entries_cover_follow_of_the_lhs() {
        let (_, table, _) = build_all(expr_specs());
        let Action::Shift(id_state) = table.action(0, "id") else {
            panic!("expected shift on id");
        };
        // After shifting `id`, every symbol in FOLLOW(F) reduces by F -> id.
        for sym in ["$", "+", "*"] {
            assert_eq!(table.action(id_state, sym), Action::Reduce(5));
        }
    }

    #[test]
    fn unknown_symbols_read_as_invalid() {
        let (_, table, _) = build_all(expr_specs());
        assert_eq!(table.action(0, "nosuch"), Action::Invalid);
        assert_eq!(table.action(usize::MAX, "id"), Action::Invalid);
    }

    #[test]
    fn every_cell_is_defined() {
        let (_, table, _) = build_all(expr_specs());
        for state in 0..table.len() {
            for sym in table.symbols() {
                // Lookup never panics; Invalid is a defined answer.
                let _ = table.action(state, sym);
            }
        }
    }

    #[test]
    fn epsilon_production_reduces_on_every_follow_symbol() {
        let (g, table, conflicts) = build_all(vec![
            ProductionSpec::new("A", ["b", "A"]),
            ProductionSpec::new("A", [""]),
        ]);
        assert!(conflicts.is_empty());
        let eps = g
            .productions()
            .iter()
            .find(|p| p.is_epsilon())
            .map(|p| p.id)
            .unwrap();
        // FOLLOW(A) = {$}; the epsilon reduce must appear on it in the
        // states where A can vanish, which includes state 0, and must not
        // leak onto `b`, which only shifts.
        assert_eq!(table.action(0, "$"), Action::Reduce(eps));
        assert!(matches!(table.action(0, "b"), Action::Shift(_)));
    }

    #[test]
    fn epsilon_reduce_lands_on_follow_symbols_other_than_its_own_first() {
        let (g, table, _) = build_all(vec![
            ProductionSpec::new("S", ["A", "x"]),
            ProductionSpec::new("A", ["b", "A"]),
            ProductionSpec::new("A", [""]),
        ]);
        let eps = g
            .productions()
            .iter()
            .find(|p| p.is_epsilon())
            .map(|p| p.id)
            .unwrap();
        // FOLLOW(A) = {x}: the empty A before `x` must reduce on `x` even
        // though FIRST(A) only holds `b`.
        assert_eq!(table.action(0, "x"), Action::Reduce(eps));
        assert!(matches!(table.action(0, "b"), Action::Shift(_)));
    }

    #[test]
    fn dangling_else_reports_a_conflict_but_stays_total() {
        let (_, table, conflicts) = build_all(vec![
            ProductionSpec::new("S", ["if", "E", "then", "S"]),
            ProductionSpec::new("S", ["if", "E", "then", "S", "else", "S"]),
            ProductionSpec::new("S", ["s"]),
            ProductionSpec::new("E", ["e"]),
        ]);
        assert!(!conflicts.is_empty());
        // The shift was discovered first and stays.
        let c = &conflicts[0];
        assert_eq!(c.symbol, "else");
        assert!(matches!(c.kept, Action::Shift(_)));
        assert!(matches!(c.dropped, Action::Reduce(_)));
        // The table is still total over its alphabet.
        for state in 0..table.len() {
            for sym in table.symbols() {
                let _ = table.action(state, sym);
            }
        }
    }

    #[test]
    fn rebuilds_are_identical() {
        let (_, a, _) = build_all(expr_specs());
        let (_, b, _) = build_all(expr_specs());
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn display_renders_a_grid() {
        let (_, table, _) = build_all(expr_specs());
        let dump = table.to_string();
        assert!(dump.starts_with(",$,"));
        assert!(dump.contains("acc"));
        assert!(dump.lines().count() == table.len() + 1);
    }
}

