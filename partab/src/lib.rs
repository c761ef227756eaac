//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! SLR-style parser table generator and shift-reduce execution engine.
//!
//! `partab` turns an ordered list of productions into a parsing automaton
//! at runtime: the canonical collection of LR(0) item sets, FIRST/FOLLOW
//! terminal sets, and a total SHIFT/REDUCE/GOTO/ACCEPT action table. The
//! table then drives a token stream through a shift-reduce loop, invoking
//! caller-supplied per-production callbacks to build a semantic value.
//!
//! Reductions are placed with FOLLOW sets over LR(0) states, the SLR
//! approximation. Conflicting table entries are resolved
//! first-discovered-wins and reported, not hidden; grammars like
//! dangling-else parse deterministically because of exactly that bias.
//!
//! ```rust
//! use partab::{Parser, ProductionSpec, Token};
//!
//! let parser: Parser<i64, ()> = Parser::build(
//!     vec![
//!         ProductionSpec::new("E", ["E", "+", "E"])
//!             .reduce(|_, p, _| Ok(p[0].value + p[2].value)),
//!         ProductionSpec::new("E", ["num"]),
//!     ],
//!     None,
//! )
//! .unwrap();
//! ```
//!
//! A built [`Parser`] is immutable and shareable: parsing only reads the
//! table and keeps its stacks local to each call.

pub mod error;
pub mod first;
pub mod follow;
pub mod grammar;
pub mod itemsets;
pub mod lexer;
pub mod parser;
pub mod table;

pub use crate::error::{
    BuildError, FixedPointDivergence, GrammarBuildError, LexError, ParseError, Position, Span,
};
pub use crate::first::{First, FirstSet, FIXED_POINT_LIMIT};
pub use crate::follow::Follow;
pub use crate::grammar::{
    is_nonterminal, is_terminal, Grammar, Production, ProductionSpec, ReduceFn, SemanticError,
    AUGMENTED_START, END_MARKER, EPSILON,
};
pub use crate::itemsets::{Item, Itemset, Itemsets, Kernel};
pub use crate::lexer::{LexToken, Lexer, WHITESPACE_CLASS};
pub use crate::parser::{Parser, Token, DEFAULT_STEP_LIMIT};
pub use crate::table::{Action, Conflict, ParseTable};
