//! # partab-calc
//!
//! A small demonstration crate built on **partab**, providing a complete,
//! minimal example of a lexer-parser pipeline for a calculator language.
//!
//! The calculator wires the `partab` scanner and parse engine together
//! with a shared symbol table: statements like `a = 1 + 2 * 3` are
//! tokenized, parsed bottom-up, and evaluated inside the reduction
//! callbacks, with variable bindings persisting across statements.
//!
//! ```rust
//! use partab_calc::Calc;
//!
//! let mut calc = Calc::try_new().unwrap();
//! assert_eq!(calc.eval("a = 1 + 2 * 3").unwrap(), 7);
//! assert_eq!(calc.eval("a * 2").unwrap(), 14);
//! ```

pub mod calc;
pub mod symtab;

pub use calc::{calc_lexer, calc_parser, Calc, CalcError, Value};
pub use symtab::{SymTab, SymTabError};
