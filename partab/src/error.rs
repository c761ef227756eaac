//! Source-location and error types used across table construction and parsing.
//!
//! This module defines the small types the rest of the crate uses for
//! tracking source locations and reporting failures: [`Position`]/[`Span`]
//! for pinpointing input text, the build-time errors
//! ([`GrammarBuildError`], [`FixedPointDivergence`], [`BuildError`]), and the
//! run-time errors ([`LexError`], [`ParseError`]). A `span!` macro builds
//! `Option<Span>` values inline.
//!
//! Build-time errors abort construction with no partial automaton exposed;
//! [`ParseError`] aborts the current parse and carries the stack symbols and
//! lookahead for diagnosis. Table conflicts are *not* errors; see
//! [`Conflict`](crate::table::Conflict).

use smartstring::alias::String;
use thiserror::Error;

/// A 1-based line/column position in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number (character position in the line).
    pub column: usize,
}

impl Position {
    /// Creates a new `Position`.
    #[inline]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A half-open source range: `[start, end)`.
///
/// `Span` marks the region of input that a token covers, or attaches a
/// location to a diagnostic. Reductions merge the spans of the entries they
/// consume, so the span of a nonterminal entry covers its whole derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Starting position (inclusive).
    pub start: Position,
    /// Ending position (exclusive by convention).
    pub end: Position,
}

impl Span {
    /// Creates a new `Span`.
    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Merge two spans into one that covers both.
    #[inline]
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: if self.start <= other.start {
                self.start
            } else {
                other.start
            },
            end: if self.end >= other.end {
                self.end
            } else {
                other.end
            },
        }
    }

    /// Returns `true` if the span is empty (same start and end position).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the inclusive line range spanned by this `Span`.
    #[inline]
    pub fn line_range(&self) -> (usize, usize) {
        (self.start.line, self.end.line)
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} to {}:{}",
            self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

/// Build an `Option<Span>` inline from 1-based line/column coordinates.
///
/// # Examples
///
/// ```rust
/// # use partab::span;
/// let s = span!(1, 1, 1, 5);
/// assert!(s.is_some());
/// ```
#[macro_export]
macro_rules! span {
    ($line_start:expr, $col_start:expr, $line_end:expr, $col_end:expr) => {
        Some($crate::Span {
            start: $crate::Position {
                line: $line_start,
                column: $col_start,
            },
            end: $crate::Position {
                line: $line_end,
                column: $col_end,
            },
        })
    };
}

/// A production descriptor was malformed; grammar construction is aborted
/// and no partial automaton is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarBuildError {
    /// The production list was empty; augmentation needs a start symbol.
    #[error("grammar has no productions")]
    Empty,

    /// The epsilon marker appeared alongside other right-hand side symbols.
    /// An epsilon production is an empty right-hand side (or the sole
    /// marker), never a marker mixed into a longer one.
    #[error("epsilon marker must be the only right-hand side symbol of {lhs:?}")]
    MisplacedEpsilon {
        /// Left-hand side of the offending production.
        lhs: String,
    },

    /// A production's left-hand side does not classify as a nonterminal,
    /// so closure would never expand it.
    #[error("left-hand side {lhs:?} is not a nonterminal")]
    TerminalLhs {
        /// The offending left-hand side.
        lhs: String,
    },

    /// The end-of-input marker `$` appeared in a right-hand side. It is
    /// synthesized by the engine and cannot be a grammar symbol.
    #[error("the end marker \"$\" cannot appear in a production ({lhs:?})")]
    ReservedEndMarker {
        /// Left-hand side of the offending production.
        lhs: String,
    },
}

/// A FIRST/FOLLOW fixed point failed to converge within the iteration
/// bound. Signals a malformed grammar; no partial sets are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{analysis} sets failed to converge within {limit} passes")]
pub struct FixedPointDivergence {
    /// Which analysis diverged (`"FIRST"` or `"FOLLOW"`).
    pub analysis: &'static str,
    /// The iteration bound that was exceeded.
    pub limit: usize,
}

/// Any error that can abort automaton construction.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Grammar(#[from] GrammarBuildError),

    #[error(transparent)]
    FixedPoint(#[from] FixedPointDivergence),
}

/// A scanner rule failed to compile.
#[derive(Debug, Error)]
pub enum LexError {
    /// The pattern of the rule at `index` is not a valid regex.
    #[error("invalid pattern in scanner rule {index}")]
    BadPattern {
        /// Zero-based position of the rule in the rule list.
        index: usize,
        #[source]
        source: regex::Error,
    },
}

/// A parse failed. Always fatal to the current parse; no recovery or
/// resynchronization is attempted.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The table holds no action for the current state and lookahead.
    #[error("no action in state {state} for {symbol:?}")]
    UnexpectedToken {
        /// State on top of the stack.
        state: usize,
        /// Lookahead symbol.
        symbol: String,
        /// Lookahead location, if known.
        span: Option<Span>,
        /// Symbols on the value stack at the point of failure, bottom first.
        stack: Vec<String>,
    },

    /// An action kind appeared where another was required; the table and
    /// the driver are out of step.
    #[error("{detail} (state {state}, symbol {symbol:?})")]
    TableMismatch {
        state: usize,
        symbol: String,
        detail: &'static str,
    },

    /// Accept was reached while the lookahead was not end-of-input.
    #[error("accept reached with lookahead {symbol:?}")]
    AcceptLookahead {
        /// The non-`$` lookahead symbol.
        symbol: String,
    },

    /// The driver exceeded its step bound.
    #[error("parse exceeded {limit} steps")]
    StepLimitExceeded {
        /// The configured bound.
        limit: usize,
    },

    /// A reduction tried to pop more entries than the stack holds.
    #[error("stack underflow while reducing production {production}")]
    StackUnderflow {
        /// Id of the production being reduced.
        production: usize,
    },

    /// After accept, the value stack did not hold exactly one entry.
    #[error("parse finished with {len} stack entries")]
    UnbalancedFinalStack {
        /// Number of entries left on the value stack.
        len: usize,
    },

    /// A reduction callback failed.
    #[error("reduction for production {production} failed")]
    Semantic {
        /// Id of the production whose callback failed.
        production: usize,
        /// Merged span of the popped entries, if any carried one.
        span: Option<Span>,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_merge_covers_both() {
        let a = Span::new(Position::new(1, 3), Position::new(1, 7));
        let b = Span::new(Position::new(1, 5), Position::new(2, 2));
        let m = a.merge(&b);
        assert_eq!(m.start, Position::new(1, 3));
        assert_eq!(m.end, Position::new(2, 2));
        assert_eq!(m.line_range(), (1, 2));
        assert!(!m.is_empty());
    }

    #[test]
    fn span_macro_builds_some() {
        let s = span!(2, 1, 2, 9);
        assert_eq!(
            s,
            Some(Span::new(Position::new(2, 1), Position::new(2, 9)))
        );
    }

    #[test]
    fn parse_error_displays_lookahead() {
        let err = ParseError::UnexpectedToken {
            state: 3,
            symbol: "+".into(),
            span: span!(1, 2, 1, 3),
            stack: vec!["E".into()],
        };
        assert!(err.to_string().contains("state 3"));
        assert!(err.to_string().contains('+'));
    }

    fn _assert_send_sync_static<T: Send + Sync + 'static>() {}

    #[test]
    fn errors_are_send_sync_static() {
        _assert_send_sync_static::<BuildError>();
        _assert_send_sync_static::<ParseError>();
    }
}
