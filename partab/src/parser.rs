//! The build pipeline and the shift-reduce driver.
//!
//! [`Parser::build`] runs the whole construction once per grammar:
//! augmentation, canonical item sets, FIRST, FOLLOW, and the action
//! table. The result is immutable and safely shareable: [`Parser::parse`]
//! only reads the table and keeps its stacks local to the call, so one
//! built parser can serve concurrent parses.
//!
//! The driver itself is the classic loop over
//! `Shift`/`Reduce`/`Goto`/`Accept`/`Invalid`: two parallel stacks (value
//! entries and state markers), a synthesized `$` lookahead once the input
//! runs out, and a step bound guarding against a malformed table rather
//! than trusting correctness unconditionally. No error recovery is
//! attempted; the first failure aborts the parse.

use crate::error::{BuildError, ParseError, Span};
use crate::first::First;
use crate::follow::Follow;
use crate::grammar::{Grammar, ProductionSpec, END_MARKER};
use crate::itemsets::Itemsets;
use crate::table::{Action, Conflict, ParseTable};
use smartstring::alias::String;

/// Default bound on driver steps per parse.
pub const DEFAULT_STEP_LIMIT: usize = 1_000_000;

/// A runtime token: a symbol, an opaque semantic value, and an optional
/// source span. The same type is the engine's stack entry, so reduction
/// callbacks see popped entries in exactly this shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<V> {
    /// Symbol known to the grammar (terminal for input tokens, the
    /// left-hand side nonterminal for reduced entries).
    pub symbol: String,
    /// Semantic payload; opaque to the engine.
    pub value: V,
    /// Source location, if the producer tracked one. Reduced entries get
    /// the merged span of everything they consumed.
    pub span: Option<Span>,
}

impl<V> Token<V> {
    /// Creates a token without a span.
    pub fn new(symbol: impl Into<String>, value: V) -> Self {
        Self {
            symbol: symbol.into(),
            value,
            span: None,
        }
    }

    /// Creates a token with a span.
    pub fn with_span(symbol: impl Into<String>, value: V, span: Span) -> Self {
        Self {
            symbol: symbol.into(),
            value,
            span: Some(span),
        }
    }
}

/// A built parsing automaton: grammar, canonical collection, FIRST/FOLLOW,
/// action table, and the conflicts the table builder reported.
///
/// `V` is the semantic value type, `C` the caller's context threaded into
/// every reduction callback.
pub struct Parser<V, C> {
    grammar: Grammar<V, C>,
    itemsets: Itemsets,
    first: First,
    follow: Follow,
    table: ParseTable,
    conflicts: Vec<Conflict>,
    step_limit: usize,
}

impl<V, C> Parser<V, C> {
    /// Builds the automaton for a grammar. Build-time failures abort with
    /// no partial state; table conflicts do not fail the build and are
    /// available from [`Parser::conflicts`].
    pub fn build(
        specs: Vec<ProductionSpec<V, C>>,
        start: Option<&str>,
    ) -> Result<Self, BuildError> {
        let grammar = Grammar::build(specs, start)?;
        let itemsets = Itemsets::build(grammar.productions());
        let first = First::build(grammar.productions())?;
        let follow = Follow::build(grammar.productions(), grammar.start(), &first)?;
        let (table, conflicts) = ParseTable::build(
            &itemsets,
            grammar.productions(),
            grammar.sorted_symbols(),
            &follow,
        );
        log::trace!(
            "built parser: {} productions, {} states, {} conflicts",
            grammar.productions().len(),
            itemsets.len(),
            conflicts.len()
        );
        Ok(Self {
            grammar,
            itemsets,
            first,
            follow,
            table,
            conflicts,
            step_limit: DEFAULT_STEP_LIMIT,
        })
    }

    /// Replaces the per-parse step bound.
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = limit;
        self
    }

    /// The underlying grammar.
    pub fn grammar(&self) -> &Grammar<V, C> {
        &self.grammar
    }

    /// The canonical collection of states.
    pub fn itemsets(&self) -> &Itemsets {
        &self.itemsets
    }

    /// FIRST sets.
    pub fn first(&self) -> &First {
        &self.first
    }

    /// FOLLOW sets.
    pub fn follow(&self) -> &Follow {
        &self.follow
    }

    /// The action table.
    pub fn table(&self) -> &ParseTable {
        &self.table
    }

    /// Conflicts the table builder resolved first-wins, in discovery
    /// order. Empty for a grammar the approximation handles cleanly.
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Renders the production list, item sets, and action table, the
    /// debugging dump of the whole automaton.
    pub fn dump(&self) -> std::string::String {
        format!(
            "{}\n{}\n{}{}\n{}",
            self.grammar,
            self.itemsets.render(self.grammar.productions()),
            self.first,
            self.follow,
            self.table
        )
    }
}

impl<V: Default, C> Parser<V, C> {
    /// Drives a token stream through the table, invoking reduction
    /// callbacks bottom-up, and returns the semantic value of the
    /// accepted goal entry.
    ///
    /// The stream is implicitly terminated by `$`; the driver synthesizes
    /// the end marker once `input` is exhausted. Productions without a
    /// callback produce `V::default()`.
    pub fn parse<I>(&self, input: I, ctx: &mut C) -> Result<V, ParseError>
    where
        I: IntoIterator<Item = Token<V>>,
    {
        let mut input = input.into_iter();
        let mut lookahead = input.next();
        let mut states: Vec<usize> = vec![0];
        let mut stack: Vec<Token<V>> = Vec::new();
        let mut state = 0;

        for step in 0.. {
            if step == self.step_limit {
                return Err(ParseError::StepLimitExceeded {
                    limit: self.step_limit,
                });
            }
            let symbol: String = lookahead
                .as_ref()
                .map_or_else(|| END_MARKER.into(), |t| t.symbol.clone());
            if log::log_enabled!(log::Level::Trace) {
                log::trace!(
                    "state {} lookahead {:?} stack [{}]",
                    state,
                    symbol,
                    stack
                        .iter()
                        .map(|t| t.symbol.as_str())
                        .collect::<Vec<_>>()
                        .join(" ")
                );
            }

            match self.table.action(state, &symbol) {
                Action::Shift(target) => {
                    log::trace!("shift {}", target);
                    let Some(token) = lookahead.take() else {
                        // Only a grammar mentioning `$` could shift at end
                        // of input, and grammar construction rejects that.
                        return Err(ParseError::TableMismatch {
                            state,
                            symbol,
                            detail: "shift on synthesized end of input",
                        });
                    };
                    stack.push(token);
                    states.push(target);
                    state = target;
                    lookahead = input.next();
                }

                Action::Reduce(prod_id) => {
                    let prod = self.grammar.production(prod_id);
                    log::trace!("reduce {}", prod);
                    let count = prod.rhs.len();
                    if stack.len() < count || states.len() < count + 1 {
                        return Err(ParseError::StackUnderflow {
                            production: prod_id,
                        });
                    }
                    // 2 x |rhs| stack slots go: |rhs| value entries and
                    // |rhs| state markers. Zero for an epsilon production.
                    let popped = stack.split_off(stack.len() - count);
                    states.truncate(states.len() - count);
                    let span = popped
                        .iter()
                        .filter_map(|t| t.span)
                        .reduce(|a, b| a.merge(&b));
                    let value = match self.grammar.reducer(prod_id) {
                        Some(reduce) => reduce(prod, popped, ctx).map_err(|source| {
                            ParseError::Semantic {
                                production: prod_id,
                                span,
                                source,
                            }
                        })?,
                        None => V::default(),
                    };
                    state = match states.last() {
                        Some(&s) => s,
                        None => {
                            return Err(ParseError::StackUnderflow {
                                production: prod_id,
                            })
                        }
                    };
                    let Action::Goto(target) = self.table.action(state, &prod.lhs) else {
                        return Err(ParseError::TableMismatch {
                            state,
                            symbol: prod.lhs.clone(),
                            detail: "expected a goto after reduction",
                        });
                    };
                    stack.push(Token {
                        symbol: prod.lhs.clone(),
                        value,
                        span,
                    });
                    states.push(target);
                    state = target;
                }

                Action::Accept => {
                    log::trace!("accept");
                    if symbol != END_MARKER {
                        // The table only places Accept on the `$` column;
                        // anything else here is an internal inconsistency,
                        // not a parse error in the input.
                        return Err(ParseError::AcceptLookahead { symbol });
                    }
                    if stack.len() != 1 {
                        return Err(ParseError::UnbalancedFinalStack { len: stack.len() });
                    }
                    states.pop();
                    let Some(goal) = stack.pop() else {
                        return Err(ParseError::UnbalancedFinalStack { len: 0 });
                    };
                    return Ok(goal.value);
                }

                Action::Goto(_) => {
                    return Err(ParseError::TableMismatch {
                        state,
                        symbol,
                        detail: "goto out of context",
                    });
                }

                Action::Invalid => {
                    return Err(ParseError::UnexpectedToken {
                        state,
                        symbol,
                        span: lookahead.as_ref().and_then(|t| t.span),
                        stack: stack.iter().map(|t| t.symbol.clone()).collect(),
                    });
                }
            }
        }
        unreachable!("the step loop either returns or hits its bound")
    }
}
