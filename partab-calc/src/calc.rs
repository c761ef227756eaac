//! The calculator itself: grammar, reduction callbacks, and the
//! lexer-parser pipeline.
//!
//! Precedence comes from the grammar shape (the `Expr`/`Term`/`Factor`
//! ladder), so the table builds without conflicts. Assignments store into
//! the shared [`SymTab`] and evaluate to the assigned value; reading an
//! identifier that was never assigned yields 0, the symbol table's fresh
//! value.

use crate::symtab::{SymTab, SymTabError};
use partab::{
    BuildError, LexError, Lexer, ParseError, Parser, Production, ProductionSpec, SemanticError,
    Token, WHITESPACE_CLASS,
};
use smartstring::alias::String;
use thiserror::Error;

/// Semantic payload on the parse stack: nothing, a raw lexeme, or a
/// computed number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Value {
    /// No payload (operators, fresh entries).
    #[default]
    None,
    /// Matched input text of a terminal.
    Lexeme(String),
    /// A computed integer.
    Number(i64),
}

/// Everything that can go wrong while building or running the calculator.
#[derive(Debug, Error)]
pub enum CalcError {
    /// The grammar failed to build; a bug in the calculator itself.
    #[error("calculator grammar failed to build")]
    Build(#[from] BuildError),

    /// A scanner rule failed to compile; likewise a calculator bug.
    #[error("calculator scanner failed to build")]
    Lex(#[from] LexError),

    /// The statement did not parse.
    #[error("parse failed")]
    Parse(#[from] ParseError),

    /// A statement evaluated to something that is not a number.
    #[error("statement did not produce a number")]
    NotANumber,

    /// Division by zero.
    #[error("division by zero")]
    DivideByZero,

    /// A symbol-table operation failed.
    #[error("symtab error")]
    SymTab(#[from] SymTabError),
}

fn number(token: &Token<Value>) -> Result<i64, SemanticError> {
    match token.value {
        Value::Number(n) => Ok(n),
        _ => Err(CalcError::NotANumber.into()),
    }
}

fn lexeme(token: &Token<Value>) -> Result<&str, SemanticError> {
    match &token.value {
        Value::Lexeme(s) => Ok(s.as_str()),
        _ => Err(CalcError::NotANumber.into()),
    }
}

fn passthrough(
    _prod: &Production,
    mut popped: Vec<Token<Value>>,
    _ctx: &mut SymTab,
) -> Result<Value, SemanticError> {
    Ok(popped.remove(0).value)
}

fn binop(
    prod: &Production,
    popped: Vec<Token<Value>>,
    _ctx: &mut SymTab,
) -> Result<Value, SemanticError> {
    let a = number(&popped[0])?;
    let b = number(&popped[2])?;
    let n = match prod.rhs[1].as_str() {
        "+" => a.wrapping_add(b),
        "-" => a.wrapping_sub(b),
        "*" => a.wrapping_mul(b),
        _ => {
            if b == 0 {
                return Err(CalcError::DivideByZero.into());
            }
            a / b
        }
    };
    Ok(Value::Number(n))
}

/// The calculator grammar wired to its reduction callbacks.
pub fn calc_parser() -> Result<Parser<Value, SymTab>, BuildError> {
    Parser::build(
        vec![
            ProductionSpec::new("Stat", ["id", "=", "Expr"]).reduce(|_, popped, ctx: &mut SymTab| {
                let name: String = lexeme(&popped[0])?.into();
                let n = number(&popped[2])?;
                let index = ctx.intern(name);
                ctx.set(index, n).map_err(CalcError::from)?;
                Ok(Value::Number(n))
            }),
            ProductionSpec::new("Stat", ["Expr"]).reduce(passthrough),
            ProductionSpec::new("Expr", ["Expr", "+", "Term"]).reduce(binop),
            ProductionSpec::new("Expr", ["Expr", "-", "Term"]).reduce(binop),
            ProductionSpec::new("Expr", ["Term"]).reduce(passthrough),
            ProductionSpec::new("Term", ["Term", "*", "Factor"]).reduce(binop),
            ProductionSpec::new("Term", ["Term", "/", "Factor"]).reduce(binop),
            ProductionSpec::new("Term", ["Factor"]).reduce(passthrough),
            ProductionSpec::new("Factor", ["(", "Expr", ")"]).reduce(|_, mut popped, _| {
                Ok(popped.remove(1).value)
            }),
            ProductionSpec::new("Factor", ["num"]).reduce(|_, popped, _| {
                let n: i64 = lexeme(&popped[0])?.parse()?;
                Ok(Value::Number(n))
            }),
            ProductionSpec::new("Factor", ["id"]).reduce(|_, popped, ctx: &mut SymTab| {
                let index = ctx.intern(lexeme(&popped[0])?);
                Ok(Value::Number(ctx.get(index).map_err(CalcError::from)?))
            }),
        ],
        Some("Stat"),
    )
}

/// The calculator scanner: whitespace, single-character operators labeled
/// by their own lexeme, identifiers, integers.
pub fn calc_lexer() -> Result<Lexer, LexError> {
    Lexer::new(vec![
        (Some(WHITESPACE_CLASS), r"\s+"),
        (None, r"[-+*/()=]"),
        (Some("id"), r"[A-Za-z_][A-Za-z0-9_]*"),
        (Some("num"), r"[0-9]+"),
    ])
}

/// A ready-to-use pipeline: scanner, parser, and the symbol table that
/// persists across statements.
pub struct Calc {
    lexer: Lexer,
    parser: Parser<Value, SymTab>,
    /// Variable bindings, shared by every statement evaluated so far.
    pub symtab: SymTab,
}

impl Calc {
    /// Builds the pipeline. The grammar is conflict-free; a conflict here
    /// means the grammar in this file was edited into ambiguity.
    pub fn try_new() -> Result<Self, CalcError> {
        let parser = calc_parser()?;
        debug_assert!(parser.conflicts().is_empty());
        Ok(Self {
            lexer: calc_lexer()?,
            parser,
            symtab: SymTab::new(),
        })
    }

    /// Evaluates one statement and returns its numeric result.
    pub fn eval(&mut self, statement: &str) -> Result<i64, CalcError> {
        log::trace!("eval {:?}", statement);
        let tokens = self.lexer.tokenize(statement).into_iter().map(|t| {
            Token::with_span(t.symbol, Value::Lexeme(t.lexeme), t.span)
        });
        match self.parser.parse(tokens, &mut self.symtab)? {
            Value::Number(n) => Ok(n),
            _ => Err(CalcError::NotANumber),
        }
    }
}
