//! The boundary scanner: an ordered list of `(class, pattern)` rules
//! matched against the remaining input in *list order*: the first rule
//! that matches at the current position wins, not the longest match.
//!
//! A rule without a class labels its token with the matched lexeme itself,
//! which is how single-character operators become their own terminal
//! symbols. The `white` class is skipped by default. Input no rule can
//! match is skipped one character at a time, with one warning per run of
//! garbage. Tokens carry 1-based line/column spans.

use crate::error::{LexError, Position, Span};
use regex::Regex;
use smartstring::alias::String;

/// Class name of tokens the scanner drops unless told otherwise.
pub const WHITESPACE_CLASS: &str = "white";

#[derive(Debug)]
struct LexRule {
    class: Option<String>,
    pattern: Regex,
}

/// A scanned token: the parser-facing symbol, the matched text, and where
/// it sat in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexToken {
    /// Symbol the parser will see: the rule's class, or the lexeme itself
    /// for classless rules.
    pub symbol: String,
    /// The matched input text.
    pub lexeme: String,
    /// Location of the lexeme.
    pub span: Span,
}

/// The list-order scanner.
#[derive(Debug)]
pub struct Lexer {
    rules: Vec<LexRule>,
    keep_white: bool,
}

impl Lexer {
    /// Compiles a rule list. Rule order is match priority.
    pub fn new<'a, I>(rules: I) -> Result<Self, LexError>
    where
        I: IntoIterator<Item = (Option<&'a str>, &'a str)>,
    {
        let mut compiled = Vec::new();
        for (index, (class, pattern)) in rules.into_iter().enumerate() {
            let pattern = Regex::new(pattern)
                .map_err(|source| LexError::BadPattern { index, source })?;
            compiled.push(LexRule {
                class: class.map(Into::into),
                pattern,
            });
        }
        Ok(Self {
            rules: compiled,
            keep_white: false,
        })
    }

    /// Keeps `white`-class tokens in the output instead of dropping them.
    pub fn keep_white(mut self, keep: bool) -> Self {
        self.keep_white = keep;
        self
    }

    /// Scans the whole input. The end marker is *not* appended; the parse
    /// driver synthesizes it.
    pub fn tokenize(&self, input: &str) -> Vec<LexToken> {
        let mut tokens = Vec::new();
        let mut rest = input;
        let mut pos = Position::new(1, 1);
        let mut quiet = false;

        while !rest.is_empty() {
            match self.match_at(rest) {
                Some((rule, lexeme)) => {
                    quiet = false;
                    let start = pos;
                    pos = advance(pos, lexeme);
                    let symbol = match &rule.class {
                        Some(class) => class.clone(),
                        None => lexeme.into(),
                    };
                    rest = &rest[lexeme.len()..];
                    if self.keep_white || symbol != WHITESPACE_CLASS {
                        tokens.push(LexToken {
                            symbol,
                            lexeme: lexeme.into(),
                            span: Span::new(start, pos),
                        });
                    }
                }
                None => {
                    if !quiet {
                        quiet = true;
                        log::warn!(
                            "no rule matches input at {}:{}: {:?}...",
                            pos.line,
                            pos.column,
                            rest.chars().take(10).collect::<std::string::String>()
                        );
                    }
                    let mut chars = rest.chars();
                    if let Some(c) = chars.next() {
                        let mut skipped = [0u8; 4];
                        pos = advance(pos, c.encode_utf8(&mut skipped));
                    }
                    rest = chars.as_str();
                }
            }
        }
        tokens
    }

    /// The first rule matching at the start of `rest`, in list order.
    /// Zero-width matches are ignored; a rule that consumes nothing
    /// cannot make progress.
    fn match_at<'a>(&self, rest: &'a str) -> Option<(&LexRule, &'a str)> {
        for rule in &self.rules {
            if let Some(m) = rule.pattern.find(rest) {
                if m.start() == 0 && !m.is_empty() {
                    return Some((rule, m.as_str()));
                }
            }
        }
        None
    }
}

fn advance(mut pos: Position, text: &str) -> Position {
    for c in text.chars() {
        if c == '\n' {
            pos.line += 1;
            pos.column = 1;
        } else {
            pos.column += 1;
        }
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn calc_lexer() -> Lexer {
        Lexer::new(vec![
            (Some(WHITESPACE_CLASS), r"\s+"),
            (None, r"[-+*/()=]"),
            (Some("id"), r"[A-Za-z_][A-Za-z0-9_]*"),
            (Some("num"), r"[0-9]+"),
        ])
        .unwrap()
    }

    fn symbols(tokens: &[LexToken]) -> Vec<&str> {
        tokens.iter().map(|t| t.symbol.as_str()).collect()
    }

    #[test]
    fn classes_and_lexeme_labels() {
        let tokens = calc_lexer().tokenize("a = 1 + 20");
        assert_eq!(symbols(&tokens), vec!["id", "=", "num", "+", "num"]);
        assert_eq!(tokens[2].lexeme, "1");
        assert_eq!(tokens[4].lexeme, "20");
    }

    #[test]
    fn list_order_wins_over_longest_match() {
        // The first rule only takes one letter, but sits before the
        // greedy identifier rule, so it wins every time.
        let lexer = Lexer::new(vec![
            (Some("letter"), r"[a-z]"),
            (Some("word"), r"[a-z]+"),
        ])
        .unwrap();
        let tokens = lexer.tokenize("ab");
        assert_eq!(symbols(&tokens), vec!["letter", "letter"]);
    }

    #[test]
    fn whitespace_is_dropped_unless_kept() {
        let tokens = calc_lexer().tokenize("1 + 2");
        assert_eq!(symbols(&tokens), vec!["num", "+", "num"]);

        let kept = calc_lexer().keep_white(true).tokenize("1 + 2");
        assert_eq!(
            symbols(&kept),
            vec!["num", "white", "+", "white", "num"]
        );
    }

    #[test]
    fn unmatchable_input_is_skipped_without_stalling() {
        init_logger();
        let tokens = calc_lexer().tokenize("1 §§ 2");
        assert_eq!(symbols(&tokens), vec!["num", "num"]);
    }

    #[test]
    fn spans_track_lines_and_columns() {
        let tokens = calc_lexer().tokenize("1 +\nab");
        assert_eq!(tokens[0].span.start, Position::new(1, 1));
        assert_eq!(tokens[1].span.start, Position::new(1, 3));
        assert_eq!(tokens[2].span.start, Position::new(2, 1));
        assert_eq!(tokens[2].span.end, Position::new(2, 3));
    }

    #[test]
    fn bad_pattern_is_reported_with_its_index() {
        let err = Lexer::new(vec![(Some("x"), r"["), (None, r"a")]).unwrap_err();
        let LexError::BadPattern { index, .. } = err;
        assert_eq!(index, 0);
    }

    #[test]
    fn zero_width_matches_cannot_stall_the_scanner() {
        let lexer = Lexer::new(vec![(Some("empty"), r"x*"), (Some("y"), r"y")]).unwrap();
        let tokens = lexer.tokenize("yy");
        assert_eq!(symbols(&tokens), vec!["y", "y"]);
    }
}
