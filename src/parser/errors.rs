//! Error types for grammar construction and parsing
//!
//! A rule that does not match is *not* an error: the engine reports it as
//! `Ok(None)` and the caller backtracks. The types here cover the cases that
//! end a parse for good:
//! - [`GrammarError`]: a grammar was wired incorrectly before any parsing
//! - [`ParseFault`]: a programming error or resource limit hit mid-parse
//! - [`ParseError`]: what a caller of a whole-input parse sees

use super::ast::SourceLocation;
use super::combinator::ParserId;
use super::lexer::TokenKind;

/// Errors raised while building a grammar
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("rule '{name}' was declared but never defined")]
    UndefinedRule { name: String },

    #[error("rule '{name}' is already defined")]
    AlreadyDefined { name: String },

    #[error("parser #{id} does not exist in this grammar")]
    UnknownParser { id: ParserId },

    #[error("invalid lexical table: {0}")]
    Lexicon(#[from] regex::Error),
}

/// Fatal conditions that abort a parse immediately
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFault {
    /// A forward reference was run before being defined or substituted
    #[error("unresolved placeholder '{name}' was invoked")]
    UnresolvedPlaceholder { name: String },

    /// A bind continuation received a value it was not written for
    #[error("rule '{rule}' received an unexpected value: {found}")]
    UnexpectedShape { rule: &'static str, found: String },

    #[error("recursion limit of {limit} nested rules exceeded")]
    RecursionLimit { limit: usize },

    #[error("parser #{id} does not exist in this grammar")]
    UnknownParser { id: ParserId },
}

/// Result of parsing a whole input
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Parse error at line {}, column {}: {}", .furthest.line, .furthest.column, describe_expected(.expected))]
    NoMatch {
        /// Where the failed rule started
        location: SourceLocation,
        /// Furthest position any token attempt reached
        furthest: SourceLocation,
        /// Token kinds that were tried at the furthest position
        expected: Vec<TokenKind>,
    },

    #[error(transparent)]
    Fault(#[from] ParseFault),
}

impl ParseError {
    pub fn is_fault(&self) -> bool {
        matches!(self, ParseError::Fault(_))
    }
}

fn describe_expected(expected: &[TokenKind]) -> String {
    match expected {
        [] => "unexpected input".to_string(),
        [only] => format!("expected {}", only),
        kinds => {
            let names: Vec<String> = kinds.iter().map(|k| k.to_string()).collect();
            format!("expected one of {}", names.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_message() {
        let err = ParseError::NoMatch {
            location: SourceLocation::new(1, 1),
            furthest: SourceLocation::new(2, 7),
            expected: vec![TokenKind::Semicolon],
        };
        assert_eq!(
            err.to_string(),
            "Parse error at line 2, column 7: expected ';'"
        );
        assert!(!err.is_fault());
    }

    #[test]
    fn test_fault_is_transparent() {
        let err: ParseError = ParseFault::RecursionLimit { limit: 3 }.into();
        assert!(err.is_fault());
        assert_eq!(err.to_string(), "recursion limit of 3 nested rules exceeded");
    }
}
