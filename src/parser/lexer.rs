//! Lexical table for the C subset
//!
//! There is no separate tokenization pass: [`Token`](crate::parser::combinator::Node::Token)
//! parsers ask the [`Lexicon`] to match a single [`TokenKind`] directly at the
//! cursor, after skipping whitespace and `//` line comments. Each kind is a
//! regular expression anchored at the match position.
//!
//! Keywords only match on a word boundary (`int3` is an identifier), and an
//! identifier never matches a reserved word.

use super::ast::SourceLocation;
use regex::Regex;
use std::fmt;

/// Every kind of lexical unit the grammar can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
    // Keywords
    Int,
    Float,
    Return,

    // Names and literals
    Identifier,
    Floating,
    Integer,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Equals,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semicolon,
    Comma,

    // Matches only once all remaining input is whitespace
    EndOfInput,
}

impl TokenKind {
    /// All kinds, in table order
    pub const ALL: [TokenKind; 19] = [
        TokenKind::Int,
        TokenKind::Float,
        TokenKind::Return,
        TokenKind::Identifier,
        TokenKind::Floating,
        TokenKind::Integer,
        TokenKind::Plus,
        TokenKind::Minus,
        TokenKind::Star,
        TokenKind::Slash,
        TokenKind::Percent,
        TokenKind::Equals,
        TokenKind::LParen,
        TokenKind::RParen,
        TokenKind::LBrace,
        TokenKind::RBrace,
        TokenKind::Semicolon,
        TokenKind::Comma,
        TokenKind::EndOfInput,
    ];

    /// Regular expression for this kind, without anchoring
    pub fn pattern(self) -> &'static str {
        match self {
            TokenKind::Int => r"int\b",
            TokenKind::Float => r"float\b",
            TokenKind::Return => r"return\b",
            TokenKind::Identifier => r"[A-Za-z_][A-Za-z0-9_]*",
            TokenKind::Floating => r"[0-9]+\.[0-9]+",
            TokenKind::Integer => r"[0-9]+",
            TokenKind::Plus => r"\+",
            TokenKind::Minus => r"-",
            TokenKind::Star => r"\*",
            TokenKind::Slash => r"/",
            TokenKind::Percent => r"%",
            TokenKind::Equals => r"=",
            TokenKind::LParen => r"\(",
            TokenKind::RParen => r"\)",
            TokenKind::LBrace => r"\{",
            TokenKind::RBrace => r"\}",
            TokenKind::Semicolon => r";",
            TokenKind::Comma => r",",
            TokenKind::EndOfInput => r"\z",
        }
    }

    /// Reserved words, which [`TokenKind::Identifier`] refuses to match
    pub fn is_keyword(text: &str) -> bool {
        matches!(text, "int" | "float" | "return")
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int => write!(f, "'int'"),
            TokenKind::Float => write!(f, "'float'"),
            TokenKind::Return => write!(f, "'return'"),
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::Floating => write!(f, "float literal"),
            TokenKind::Integer => write!(f, "int literal"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Percent => write!(f, "'%'"),
            TokenKind::Equals => write!(f, "'='"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::EndOfInput => write!(f, "end of input"),
        }
    }
}

/// A matched lexical unit: the value a `Token` parser yields.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub kind: TokenKind,
    pub text: String,
    pub location: SourceLocation,
}

impl Lexeme {
    pub fn new(kind: TokenKind, text: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind,
            text: text.into(),
            location,
        }
    }
}

/// Compiled matchers for every [`TokenKind`], plus the whitespace skipper.
#[derive(Debug, Clone)]
pub struct Lexicon {
    skip: Regex,
    matchers: Vec<Regex>,
}

impl Lexicon {
    pub fn new() -> Result<Self, regex::Error> {
        let skip = Regex::new(r"^(?:\s|//[^\n]*)*")?;
        let matchers = TokenKind::ALL
            .iter()
            .map(|kind| Regex::new(&format!("^(?:{})", kind.pattern())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { skip, matchers })
    }

    /// Position of the first non-skippable character at or after `pos`
    pub fn skip_whitespace(&self, text: &str, pos: usize) -> usize {
        match self.skip.find(&text[pos..]) {
            Some(m) => pos + m.end(),
            None => pos,
        }
    }

    /// Try to match `kind` starting exactly at `pos`; returns the end offset.
    pub fn match_at(&self, kind: TokenKind, text: &str, pos: usize) -> Option<usize> {
        let rest = &text[pos..];
        let m = self.matchers[kind.index()].find(rest)?;
        let matched = m.as_str();

        match kind {
            TokenKind::Identifier if TokenKind::is_keyword(matched) => return None,
            // A digit run followed by '.' is the start of a float literal
            TokenKind::Integer if rest[m.end()..].starts_with('.') => return None,
            _ => {}
        }

        Some(pos + m.end())
    }
}
