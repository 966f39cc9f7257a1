//! Packrat parse engine
//!
//! A [`Session`] runs rules of a [`Grammar`] against one source text. Every
//! arena rule goes through [`Session::parse`], which consults the bounded
//! [`MemoCache`] keyed by `(rule, position)` before doing any work and records
//! the outcome afterwards, failures included.
//!
//! # Cursor discipline
//!
//! A rule that does not match leaves the cursor exactly where it started.
//! `Many` commits each successful iteration and never fails.
//!
//! # Nesting
//!
//! Every rule invocation recurses on the native stack. Before descending,
//! [`Session::parse`] makes sure enough stack remains and switches to a new
//! segment when it does not, so deep but valid input never overflows the
//! calling thread. [`ParseConfig::max_depth`] still bounds the nesting.
//!
//! # Tracing
//!
//! With the `trace` log level enabled each rule attempt is logged as
//! `PARSING`, `SUCCEEDED` or `FAILED`, indented by nesting depth.

use super::ast::SourceLocation;
use super::cache::{CacheStats, MemoCache};
use super::combinator::{Grammar, Node, ParserId, Parsed};
use super::cursor::Cursor;
use super::errors::{ParseError, ParseFault};
use super::lexer::{Lexeme, TokenKind};
use crate::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_DEPTH, STACK_RED_ZONE, STACK_SEGMENT_SIZE,
};
use log::{debug, log_enabled, trace, Level};

/// Tunables for one parse invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    /// Memo entries kept before evicting the oldest; 0 disables memoization
    pub cache_capacity: usize,
    /// Nested rule invocations allowed before the parse is aborted
    pub max_depth: usize,
}

impl ParseConfig {
    pub fn new() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn without_memo(self) -> Self {
        self.with_cache_capacity(0)
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self::new()
    }
}

type MemoEntry = (Option<Parsed>, usize);

/// State of a single parse: cursor, memo table and failure bookkeeping
pub struct Session<'g, 'a> {
    grammar: &'g Grammar,
    cursor: Cursor<'a>,
    cache: MemoCache<(ParserId, usize), MemoEntry>,
    config: ParseConfig,
    depth: usize,
    furthest: usize,
    expected: Vec<TokenKind>,
}

impl<'g, 'a> Session<'g, 'a> {
    pub fn new(grammar: &'g Grammar, text: &'a str, config: ParseConfig) -> Self {
        Self {
            grammar,
            cursor: Cursor::new(text),
            cache: MemoCache::new(config.cache_capacity),
            config,
            depth: 0,
            furthest: 0,
            expected: Vec::new(),
        }
    }

    pub fn cursor(&self) -> &Cursor<'a> {
        &self.cursor
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Furthest position a token attempt reached, and the kinds tried there
    pub fn furthest_failure(&self) -> (SourceLocation, Vec<TokenKind>) {
        let mut expected = self.expected.clone();
        expected.sort();
        (self.cursor.location_of(self.furthest), expected)
    }

    /// Run an arena rule at the current position.
    ///
    /// `Ok(None)` means the rule did not match; the cursor is unchanged.
    pub fn parse(&mut self, id: ParserId) -> Result<Option<Parsed>, ParseFault> {
        let start = self.cursor.position();
        let key = (id, start);

        if let Some((result, end)) = self.cache.get(&key) {
            self.cursor.restore(end);
            if log_enabled!(Level::Trace) {
                trace!(
                    "{:indent$}CACHED {} @{} -> {}",
                    "",
                    self.grammar.describe(id),
                    start,
                    if result.is_some() { "match" } else { "no match" },
                    indent = self.depth * 2
                );
            }
            return Ok(result);
        }

        let grammar = self.grammar;
        let node = grammar.node(id).ok_or(ParseFault::UnknownParser { id })?;

        if self.depth >= self.config.max_depth {
            return Err(ParseFault::RecursionLimit {
                limit: self.config.max_depth,
            });
        }

        let traced = log_enabled!(Level::Trace);
        if traced {
            trace!(
                "{:indent$}PARSING {} @{}",
                "",
                grammar.describe(id),
                start,
                indent = self.depth * 2
            );
        }

        self.depth += 1;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT_SIZE, || {
            self.run_node(node)
        });
        self.depth -= 1;
        let result = result?;

        if result.is_none() {
            self.cursor.restore(start);
        }
        if traced {
            trace!(
                "{:indent$}{} {} @{}..{}",
                "",
                if result.is_some() { "SUCCEEDED" } else { "FAILED" },
                grammar.describe(id),
                start,
                self.cursor.position(),
                indent = self.depth * 2
            );
        }

        self.cache
            .insert(key, (result.clone(), self.cursor.position()));
        Ok(result)
    }

    /// Match logic for one node; used directly for continuation-built nodes,
    /// which have no arena identity and so bypass the memo table.
    fn run_node(&mut self, node: &Node) -> Result<Option<Parsed>, ParseFault> {
        match node {
            Node::Token(kind) => Ok(self.match_token(*kind)),

            Node::Constant(value) => Ok(Some(value.clone())),

            Node::Or(children) => {
                for &child in children {
                    if let Some(value) = self.parse(child)? {
                        return Ok(Some(value));
                    }
                }
                Ok(None)
            }

            Node::And(children) => {
                let start = self.cursor.position();
                let mut items = Vec::with_capacity(children.len());
                for &child in children {
                    match self.parse(child)? {
                        Some(value) => items.push(value),
                        None => {
                            self.cursor.restore(start);
                            return Ok(None);
                        }
                    }
                }
                Ok(Some(Parsed::Seq(items)))
            }

            Node::Many(child) => {
                let mut items = Vec::new();
                loop {
                    let before = self.cursor.position();
                    match self.parse(*child)? {
                        // A match that consumed nothing would repeat forever
                        Some(value) if self.cursor.position() > before => items.push(value),
                        _ => break,
                    }
                }
                Ok(Some(Parsed::Seq(items)))
            }

            Node::Maybe(child, default) => match self.parse(*child)? {
                Some(value) => Ok(Some(value)),
                None => Ok(Some(default.clone())),
            },

            Node::Bind(child, continuation) => {
                let start = self.cursor.position();
                let value = match self.parse(*child)? {
                    Some(value) => value,
                    None => return Ok(None),
                };
                let next = continuation(value)?;
                let result = self.run_node(&next)?;
                if result.is_none() {
                    self.cursor.restore(start);
                }
                Ok(result)
            }

            Node::Placeholder(name) => Err(ParseFault::UnresolvedPlaceholder { name: name.clone() }),
        }
    }

    fn match_token(&mut self, kind: TokenKind) -> Option<Parsed> {
        let grammar = self.grammar;
        let lexicon = grammar.lexicon();
        let text = self.cursor.text();
        let start = lexicon.skip_whitespace(text, self.cursor.position());

        match lexicon.match_at(kind, text, start) {
            Some(end) => {
                let location = self.cursor.location_of(start);
                self.cursor.advance_to(end);
                Some(Parsed::Token(Lexeme::new(kind, &text[start..end], location)))
            }
            None => {
                self.note_failure(start, kind);
                None
            }
        }
    }

    fn note_failure(&mut self, position: usize, kind: TokenKind) {
        if position > self.furthest {
            self.furthest = position;
            self.expected.clear();
        }
        if position == self.furthest && !self.expected.contains(&kind) {
            self.expected.push(kind);
        }
    }

    /// Record that the input did not end where a whole-input parse stopped
    fn note_trailing_input(&mut self) {
        let grammar = self.grammar;
        let lexicon = grammar.lexicon();
        let rest = lexicon.skip_whitespace(self.cursor.text(), self.cursor.position());
        self.note_failure(rest, TokenKind::EndOfInput);
    }

    fn at_end_of_input(&self) -> bool {
        let lexicon = self.grammar.lexicon();
        lexicon.skip_whitespace(self.cursor.text(), self.cursor.position()) == self.cursor.text().len()
    }

    fn log_stats(&self) {
        let stats = self.cache.stats();
        debug!(
            "parse finished at {}: {} cache hits, {} misses, {} evictions",
            self.cursor.position(),
            stats.hits,
            stats.misses,
            stats.evictions
        );
    }
}

impl Grammar {
    /// Run `rule` from the start of `text` without requiring it to consume
    /// everything. Returns the value and the end position.
    pub fn parse_prefix(
        &self,
        rule: ParserId,
        text: &str,
        config: ParseConfig,
    ) -> Result<Option<(Parsed, usize)>, ParseFault> {
        let mut session = Session::new(self, text, config);
        let result = session.parse(rule)?;
        session.log_stats();
        Ok(result.map(|value| (value, session.cursor().position())))
    }

    /// Run `rule` over all of `text`; only whitespace may follow the match.
    pub fn parse_complete(
        &self,
        rule: ParserId,
        text: &str,
        config: ParseConfig,
    ) -> Result<Parsed, ParseError> {
        let mut session = Session::new(self, text, config);
        let result = session.parse(rule)?;
        session.log_stats();

        match result {
            Some(value) if session.at_end_of_input() => Ok(value),
            matched => {
                if matched.is_some() {
                    session.note_trailing_input();
                }
                let (furthest, expected) = session.furthest_failure();
                Err(ParseError::NoMatch {
                    location: session.cursor().location_of(0),
                    furthest,
                    expected,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::combinator::GrammarBuilder;

    fn token_text(value: &Parsed) -> &str {
        match value {
            Parsed::Token(lexeme) => &lexeme.text,
            other => panic!("Expected token, got {}", other.shape()),
        }
    }

    #[test]
    fn test_token_skips_leading_whitespace() {
        let mut g = GrammarBuilder::new();
        let int = g.token(TokenKind::Int);
        let grammar = g.finish().expect("grammar builds");

        let mut session = Session::new(&grammar, "   \nint   int", ParseConfig::new());
        let first = session.parse(int).expect("no fault").expect("matches");
        assert_eq!(token_text(&first), "int");
        assert_eq!(session.cursor().position(), 7);

        let second = session.parse(int).expect("no fault").expect("matches");
        assert_eq!(token_text(&second), "int");
        assert!(session.cursor().is_at_end());
    }

    #[test]
    fn test_token_failure_keeps_position() {
        let mut g = GrammarBuilder::new();
        let int = g.token(TokenKind::Int);
        let grammar = g.finish().expect("grammar builds");

        for text in ["intint", "int3 int", "  x"] {
            let mut session = Session::new(&grammar, text, ParseConfig::new());
            assert_eq!(session.parse(int).expect("no fault"), None, "{}", text);
            assert_eq!(session.cursor().position(), 0);
        }
    }

    #[test]
    fn test_and_restores_on_failure() {
        let mut g = GrammarBuilder::new();
        let int = g.token(TokenKind::Int);
        let ident = g.token(TokenKind::Identifier);
        let semi = g.token(TokenKind::Semicolon);
        let decl = g.and([int, ident, semi]);
        let grammar = g.finish().expect("grammar builds");

        let mut session = Session::new(&grammar, "int a =", ParseConfig::new());
        assert_eq!(session.parse(decl).expect("no fault"), None);
        assert_eq!(session.cursor().position(), 0);

        let (furthest, expected) = session.furthest_failure();
        assert_eq!(furthest.column, 7);
        assert_eq!(expected, vec![TokenKind::Semicolon]);
    }

    #[test]
    fn test_many_stops_on_zero_width_match() {
        let mut g = GrammarBuilder::new();
        let int = g.token(TokenKind::Integer);
        let maybe = g.maybe(int, Parsed::Empty);
        let many = g.many(maybe);
        let grammar = g.finish().expect("grammar builds");

        let (value, end) = grammar
            .parse_prefix(many, "1 2 x", ParseConfig::new())
            .expect("no fault")
            .expect("many never fails");
        assert_eq!(end, 3);
        match value {
            Parsed::Seq(items) => assert_eq!(items.len(), 2),
            other => panic!("Expected sequence, got {}", other.shape()),
        }
    }

    #[test]
    fn test_bind_runs_continuation_parser() {
        let mut g = GrammarBuilder::new();
        let int = g.token(TokenKind::Integer);
        let semi = g.token(TokenKind::Semicolon);
        // A zero stands alone; any other number must be followed by ';'
        let stmt = g.bind(int, move |value| match value {
            Parsed::Token(ref lexeme) if lexeme.text == "0" => Ok(Node::Constant(Parsed::Empty)),
            _ => Ok(Node::And(vec![semi])),
        });
        let grammar = g.finish().expect("grammar builds");

        let (value, end) = grammar
            .parse_prefix(stmt, "42 ;", ParseConfig::new())
            .expect("no fault")
            .expect("matches");
        assert_eq!(end, 4);
        assert!(matches!(value, Parsed::Seq(ref items) if items.len() == 1));

        let (value, end) = grammar
            .parse_prefix(stmt, "0 +", ParseConfig::new())
            .expect("no fault")
            .expect("matches");
        assert_eq!((value, end), (Parsed::Empty, 1));

        let failed = grammar
            .parse_prefix(stmt, "42 +", ParseConfig::new())
            .expect("no fault");
        assert_eq!(failed, None);
    }

    #[test]
    fn test_placeholder_is_fatal() {
        let mut g = GrammarBuilder::new();
        let hole = g.reflection();
        let int = g.token(TokenKind::Integer);
        let pair = g.and([int, hole]);
        let grammar = g.finish().expect("grammar builds");

        match grammar.parse_prefix(pair, "1 2", ParseConfig::new()) {
            Err(ParseFault::UnresolvedPlaceholder { name }) => assert_eq!(name, "<reflection>"),
            other => panic!("Expected UnresolvedPlaceholder, got {:?}", other),
        }
    }

    #[test]
    fn test_recursion_limit() {
        let mut g = GrammarBuilder::new();
        let expr = g.declare("expr");
        let plus = g.token(TokenKind::Plus);
        let left_recursive = g.and([expr, plus]);
        g.define(expr, Node::Or(vec![left_recursive])).expect("defines");
        let grammar = g.finish().expect("grammar builds");

        let config = ParseConfig::new().with_max_depth(50);
        assert_eq!(
            grammar.parse_prefix(expr, "+", config),
            Err(ParseFault::RecursionLimit { limit: 50 })
        );
    }

    #[test]
    fn test_parse_complete_reports_trailing_input() {
        let mut g = GrammarBuilder::new();
        let int = g.token(TokenKind::Integer);
        let grammar = g.finish().expect("grammar builds");

        match grammar.parse_complete(int, "1 2", ParseConfig::new()) {
            Err(ParseError::NoMatch { furthest, expected, .. }) => {
                assert_eq!(furthest.column, 3);
                assert_eq!(expected, vec![TokenKind::EndOfInput]);
            }
            other => panic!("Expected NoMatch, got {:?}", other),
        }
    }
}
