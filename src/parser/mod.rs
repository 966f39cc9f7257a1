//! Packrat parser-combinator front end
//!
//! This module turns C source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: lexical table (token kind → anchored regex)
//! - [`cursor`]: source position and line/column lookup
//! - [`combinator`]: node arena, combinator kinds and the grammar builder
//! - [`engine`]: memoized evaluation of rules against a cursor
//! - [`cache`]: bounded memo table
//! - [`optimize`]: Or/And associativity flattening
//! - [`grammar`]: the C grammar and its AST-building continuations
//! - [`ast`]: AST node definitions
//!
//! # Supported C Subset
//!
//! - Types: `int`, `float`
//! - Statements: definitions, assignments, `return`, expression statements,
//!   empty statements, nested blocks
//! - Expressions: `+ - * / %`, unary `+`/`-`, parentheses, integer and float
//!   literals, variables
//! - Top level: function definitions and global definitions
//!
//! # Parser Implementation
//!
//! Scannerless backtracking combinators with a per-parse memo table. No
//! parser generator is involved; the grammar is plain Rust data built once
//! and optimized before use.

pub mod ast;
pub mod cache;
pub mod combinator;
pub mod cursor;
pub mod engine;
pub mod errors;
pub mod grammar;
pub mod lexer;
pub mod optimize;

pub use engine::{ParseConfig, Session};
pub use errors::{GrammarError, ParseError, ParseFault};
pub use grammar::{Associativity, CGrammar, GrammarOptions};
