//! # Introduction
//!
//! pcc compiles a small C subset to AArch64-flavoured assembly. Its front end
//! is a generic backtracking parser-combinator engine with packrat
//! memoization; the grammar is plain data (an arena of combinator nodes) that
//! is flattened by an optimizer before use.
//!
//! ## Compilation pipeline
//!
//! ```text
//! Source → Combinator grammar (memoized) → AST → Emitter → Assembly
//! ```
//!
//! 1. [`parser`]: combinator algebra, packrat engine, grammar optimizer and
//!    the C grammar whose bind continuations build the AST.
//! 2. [`codegen`]: walks the AST, assigns stack slots per lexical scope and
//!    produces an ordered instruction list.
//!
//! ## Example
//!
//! ```
//! use pcc::{compile, CompileOptions};
//!
//! let asm = compile("int main() { int a = 1 + 2; return a; }", &CompileOptions::default())
//!     .expect("compiles");
//! assert!(asm.to_string().contains("_main:"));
//! ```

pub mod codegen;
pub mod constants;
pub mod parser;

use codegen::{Assembly, EmitError};
use parser::ast::Program;
use parser::{CGrammar, GrammarError, GrammarOptions, ParseConfig, ParseError};

/// Everything that shapes one compilation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub grammar: GrammarOptions,
    pub parse: ParseConfig,
}

/// Any failure between source text and assembly
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("grammar construction failed: {0}")]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    /// Whether the failure is a defect in the compiler rather than in its input
    pub fn is_internal(&self) -> bool {
        match self {
            CompileError::Grammar(_) => true,
            CompileError::Parse(err) => err.is_fault(),
            CompileError::Emit(err) => matches!(err, EmitError::Unsupported { .. }),
            CompileError::Io(_) => false,
        }
    }

    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        if self.is_internal() {
            3
        } else {
            1
        }
    }
}

/// Parse a translation unit with a freshly built grammar
pub fn parse(source: &str, options: &CompileOptions) -> Result<Program, CompileError> {
    let grammar = CGrammar::build(options.grammar)?;
    Ok(grammar.parse_program(source, options.parse)?)
}

/// Parse and lower a translation unit
pub fn compile(source: &str, options: &CompileOptions) -> Result<Assembly, CompileError> {
    let program = parse(source, options)?;
    Ok(codegen::emit_program(&program)?)
}
