//! Stack-slot code emitter
//!
//! Lowers a parsed [`Program`](crate::parser::ast::Program) to an
//! [`instruction::Assembly`]:
//! - [`emitter`]: program and function level lowering, prologue/epilogue
//! - [`scope`]: lexical scopes and slot offsets for one function
//! - [`instruction`]: instruction values and their assembly text
//! - [`errors`]: emission errors
//!
//! # Two passes per function
//!
//! A function body is lowered first; the highest slot offset any nested
//! scope reached then becomes the size reserved by the prologue and released
//! before every `ret`.

pub mod emitter;
pub mod errors;
mod expressions;
pub mod instruction;
pub mod scope;
mod statements;

pub use emitter::{emit_program, Emitter};
pub use errors::EmitError;
pub use instruction::{Assembly, Instruction, Register};
