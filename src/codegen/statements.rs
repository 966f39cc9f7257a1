//! Statement lowering
//!
//! Implemented as `pub(crate)` methods on [`FunctionEmitter`]:
//! - Blocks open a nested scope for their duration
//! - Definitions claim a slot in the innermost scope, then store the initializer
//! - Returns move the result to `w0`, release the frame and `ret`
//!
//! The frame size is unknown until the whole body has been walked, so each
//! `Release` is emitted with a placeholder size and recorded for patching.

use super::emitter::FunctionEmitter;
use super::errors::EmitError;
use super::instruction::{Instruction, Register};
use crate::parser::ast::*;

impl FunctionEmitter<'_> {
    pub(crate) fn emit_block(&mut self, statements: &[AstNode]) -> Result<(), EmitError> {
        self.frame.push_scope();
        for statement in statements {
            self.emit(statement)?;
        }
        self.frame.pop_scope();
        Ok(())
    }

    pub(crate) fn emit_definition(
        &mut self,
        name: &str,
        var_type: TypeName,
        init: Option<&AstNode>,
        location: SourceLocation,
    ) -> Result<(), EmitError> {
        let slot = self.frame.declare(name, var_type, location)?;
        if let Some(init) = init {
            self.emit(init)?;
            self.code.push(Instruction::Store {
                src: Register::W8,
                offset: slot.address(self.spilled),
            });
        }
        Ok(())
    }

    pub(crate) fn emit_assignment(
        &mut self,
        name: &str,
        value: &AstNode,
        location: SourceLocation,
    ) -> Result<(), EmitError> {
        self.emit(value)?;
        self.store_variable(name, location)
    }

    pub(crate) fn emit_return(&mut self, expr: &AstNode) -> Result<(), EmitError> {
        self.emit(expr)?;
        self.code.push(Instruction::Move {
            dst: Register::RETURN,
            src: Register::W8,
        });
        self.emit_epilogue();
        Ok(())
    }

    pub(crate) fn emit_epilogue(&mut self) {
        self.releases.push(self.code.len());
        self.code.push(Instruction::Release(0));
        self.code.push(Instruction::Ret);
    }
}
