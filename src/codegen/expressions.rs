//! Expression lowering
//!
//! Every expression leaves its value in `w8`. A binary expression evaluates
//! its left operand, parks it on the machine stack, evaluates the right
//! operand, moves it to `w9`, restores the left operand into `w8` and applies
//! the opcode. While an operand is parked, `sp` is lower by [`SPILL_SIZE`],
//! so slot addresses are shifted by the parked byte count.

use super::emitter::{symbol, FunctionEmitter};
use super::errors::EmitError;
use super::instruction::{ArithOp, Instruction, Register};
use crate::constants::SPILL_SIZE;
use crate::parser::ast::*;

impl FunctionEmitter<'_> {
    pub(crate) fn emit_constant(
        &mut self,
        literal: Literal,
        location: SourceLocation,
    ) -> Result<(), EmitError> {
        match literal {
            Literal::Int(value) => {
                let value = EmitError::check_int(value, location)?;
                self.code.push(Instruction::MoveImmediate {
                    dst: Register::W8,
                    value: i64::from(value),
                });
                Ok(())
            }
            Literal::Float(_) => Err(EmitError::unsupported("floating-point arithmetic", location)),
        }
    }

    pub(crate) fn load_variable(&mut self, name: &str, location: SourceLocation) -> Result<(), EmitError> {
        if let Some(slot) = self.frame.resolve(name) {
            self.code.push(Instruction::Load {
                dst: Register::W8,
                offset: slot.address(self.spilled),
            });
            return Ok(());
        }

        self.check_global(name, location)?;
        self.code.push(Instruction::PageAddress {
            dst: Register::X9,
            symbol: symbol(name),
        });
        self.code.push(Instruction::LoadGlobal {
            dst: Register::W8,
            base: Register::X9,
            symbol: symbol(name),
        });
        Ok(())
    }

    /// Store `w8` into the variable `name`
    pub(crate) fn store_variable(&mut self, name: &str, location: SourceLocation) -> Result<(), EmitError> {
        if let Some(slot) = self.frame.resolve(name) {
            self.code.push(Instruction::Store {
                src: Register::W8,
                offset: slot.address(self.spilled),
            });
            return Ok(());
        }

        self.check_global(name, location)?;
        self.code.push(Instruction::PageAddress {
            dst: Register::X9,
            symbol: symbol(name),
        });
        self.code.push(Instruction::StoreGlobal {
            src: Register::W8,
            base: Register::X9,
            symbol: symbol(name),
        });
        Ok(())
    }

    fn check_global(&self, name: &str, location: SourceLocation) -> Result<(), EmitError> {
        if self.globals.contains_key(name) {
            Ok(())
        } else {
            Err(EmitError::UnresolvedIdentifier {
                name: name.to_string(),
                location,
            })
        }
    }

    pub(crate) fn emit_unary(&mut self, op: UnOp, operand: &AstNode) -> Result<(), EmitError> {
        // A negated literal is one constant, so `-2147483648` stays in range
        if let (UnOp::Neg, AstNode::Constant(Literal::Int(value), location)) = (op, operand) {
            return self.emit_constant(Literal::Int(value.saturating_neg()), *location);
        }

        self.emit(operand)?;
        if op == UnOp::Neg {
            self.code.push(Instruction::Negate {
                dst: Register::W8,
                src: Register::W8,
            });
        }
        Ok(())
    }

    pub(crate) fn emit_binary(
        &mut self,
        op: BinOp,
        left: &AstNode,
        right: &AstNode,
    ) -> Result<(), EmitError> {
        self.emit(left)?;
        self.code.push(Instruction::Push(Register::W8));
        self.spilled += SPILL_SIZE;

        self.emit(right)?;
        self.code.push(Instruction::Move {
            dst: Register::W9,
            src: Register::W8,
        });
        self.code.push(Instruction::Pop(Register::W8));
        self.spilled -= SPILL_SIZE;

        let arith = |op| Instruction::Arith {
            op,
            dst: Register::W8,
            lhs: Register::W8,
            rhs: Register::W9,
        };
        match op {
            BinOp::Add => self.code.push(arith(ArithOp::Add)),
            BinOp::Sub => self.code.push(arith(ArithOp::Sub)),
            BinOp::Mul => self.code.push(arith(ArithOp::Mul)),
            BinOp::Div => self.code.push(arith(ArithOp::SDiv)),
            BinOp::Mod => {
                self.code.push(Instruction::Arith {
                    op: ArithOp::SDiv,
                    dst: Register::W10,
                    lhs: Register::W8,
                    rhs: Register::W9,
                });
                self.code.push(Instruction::MultiplySubtract {
                    dst: Register::W8,
                    lhs: Register::W10,
                    rhs: Register::W9,
                    acc: Register::W8,
                });
            }
        }
        Ok(())
    }
}
