//! Emitted instructions and their assembly text
//!
//! The emitter targets an AArch64-flavoured stack machine: every value lives
//! in a 32-bit `w` register or a stack slot addressed from `sp`. Rendering
//! is one line per [`Instruction`]; labels start at column 0 and everything
//! else is indented.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// Argument / return registers `w0`..`w7`
    Arg(u8),
    /// Left operand and expression result
    W8,
    /// Right operand
    W9,
    /// Scratch for the quotient in `%`
    W10,
    /// Page base for global accesses
    X9,
}

impl Register {
    /// Register holding the function result
    pub const RETURN: Register = Register::Arg(0);
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Register::Arg(n) => write!(f, "w{}", n),
            Register::W8 => write!(f, "w8"),
            Register::W9 => write!(f, "w9"),
            Register::W10 => write!(f, "w10"),
            Register::X9 => write!(f, "x9"),
        }
    }
}

/// Three-register arithmetic opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    SDiv,
}

impl ArithOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "sub",
            ArithOp::Mul => "mul",
            ArithOp::SDiv => "sdiv",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    // Directives
    Section(&'static str),
    Global(String),
    Align(u32),
    Label(String),
    Word(i64),
    Float(f64),

    // Frame management
    Reserve(usize),
    Release(usize),

    // Data movement
    MoveImmediate { dst: Register, value: i64 },
    Move { dst: Register, src: Register },
    Load { dst: Register, offset: usize },
    Store { src: Register, offset: usize },
    Push(Register),
    Pop(Register),
    PageAddress { dst: Register, symbol: String },
    LoadGlobal { dst: Register, base: Register, symbol: String },
    StoreGlobal { src: Register, base: Register, symbol: String },

    // Arithmetic
    Negate { dst: Register, src: Register },
    Arith { op: ArithOp, dst: Register, lhs: Register, rhs: Register },
    /// `dst = acc - lhs * rhs`
    MultiplySubtract { dst: Register, lhs: Register, rhs: Register, acc: Register },

    Ret,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Instruction::Label(name) = self {
            return write!(f, "{}:", name);
        }

        write!(f, "    ")?;
        match self {
            Instruction::Section(name) => write!(f, "{}", name),
            Instruction::Global(name) => write!(f, ".globl {}", name),
            Instruction::Align(power) => write!(f, ".p2align {}", power),
            Instruction::Word(value) => write!(f, ".word {}", value),
            Instruction::Float(value) => write!(f, ".float {:?}", value),
            Instruction::Reserve(bytes) => write!(f, "sub sp, sp, #{}", bytes),
            Instruction::Release(bytes) => write!(f, "add sp, sp, #{}", bytes),
            Instruction::MoveImmediate { dst, value } => {
                if (-65536..=65535).contains(value) {
                    write!(f, "mov {}, #{}", dst, value)
                } else {
                    write!(f, "ldr {}, ={}", dst, value)
                }
            }
            Instruction::Move { dst, src } => write!(f, "mov {}, {}", dst, src),
            Instruction::Load { dst, offset } => write!(f, "ldr {}, [sp, #{}]", dst, offset),
            Instruction::Store { src, offset } => write!(f, "str {}, [sp, #{}]", src, offset),
            Instruction::Push(reg) => write!(f, "str {}, [sp, #-16]!", reg),
            Instruction::Pop(reg) => write!(f, "ldr {}, [sp], #16", reg),
            Instruction::PageAddress { dst, symbol } => write!(f, "adrp {}, {}@PAGE", dst, symbol),
            Instruction::LoadGlobal { dst, base, symbol } => {
                write!(f, "ldr {}, [{}, {}@PAGEOFF]", dst, base, symbol)
            }
            Instruction::StoreGlobal { src, base, symbol } => {
                write!(f, "str {}, [{}, {}@PAGEOFF]", src, base, symbol)
            }
            Instruction::Negate { dst, src } => write!(f, "neg {}, {}", dst, src),
            Instruction::Arith { op, dst, lhs, rhs } => {
                write!(f, "{} {}, {}, {}", op.mnemonic(), dst, lhs, rhs)
            }
            Instruction::MultiplySubtract { dst, lhs, rhs, acc } => {
                write!(f, "msub {}, {}, {}, {}", dst, lhs, rhs, acc)
            }
            Instruction::Ret => write!(f, "ret"),
            Instruction::Label(_) => Ok(()),
        }
    }
}

/// Complete output of the emitter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    pub instructions: Vec<Instruction>,
}

impl Assembly {
    /// Rendered text, one entry per instruction
    pub fn lines(&self) -> Vec<String> {
        self.instructions.iter().map(|i| i.to_string()).collect()
    }
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.instructions {
            writeln!(f, "{}", instruction)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_is_not_indented() {
        assert_eq!(Instruction::Label("_main".into()).to_string(), "_main:");
        assert_eq!(Instruction::Ret.to_string(), "    ret");
    }

    #[test]
    fn test_stack_addressing() {
        let store = Instruction::Store {
            src: Register::W8,
            offset: 8,
        };
        assert_eq!(store.to_string(), "    str w8, [sp, #8]");
        assert_eq!(Instruction::Push(Register::W8).to_string(), "    str w8, [sp, #-16]!");
        assert_eq!(Instruction::Pop(Register::W8).to_string(), "    ldr w8, [sp], #16");
    }

    #[test]
    fn test_large_immediate_uses_literal_pool() {
        let small = Instruction::MoveImmediate {
            dst: Register::W8,
            value: 42,
        };
        let large = Instruction::MoveImmediate {
            dst: Register::W8,
            value: 100_000,
        };
        assert_eq!(small.to_string(), "    mov w8, #42");
        assert_eq!(large.to_string(), "    ldr w8, =100000");
    }

    #[test]
    fn test_return_register() {
        let mov = Instruction::Move {
            dst: Register::RETURN,
            src: Register::W8,
        };
        assert_eq!(mov.to_string(), "    mov w0, w8");
    }
}
