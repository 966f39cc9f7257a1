// Code emitter: lowers a parsed program to stack-machine assembly

use super::errors::EmitError;
use super::instruction::{Assembly, Instruction, Register};
use super::scope::Frame;
use crate::constants::{FUNCTION_ALIGNMENT, MAX_REGISTER_PARAMS};
use crate::parser::ast::*;
use log::debug;
use rustc_hash::FxHashMap;

/// Assembly symbol for a C name
pub fn symbol(name: &str) -> String {
    format!("_{}", name)
}

/// Lowers a whole [`Program`]: functions into `.text`, globals into `.data`
pub struct Emitter {
    /// Global variables declared so far (name -> type)
    globals: FxHashMap<String, TypeName>,

    /// Function names declared so far
    functions: FxHashMap<String, SourceLocation>,

    text: Vec<Instruction>,
    data: Vec<Instruction>,
}

impl Emitter {
    pub fn new() -> Self {
        Emitter {
            globals: FxHashMap::default(),
            functions: FxHashMap::default(),
            text: Vec::new(),
            data: Vec::new(),
        }
    }

    pub fn emit_program(mut self, program: &Program) -> Result<Assembly, EmitError> {
        for node in &program.nodes {
            match node {
                AstNode::Function {
                    name,
                    params,
                    body,
                    location,
                    ..
                } => self.emit_function(name, params, body, *location)?,
                AstNode::Definition {
                    name,
                    var_type,
                    init,
                    location,
                } => self.emit_global(name, *var_type, init.as_deref(), *location)?,
                AstNode::EmptyStatement { .. } => {}
                other => {
                    return Err(EmitError::unsupported(
                        format!("{} at top level", other.kind()),
                        *other.location(),
                    ))
                }
            }
        }

        let mut instructions = vec![Instruction::Section(".text")];
        instructions.append(&mut self.text);
        if !self.data.is_empty() {
            instructions.push(Instruction::Section(".data"));
            instructions.push(Instruction::Align(FUNCTION_ALIGNMENT));
            instructions.append(&mut self.data);
        }
        Ok(Assembly { instructions })
    }

    fn check_unique(&self, name: &str, location: SourceLocation) -> Result<(), EmitError> {
        if self.globals.contains_key(name) || self.functions.contains_key(name) {
            return Err(EmitError::Redefinition {
                name: name.to_string(),
                location,
            });
        }
        Ok(())
    }

    fn emit_global(
        &mut self,
        name: &str,
        var_type: TypeName,
        init: Option<&AstNode>,
        location: SourceLocation,
    ) -> Result<(), EmitError> {
        self.check_unique(name, location)?;

        let value = match init {
            None => Literal::Int(0),
            Some(expr) => constant_value(expr).ok_or_else(|| EmitError::NonConstantGlobal {
                name: name.to_string(),
                location,
            })?,
        };

        let directive = match (var_type, value) {
            (TypeName::Float, Literal::Float(f)) => Instruction::Float(f),
            (TypeName::Float, Literal::Int(i)) => Instruction::Float(i as f64),
            (TypeName::Int, Literal::Int(i)) => {
                Instruction::Word(i64::from(EmitError::check_int(i, location)?))
            }
            (TypeName::Int, Literal::Float(f)) => {
                Instruction::Word(i64::from(EmitError::check_int(f.trunc() as i64, location)?))
            }
        };
        self.data.push(Instruction::Global(symbol(name)));
        self.data.push(Instruction::Label(symbol(name)));
        self.data.push(directive);
        self.globals.insert(name.to_string(), var_type);
        Ok(())
    }

    fn emit_function(
        &mut self,
        name: &str,
        params: &[Parameter],
        body: &AstNode,
        location: SourceLocation,
    ) -> Result<(), EmitError> {
        self.check_unique(name, location)?;
        if params.len() > MAX_REGISTER_PARAMS {
            return Err(EmitError::unsupported(
                format!("function with {} parameters", params.len()),
                location,
            ));
        }
        self.functions.insert(name.to_string(), location);

        let statements = match body {
            AstNode::Block { statements, .. } => statements.as_slice(),
            other => std::slice::from_ref(other),
        };

        let mut function = FunctionEmitter::new(name, &self.globals);
        for (index, param) in params.iter().enumerate() {
            function.emit_parameter(index, param)?;
        }
        // The body shares the parameters' scope, so redeclaring a parameter is an error
        for statement in statements {
            function.emit(statement)?;
        }
        if !matches!(statements.last(), Some(AstNode::Return { .. })) {
            function.emit_epilogue();
        }

        let (code, frame_size) = function.finish();

        // Second pass: the prologue can only be written once the frame size is known
        self.text.push(Instruction::Global(symbol(name)));
        self.text.push(Instruction::Align(FUNCTION_ALIGNMENT));
        self.text.push(Instruction::Label(symbol(name)));
        self.text.push(Instruction::Reserve(frame_size));
        self.text.extend(code);
        Ok(())
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Lower a program to assembly
pub fn emit_program(program: &Program) -> Result<Assembly, EmitError> {
    Emitter::new().emit_program(program)
}

/// Compile-time value of a global initializer: a literal, optionally signed
fn constant_value(expr: &AstNode) -> Option<Literal> {
    match expr {
        AstNode::Constant(literal, _) => Some(*literal),
        AstNode::UnaryExpr { op, operand, .. } => match (op, constant_value(operand)?) {
            (UnOp::Plus, literal) => Some(literal),
            (UnOp::Neg, Literal::Int(i)) => Some(Literal::Int(i.saturating_neg())),
            (UnOp::Neg, Literal::Float(f)) => Some(Literal::Float(-f)),
        },
        _ => None,
    }
}

/// Per-function emission state
///
/// Statement and expression lowering live in `statements.rs` and
/// `expressions.rs` as further `impl FunctionEmitter` blocks.
pub(crate) struct FunctionEmitter<'a> {
    pub(crate) globals: &'a FxHashMap<String, TypeName>,
    pub(crate) frame: Frame,
    pub(crate) code: Vec<Instruction>,

    /// Indices of `Release` instructions to patch with the final frame size
    pub(crate) releases: Vec<usize>,

    /// Bytes of operands currently parked on the machine stack
    pub(crate) spilled: usize,
}

impl<'a> FunctionEmitter<'a> {
    pub(crate) fn new(name: &str, globals: &'a FxHashMap<String, TypeName>) -> Self {
        FunctionEmitter {
            globals,
            frame: Frame::new(name),
            code: Vec::new(),
            releases: Vec::new(),
            spilled: 0,
        }
    }

    /// Lower one AST node in the current scope
    pub(crate) fn emit(&mut self, node: &AstNode) -> Result<(), EmitError> {
        match node {
            AstNode::Block { statements, .. } => self.emit_block(statements),
            AstNode::Definition {
                name,
                var_type,
                init,
                location,
            } => self.emit_definition(name, *var_type, init.as_deref(), *location),
            AstNode::Assignment {
                name,
                value,
                location,
            } => self.emit_assignment(name, value, *location),
            AstNode::Return { expr, .. } => self.emit_return(expr),
            AstNode::EmptyStatement { .. } => Ok(()),

            AstNode::Constant(literal, location) => self.emit_constant(*literal, *location),
            AstNode::Variable(name, location) => self.load_variable(name, *location),
            AstNode::UnaryExpr { op, operand, .. } => self.emit_unary(*op, operand),
            AstNode::BinaryExpr {
                op, left, right, ..
            } => self.emit_binary(*op, left, right),

            AstNode::Function { location, .. } => {
                Err(EmitError::unsupported("nested function", *location))
            }
            AstNode::Parameter(param) => {
                Err(EmitError::unsupported("parameter outside a parameter list", param.location))
            }
        }
    }

    fn emit_parameter(&mut self, index: usize, param: &Parameter) -> Result<(), EmitError> {
        let slot = self
            .frame
            .declare(&param.name, param.param_type, param.location)?;
        // `index` is bounded by MAX_REGISTER_PARAMS
        self.code.push(Instruction::Store {
            src: Register::Arg(index as u8),
            offset: slot.address(self.spilled),
        });
        Ok(())
    }

    /// Instructions and the frame size, with every `Release` patched
    pub(crate) fn finish(mut self) -> (Vec<Instruction>, usize) {
        let frame_size = self.frame.max_offset();
        debug!(
            "function '{}' reserves {} bytes, {} release(s) patched",
            self.frame.function_name,
            frame_size,
            self.releases.len()
        );
        for &index in &self.releases {
            if let Some(release) = self.code.get_mut(index) {
                *release = Instruction::Release(frame_size);
            }
        }
        (self.code, frame_size)
    }
}
