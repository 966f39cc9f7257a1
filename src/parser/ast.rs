// AST (Abstract Syntax Tree) definitions produced by the grammar's bind continuations

use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Scalar types nameable in declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeName {
    Int,
    Float,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Plus, // +x
    Neg,  // -x
}

/// Literal value of a `Constant` node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub param_type: TypeName,
    pub location: SourceLocation,
}

/// AST nodes representing statements and expressions
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    // Top-level declarations
    Function {
        name: String,
        return_type: TypeName,
        params: Vec<Parameter>,
        body: Box<AstNode>, // always a Block
        location: SourceLocation,
    },
    Parameter(Parameter),

    // Statements
    Block {
        statements: Vec<AstNode>,
        location: SourceLocation,
    },
    Definition {
        name: String,
        var_type: TypeName,
        init: Option<Box<AstNode>>,
        location: SourceLocation,
    },
    Assignment {
        name: String,
        value: Box<AstNode>,
        location: SourceLocation,
    },
    Return {
        expr: Box<AstNode>,
        location: SourceLocation,
    },
    EmptyStatement {
        location: SourceLocation,
    },

    // Expressions
    Constant(Literal, SourceLocation),
    Variable(String, SourceLocation),
    BinaryExpr {
        op: BinOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
        location: SourceLocation,
    },
    UnaryExpr {
        op: UnOp,
        operand: Box<AstNode>,
        location: SourceLocation,
    },
}

impl AstNode {
    /// Get the source location of this node
    pub fn location(&self) -> &SourceLocation {
        match self {
            AstNode::Function { location, .. } => location,
            AstNode::Parameter(param) => &param.location,
            AstNode::Block { location, .. } => location,
            AstNode::Definition { location, .. } => location,
            AstNode::Assignment { location, .. } => location,
            AstNode::Return { location, .. } => location,
            AstNode::EmptyStatement { location } => location,
            AstNode::Constant(_, loc) => loc,
            AstNode::Variable(_, loc) => loc,
            AstNode::BinaryExpr { location, .. } => location,
            AstNode::UnaryExpr { location, .. } => location,
        }
    }

    /// Short name of the node kind, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            AstNode::Function { .. } => "function",
            AstNode::Parameter(_) => "parameter",
            AstNode::Block { .. } => "block",
            AstNode::Definition { .. } => "definition",
            AstNode::Assignment { .. } => "assignment",
            AstNode::Return { .. } => "return statement",
            AstNode::EmptyStatement { .. } => "empty statement",
            AstNode::Constant(..) => "constant",
            AstNode::Variable(..) => "variable",
            AstNode::BinaryExpr { .. } => "binary expression",
            AstNode::UnaryExpr { .. } => "unary expression",
        }
    }
}

/// A whole translation unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub nodes: Vec<AstNode>, // Function definitions and top-level statements, in source order
}
