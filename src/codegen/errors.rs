//! Error types for code emission
//!
//! All emission errors are fatal: no partial assembly is returned.

use crate::parser::ast::SourceLocation;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmitError {
    /// A variable that is neither local nor global
    #[error("Unresolved identifier '{name}' at line {}, column {}", .location.line, .location.column)]
    UnresolvedIdentifier {
        name: String,
        location: SourceLocation,
    },

    /// A name declared twice in the same scope
    #[error("Redefinition of '{name}' at line {}, column {}", .location.line, .location.column)]
    Redefinition {
        name: String,
        location: SourceLocation,
    },

    /// A global whose initializer is not a constant
    #[error(
        "Global '{name}' at line {}, column {} must be initialized with a constant",
        .location.line, .location.column
    )]
    NonConstantGlobal {
        name: String,
        location: SourceLocation,
    },

    /// An `int` value that does not fit in 32 bits
    #[error(
        "Integer constant {value} at line {}, column {} does not fit in 32 bits",
        .location.line, .location.column
    )]
    IntegerOutOfRange {
        value: i64,
        location: SourceLocation,
    },

    /// A construct that parses but has no lowering in its position
    #[error("Unsupported {construct} at line {}, column {}", .location.line, .location.column)]
    Unsupported {
        construct: String,
        location: SourceLocation,
    },
}

impl EmitError {
    pub fn location(&self) -> SourceLocation {
        match self {
            EmitError::UnresolvedIdentifier { location, .. }
            | EmitError::Redefinition { location, .. }
            | EmitError::NonConstantGlobal { location, .. }
            | EmitError::IntegerOutOfRange { location, .. }
            | EmitError::Unsupported { location, .. } => *location,
        }
    }

    /// `value` as a 32-bit `int`, or an out-of-range error at `location`
    pub(crate) fn check_int(value: i64, location: SourceLocation) -> Result<i32, Self> {
        i32::try_from(value).map_err(|_| EmitError::IntegerOutOfRange { value, location })
    }

    pub(crate) fn unsupported(construct: impl Into<String>, location: SourceLocation) -> Self {
        EmitError::Unsupported {
            construct: construct.into(),
            location,
        }
    }
}
