//! Lexical scopes and stack-slot assignment for one function
//!
//! A [`Frame`] keeps a stack of scopes; each scope's parent is the one below
//! it. A new scope starts allocating where its parent currently stands, so
//! slots of sibling blocks overlap while nested names never collide with the
//! names they shadow. The frame remembers the highest offset any scope ever
//! reached, which is the size the function prologue reserves.
//!
//! # Offsets
//!
//! Slot offsets count up from the bottom of the frame in [`SLOT_SIZE`] steps:
//! the first variable has offset 8, the second 16, and so on. A slot with
//! offset `n` occupies bytes `[n - 8, n)` above `sp`.

use super::errors::EmitError;
use crate::constants::SLOT_SIZE;
use crate::parser::ast::{SourceLocation, TypeName};
use rustc_hash::FxHashMap;

/// Storage assigned to a local variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub offset: usize,
    pub var_type: TypeName,
}

impl Slot {
    /// Byte address relative to `sp`, given how many bytes are currently parked below the frame
    pub fn address(&self, spilled: usize) -> usize {
        self.offset - SLOT_SIZE + spilled
    }
}

#[derive(Debug, Clone, Default)]
struct Scope {
    slots: FxHashMap<String, Slot>,
    next_offset: usize,
}

/// Scope chain and frame size of the function being emitted
#[derive(Debug, Clone)]
pub struct Frame {
    pub function_name: String,
    scopes: Vec<Scope>,
    max_offset: usize,
}

impl Frame {
    /// Create a frame with its function-level scope already entered
    pub fn new(function_name: &str) -> Self {
        Frame {
            function_name: function_name.to_string(),
            scopes: vec![Scope::default()],
            max_offset: 0,
        }
    }

    /// Enter a nested scope
    pub fn push_scope(&mut self) {
        let next_offset = self.current().map_or(0, |scope| scope.next_offset);
        self.scopes.push(Scope {
            slots: FxHashMap::default(),
            next_offset,
        });
    }

    /// Exit the innermost scope
    pub fn pop_scope(&mut self) {
        // The function-level scope lives as long as the frame
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Give `name` a fresh slot in the innermost scope
    pub fn declare(
        &mut self,
        name: &str,
        var_type: TypeName,
        location: SourceLocation,
    ) -> Result<Slot, EmitError> {
        let scope = self
            .scopes
            .last_mut()
            .ok_or_else(|| EmitError::unsupported("declaration outside a scope", location))?;

        if scope.slots.contains_key(name) {
            return Err(EmitError::Redefinition {
                name: name.to_string(),
                location,
            });
        }

        scope.next_offset += SLOT_SIZE;
        let slot = Slot {
            offset: scope.next_offset,
            var_type,
        };
        scope.slots.insert(name.to_string(), slot);
        self.max_offset = self.max_offset.max(slot.offset);
        Ok(slot)
    }

    /// Find `name` in the innermost scope that declares it
    pub fn resolve(&self, name: &str) -> Option<Slot> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.slots.get(name).copied())
    }

    /// Bytes the prologue must reserve
    pub fn max_offset(&self) -> usize {
        self.max_offset
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn current(&self) -> Option<&Scope> {
        self.scopes.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn here() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    #[test]
    fn test_shadowing_gets_distinct_slot() {
        let mut frame = Frame::new("f");
        let outer = frame.declare("a", TypeName::Int, here()).expect("declares");

        frame.push_scope();
        let inner = frame.declare("a", TypeName::Int, here()).expect("shadowing is allowed");
        assert_ne!(outer.offset, inner.offset);
        assert_eq!(frame.resolve("a"), Some(inner));
        frame.pop_scope();

        assert_eq!(frame.resolve("a"), Some(outer));
        assert_eq!(frame.max_offset(), 16);
    }

    #[test]
    fn test_redeclaration_in_same_scope_fails() {
        let mut frame = Frame::new("f");
        frame.declare("x", TypeName::Int, here()).expect("declares");
        match frame.declare("x", TypeName::Float, SourceLocation::new(2, 5)) {
            Err(EmitError::Redefinition { name, location }) => {
                assert_eq!(name, "x");
                assert_eq!(location, SourceLocation::new(2, 5));
            }
            other => panic!("Expected Redefinition, got {:?}", other),
        }
    }

    #[test]
    fn test_sibling_scopes_reuse_slots() {
        let mut frame = Frame::new("f");
        frame.declare("a", TypeName::Int, here()).expect("declares");

        frame.push_scope();
        let first = frame.declare("b", TypeName::Int, here()).expect("declares");
        frame.declare("c", TypeName::Int, here()).expect("declares");
        frame.pop_scope();

        frame.push_scope();
        let second = frame.declare("d", TypeName::Int, here()).expect("declares");
        frame.pop_scope();

        assert_eq!(first.offset, second.offset);
        assert_eq!(frame.max_offset(), 24);
        assert_eq!(frame.resolve("b"), None);
    }

    #[test]
    fn test_function_scope_survives_pop() {
        let mut frame = Frame::new("f");
        frame.pop_scope();
        assert_eq!(frame.depth(), 1);
        assert!(frame.declare("a", TypeName::Int, here()).is_ok());
    }

    #[test]
    fn test_slot_address_accounts_for_spills() {
        let slot = Slot {
            offset: 16,
            var_type: TypeName::Int,
        };
        assert_eq!(slot.address(0), 8);
        assert_eq!(slot.address(16), 24);
    }
}
