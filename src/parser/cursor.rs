//! Read position over the source text
//!
//! A [`Cursor`] is owned by exactly one parse invocation. Combinators advance
//! it on success and put it back with [`Cursor::restore`] when an alternative
//! fails; nothing is unwound implicitly.

use super::ast::SourceLocation;

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    text: &'a str,
    position: usize,
    /// Byte offsets where each line starts, for offset -> line/column lookups
    line_starts: Vec<usize>,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            text,
            position: 0,
            line_starts,
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Move to a position previously obtained from [`Cursor::position`]
    pub fn restore(&mut self, position: usize) {
        debug_assert!(position <= self.text.len());
        self.position = position;
    }

    pub fn advance_to(&mut self, position: usize) {
        debug_assert!(position >= self.position && position <= self.text.len());
        self.position = position;
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.text.len()
    }

    /// 1-based line and column of a byte offset
    pub fn location_of(&self, offset: usize) -> SourceLocation {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let column = self.text[line_start..offset].chars().count() + 1;
        SourceLocation::new(line + 1, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_of_offsets() {
        let cursor = Cursor::new("int a;\n  a = 1;\n");
        assert_eq!(cursor.location_of(0), SourceLocation::new(1, 1));
        assert_eq!(cursor.location_of(4), SourceLocation::new(1, 5));
        assert_eq!(cursor.location_of(7), SourceLocation::new(2, 1));
        assert_eq!(cursor.location_of(9), SourceLocation::new(2, 3));
        assert_eq!(cursor.location_of(16), SourceLocation::new(3, 1));
    }

    #[test]
    fn test_restore() {
        let mut cursor = Cursor::new("abc");
        cursor.advance_to(2);
        assert_eq!(cursor.position(), 2);
        cursor.restore(0);
        assert_eq!(cursor.position(), 0);
        assert!(!cursor.is_at_end());
        cursor.advance_to(3);
        assert!(cursor.is_at_end());
    }
}
