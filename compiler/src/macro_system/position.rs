//! Source provenance for macro expressions
//!
//! A [`Position`] is what `Context.currentPos()` hands to a macro body and what
//! every expression it builds must carry. There is no "unknown" position:
//! whoever builds an expression says where it came from, usually the call site
//! or the position of another expression.

use super::expr::Expr;
use serde::{Deserialize, Serialize};
use source_map::{FileId, SourceMap, SourcePosition, SourceSpan};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(SourceSpan);

impl Position {
    pub fn new(span: SourceSpan) -> Self {
        Self(span)
    }

    /// Resolve a byte range of a registered file, like `Context.makePosition({file, min, max})`
    pub fn from_offsets(source_map: &SourceMap, file_id: FileId, min: usize, max: usize) -> Option<Self> {
        source_map.span_from_offsets(file_id, min, max).map(Self)
    }

    /// Position for a host that only knows line/column, not the file text.
    ///
    /// Byte offsets are left at zero; line and column are what diagnostics
    /// print for such positions.
    pub fn synthetic(file_id: FileId, line: usize, column: usize) -> Self {
        Self(SourceSpan::single_position(
            SourcePosition::new(line.max(1), column.max(1), 0),
            file_id,
        ))
    }

    pub fn span(&self) -> SourceSpan {
        self.0
    }

    pub fn file_id(&self) -> FileId {
        self.0.file_id
    }

    pub fn line(&self) -> usize {
        self.0.start.line
    }

    pub fn column(&self) -> usize {
        self.0.start.column
    }

    /// Start byte offset (`min` in Haxe's `getPosInfos`)
    pub fn min(&self) -> usize {
        self.0.start.byte_offset
    }

    /// End byte offset (`max` in Haxe's `getPosInfos`)
    pub fn max(&self) -> usize {
        self.0.end.byte_offset
    }

    /// Covering position of two positions in the same file
    pub fn union(self, other: Position) -> Option<Position> {
        self.0.merge(other.0).map(Self)
    }
}

impl From<SourceSpan> for Position {
    fn from(span: SourceSpan) -> Self {
        Self(span)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.file_id(),
            self.line(),
            self.column()
        )
    }
}

/// The position already stored on an expression
pub fn position_of(expr: &Expr) -> Position {
    expr.pos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macro_system::builders;

    #[test]
    fn test_from_offsets_matches_source() {
        let mut map = SourceMap::new();
        let src = "var a = makeConst();";
        let file = map.add_file("Main.hx", src);

        let pos = Position::from_offsets(&map, file, 8, 19).unwrap();
        assert_eq!(pos.line(), 1);
        assert_eq!(pos.column(), 9);
        assert_eq!((pos.min(), pos.max()), (8, 19));
        assert_eq!(map.snippet(&pos.span()), Some("makeConst()"));
        assert!(Position::from_offsets(&map, file, 8, 400).is_none());
    }

    #[test]
    fn test_synthetic_clamps_to_one_based() {
        let pos = Position::synthetic(FileId::new(3), 0, 0);
        assert_eq!(pos.line(), 1);
        assert_eq!(pos.column(), 1);
        assert_eq!(pos.to_string(), "FileId(3):1:1");
        assert_eq!(SourceMap::new().describe(&pos.span()), pos.to_string());
    }

    #[test]
    fn test_position_of_returns_stored_position() {
        let pos = Position::synthetic(FileId::new(0), 4, 12);
        let expr = builders::string_const("hi", pos);
        assert_eq!(position_of(&expr), pos);
    }

    #[test]
    fn test_union_same_file_only() {
        let a = Position::synthetic(FileId::new(0), 1, 1);
        let b = Position::synthetic(FileId::new(0), 2, 5);
        let c = Position::synthetic(FileId::new(1), 1, 1);
        assert!(a.union(b).is_some());
        assert!(a.union(c).is_none());
    }
}
