/// Core value types: positions, spans, and the records handed to callers.
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A location in source text. Rows and columns are one-based, columns count
/// characters within the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// One-based character column.
    pub column: u32,
    /// One-based line number.
    pub row: u32,
}

impl Position {
    /// Build a position from a row and a column.
    pub const fn new(row: u32, column: u32) -> Self {
        return Self { column, row };
    }
}

impl Ord for Position {
    /// Row-major ordering: row first, column second.
    fn cmp(&self, other: &Self) -> Ordering {
        return (self.row, self.column).cmp(&(other.row, other.column));
    }
}

impl PartialOrd for Position {
    /// Delegate to `Ord` implementation.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        return Some(self.cmp(other));
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}:{}", self.row, self.column);
    }
}

impl std::str::FromStr for Position {
    type Err = String;

    /// Parse `ROW:COLUMN`, as accepted on the command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (row, column) = s
            .split_once(':')
            .ok_or_else(|| return format!("expected ROW:COLUMN, got `{s}`"))?;
        let number = |part: &str| return part.trim().parse::<u32>().map_err(|e| return format!("`{part}`: {e}"));
        return Ok(Self::new(number(row)?, number(column)?));
    }
}

/// Inclusive extent of a node, from its first to its last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Position of the last character.
    pub bottom_right: Position,
    /// Position of the first character.
    pub top_left: Position,
}

impl Span {
    /// Whether `pos` lies within the span, both ends inclusive.
    pub fn contains(&self, pos: Position) -> bool {
        return self.top_left <= pos && pos <= self.bottom_right;
    }

    /// Build a span from its two corners.
    pub const fn new(top_left: Position, bottom_right: Position) -> Self {
        return Self { bottom_right, top_left };
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}-{}", self.top_left, self.bottom_right);
    }
}

/// One breadcrumb entry: the kind of an enclosing construct and its extent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Location of the construct.
    pub span: Span,
    /// Syntactic category reported by the grammar, e.g. `function_definition`.
    pub type_tag: String,
}

/// A resolved node as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSummary {
    /// Location of the node.
    pub span: Span,
    /// Source text covered by the node.
    pub text: String,
    /// Syntactic category reported by the grammar.
    pub type_tag: String,
}

#[cfg(test)]
mod tests {
    use super::{Position, Span};

    #[test]
    fn positions_order_row_first() {
        assert!(Position::new(1, 80) < Position::new(2, 1));
        assert!(Position::new(3, 4) < Position::new(3, 5));
        assert_eq!(Position::new(2, 2), Position::new(2, 2));
    }

    #[test]
    fn span_contains_both_corners() {
        let span = Span::new(Position::new(2, 5), Position::new(4, 1));
        assert!(span.contains(Position::new(2, 5)));
        assert!(span.contains(Position::new(3, 200)));
        assert!(span.contains(Position::new(4, 1)));
        assert!(!span.contains(Position::new(2, 4)));
        assert!(!span.contains(Position::new(4, 2)));
    }

    #[test]
    fn position_parses_from_row_colon_column() {
        assert_eq!("3:7".parse::<Position>().unwrap(), Position::new(3, 7));
        assert!("3".parse::<Position>().is_err());
        assert!("a:1".parse::<Position>().is_err());
    }

    #[test]
    fn empty_span_contains_nothing() {
        // Zero-width nodes end one column before they start.
        let span = Span::new(Position::new(1, 4), Position::new(1, 3));
        assert!(!span.contains(Position::new(1, 3)));
        assert!(!span.contains(Position::new(1, 4)));
    }
}
