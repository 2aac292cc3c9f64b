//! Arena snapshot of a tree-sitter parse.
//!
//! Tree-sitter nodes borrow their tree and carry no stable parent pointers we
//! can hand out over the wire, so every named node is copied into a flat arena
//! once per parse. Parent links are indices, identity is the index itself.

use std::ops::Range;

use tree_sitter::{Node, Parser};

use crate::adapter::TreeAdapter;
use crate::error::Error;
use crate::grammar::Grammar;
use crate::resolver::Region;
use crate::types::{NodeSummary, Position, Span};

/// Default maximum source size (16 MiB).
pub const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Handle to a node of one `SyntaxTree`. Equality is identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Per-parse knobs taken from the configuration.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions<'a> {
    /// Node kinds treated as ordered containers on top of the grammar defaults.
    pub extra_containers: &'a [String],
    /// Sources above this size are rejected before parsing.
    pub max_bytes: u64,
}

impl Default for ParseOptions<'_> {
    fn default() -> Self {
        return Self { extra_containers: &[], max_bytes: MAX_FILE_SIZE };
    }
}

/// A node copied out of the tree-sitter tree.
#[derive(Debug)]
struct NodeData {
    /// Byte offsets of the node in the source.
    byte_range: Range<usize>,
    /// Named children in source order.
    children: Vec<NodeId>,
    /// Whether `children` is exposed as an ordered container.
    container: bool,
    /// Field name this node occupies in its parent, if any.
    field: Option<&'static str>,
    /// Tree-sitter node kind.
    kind: &'static str,
    /// Enclosing node, `None` for the root.
    parent: Option<NodeId>,
    /// One-based inclusive extent.
    span: Span,
}

/// Immutable snapshot of one parsed source. Node handles stay valid for the
/// lifetime of the snapshot; a re-parse produces a new snapshot.
#[derive(Debug)]
pub struct SyntaxTree {
    /// Canonical name of the grammar that produced the tree.
    language: &'static str,
    /// Arena of named nodes, the root at index 0.
    nodes: Vec<NodeData>,
    /// The parsed text.
    source: String,
}

impl SyntaxTree {
    /// First named child of `node` filling `field`.
    pub fn child_by_field(&self, node: NodeId, field: &str) -> Option<NodeId> {
        return self
            .children(node)
            .iter()
            .copied()
            .find(|child| return self.field_name(*child) == Some(field));
    }

    /// Arena lookup.
    ///
    /// # Panics
    ///
    /// Panics if `node` was minted by a different tree.
    #[allow(clippy::indexing_slicing, reason = "NodeId is only minted by this arena")]
    fn data(&self, node: NodeId) -> &NodeData {
        return &self.nodes[node.0];
    }

    /// Field name `node` occupies in its parent, e.g. `body` or `name`.
    ///
    /// # Panics
    ///
    /// Panics if `node` does not belong to this tree.
    pub fn field_name(&self, node: NodeId) -> Option<&'static str> {
        return self.data(node).field;
    }

    /// Canonical name of the grammar that produced the tree.
    pub const fn language(&self) -> &'static str {
        return self.language;
    }

    /// Parse `source` with `grammar` into an arena snapshot.
    ///
    /// # Errors
    ///
    /// Returns `Error::SourceTooLarge` if the source exceeds the size limit,
    /// or `Error::ParseFailed` if tree-sitter cannot parse the source or the
    /// tree contains syntax errors.
    pub fn parse(
        origin: &str,
        source: String,
        grammar: &Grammar,
        options: ParseOptions<'_>,
    ) -> Result<Self, Error> {
        let source_len: u64 = source.len().try_into().unwrap_or(u64::MAX);
        if source_len > options.max_bytes {
            return Err(Error::SourceTooLarge {
                max_bytes: options.max_bytes,
                origin: origin.to_string(),
                size_bytes: source_len,
            });
        }

        let mut parser = Parser::new();
        parser.set_language(&grammar.language).map_err(|e| {
            return Error::ParseFailed { origin: origin.to_string(), reason: e.to_string() };
        })?;

        let tree = parser.parse(&source, None).ok_or_else(|| {
            return Error::ParseFailed {
                origin: origin.to_string(),
                reason: "tree-sitter returned None".to_string(),
            };
        })?;

        if let Some(bad) = first_error_node(tree.root_node()) {
            let at = span_of(bad, &source).top_left;
            let what = if bad.is_missing() { "missing" } else { "unexpected" };
            return Err(Error::ParseFailed {
                origin: origin.to_string(),
                reason: format!("syntax error at {at}: {what} `{}`", bad.kind()),
            });
        }

        let nodes = copy_named_nodes(tree.root_node(), &source, grammar, options.extra_containers);
        tracing::debug!(origin, language = grammar.name, nodes = nodes.len(), "parsed source");

        return Ok(Self { language: grammar.name, nodes, source });
    }

    /// Source text of a resolved region: from the first node's start to the
    /// last node's end, so the whitespace between siblings is kept.
    pub fn serialize(&self, region: &Region<NodeId>) -> &str {
        let nodes = region.nodes();
        let (Some(first), Some(last)) = (nodes.first(), nodes.last()) else {
            return "";
        };
        let start = self.data(*first).byte_range.start;
        let end = self.data(*last).byte_range.end;
        return self.source.get(start..end).unwrap_or("");
    }

    /// The parsed text.
    pub fn source(&self) -> &str {
        return &self.source;
    }

    /// Type, extent, and text of `node`.
    pub fn summary(&self, node: NodeId) -> NodeSummary {
        let data = self.data(node);
        return NodeSummary {
            span: data.span,
            text: self.text(node).to_string(),
            type_tag: data.kind.to_string(),
        };
    }

    /// Source text covered by `node`.
    pub fn text(&self, node: NodeId) -> &str {
        return self.source.get(self.data(node).byte_range.clone()).unwrap_or("");
    }

    /// The nodes directly below the root.
    pub fn top_level(&self) -> &[NodeId] {
        return self.children(self.root());
    }
}

impl TreeAdapter for SyntaxTree {
    type Node = NodeId;

    fn children(&self, node: NodeId) -> &[NodeId] {
        return &self.data(node).children;
    }

    fn container_items(&self, node: NodeId) -> Option<&[NodeId]> {
        let data = self.data(node);
        return data.container.then_some(data.children.as_slice());
    }

    fn node_count(&self) -> usize {
        return self.nodes.len();
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        return self.data(node).parent;
    }

    fn root(&self) -> NodeId {
        return NodeId(0);
    }

    fn span(&self, node: NodeId) -> Span {
        return self.data(node).span;
    }

    fn type_tag(&self, node: NodeId) -> &str {
        return self.data(node).kind;
    }
}

/// Character column of `byte`, given its byte column within the line.
fn char_column(source: &str, byte: usize, byte_column: usize) -> u32 {
    let line_start = byte.saturating_sub(byte_column);
    let count = source
        .get(line_start..byte)
        .map_or(byte_column, |prefix| return prefix.chars().count());
    return u32::try_from(count).unwrap_or(u32::MAX);
}

/// Walk the tree-sitter tree depth-first and copy every named node into the arena.
/// Children are pushed in reverse so they pop, and get appended to their
/// parent, in source order.
fn copy_named_nodes(
    root: Node<'_>,
    source: &str,
    grammar: &Grammar,
    extra_containers: &[String],
) -> Vec<NodeData> {
    let mut nodes: Vec<NodeData> = Vec::new();
    let mut pending: Vec<(Node<'_>, Option<NodeId>, Option<&'static str>)> = vec![(root, None, None)];

    while let Some((ts_node, parent, field)) = pending.pop() {
        let id = NodeId(nodes.len());
        let kind = ts_node.kind();
        let container = parent.is_none()
            || grammar.containers.contains(&kind)
            || extra_containers.iter().any(|k| return k == kind);

        nodes.push(NodeData {
            byte_range: ts_node.byte_range(),
            children: Vec::new(),
            container,
            field,
            kind,
            parent,
            span: span_of(ts_node, source),
        });

        if let Some(parent_data) = parent.and_then(|p| return nodes.get_mut(p.0)) {
            parent_data.children.push(id);
        }

        let named = named_children_with_fields(ts_node);
        pending.extend(named.into_iter().rev().map(|(child, f)| return (child, Some(id), f)));
    }

    return nodes;
}

/// First ERROR or MISSING node in document order.
fn first_error_node(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error_node(child) {
            return Some(found);
        }
    }
    return None;
}

/// Named children of `node` paired with the field each one fills.
fn named_children_with_fields(node: Node<'_>) -> Vec<(Node<'_>, Option<&'static str>)> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    if !cursor.goto_first_child() {
        return out;
    }
    loop {
        let child = cursor.node();
        if child.is_named() {
            out.push((child, cursor.field_name()));
        }
        if !cursor.goto_next_sibling() {
            break;
        }
    }
    return out;
}

/// Convert tree-sitter's zero-based, end-exclusive byte points into a
/// one-based inclusive character span.
fn span_of(node: Node<'_>, source: &str) -> Span {
    let start = node.start_position();
    let end = node.end_position();
    let top_left = Position::new(
        u32::try_from(start.row).unwrap_or(u32::MAX).saturating_add(1),
        char_column(source, node.start_byte(), start.column).saturating_add(1),
    );
    let bottom_right = Position::new(
        u32::try_from(end.row).unwrap_or(u32::MAX).saturating_add(1),
        char_column(source, node.end_byte(), end.column),
    );
    return Span::new(top_left, bottom_right);
}
