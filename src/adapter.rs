//! The capability surface the resolution engine needs from a parsed tree.

use std::fmt::Debug;

use crate::types::Span;

/// Read-only view of a concrete syntax tree.
///
/// Node handles compare by identity: two handles are equal only when they
/// name the same node of the same snapshot, never because two subtrees look
/// alike.
pub trait TreeAdapter {
    /// Identity handle for a node of this tree.
    type Node: Copy + Eq + Debug;

    /// All children of `node` in source order, used to descend toward a position.
    fn children(&self, node: Self::Node) -> &[Self::Node];

    /// The ordered, index-addressable items of `node` when it is a container.
    fn container_items(&self, node: Self::Node) -> Option<&[Self::Node]>;

    /// Index of `child` among the container items of `container`.
    fn index_of(&self, container: Self::Node, child: Self::Node) -> Option<usize> {
        return self
            .container_items(container)?
            .iter()
            .position(|item| return *item == child);
    }

    /// Upper bound on the number of nodes, used to detect parent cycles.
    fn node_count(&self) -> usize;

    /// The enclosing node, `None` only for the root.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// The synthetic root that terminates every upward walk.
    fn root(&self) -> Self::Node;

    /// Inclusive extent of `node`.
    fn span(&self, node: Self::Node) -> Span;

    /// Syntactic category of `node`.
    fn type_tag(&self, node: Self::Node) -> &str;
}
