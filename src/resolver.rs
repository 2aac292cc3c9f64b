//! Map positions and selections onto tree nodes.

use crate::adapter::TreeAdapter;
use crate::error::Error;
use crate::types::Position;

/// What a selection resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region<N> {
    /// A single node covers the selection.
    Node(N),
    /// A contiguous run of items of one ordered container, in source order.
    Siblings(Vec<N>),
}

impl<N> Region<N> {
    /// The resolved nodes in source order.
    pub fn nodes(&self) -> &[N] {
        return match self {
            Region::Node(node) => std::slice::from_ref(node),
            Region::Siblings(nodes) => nodes,
        };
    }
}

/// `node` followed by each of its ancestors, ending with the root.
///
/// # Errors
///
/// Returns `Error::MalformedTree` if the walk revisits more nodes than the tree
/// holds (a parent cycle) or ends at a node other than the root.
pub fn ancestor_chain<T: TreeAdapter>(tree: &T, node: T::Node) -> Result<Vec<T::Node>, Error> {
    let root = tree.root();
    let limit = tree.node_count();
    let mut chain = vec![node];
    let mut current = node;

    while current != root {
        if chain.len() > limit {
            return Err(Error::malformed(format!("parent cycle above {node:?}")));
        }
        current = tree
            .parent(current)
            .ok_or_else(|| return Error::malformed(format!("{current:?} has no parent but is not the root")))?;
        chain.push(current);
    }

    return Ok(chain);
}

/// Find the most deeply nested node whose span contains `pos`.
///
/// Positions outside every node degrade to the root rather than failing.
///
/// # Errors
///
/// Returns `Error::MalformedTree` if descending never terminates.
pub fn resolve_point<T: TreeAdapter>(tree: &T, pos: Position) -> Result<T::Node, Error> {
    let mut current = tree.root();

    for _ in 0..tree.node_count() {
        let next = tree
            .children(current)
            .iter()
            .copied()
            .find(|child| return tree.span(*child).contains(pos));
        match next {
            None => return Ok(current),
            Some(child) => current = child,
        }
    }

    return Err(Error::malformed(format!("descent toward {pos} did not terminate")));
}

/// Resolve the selection `start..=end` to the node or sibling run that
/// minimally covers it.
///
/// Both ends are resolved to nodes and their ancestor chains are compared
/// from the root down. At the lowest common ancestor, if it is an ordered
/// container, the inclusive slice between the two diverging children is
/// returned; otherwise the ancestor itself is.
///
/// # Errors
///
/// Returns `Error::MalformedTree` if an ancestor walk fails or a container
/// reports an index outside its items.
pub fn resolve_region<T: TreeAdapter>(
    tree: &T,
    start: Position,
    end: Position,
) -> Result<Region<T::Node>, Error> {
    let start_node = resolve_point(tree, start)?;
    let end_node = resolve_point(tree, end)?;
    if start_node == end_node {
        return Ok(Region::Node(start_node));
    }

    let mut start_chain = ancestor_chain(tree, start_node)?;
    let mut end_chain = ancestor_chain(tree, end_node)?;

    // Chains are leaf-first. Drop the deepest extra entries of the longer one
    // so the pairs below sit at the same depth.
    let depth = start_chain.len().min(end_chain.len());
    start_chain.drain(..start_chain.len().saturating_sub(depth));
    end_chain.drain(..end_chain.len().saturating_sub(depth));

    let mut previous = tree.root();
    for (s, e) in start_chain.iter().rev().zip(end_chain.iter().rev()) {
        if s != e {
            return narrow_to_slice(tree, previous, *s, *e);
        }
        previous = *s;
    }

    return Ok(Region::Node(previous));
}

/// Narrow the common ancestor to the items between two of its children.
///
/// # Errors
///
/// Returns `Error::MalformedTree` if `index_of` disagrees with the container items.
fn narrow_to_slice<T: TreeAdapter>(
    tree: &T,
    ancestor: T::Node,
    from: T::Node,
    to: T::Node,
) -> Result<Region<T::Node>, Error> {
    let Some(items) = tree.container_items(ancestor) else {
        return Ok(Region::Node(ancestor));
    };

    let (Some(a), Some(b)) = (tree.index_of(ancestor, from), tree.index_of(ancestor, to)) else {
        tracing::trace!(
            ancestor = tree.type_tag(ancestor),
            "diverging nodes are not items of the container, using it whole"
        );
        return Ok(Region::Node(ancestor));
    };

    let (low, high) = (a.min(b), a.max(b));
    let Some(slice) = items.get(low..=high) else {
        return Err(Error::malformed(format!(
            "{} reports index {high} but holds {} items",
            tree.type_tag(ancestor),
            items.len()
        )));
    };

    return Ok(Region::Siblings(slice.to_vec()));
}
