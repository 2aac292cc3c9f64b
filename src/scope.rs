//! Breadcrumb chains of enclosing scopes.

use crate::adapter::TreeAdapter;
use crate::error::Error;
use crate::types::Scope;

/// Enclosing scopes of `anchor`, innermost first, excluding the root.
///
/// A run of ancestors sharing one span collapses to its outermost member, so
/// every entry names a distinct source range.
///
/// # Errors
///
/// Returns `Error::MalformedTree` if the parent walk cycles or stops before
/// reaching the root.
pub fn scope_chain<T: TreeAdapter>(tree: &T, anchor: T::Node) -> Result<Vec<Scope>, Error> {
    let root = tree.root();
    let mut chain: Vec<Scope> = Vec::new();
    let mut current = anchor;
    let mut steps: usize = 0;

    while current != root {
        steps = steps.saturating_add(1);
        if steps > tree.node_count() {
            return Err(Error::malformed(format!("parent cycle above {anchor:?}")));
        }

        let span = tree.span(current);
        let type_tag = tree.type_tag(current).to_string();
        current = tree
            .parent(current)
            .ok_or_else(|| return Error::malformed(format!("{current:?} cannot reach the root")))?;

        if chain.last().is_some_and(|last| return last.span == span) {
            chain.pop();
        }
        chain.push(Scope { span, type_tag });
    }

    return Ok(chain);
}
