//! Source-shape checks run before a method sees its input.

use crate::adapter::TreeAdapter as _;
use crate::error::Error;
use crate::tree::{NodeId, SyntaxTree};

/// Accepts a source whose top-level nodes all carry one of `identifiers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeValidator {
    /// Allowed top-level type tags.
    pub identifiers: &'static [&'static str],
    /// Require exactly one top-level node.
    pub single: bool,
}

impl TypeValidator {
    /// Validator accepting exactly one top-level node of the given types.
    pub const fn single(identifiers: &'static [&'static str]) -> Self {
        return Self { identifiers, single: true };
    }

    /// Check `tree` and hand back the top-level nodes the method works on.
    /// With `single`, the returned slice holds exactly one node.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` naming the first offending node, or the
    /// node count when `single` is violated.
    pub fn validate<'t>(&self, tree: &'t SyntaxTree) -> Result<&'t [NodeId], Error> {
        let nodes = tree.top_level();

        if let Some(bad) = nodes.iter().find(|n| return !self.identifiers.contains(&tree.type_tag(**n))) {
            return Err(Error::Validation {
                reason: format!(
                    "expected {}, found `{}` at {}",
                    self.identifiers.join(" or "),
                    tree.type_tag(*bad),
                    tree.span(*bad).top_left
                ),
            });
        }

        if self.single && nodes.len() != 1 {
            return Err(Error::Validation {
                reason: format!("expected a single {}, found {} nodes", self.identifiers.join(" or "), nodes.len()),
            });
        }

        return Ok(nodes);
    }
}
