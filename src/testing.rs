//! Hand-built trees for exercising the engine on shapes a parser never produces.

use crate::adapter::TreeAdapter;
use crate::types::{Position, Span};

/// One node of a `FakeTree`.
#[derive(Debug)]
struct FakeNode {
    /// All children, in push order.
    children: Vec<usize>,
    /// Children visible as container items.
    items: Vec<usize>,
    /// Parent link, freely rewritable.
    parent: Option<usize>,
    /// Index `index_of` reports for this node instead of its real one.
    reported_index: Option<usize>,
    /// Extent.
    span: Span,
    /// Type tag.
    tag: &'static str,
}

/// A tree whose links can be corrupted on purpose. Every node is a container.
#[derive(Debug)]
pub(crate) struct FakeTree {
    /// Arena, the root at index 0.
    nodes: Vec<FakeNode>,
}

impl FakeTree {
    /// Remove the parent link of `node` without making it the root.
    pub(crate) fn detach(&mut self, node: usize) {
        self.nodes[node].parent = None;
    }

    /// Keep `node` as a child of its parent but drop it from the parent's items.
    pub(crate) fn hide_from_items(&mut self, node: usize) {
        if let Some(parent) = self.nodes[node].parent {
            self.nodes[parent].items.retain(|item| return *item != node);
        }
    }

    /// Make `index_of` report `index` for `node`.
    pub(crate) fn misreport_index(&mut self, node: usize, index: usize) {
        self.nodes[node].reported_index = Some(index);
    }

    /// A tree holding only a root spanning rows 1 to 100.
    pub(crate) fn new() -> Self {
        return Self {
            nodes: vec![FakeNode {
                children: Vec::new(),
                items: Vec::new(),
                parent: None,
                reported_index: None,
                span: Span::new(Position::new(1, 1), Position::new(100, 1)),
                tag: "root",
            }],
        };
    }

    /// Append a node under `parent` and return its handle.
    pub(crate) fn push(
        &mut self,
        tag: &'static str,
        parent: usize,
        top_left: (u32, u32),
        bottom_right: (u32, u32),
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(FakeNode {
            children: Vec::new(),
            items: Vec::new(),
            parent: Some(parent),
            reported_index: None,
            span: Span::new(
                Position::new(top_left.0, top_left.1),
                Position::new(bottom_right.0, bottom_right.1),
            ),
            tag,
        });
        self.nodes[parent].children.push(id);
        self.nodes[parent].items.push(id);
        return id;
    }

    /// Point the parent link of `node` at `parent` without touching child lists.
    pub(crate) fn set_parent(&mut self, node: usize, parent: usize) {
        self.nodes[node].parent = Some(parent);
    }
}

impl TreeAdapter for FakeTree {
    type Node = usize;

    fn children(&self, node: usize) -> &[usize] {
        return &self.nodes[node].children;
    }

    fn container_items(&self, node: usize) -> Option<&[usize]> {
        return Some(&self.nodes[node].items);
    }

    fn index_of(&self, container: usize, child: usize) -> Option<usize> {
        if let Some(index) = self.nodes[child].reported_index {
            return Some(index);
        }
        return self
            .container_items(container)?
            .iter()
            .position(|item| return *item == child);
    }

    fn node_count(&self) -> usize {
        return self.nodes.len();
    }

    fn parent(&self, node: usize) -> Option<usize> {
        return self.nodes[node].parent;
    }

    fn root(&self) -> usize {
        return 0;
    }

    fn span(&self, node: usize) -> Span {
        return self.nodes[node].span;
    }

    fn type_tag(&self, node: usize) -> &str {
        return self.nodes[node].tag;
    }
}
