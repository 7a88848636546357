use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type NodeId = usize;

/// Normalized label tokens attached to a node by offline preprocessing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub tokens: BTreeSet<String>,
}

impl Concept {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Concept {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub concept: Option<Concept>,
}

/// A labeled concept hierarchy stored as an arena of nodes.
///
/// Node ids are stable for the lifetime of the context; nodes are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the root node, replacing the root pointer if one already exists.
    pub fn create_root(&mut self, name: impl Into<String>) -> NodeId {
        let id = self.push(name.into(), None);
        self.root = Some(id);
        id
    }

    pub fn create_child(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        let id = self.push(name.into(), Some(parent));
        self.nodes[parent].children.push(id);
        id
    }

    fn push(&mut self, name: String, parent: Option<NodeId>) -> NodeId {
        self.nodes.push(Node {
            name,
            parent,
            children: Vec::new(),
            concept: None,
        });
        self.nodes.len() - 1
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids in depth-first preorder starting at the root.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let Some(root) = self.root else {
            return order;
        };
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }
        order
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// Proper ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes[id].parent, move |&current| {
            self.nodes[current].parent
        })
    }

    /// True when `ancestor` is a proper ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|candidate| candidate == ancestor)
    }

    /// Node names from the root down to `id`.
    pub fn path(&self, id: NodeId) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .ancestors(id)
            .map(|ancestor| self.nodes[ancestor].name.as_str())
            .collect();
        names.reverse();
        names.push(self.nodes[id].name.as_str());
        names
    }

    /// Resolve a root-to-node name path; the first matching child wins on duplicates.
    pub fn find_by_path<S: AsRef<str>>(&self, path: &[S]) -> Option<NodeId> {
        let (first, rest) = path.split_first()?;
        let root = self.root?;
        if self.nodes[root].name != first.as_ref() {
            return None;
        }
        let mut current = root;
        for name in rest {
            current = *self.nodes[current]
                .children
                .iter()
                .find(|&&child| self.nodes[child].name == name.as_ref())?;
        }
        Some(current)
    }

    pub fn is_preprocessed(&self) -> bool {
        !self.nodes.is_empty() && self.nodes.iter().all(|node| node.concept.is_some())
    }

    /// Conjunction of label concepts along the path from the root to `id`.
    ///
    /// Returns `None` when any node on the path has not been preprocessed.
    pub fn path_concept(&self, id: NodeId) -> Option<BTreeSet<String>> {
        let mut tokens = self.nodes[id].concept.as_ref()?.tokens.clone();
        for ancestor in self.ancestors(id) {
            tokens.extend(self.nodes[ancestor].concept.as_ref()?.tokens.iter().cloned());
        }
        Some(tokens)
    }
}
