//! Hierarchical view of slash-delimited branch names
//!
//! Branch names such as `feature/login/form` are split on `/` and folded into a
//! tree where every segment becomes a node. Siblings keep the order in which they
//! were first seen, so numbering in the rendered menu follows the order git lists
//! branches in rather than an alphabetical one.

mod render;

pub use render::BranchMenu;

/// A single path segment in the branch tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchNode {
    pub segment: String,
    /// Set when a branch ends exactly at this node
    pub full_name: Option<String>,
    pub children: Vec<BranchNode>,
}

impl BranchNode {
    fn new(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            ..Default::default()
        }
    }

    fn child_mut(&mut self, segment: &str) -> &mut BranchNode {
        let pos = match self.children.iter().position(|c| c.segment == segment) {
            Some(pos) => pos,
            None => {
                self.children.push(BranchNode::new(segment));
                self.children.len() - 1
            }
        };
        &mut self.children[pos]
    }

    /// Look up a direct child by segment name
    #[cfg(test)]
    pub(crate) fn child(&self, segment: &str) -> Option<&BranchNode> {
        self.children.iter().find(|c| c.segment == segment)
    }

    /// A node that groups other branches under its path
    #[must_use]
    pub fn is_folder(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Branch names folded into a tree keyed by `/` separated segments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchTree {
    root: BranchNode,
}

impl BranchTree {
    /// Build a tree from branch names in the order they are given.
    ///
    /// Every segment is kept as-is, including empty ones produced by names like
    /// `a//b`. When one branch name is a path prefix of another, its node keeps
    /// the full name and gains children as well.
    pub fn build<I, S>(branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut root = BranchNode::default();
        for branch in branches {
            let branch = branch.as_ref();
            let node = branch
                .split('/')
                .fold(&mut root, |node, segment| node.child_mut(segment));
            node.full_name = Some(branch.to_string());
        }
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &BranchNode {
        &self.root
    }

    /// Walk the tree and number every selectable branch
    #[must_use]
    pub fn menu(&self) -> BranchMenu {
        BranchMenu::from_tree(self)
    }
}
