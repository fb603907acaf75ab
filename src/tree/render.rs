use std::fmt;

use super::{BranchNode, BranchTree};

/// Rendered branch listing together with the branches it numbers.
///
/// Both are produced by the same traversal, so the `[n]` shown next to a branch
/// always resolves back to that branch through [`BranchMenu::get`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchMenu {
    lines: Vec<String>,
    choices: Vec<String>,
}

impl BranchMenu {
    pub(super) fn from_tree(tree: &BranchTree) -> Self {
        let mut menu = Self::default();
        menu.push_children(tree.root(), "");
        menu
    }

    fn push_children(&mut self, node: &BranchNode, prefix: &str) {
        let count = node.children.len();
        for (i, child) in node.children.iter().enumerate() {
            let is_last = i + 1 == count;
            let connector = if is_last { "└── " } else { "├── " };

            let label = match &child.full_name {
                Some(full_name) => {
                    self.choices.push(full_name.clone());
                    format!("[{}] {}", self.choices.len(), child.segment)
                }
                None => child.segment.clone(),
            };

            if child.is_folder() {
                self.lines.push(format!("{prefix}{connector}{label}/"));
                let extension = if is_last { "    " } else { "│   " };
                self.push_children(child, &format!("{prefix}{extension}"));
            } else {
                self.lines.push(format!("{prefix}{connector}{label}"));
            }
        }
    }

    /// Selectable branches; position + 1 is the displayed number
    #[cfg(test)]
    pub(crate) fn choices(&self) -> &[String] {
        &self.choices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.choices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Resolve a 1-based display number to its branch
    #[must_use]
    pub fn get(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|i| self.choices.get(i))
            .map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, branch: &str) -> bool {
        self.choices.iter().any(|c| c == branch)
    }
}

impl fmt::Display for BranchMenu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_nested_tree() {
        let menu = BranchTree::build(["main", "feature/x", "feature/y"]).menu();
        insta::assert_snapshot!(menu.to_string(), @r"
        ├── [1] main
        └── feature/
            ├── [2] x
            └── [3] y
        ");
        assert_eq!(menu.choices(), ["main", "feature/x", "feature/y"]);
        assert_eq!(menu.len(), 3);
    }

    #[test]
    fn test_render_continuation_guides() {
        let menu = BranchTree::build([
            "origin/feature/a",
            "origin/feature/b",
            "origin/main",
            "upstream/main",
        ])
        .menu();
        insta::assert_snapshot!(menu.to_string(), @r"
        ├── origin/
        │   ├── feature/
        │   │   ├── [1] a
        │   │   └── [2] b
        │   └── [3] main
        └── upstream/
            └── [4] main
        ");
    }

    #[test]
    fn test_selectable_folder_numbered_before_children() {
        let menu = BranchTree::build(["release", "release/v1", "main"]).menu();
        insta::assert_snapshot!(menu.to_string(), @r"
        ├── [1] release/
        │   └── [2] v1
        └── [3] main
        ");
        assert_eq!(menu.choices(), ["release", "release/v1", "main"]);
    }

    #[test]
    fn test_choices_follow_input_order_without_collisions() {
        let branches = ["develop", "hotfix/b", "hotfix/a", "main"];
        let menu = BranchTree::build(branches).menu();
        assert_eq!(menu.choices(), branches);
    }

    #[test]
    fn test_get_is_one_based() {
        let menu = BranchTree::build(["a", "b"]).menu();
        assert_eq!(menu.get(0), None);
        assert_eq!(menu.get(1), Some("a"));
        assert_eq!(menu.get(2), Some("b"));
        assert_eq!(menu.get(3), None);
    }

    #[test]
    fn test_empty_tree_renders_nothing() {
        let menu = BranchTree::build(Vec::<String>::new()).menu();
        assert!(menu.is_empty());
        assert_eq!(menu.to_string(), "");
    }
}
