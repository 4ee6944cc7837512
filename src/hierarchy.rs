//! Builds a tree out of a flat `*`-depth bullet list.
//!
//! Wikitext lists have no closing delimiters: depth alone defines scope. Depths
//! are taken relative to the shallowest line of each run, so a list written as
//! `**`/`***` nests the same way as one written as `*`/`**`.

use serde::{Deserialize, Serialize};

const DEPTH_MARKER: char = '*';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    pub fn new(label: impl Into<String>) -> Self {
        HierarchyNode {
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(label: impl Into<String>, children: Vec<HierarchyNode>) -> Self {
        HierarchyNode {
            label: label.into(),
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Strip the leading depth markers, returning `(depth, text)`.
/// Lines without markers are not part of the list.
fn split_depth(line: &str) -> Option<(usize, &str)> {
    let text = line.trim_start_matches(DEPTH_MARKER);
    let depth = line.len() - text.len();
    (depth > 0).then_some((depth, text))
}

struct ArenaNode {
    label: String,
    children: Vec<usize>,
}

/// Build the forest for a section's content lines.
///
/// Each line at the minimum depth of its run opens a node; the deeper lines that
/// follow become that node's run. Deeper lines appearing before the first
/// minimum-depth line are adopted by it. Uses an explicit work stack, so input
/// nesting depth never grows the call stack.
pub fn build_hierarchy<S: AsRef<str>>(lines: &[S]) -> Vec<HierarchyNode> {
    let items: Vec<(usize, String)> = lines
        .iter()
        .filter_map(|line| split_depth(line.as_ref()))
        .map(|(depth, text)| (depth, text.to_string()))
        .collect();

    let mut arena: Vec<ArenaNode> = Vec::new();
    let mut roots: Vec<usize> = Vec::new();
    let mut work: Vec<(Vec<(usize, String)>, Option<usize>)> = vec![(items, None)];

    while let Some((run, parent)) = work.pop() {
        let Some(min_depth) = run.iter().map(|(depth, _)| *depth).min() else {
            continue;
        };

        let mut current: Option<usize> = None;
        let mut pending: Vec<(usize, String)> = Vec::new();

        for (depth, text) in run {
            if depth > min_depth {
                pending.push((depth, text));
                continue;
            }
            if let Some(open) = current {
                work.push((std::mem::take(&mut pending), Some(open)));
            }
            let index = arena.len();
            arena.push(ArenaNode {
                label: text,
                children: Vec::new(),
            });
            match parent {
                Some(p) => arena[p].children.push(index),
                None => roots.push(index),
            }
            current = Some(index);
        }

        if let Some(open) = current {
            work.push((pending, Some(open)));
        }
    }

    // Children always have larger arena indices than their parent, so a reverse
    // sweep finishes every subtree before its parent needs it.
    let mut built: Vec<Option<HierarchyNode>> = Vec::with_capacity(arena.len());
    built.resize_with(arena.len(), || None);
    for (index, node) in arena.into_iter().enumerate().rev() {
        let children = node
            .children
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[index] = Some(HierarchyNode::with_children(node.label, children));
    }

    roots
        .into_iter()
        .filter_map(|root| built[root].take())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(label: &str) -> HierarchyNode {
        HierarchyNode::new(label)
    }

    #[test]
    fn builds_two_level_tree() {
        let lines = [
            "* 音読み",
            "** [[呉音]] : [[ロク]]",
            "** [[漢音]] : [[リク]]",
            "* 訓読み",
            "*: [[ころす|ころ-す]]",
        ];
        let tree = build_hierarchy(&lines);
        assert_eq!(
            tree,
            vec![
                HierarchyNode::with_children(
                    " 音読み",
                    vec![leaf(" [[呉音]] : [[ロク]]"), leaf(" [[漢音]] : [[リク]]")]
                ),
                leaf(" 訓読み"),
                leaf(": [[ころす|ころ-す]]"),
            ]
        );
    }

    #[test]
    fn depth_is_relative_to_minimum() {
        let shallow = build_hierarchy(&["* a", "** b", "* c"]);
        let deep = build_hierarchy(&["** a", "*** b", "** c"]);
        assert_eq!(shallow, deep);
    }

    #[test]
    fn three_levels() {
        let tree = build_hierarchy(&["*1", "**1.1", "***1.1.1", "**1.2", "*2", "**2.1"]);
        assert_eq!(
            tree,
            vec![
                HierarchyNode::with_children(
                    "1",
                    vec![
                        HierarchyNode::with_children("1.1", vec![leaf("1.1.1")]),
                        leaf("1.2"),
                    ]
                ),
                HierarchyNode::with_children("2", vec![leaf("2.1")]),
            ]
        );
    }

    #[test]
    fn lines_without_markers_are_dropped() {
        let tree = build_hierarchy(&["intro", "*a", "plain", "**b"]);
        assert_eq!(tree, vec![HierarchyNode::with_children("a", vec![leaf("b")])]);
    }

    #[test]
    fn leading_deeper_lines_are_adopted_by_first_node() {
        let tree = build_hierarchy(&["**orphan", "*a", "**b"]);
        assert_eq!(
            tree,
            vec![HierarchyNode::with_children("a", vec![leaf("orphan"), leaf("b")])]
        );
    }

    #[test]
    fn uneven_children_group_by_their_own_minimum() {
        // Under `a` the shallowest child is at depth 2, so the depth-3 line
        // before it is adopted by that child.
        let tree = build_hierarchy(&["*a", "***x", "**y"]);
        assert_eq!(
            tree,
            vec![HierarchyNode::with_children(
                "a",
                vec![HierarchyNode::with_children("y", vec![leaf("x")])]
            )]
        );
    }

    #[test]
    fn text_after_the_markers_is_kept_verbatim() {
        let tree = build_hierarchy(&["* a", "**  b"]);
        assert_eq!(tree, vec![HierarchyNode::with_children(" a", vec![leaf("  b")])]);
    }

    #[test]
    fn empty_input() {
        let lines: [&str; 0] = [];
        assert!(build_hierarchy(&lines).is_empty());
        assert!(build_hierarchy(&["no markers here"]).is_empty());
    }

    #[test]
    fn deep_nesting_does_not_overflow() {
        let lines: Vec<String> = (1..=5000).map(|d| format!("{}x", "*".repeat(d))).collect();
        let tree = build_hierarchy(&lines);
        assert_eq!(tree.len(), 1);
        let mut depth = 1;
        let mut node = &tree[0];
        while let Some(child) = node.children.first() {
            node = child;
            depth += 1;
        }
        assert_eq!(depth, 5000);
        // Dropping a 5000-deep tree recurses in Drop; unwind it iteratively.
        let mut stack = tree;
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}
