//! Structural repairs that bring a reading tree into the canonical
//! `[音読み, 訓読み]` shape.
//!
//! Page authors split blocks across siblings, repeat headers and nest kun'yomi
//! under the on'yomi bullet. Each repair targets one of these habits; shapes none
//! of them recognizes are passed through untouched.

use crate::hierarchy::HierarchyNode;

pub const ON_MARKER: &str = "音読み";
pub const KUN_MARKER: &str = "訓読み";
const ABSENT_MARKERS: [&str; 2] = ["無し", "なし"];
const KUN_CONTENT_MARKERS: [&str; 3] = ["常用漢字表内", "常用漢字表外", KUN_MARKER];

/// Whether `label` is an explicit "no on'yomi" note.
pub fn is_absence_note(label: &str) -> bool {
    ABSENT_MARKERS.iter().any(|m| label.contains(m))
}

fn is_on(node: &HierarchyNode) -> bool {
    node.label.contains(ON_MARKER)
}

fn is_kun(node: &HierarchyNode) -> bool {
    node.label.contains(KUN_MARKER)
}

/// Run every repair in order.
pub fn normalize(forest: Vec<HierarchyNode>) -> Vec<HierarchyNode> {
    let forest = merge_kunyomi(forest);
    let forest = merge_onyomi(forest);
    fix_mistaken_group(forest)
}

/// The first non-final 訓読み node absorbs every top-level node after it.
pub fn merge_kunyomi(mut forest: Vec<HierarchyNode>) -> Vec<HierarchyNode> {
    let Some(index) = forest
        .iter()
        .enumerate()
        .position(|(i, node)| i + 1 < forest.len() && is_kun(node))
    else {
        return forest;
    };

    let tail = forest.split_off(index + 1);
    forest[index].children.extend(tail);
    forest
}

/// Fold an explicit "no on'yomi" note into the on'yomi node, then absorb stray
/// nodes sitting between the on'yomi run and the kun'yomi node.
pub fn merge_onyomi(mut forest: Vec<HierarchyNode>) -> Vec<HierarchyNode> {
    if forest.len() >= 2
        && is_on(&forest[0])
        && forest[0].is_leaf()
        && is_absence_note(&forest[1].label)
    {
        let absent = forest.remove(1);
        let head = &mut forest[0];
        head.children.push(HierarchyNode::new(absent.label));
        head.children.extend(absent.children);
    }

    if forest.len() <= 2 || !is_on(&forest[0]) {
        return forest;
    }
    let Some(kun_index) = forest.iter().position(is_kun) else {
        return forest;
    };

    let tail = forest.split_off(kun_index);
    let mut result: Vec<HierarchyNode> = Vec::with_capacity(forest.len() + tail.len());
    for node in forest {
        match result.last_mut() {
            Some(last) if !is_on(&node) => last.children.push(node),
            _ => result.push(node),
        }
    }
    result.extend(tail);
    result
}

fn mentions_kun_content(node: &HierarchyNode) -> bool {
    KUN_CONTENT_MARKERS.iter().any(|m| node.label.contains(m))
        || node
            .children
            .iter()
            .any(|child| KUN_CONTENT_MARKERS.iter().any(|m| child.label == *m))
}

/// When the tree is a lone 音読み node, split off any kun'yomi content that was
/// nested under it by mistake.
pub fn fix_mistaken_group(mut forest: Vec<HierarchyNode>) -> Vec<HierarchyNode> {
    if forest.len() != 1 || !is_on(&forest[0]) {
        return forest;
    }

    let Some(split_at) = forest[0].children.iter().position(mentions_kun_content) else {
        return forest;
    };

    let mut on = forest.remove(0);
    let mut moved = on.children.split_off(split_at);
    let kun = if is_kun(&moved[0]) {
        let mut head = moved.remove(0);
        head.children.extend(moved);
        head
    } else {
        HierarchyNode::with_children(KUN_MARKER, moved)
    };

    vec![on, kun]
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
