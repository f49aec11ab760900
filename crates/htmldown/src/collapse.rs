//! Browser-style whitespace collapsing.
//!
//! A single pre-pass over the tree simulates how a browser would render
//! inline whitespace, producing a [`CollapsedText`] side table instead of
//! mutating the DOM: text nodes map to their collapsed replacement, and nodes
//! that collapse to nothing land in an omit set. Everything downstream reads
//! text through [`collected_text`] so the table stays authoritative for the
//! duration of one conversion.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::node::{NodeData, NodeId, NodeRef};
use crate::utilities::{is_block, is_void};

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \r\n\t]+").unwrap());

/// Per-conversion whitespace-collapse results.
///
/// Keys are node identities; only text nodes ever appear in the table.
#[derive(Debug, Default)]
pub struct CollapsedText {
    replacements: HashMap<NodeId, String>,
    omitted: HashSet<NodeId>,
}

impl CollapsedText {
    /// The collapsed replacement for a text node, if any.
    pub fn replacement(&self, id: NodeId) -> Option<&str> {
        self.replacements.get(&id).map(String::as_str)
    }

    /// Whether the node collapsed to nothing and should be skipped.
    pub fn is_omitted(&self, id: NodeId) -> bool {
        self.omitted.contains(&id)
    }
}

fn is_pre_node(node: NodeRef<'_>, treat_code_as_pre: bool) -> bool {
    node.has_tag("pre") || (treat_code_as_pre && node.has_tag("code"))
}

// Omitted nodes count as removed, so traversal must not see them again.
fn effective_first_child<'a>(node: NodeRef<'a>, result: &CollapsedText) -> Option<NodeRef<'a>> {
    let mut child = node.first_child();
    while let Some(c) = child {
        if !result.is_omitted(c.id()) {
            return Some(c);
        }
        child = c.next_sibling();
    }
    None
}

fn effective_next_sibling<'a>(node: NodeRef<'a>, result: &CollapsedText) -> Option<NodeRef<'a>> {
    let mut sibling = node.next_sibling();
    while let Some(s) = sibling {
        if !result.is_omitted(s.id()) {
            return Some(s);
        }
        sibling = s.next_sibling();
    }
    None
}

// Document-order successor, honoring preformatted subtrees (never descended
// into) and the no-revisit rule when arriving from a child.
fn next_node<'a>(
    prev: Option<NodeRef<'a>>,
    current: NodeRef<'a>,
    result: &CollapsedText,
    treat_code_as_pre: bool,
) -> Option<NodeRef<'a>> {
    let arrived_from_child =
        prev.is_some_and(|p| p.parent().map(|pp| pp.id()) == Some(current.id()));
    if arrived_from_child || is_pre_node(current, treat_code_as_pre) {
        return effective_next_sibling(current, result).or_else(|| current.parent());
    }
    effective_first_child(current, result)
        .or_else(|| effective_next_sibling(current, result))
        .or_else(|| current.parent())
}

// The node that follows `node` once it has been dropped from the walk.
fn after_removal<'a>(node: NodeRef<'a>, result: &CollapsedText) -> Option<NodeRef<'a>> {
    effective_next_sibling(node, result).or_else(|| node.parent())
}

fn strip_trailing_space(result: &mut CollapsedText, id: NodeId) {
    if let Some(text) = result.replacements.get_mut(&id) {
        if text.ends_with(' ') {
            text.pop();
            if text.is_empty() {
                result.omitted.insert(id);
            }
        }
    }
}

/// Collapse whitespace below `root`, recording replacements and omissions.
///
/// The walk revisits ancestors on the way back up; that second visit of a
/// block boundary is what strips the trailing space off the preceding text
/// node. A preformatted root yields an empty table.
pub fn collapse_whitespace(root: NodeRef<'_>, treat_code_as_pre: bool) -> CollapsedText {
    let mut result = CollapsedText::default();
    if is_pre_node(root, treat_code_as_pre) || root.first_child().is_none() {
        return result;
    }

    let mut prev_text: Option<NodeRef<'_>> = None;
    let mut keep_leading_whitespace = false;

    let mut prev: Option<NodeRef<'_>> = None;
    let mut current = next_node(prev, root, &result, treat_code_as_pre);

    while let Some(node) = current {
        if node.id() == root.id() {
            break;
        }

        match node.data() {
            NodeData::Text(raw) => {
                let mut text = WHITESPACE_RUN.replace_all(raw, " ").into_owned();

                let prev_ended_with_space = prev_text.is_some_and(|p| {
                    result
                        .replacement(p.id())
                        .is_some_and(|t| t.ends_with(' '))
                });
                if (prev_text.is_none() || prev_ended_with_space)
                    && !keep_leading_whitespace
                    && text.starts_with(' ')
                {
                    text.remove(0);
                }

                if text.is_empty() {
                    result.omitted.insert(node.id());
                    current = after_removal(node, &result);
                    continue;
                }

                result.replacements.insert(node.id(), text);
                prev_text = Some(node);
            }
            NodeData::Element { .. } => {
                let block_like = is_block(node) || node.has_tag("br");
                let pre_like = is_void(node) || is_pre_node(node, treat_code_as_pre);

                if block_like {
                    if let Some(p) = prev_text {
                        strip_trailing_space(&mut result, p.id());
                    }
                    prev_text = None;
                    keep_leading_whitespace = false;
                } else if pre_like {
                    prev_text = None;
                    keep_leading_whitespace = true;
                } else if prev_text.is_some() {
                    keep_leading_whitespace = false;
                }
            }
            _ => {
                result.omitted.insert(node.id());
                current = after_removal(node, &result);
                continue;
            }
        }

        let next = next_node(prev, node, &result, treat_code_as_pre);
        prev = Some(node);
        current = next;
    }

    if let Some(p) = prev_text {
        strip_trailing_space(&mut result, p.id());
    }

    result
}

/// Collect the text of a subtree, honoring the collapse table.
///
/// Omitted nodes contribute nothing; text nodes yield their replacement when
/// one exists, their raw text otherwise; comments are always empty.
pub fn collected_text(node: NodeRef<'_>, collapsed: &CollapsedText) -> String {
    if collapsed.is_omitted(node.id()) {
        return String::new();
    }
    match node.data() {
        NodeData::Text(raw) => collapsed
            .replacement(node.id())
            .map(str::to_string)
            .unwrap_or_else(|| raw.clone()),
        NodeData::Comment(_) => String::new(),
        NodeData::Document | NodeData::Element { .. } => node
            .children()
            .map(|child| collected_text(child, collapsed))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::Document;

    fn body_text(document: &Document, collapsed: &CollapsedText) -> String {
        collected_text(document.body(), collapsed)
    }

    #[test]
    fn test_collapses_runs_to_single_spaces() {
        let document = Document::parse("<p>Multiple    spaces\n\tand\r\nlines</p>");
        let collapsed = collapse_whitespace(document.body(), false);
        assert_eq!(body_text(&document, &collapsed), "Multiple spaces and lines");
    }

    #[test]
    fn test_strips_edges_around_blocks() {
        let document = Document::parse("<div>  Content  </div><div>  More  </div>");
        let collapsed = collapse_whitespace(document.body(), false);
        assert_eq!(body_text(&document, &collapsed), "ContentMore");
    }

    #[test]
    fn test_whitespace_only_nodes_are_omitted() {
        let document = Document::parse("<p>a</p>\n    <p>b</p>");
        let collapsed = collapse_whitespace(document.body(), false);
        let body = document.body();
        let stray = body
            .children()
            .find(|c| c.is_text())
            .expect("whitespace text node between paragraphs");
        assert!(collapsed.is_omitted(stray.id()));
    }

    #[test]
    fn test_pre_content_is_untouched() {
        let document = Document::parse("<pre>  keep   this\n  layout</pre>");
        let collapsed = collapse_whitespace(document.body(), false);
        let pre = document.body().find_child("pre").unwrap();
        assert_eq!(collected_text(pre, &collapsed), "  keep   this\n  layout");
    }

    #[test]
    fn test_br_strips_preceding_space() {
        let document = Document::parse("More <br>after");
        let collapsed = collapse_whitespace(document.body(), false);
        assert_eq!(body_text(&document, &collapsed), "Moreafter");
    }

    #[test]
    fn test_space_preserved_after_void_element() {
        let document = Document::parse("<img src=\"x.png\"> trailing kept");
        let collapsed = collapse_whitespace(document.body(), false);
        assert_eq!(body_text(&document, &collapsed), " trailing kept");
    }

    #[test]
    fn test_nbsp_survives() {
        let document = Document::parse("<p>Foo<span>&nbsp;</span>Bar</p>");
        let collapsed = collapse_whitespace(document.body(), false);
        assert_eq!(body_text(&document, &collapsed), "Foo\u{a0}Bar");
    }

    #[test]
    fn test_idempotent_over_the_same_tree() {
        let html = "<p>  a  <em> b </em>  c  </p><div> d </div>";
        let document = Document::parse(html);
        let first = collapse_whitespace(document.body(), false);
        let second = collapse_whitespace(document.body(), false);
        assert_eq!(body_text(&document, &first), body_text(&document, &second));
        assert_eq!(first.replacements, second.replacements);
        assert_eq!(first.omitted, second.omitted);
    }

    #[test]
    fn test_code_treated_as_pre_when_requested() {
        let document = Document::parse("<code>  spaced  out  </code>");
        let collapsed = collapse_whitespace(document.body(), true);
        let code = document.body().find_child("code").unwrap();
        assert_eq!(collected_text(code, &collapsed), "  spaced  out  ");
    }
}
