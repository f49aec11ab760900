//! HTML parsing support.
//!
//! This module adapts [`scraper`] (html5ever) output into the arena
//! [`DomTree`] the conversion engine consumes. Entity decoding is done by the
//! parser; text spans keep their whitespace as written, which the collapse
//! pass relies on. Doctype and processing-instruction nodes are dropped,
//! comments are kept so keep filters can serialize them back out.

use ego_tree;
use scraper::{node::Node as ScraperNode, Html};

use crate::node::{DomTree, NodeId, NodeRef};

/// A parsed HTML document owning its node tree.
pub struct Document {
    tree: DomTree,
}

impl Document {
    /// Parse an HTML string into a document.
    ///
    /// html5ever recovers from arbitrary malformed input, so this never
    /// fails; fragments are wrapped in the usual `html`/`head`/`body`
    /// scaffolding.
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut tree = DomTree::new();
        let root = tree.root_id();
        transfer_children(parsed.tree.root(), &mut tree, root);
        Self { tree }
    }

    /// Wrap an externally built tree, e.g. from a custom parser adapter.
    pub fn from_tree(tree: DomTree) -> Self {
        Self { tree }
    }

    /// The underlying tree.
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// The document root node.
    pub fn root(&self) -> NodeRef<'_> {
        self.tree.root()
    }

    /// The `<body>` element, the engine's default conversion root.
    ///
    /// Falls back to the `<html>` element, then to the document root.
    pub fn body(&self) -> NodeRef<'_> {
        let root = self.tree.root();
        let html = root.find_child("html");
        if let Some(html) = html {
            if let Some(body) = html.find_child("body") {
                return body;
            }
            return html;
        }
        root
    }
}

fn transfer_children(
    source: ego_tree::NodeRef<'_, ScraperNode>,
    tree: &mut DomTree,
    parent: NodeId,
) {
    for child in source.children() {
        match child.value() {
            ScraperNode::Text(text) => {
                tree.append_text(parent, &text);
            }
            ScraperNode::Comment(comment) => {
                tree.append_comment(parent, &comment);
            }
            ScraperNode::Element(element) => {
                let id = tree.append_element(parent, element.name(), element.attrs());
                transfer_children(child, tree, id);
            }
            ScraperNode::Document | ScraperNode::Fragment => {
                transfer_children(child, tree, parent);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wraps_fragment_in_body() {
        let document = Document::parse("<p>Hello World</p>");
        let body = document.body();
        assert!(body.has_tag("body"));
        let p = body.find_child("p").unwrap();
        assert_eq!(p.text_content(), "Hello World");
    }

    #[test]
    fn test_parse_decodes_entities() {
        let document = Document::parse("<p>42 &lt; 9001 &amp; counting&nbsp;on</p>");
        let p = document.body().find_child("p").unwrap();
        assert_eq!(p.text_content(), "42 < 9001 & counting\u{a0}on");
    }

    #[test]
    fn test_parse_keeps_comments() {
        let document = Document::parse("<p>a<!-- note -->b</p>");
        let p = document.body().find_child("p").unwrap();
        let comments: Vec<_> = p.children().filter_map(|c| c.comment()).collect();
        assert_eq!(comments, vec![" note "]);
        assert_eq!(p.text_content(), "ab");
    }

    #[test]
    fn test_parse_recovers_from_malformed_input() {
        let document = Document::parse("<p>Unclosed paragraph<p>Another");
        let body = document.body();
        assert_eq!(body.element_children().count(), 2);
    }

    #[test]
    fn test_body_fallback_on_empty_input() {
        let document = Document::parse("");
        assert!(document.body().has_tag("body"));
    }
}
