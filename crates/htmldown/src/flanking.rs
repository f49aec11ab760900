//! Flanking-whitespace analysis.
//!
//! Markdown delimiters must not be separated from their content by
//! whitespace, so whitespace at the edges of an inline element is hoisted
//! outside the delimiters. ASCII whitespace is dropped when an adjacent
//! sibling already supplies it; non-ASCII whitespace (NBSP and friends) is
//! preserved and re-encoded as `&nbsp;` so it stays visible in the output.

use crate::collapse::{collected_text, CollapsedText};
use crate::node::{NodeData, NodeRef};
use crate::utilities::{
    encode_nbsp, is_ascii_whitespace_codepoint, is_block, is_code, is_meaningful_when_blank,
    is_unicode_whitespace, is_void, has_meaningful_when_blank, has_void,
};

/// Whitespace hoisted from inside an element to outside its delimiters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlankingWhitespace {
    /// Whitespace preceding the converted content
    pub leading: String,
    /// Whitespace following the converted content
    pub trailing: String,
}

/// Which side of a node a sibling check applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlankSide {
    /// The previous-sibling side
    Left,
    /// The next-sibling side
    Right,
}

#[derive(Default)]
struct EdgeWhitespace {
    leading: String,
    leading_ascii: String,
    leading_non_ascii: String,
    trailing: String,
    trailing_ascii: String,
    trailing_non_ascii: String,
}

// Splits each edge run of Unicode whitespace into ASCII and non-ASCII
// buckets, preserving byte order within each bucket. A fully-whitespace
// string lands entirely in the leading parts.
fn edge_whitespace(text: &str) -> EdgeWhitespace {
    let mut edges = EdgeWhitespace::default();

    let mut interior_start = text.len();
    for (index, c) in text.char_indices() {
        if !is_unicode_whitespace(c) {
            interior_start = index;
            break;
        }
        edges.leading.push(c);
        if is_ascii_whitespace_codepoint(c) {
            edges.leading_ascii.push(c);
        } else {
            edges.leading_non_ascii.push(c);
        }
    }
    if interior_start == text.len() {
        return edges;
    }

    let interior = &text[interior_start..];
    let trailing_start = interior
        .char_indices()
        .rev()
        .take_while(|&(_, c)| is_unicode_whitespace(c))
        .last()
        .map(|(index, _)| index)
        .unwrap_or(interior.len());
    for c in interior[trailing_start..].chars() {
        edges.trailing.push(c);
        if is_ascii_whitespace_codepoint(c) {
            edges.trailing_ascii.push(c);
        } else {
            edges.trailing_non_ascii.push(c);
        }
    }

    edges
}

fn adjacent_sibling<'a>(node: NodeRef<'a>, side: FlankSide) -> Option<NodeRef<'a>> {
    match side {
        FlankSide::Left => node.previous_sibling(),
        FlankSide::Right => node.next_sibling(),
    }
}

/// Check whether the sibling on the given side supplies an ASCII space
/// adjacent to this node.
///
/// Block siblings never count, and neither do code siblings while
/// `preformatted_code` is in effect.
pub fn is_flanked_by_whitespace(
    side: FlankSide,
    node: NodeRef<'_>,
    collapsed: &CollapsedText,
    preformatted_code: bool,
) -> bool {
    let Some(sibling) = adjacent_sibling(node, side) else {
        return false;
    };

    match sibling.data() {
        NodeData::Element { .. } => {
            if preformatted_code && is_code(sibling) {
                return false;
            }
            if is_block(sibling) {
                return false;
            }
        }
        NodeData::Text(_) => {}
        _ => return false,
    }

    let text = collected_text(sibling, collapsed);
    if text.is_empty() {
        return false;
    }
    match side {
        FlankSide::Left => text.ends_with(' '),
        FlankSide::Right => text.starts_with(' '),
    }
}

/// Compute the whitespace to hoist outside a node's Markdown delimiters.
///
/// Block elements and code nodes under `preformatted_code` hoist nothing.
pub fn flanking_whitespace(
    node: NodeRef<'_>,
    collapsed: &CollapsedText,
    preformatted_code: bool,
) -> FlankingWhitespace {
    if is_block(node) || (preformatted_code && is_code(node)) {
        return FlankingWhitespace::default();
    }

    let text = collected_text(node, collapsed);
    if text.is_empty() {
        return FlankingWhitespace::default();
    }

    let edges = edge_whitespace(&text);
    let mut leading = edges.leading;
    let mut trailing = edges.trailing;

    if !edges.leading_ascii.is_empty()
        && is_flanked_by_whitespace(FlankSide::Left, node, collapsed, preformatted_code)
    {
        leading = edges.leading_non_ascii;
    }
    if !edges.trailing_ascii.is_empty()
        && is_flanked_by_whitespace(FlankSide::Right, node, collapsed, preformatted_code)
    {
        trailing = edges.trailing_non_ascii;
    }

    FlankingWhitespace {
        leading: encode_nbsp(&leading),
        trailing: encode_nbsp(&trailing),
    }
}

/// An element is blank when it renders to pure whitespace and carries no
/// void or otherwise meaningful descendant.
pub fn is_blank(node: NodeRef<'_>) -> bool {
    if node.is_element() && (is_void(node) || is_meaningful_when_blank(node)) {
        return false;
    }
    if !node.text_content().chars().all(is_unicode_whitespace) {
        return false;
    }
    if node.is_element() && (has_void(node) || has_meaningful_when_blank(node)) {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::Document;

    // Edge-whitespace cases: input text wrapped in a paragraph, expected
    // (leading, trailing) as produced for the bare text node.
    #[test]
    fn test_edge_whitespace_detection() {
        let nbsp = "\u{a0}";
        let cases: Vec<(String, String, String)> = vec![
            (" \r\n\tHELLO WORLD \r\n\t".into(), " \r\n\t".into(), " \r\n\t".into()),
            (" \r\nH \r\n".into(), " \r\n".into(), " \r\n".into()),
            (
                format!(" \r\n{nbsp} \r\nHELLO \r\nWORLD \r\n{nbsp} \r\n"),
                format!(" \r\n{nbsp} \r\n"),
                format!(" \r\n{nbsp} \r\n"),
            ),
            (
                format!("{nbsp} \r\nHELLO \r\nWORLD \r\n{nbsp}"),
                format!("{nbsp} \r\n"),
                format!(" \r\n{nbsp}"),
            ),
            (format!("{nbsp} \r\n{nbsp}"), format!("{nbsp} \r\n{nbsp}"), String::new()),
            ("HELLO WORLD".into(), String::new(), String::new()),
            (format!("TEST{}END", " ".repeat(32768)), String::new(), String::new()),
        ];

        for (text, leading, trailing) in cases {
            let edges = edge_whitespace(&text);
            assert_eq!(edges.leading, leading, "leading of {text:?}");
            assert_eq!(edges.trailing, trailing, "trailing of {text:?}");
        }
    }

    #[test]
    fn test_flanking_on_text_node() {
        let document = Document::parse("<p> \r\n\thello \r\n\t</p>");
        let p = document.body().find_child("p").unwrap();
        let text = p.first_child().unwrap();
        let flanking = flanking_whitespace(text, &CollapsedText::default(), false);
        assert_eq!(flanking.leading, " \r\n\t");
        assert_eq!(flanking.trailing, " \r\n\t");
    }

    #[test]
    fn test_flanking_encodes_nbsp() {
        let document = Document::parse("<p><i>\u{a0}bar</i></p>");
        let i = document.body().find_child("p").unwrap().find_child("i").unwrap();
        let flanking = flanking_whitespace(i, &CollapsedText::default(), false);
        assert_eq!(flanking.leading, "&nbsp;");
        assert_eq!(flanking.trailing, "");
    }

    #[test]
    fn test_flanked_ascii_is_dropped() {
        // "foo " supplies the space, so the em's leading ASCII run is dropped.
        let document = Document::parse("<p>foo <em> bar</em></p>");
        let p = document.body().find_child("p").unwrap();
        let em = p.find_child("em").unwrap();
        let flanking = flanking_whitespace(em, &CollapsedText::default(), false);
        assert_eq!(flanking.leading, "");
    }

    #[test]
    fn test_block_sibling_does_not_flank() {
        let document = Document::parse("<div><div>x </div><em> y</em></div>");
        let outer = document.body().find_child("div").unwrap();
        let em = outer.find_child("em").unwrap();
        assert!(!is_flanked_by_whitespace(
            FlankSide::Left,
            em,
            &CollapsedText::default(),
            false
        ));
    }

    #[test]
    fn test_block_elements_have_no_flanking() {
        let document = Document::parse("<div>  spaced  </div>");
        let div = document.body().find_child("div").unwrap();
        let flanking = flanking_whitespace(div, &CollapsedText::default(), false);
        assert_eq!(flanking, FlankingWhitespace::default());
    }

    #[test]
    fn test_is_blank() {
        let document = Document::parse(
            "<em></em><strong> \n </strong><a href=\"x\"></a><span><br></span><p>text</p>",
        );
        let body = document.body();
        let mut elements = body.element_children();
        let em = elements.next().unwrap();
        let strong = elements.next().unwrap();
        let a = elements.next().unwrap();
        let span = elements.next().unwrap();
        let p = elements.next().unwrap();

        assert!(is_blank(em));
        assert!(is_blank(strong));
        assert!(!is_blank(a), "meaningful when blank");
        assert!(!is_blank(span), "void descendant");
        assert!(!is_blank(p));
    }
}
