//! Tag classification tables, escape discipline, and text utilities.

use std::sync::LazyLock;

use regex::Regex;

use crate::node::{NodeData, NodeRef};

/// Block-level HTML elements.
pub const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "audio", "blockquote", "body", "canvas",
    "center", "dd", "dir", "div", "dl", "dt", "fieldset", "figcaption",
    "figure", "footer", "form", "frameset", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hgroup", "hr", "html", "isindex", "li", "main", "menu",
    "nav", "noframes", "noscript", "ol", "output", "p", "pre", "section",
    "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Void (self-closing) HTML elements.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements that carry meaning even when they contain only whitespace.
pub const MEANINGFUL_WHEN_BLANK: &[&str] = &[
    "a", "table", "thead", "tbody", "tfoot", "th", "td", "iframe", "script",
    "audio", "video",
];

fn node_has_tag_in(node: NodeRef<'_>, tags: &[&str]) -> bool {
    node.tag_name().is_some_and(|tag| tags.contains(&tag))
}

fn has_descendant_with_tag(node: NodeRef<'_>, tags: &[&str]) -> bool {
    node.children()
        .any(|child| node_has_tag_in(child, tags) || has_descendant_with_tag(child, tags))
}

/// Check if a node is a block-level element.
pub fn is_block(node: NodeRef<'_>) -> bool {
    node_has_tag_in(node, BLOCK_ELEMENTS)
}

/// Check if a node is a void element.
pub fn is_void(node: NodeRef<'_>) -> bool {
    node_has_tag_in(node, VOID_ELEMENTS)
}

/// Check if a node is a `<pre>` element.
pub fn is_pre(node: NodeRef<'_>) -> bool {
    node.has_tag("pre")
}

/// Check if a node is a `<code>` element or has a `<code>` ancestor.
pub fn is_code(node: NodeRef<'_>) -> bool {
    if node.has_tag("code") {
        return true;
    }
    match node.parent() {
        Some(parent) => is_code(parent),
        None => false,
    }
}

/// Check if a node is meaningful even when blank.
pub fn is_meaningful_when_blank(node: NodeRef<'_>) -> bool {
    node_has_tag_in(node, MEANINGFUL_WHEN_BLANK)
}

/// Check if any descendant is meaningful when blank.
pub fn has_meaningful_when_blank(node: NodeRef<'_>) -> bool {
    has_descendant_with_tag(node, MEANINGFUL_WHEN_BLANK)
}

/// Check if any descendant is a void element.
pub fn has_void(node: NodeRef<'_>) -> bool {
    has_descendant_with_tag(node, VOID_ELEMENTS)
}

/// ASCII whitespace as the collapse pass understands it.
pub fn is_ascii_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// ASCII whitespace code points for edge-whitespace classification
/// (U+0009..U+000D and U+0020).
pub fn is_ascii_whitespace_codepoint(c: char) -> bool {
    matches!(c, ' ' | '\u{09}'..='\u{0d}')
}

/// Unicode whitespace, including NBSP and the Mongolian vowel separator
/// which `char::is_whitespace` no longer covers.
pub fn is_unicode_whitespace(c: char) -> bool {
    c.is_whitespace() || c == '\u{180e}'
}

/// Trim Unicode whitespace from both ends of a string.
pub fn trim_str(s: &str) -> &str {
    s.trim_matches(is_unicode_whitespace)
}

/// Replace every UTF-8 NBSP with the literal `&nbsp;` entity so it survives
/// Markdown whitespace collapsing.
pub fn encode_nbsp(text: &str) -> String {
    text.replace('\u{a0}', "&nbsp;")
}

static ATTRIBUTE_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\n+\s*)+").unwrap());

/// Collapse newline runs in an attribute value to a single newline.
pub fn clean_attribute(value: &str) -> String {
    ATTRIBUTE_NEWLINES.replace_all(value, "\n").into_owned()
}

/// Escape Markdown-special characters so the text round-trips as literal
/// content. This is the default escape; see [`minimal_escape`] for the
/// conservative variant.
pub fn advanced_escape(text: &str) -> String {
    let mut out = text.replace('\\', "\\\\").replace('*', "\\*");

    if out.starts_with('-') {
        out.insert(0, '\\');
    }
    if out.starts_with("+ ") {
        out.insert(0, '\\');
    }
    if out.starts_with('=') {
        out.insert(0, '\\');
    }
    let hashes = out.bytes().take_while(|&b| b == b'#').count();
    if (1..=6).contains(&hashes) && out.as_bytes().get(hashes) == Some(&b' ') {
        out.insert(0, '\\');
    }

    out = out.replace('`', "\\`");
    if out.starts_with("~~~") {
        out.insert(0, '\\');
    }
    out = out.replace('[', "\\[").replace(']', "\\]");
    if out.starts_with('>') {
        out.insert(0, '\\');
    }
    out = out.replace('_', "\\_");

    // ordered-list prefix: digits followed by ". "
    let digits = out.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0
        && out.as_bytes().get(digits) == Some(&b'.')
        && out.as_bytes().get(digits + 1) == Some(&b' ')
    {
        out.insert(digits, '\\');
    }

    out
}

/// Escape only backslashes and square brackets.
pub fn minimal_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn escape_html(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\'' if attribute => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize a node back to HTML, used by keep filters.
pub fn serialize_node(node: NodeRef<'_>) -> String {
    let mut out = String::new();
    serialize_into(node, &mut out);
    out
}

fn serialize_into(node: NodeRef<'_>, out: &mut String) {
    match node.data() {
        NodeData::Text(text) => out.push_str(&escape_html(text, false)),
        NodeData::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        NodeData::Document => {
            for child in node.children() {
                serialize_into(child, out);
            }
        }
        NodeData::Element { tag, attrs } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape_html(value, true));
                out.push('"');
            }
            out.push('>');
            if !is_void(node) {
                for child in node.children() {
                    serialize_into(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::DomTree;

    #[test]
    fn test_block_and_void_classification() {
        let mut tree = DomTree::new();
        let root = tree.root_id();
        let div = tree.append_element(root, "div", Vec::<(&str, &str)>::new());
        let span = tree.append_element(root, "span", Vec::<(&str, &str)>::new());
        let br = tree.append_element(root, "br", Vec::<(&str, &str)>::new());

        assert!(is_block(tree.get(div)));
        assert!(!is_block(tree.get(span)));
        assert!(is_void(tree.get(br)));
        assert!(!is_void(tree.get(div)));
    }

    #[test]
    fn test_code_ancestor() {
        let mut tree = DomTree::new();
        let root = tree.root_id();
        let code = tree.append_element(root, "code", Vec::<(&str, &str)>::new());
        let span = tree.append_element(code, "span", Vec::<(&str, &str)>::new());
        let text = tree.append_text(span, "x");
        let outside = tree.append_text(root, "y");

        assert!(is_code(tree.get(code)));
        assert!(is_code(tree.get(span)));
        assert!(is_code(tree.get(text)));
        assert!(!is_code(tree.get(outside)));
    }

    #[test]
    fn test_descendant_scans() {
        let mut tree = DomTree::new();
        let root = tree.root_id();
        let div = tree.append_element(root, "div", Vec::<(&str, &str)>::new());
        let p = tree.append_element(div, "p", Vec::<(&str, &str)>::new());
        tree.append_element(p, "img", vec![("src", "x.png")]);

        assert!(has_void(tree.get(div)));
        assert!(!has_meaningful_when_blank(tree.get(div)));
    }

    #[test]
    fn test_advanced_escape() {
        assert_eq!(advanced_escape("backslash \\"), "backslash \\\\");
        assert_eq!(advanced_escape("You can use * here"), "You can use \\* here");
        assert_eq!(advanced_escape("- item"), "\\- item");
        assert_eq!(advanced_escape("Hello-world"), "Hello-world");
        assert_eq!(advanced_escape("+ item"), "\\+ item");
        assert_eq!(advanced_escape("+1 and another +"), "+1 and another +");
        assert_eq!(advanced_escape("==="), "\\===");
        assert_eq!(advanced_escape("A sentence containing ="), "A sentence containing =");
        assert_eq!(advanced_escape("### not a heading"), "\\### not a heading");
        assert_eq!(advanced_escape("#not # a heading"), "#not # a heading");
        assert_eq!(advanced_escape("`not code`"), "\\`not code\\`");
        assert_eq!(advanced_escape("~~~ foo"), "\\~~~ foo");
        assert_eq!(advanced_escape("containing ~~~"), "containing ~~~");
        assert_eq!(advanced_escape("[brackets]"), "\\[brackets\\]");
        assert_eq!(advanced_escape("> quote"), "\\> quote");
        assert_eq!(advanced_escape("42 > 1"), "42 > 1");
        assert_eq!(advanced_escape("_underscore_"), "\\_underscore\\_");
        assert_eq!(advanced_escape("1984. by George Orwell"), "1984\\. by George Orwell");
        assert_eq!(advanced_escape("1984.George Orwell"), "1984.George Orwell");
        assert_eq!(advanced_escape("* * *"), "\\* \\* \\*");
    }

    #[test]
    fn test_minimal_escape() {
        assert_eq!(minimal_escape("[a] \\ b"), "\\[a\\] \\\\ b");
        assert_eq!(minimal_escape("*_`#"), "*_`#");
    }

    #[test]
    fn test_clean_attribute() {
        assert_eq!(clean_attribute("the\n    \n    title"), "the\ntitle");
        assert_eq!(clean_attribute("plain"), "plain");
    }

    #[test]
    fn test_encode_nbsp() {
        assert_eq!(encode_nbsp("a\u{a0}b"), "a&nbsp;b");
    }

    #[test]
    fn test_serialize_node() {
        let mut tree = DomTree::new();
        let root = tree.root_id();
        let a = tree.append_element(root, "a", vec![("href", "x?a=1&b=\"2\"")]);
        tree.append_text(a, "1 < 2 & 3");
        let br = tree.append_element(root, "br", Vec::<(&str, &str)>::new());

        assert_eq!(
            serialize_node(tree.get(a)),
            "<a href=\"x?a=1&amp;b=&quot;2&quot;\">1 &lt; 2 &amp; 3</a>"
        );
        assert_eq!(serialize_node(tree.get(br)), "<br>");
    }
}
