//! The built-in CommonMark rule set.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock, Mutex};

use regex::Regex;

use super::{Filter, Rule};
use crate::node::NodeRef;
use crate::service::{CodeBlockStyle, HeadingStyle, HtmldownOptions, LinkReferenceStyle, LinkStyle};
use crate::utilities::{clean_attribute, trim_str};

/// Create the CommonMark rules, keyed, in match order.
pub fn commonmark_rules() -> Vec<(&'static str, Rule)> {
    vec![
        ("paragraph", paragraph_rule()),
        ("lineBreak", line_break_rule()),
        ("heading", heading_rule()),
        ("blockquote", blockquote_rule()),
        ("list", list_rule()),
        ("listItem", list_item_rule()),
        ("indentedCodeBlock", indented_code_block_rule()),
        ("fencedCodeBlock", fenced_code_block_rule()),
        ("horizontalRule", horizontal_rule()),
        ("inlineLink", inline_link_rule()),
        ("referenceLink", reference_link_rule()),
        ("emphasis", emphasis_rule()),
        ("strong", strong_rule()),
        ("code", code_rule()),
        ("image", image_rule()),
    ]
}

fn trim_newlines(text: &str) -> &str {
    text.trim_matches(['\n', '\r'])
}

fn paragraph_rule() -> Rule {
    Rule::for_tag("p", |content, _, _| format!("\n\n{content}\n\n"))
}

fn line_break_rule() -> Rule {
    Rule::for_tag("br", |_, _, options| format!("{}\n", options.br))
}

fn heading_rule() -> Rule {
    Rule::for_tags(&["h1", "h2", "h3", "h4", "h5", "h6"], |content, node, options| {
        let level: usize = node
            .tag_name()
            .and_then(|tag| tag[1..].parse().ok())
            .unwrap_or(1);

        match options.heading_style {
            HeadingStyle::Setext if level <= 2 => {
                let underline = if level == 1 { "=" } else { "-" };
                format!(
                    "\n\n{content}\n{}\n\n",
                    underline.repeat(content.chars().count())
                )
            }
            _ => format!("\n\n{} {content}\n\n", "#".repeat(level)),
        }
    })
}

fn blockquote_rule() -> Rule {
    Rule::for_tag("blockquote", |content, _, _| {
        let quoted: String = trim_newlines(content)
            .lines()
            .map(|line| format!("> {line}\n"))
            .collect();
        format!("\n\n{quoted}\n\n")
    })
}

fn is_last_element_child(parent: NodeRef<'_>, node: NodeRef<'_>) -> bool {
    parent
        .element_children()
        .last()
        .is_some_and(|last| last.id() == node.id())
}

fn list_rule() -> Rule {
    Rule::for_tags(&["ul", "ol"], |content, node, _| {
        let inner = trim_newlines(content);
        if let Some(parent) = node.parent() {
            if parent.has_tag("li") && is_last_element_child(parent, node) {
                return format!("\n{inner}");
            }
        }
        format!("\n\n{inner}\n\n")
    })
}

static TRAILING_NEWLINE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*$").unwrap());

fn next_element_sibling<'a>(node: NodeRef<'a>) -> Option<NodeRef<'a>> {
    let mut sibling = node.next_sibling();
    while let Some(s) = sibling {
        if s.is_element() {
            return Some(s);
        }
        sibling = s.next_sibling();
    }
    None
}

fn element_index(node: NodeRef<'_>) -> Option<usize> {
    let parent = node.parent()?;
    parent
        .element_children()
        .position(|child| child.id() == node.id())
}

fn list_item_rule() -> Rule {
    Rule::for_tag("li", |content, node, options| {
        let ltrimmed = content.trim_start_matches(['\n', '\r']);
        let rtrimmed = ltrimmed.trim_end_matches(['\n', '\r']);
        let had_trailing_newlines = rtrimmed.len() != ltrimmed.len();
        let mut result = rtrimmed.to_string();
        if had_trailing_newlines {
            result.push('\n');
        }
        result = result.replace('\n', "\n    ");

        let parent = node.parent();
        let prefix = match parent {
            Some(parent) if parent.has_tag("ol") => {
                let start: i64 = parent
                    .attr("start")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(1);
                match element_index(node) {
                    Some(index) => format!("{}.  ", start + index as i64),
                    None => "1.  ".to_string(),
                }
            }
            _ => format!("{}   ", options.bullet_list_marker),
        };

        let has_next = next_element_sibling(node).is_some();
        if has_next && result.contains('\n') {
            // a multi-line item needs a blank, indented line before the next item
            result = TRAILING_NEWLINE_RUN.replace(&result, "\n    ").into_owned();
        }
        let needs_trailing_newline = has_next && !result.ends_with('\n');
        if needs_trailing_newline {
            result.push('\n');
        }
        format!("{prefix}{result}")
    })
}

fn code_text(pre: NodeRef<'_>) -> String {
    match pre.find_child("code") {
        Some(code) => code.text_content(),
        None => pre.text_content(),
    }
}

fn indented_code_block_rule() -> Rule {
    Rule::new(
        Filter::predicate(|node, options| {
            options.code_block_style == CodeBlockStyle::Indented
                && node.has_tag("pre")
                && node.find_child("code").is_some()
        }),
        |_, node, _| {
            let mut code = code_text(node);
            if code.ends_with('\n') {
                code.pop();
            }
            let code = code.replace('\n', "\n    ");
            format!("\n\n    {code}\n\n")
        },
    )
}

static LANGUAGE_CLASS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"language-(\S+)").unwrap());

fn fenced_code_block_rule() -> Rule {
    Rule::new(
        Filter::predicate(|node, options| {
            options.code_block_style == CodeBlockStyle::Fenced
                && node.has_tag("pre")
                && node.find_child("code").is_some()
        }),
        |_, node, options| {
            let code_node = node.find_child("code");
            let language = code_node
                .and_then(|code| code.attr("class"))
                .and_then(|class| LANGUAGE_CLASS.captures(class))
                .map(|captures| captures[1].to_string())
                .unwrap_or_default();

            let mut code = match code_node {
                Some(code) => code.text_content(),
                None => String::new(),
            };

            let fence_char = options.fence.chars().next().unwrap_or('`');
            let mut fence_size = 3;
            for line in code.lines() {
                let run = line.chars().take_while(|&c| c == fence_char).count();
                if run >= 3 {
                    fence_size = fence_size.max(run + 1);
                }
            }
            let fence: String = std::iter::repeat(fence_char).take(fence_size).collect();

            if code.ends_with('\n') {
                code.pop();
            }
            format!("\n\n{fence}{language}\n{code}\n{fence}\n\n")
        },
    )
}

fn horizontal_rule() -> Rule {
    Rule::for_tag("hr", |_, _, options| format!("\n\n{}\n\n", options.hr))
}

fn has_href(node: NodeRef<'_>) -> bool {
    node.attr("href").is_some_and(|href| !href.is_empty())
}

fn inline_link_rule() -> Rule {
    Rule::new(
        Filter::predicate(|node, options| {
            options.link_style == LinkStyle::Inlined && node.has_tag("a") && has_href(node)
        }),
        |content, node, _| {
            let href = node.attr("href").unwrap_or_default();
            let mut escaped_href = String::with_capacity(href.len());
            for c in href.chars() {
                if c == '(' || c == ')' {
                    escaped_href.push('\\');
                }
                escaped_href.push(c);
            }
            let title = node
                .attr("title")
                .filter(|t| !t.is_empty())
                .map(clean_attribute);
            let title_part = title
                .map(|t| format!(" \"{}\"", t.replace('"', "\\\"")))
                .unwrap_or_default();
            format!("[{content}]({escaped_href}{title_part})")
        },
    )
}

fn reference_link_rule() -> Rule {
    // Per-service accumulator; append() drains it so every conversion on the
    // same service starts with an empty table.
    let references: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let append_references = Arc::clone(&references);

    Rule::new(
        Filter::predicate(|node, options| {
            options.link_style == LinkStyle::Referenced && node.has_tag("a") && has_href(node)
        }),
        move |content, node, options| {
            let href = node.attr("href").unwrap_or_default();
            let title = node
                .attr("title")
                .filter(|t| !t.is_empty())
                .map(clean_attribute);
            let title_part = title.map(|t| format!(" \"{t}\"")).unwrap_or_default();

            let mut references = references.lock().expect("reference accumulator poisoned");
            let (replacement, reference) = match options.link_reference_style {
                LinkReferenceStyle::Collapsed => (
                    format!("[{content}][]"),
                    format!("[{content}]: {href}{title_part}"),
                ),
                LinkReferenceStyle::Shortcut => (
                    format!("[{content}]"),
                    format!("[{content}]: {href}{title_part}"),
                ),
                LinkReferenceStyle::Full => {
                    let id = references.len() + 1;
                    (
                        format!("[{content}][{id}]"),
                        format!("[{id}]: {href}{title_part}"),
                    )
                }
            };
            references.push(reference);
            replacement
        },
    )
    .with_append(move |_| {
        let mut references = append_references
            .lock()
            .expect("reference accumulator poisoned");
        if references.is_empty() {
            return String::new();
        }
        let mut out = String::from("\n\n");
        for reference in references.iter() {
            out.push_str(reference);
            out.push('\n');
        }
        out.push_str("\n\n");
        references.clear();
        out
    })
}

fn emphasis_rule() -> Rule {
    Rule::for_tags(&["em", "i"], |content, _, options| {
        if trim_str(content).is_empty() {
            return String::new();
        }
        format!("{0}{content}{0}", options.em_delimiter)
    })
}

fn strong_rule() -> Rule {
    Rule::for_tags(&["strong", "b"], |content, _, options| {
        if trim_str(content).is_empty() {
            return String::new();
        }
        format!("{0}{content}{0}", options.strong_delimiter)
    })
}

// A <code> that is the sole element child of a <pre> is a code block, not
// inline code.
fn is_code_block(node: NodeRef<'_>) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    if !parent.has_tag("pre") {
        return false;
    }
    !parent
        .element_children()
        .any(|sibling| sibling.id() != node.id())
}

fn code_rule() -> Rule {
    Rule::new(
        Filter::predicate(|node, _| node.has_tag("code") && !is_code_block(node)),
        |content, _, _| {
            if content.is_empty() {
                return String::new();
            }
            let normalized: String = {
                let mut out = String::with_capacity(content.len());
                let mut chars = content.chars().peekable();
                while let Some(c) = chars.next() {
                    match c {
                        '\r' => {
                            if chars.peek() == Some(&'\n') {
                                chars.next();
                            }
                            out.push(' ');
                        }
                        '\n' => out.push(' '),
                        _ => out.push(c),
                    }
                }
                out
            };

            let needs_space = normalized.starts_with('`')
                || normalized.ends_with('`')
                || (normalized.starts_with(' ')
                    && normalized.ends_with(' ')
                    && normalized.chars().any(|c| c != ' '));

            let mut runs: HashSet<usize> = HashSet::new();
            let mut run = 0;
            for c in normalized.chars().chain(std::iter::once('\0')) {
                if c == '`' {
                    run += 1;
                } else if run > 0 {
                    runs.insert(run);
                    run = 0;
                }
            }
            let mut delimiter_len = 1;
            while runs.contains(&delimiter_len) {
                delimiter_len += 1;
            }
            let delimiter = "`".repeat(delimiter_len);
            let pad = if needs_space { " " } else { "" };
            format!("{delimiter}{pad}{normalized}{pad}{delimiter}")
        },
    )
}

fn image_rule() -> Rule {
    Rule::for_tag("img", |_, node, _| {
        let src = node.attr("src").unwrap_or_default();
        if src.is_empty() {
            return String::new();
        }
        let alt = node
            .attr("alt")
            .filter(|a| !a.is_empty())
            .map(clean_attribute)
            .unwrap_or_default();
        let title = node
            .attr("title")
            .filter(|t| !t.is_empty())
            .map(clean_attribute);
        let title_part = title.map(|t| format!(" \"{t}\"")).unwrap_or_default();
        format!("![{alt}]({src}{title_part})")
    })
}
