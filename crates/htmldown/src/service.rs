//! HtmldownService - the main entry point for HTML to Markdown conversion.

use std::fmt;
use std::sync::Arc;

use crate::collapse::{collapse_whitespace, collected_text, CollapsedText};
use crate::flanking::flanking_whitespace;
use crate::html::Document;
use crate::node::{NodeKind, NodeRef};
use crate::rules::{Filter, Resolution, Rule, RulePlacement, Rules};
use crate::utilities::{advanced_escape, encode_nbsp, is_block, is_code, serialize_node, trim_str};
use crate::Result;

/// Heading style options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingStyle {
    /// Use setext-style headings (underlined with = or -)
    #[default]
    Setext,
    /// Use ATX-style headings (prefixed with #)
    Atx,
}

/// Code block style options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeBlockStyle {
    /// Use indented code blocks (4 spaces)
    #[default]
    Indented,
    /// Use fenced code blocks (``` or ~~~)
    Fenced,
}

/// Link style options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStyle {
    /// Use inline links [text](url)
    #[default]
    Inlined,
    /// Use reference links [text][ref] with a trailing reference table
    Referenced,
}

/// Reference style for referenced links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkReferenceStyle {
    /// Numbered references: `[text][1]`
    #[default]
    Full,
    /// Collapsed references: `[text][]`
    Collapsed,
    /// Shortcut references: `[text]`
    Shortcut,
}

/// Escape function applied to text nodes outside code.
pub type EscapeFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Replacement applied by the blank, keep, and default rules.
pub type NodeReplacementFn = Arc<dyn for<'a> Fn(&str, NodeRef<'a>) -> String + Send + Sync>;

fn blank_replacement(_content: &str, node: NodeRef<'_>) -> String {
    if is_block(node) {
        "\n\n".to_string()
    } else {
        String::new()
    }
}

fn keep_replacement(_content: &str, node: NodeRef<'_>) -> String {
    serialize_node(node)
}

fn default_replacement(content: &str, node: NodeRef<'_>) -> String {
    if is_block(node) {
        format!("\n\n{content}\n\n")
    } else {
        content.to_string()
    }
}

/// Options for [`HtmldownService`].
#[derive(Clone)]
pub struct HtmldownOptions {
    /// Heading style (setext or atx)
    pub heading_style: HeadingStyle,

    /// Horizontal rule literal
    pub hr: String,

    /// Bullet list marker (`*`, `-` or `+`)
    pub bullet_list_marker: char,

    /// Code block style
    pub code_block_style: CodeBlockStyle,

    /// Fence literal for fenced code blocks
    pub fence: String,

    /// Emphasis delimiter
    pub em_delimiter: char,

    /// Strong delimiter
    pub strong_delimiter: String,

    /// Link style
    pub link_style: LinkStyle,

    /// Reference style for referenced links
    pub link_reference_style: LinkReferenceStyle,

    /// Line-break literal emitted for `<br>` (before the newline)
    pub br: String,

    /// Treat `<code>` content as preformatted: no whitespace collapsing
    /// inside, and code siblings never absorb flanking whitespace
    pub preformatted_code: bool,

    /// Lowercased tag names emitted as raw HTML, bypassing rule lookup
    pub keep_tags: Vec<String>,

    /// Escape applied to text nodes outside code
    pub escape: EscapeFn,

    /// Replacement for blank elements
    pub blank_replacement: NodeReplacementFn,

    /// Replacement for kept elements
    pub keep_replacement: NodeReplacementFn,

    /// Replacement when no rule matches
    pub default_replacement: NodeReplacementFn,
}

impl Default for HtmldownOptions {
    fn default() -> Self {
        Self {
            heading_style: HeadingStyle::default(),
            hr: "* * *".to_string(),
            bullet_list_marker: '*',
            code_block_style: CodeBlockStyle::default(),
            fence: "```".to_string(),
            em_delimiter: '_',
            strong_delimiter: "**".to_string(),
            link_style: LinkStyle::default(),
            link_reference_style: LinkReferenceStyle::default(),
            br: "  ".to_string(),
            preformatted_code: false,
            keep_tags: Vec::new(),
            escape: Arc::new(advanced_escape),
            blank_replacement: Arc::new(blank_replacement),
            keep_replacement: Arc::new(keep_replacement),
            default_replacement: Arc::new(default_replacement),
        }
    }
}

impl fmt::Debug for HtmldownOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmldownOptions")
            .field("heading_style", &self.heading_style)
            .field("hr", &self.hr)
            .field("bullet_list_marker", &self.bullet_list_marker)
            .field("code_block_style", &self.code_block_style)
            .field("fence", &self.fence)
            .field("em_delimiter", &self.em_delimiter)
            .field("strong_delimiter", &self.strong_delimiter)
            .field("link_style", &self.link_style)
            .field("link_reference_style", &self.link_reference_style)
            .field("br", &self.br)
            .field("preformatted_code", &self.preformatted_code)
            .field("keep_tags", &self.keep_tags)
            .finish_non_exhaustive()
    }
}

/// The main service for converting HTML to Markdown.
///
/// A service owns its options and rule set and can be reused across
/// conversions; each call observes a fresh reference accumulator. Driving
/// the *same* service from two threads at once is not supported, because
/// the reference-link rule shares its accumulator per service.
pub struct HtmldownService {
    options: HtmldownOptions,
    rules: Rules,
}

impl HtmldownService {
    /// Create a service with default options.
    pub fn new() -> Self {
        Self {
            options: HtmldownOptions::default(),
            rules: Rules::new(),
        }
    }

    /// Create a service with custom options.
    pub fn with_options(options: HtmldownOptions) -> Self {
        Self {
            options,
            rules: Rules::new(),
        }
    }

    /// Convert an HTML string to Markdown, starting at the document body.
    pub fn convert(&self, html: &str) -> Result<String> {
        let document = Document::parse(html);
        Ok(self.convert_document(&document))
    }

    /// Convert a pre-parsed document, starting at its body.
    pub fn convert_document(&self, document: &Document) -> String {
        self.convert_node(document.body())
    }

    /// Convert an arbitrary subtree.
    pub fn convert_node(&self, root: NodeRef<'_>) -> String {
        self.run_pipeline(root)
    }

    /// Add a custom rule. The newest rule wins over earlier ones and over
    /// the built-in rules.
    pub fn add_rule(&mut self, key: &str, rule: Rule) -> &mut Self {
        self.rules.add(key, rule);
        self
    }

    /// Register a batch of keyed rules before or after the built-ins.
    pub fn register_rules(
        &mut self,
        placement: RulePlacement,
        rules: Vec<(String, Rule)>,
    ) -> &mut Self {
        self.rules.extend(placement, rules);
        self
    }

    /// Keep elements matching the filter as raw HTML.
    pub fn keep(&mut self, filter: Filter) -> &mut Self {
        self.rules.keep(filter);
        self
    }

    /// Remove elements matching the filter entirely.
    pub fn remove(&mut self, filter: Filter) -> &mut Self {
        self.rules.remove(filter);
        self
    }

    /// Apply a plugin.
    pub fn use_plugin<F>(&mut self, plugin: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        plugin(self);
        self
    }

    /// Adjust options in place.
    pub fn configure_options<F>(&mut self, configure: F) -> &mut Self
    where
        F: FnOnce(&mut HtmldownOptions),
    {
        configure(&mut self.options);
        self
    }

    /// Escape Markdown-special characters with the configured escape.
    pub fn escape(&self, text: &str) -> String {
        (self.options.escape)(text)
    }

    /// The current options.
    pub fn options(&self) -> &HtmldownOptions {
        &self.options
    }

    /// Mutable access to the options.
    pub fn options_mut(&mut self) -> &mut HtmldownOptions {
        &mut self.options
    }

    // Full pipeline: collapse whitespace, reduce the tree, apply rule
    // appends, re-encode NBSP, trim the edges.
    fn run_pipeline(&self, root: NodeRef<'_>) -> String {
        let collapsed = collapse_whitespace(root, self.options.preformatted_code);

        let mut markdown = self.process_children(root, &collapsed);
        markdown = encode_nbsp(&markdown);

        for rule in self.rules.appendable() {
            if let Some(append) = &rule.append {
                markdown = join_chunks(&markdown, &append(&self.options));
            }
        }
        markdown = encode_nbsp(&markdown);

        // leading newlines go; trailing ASCII whitespace goes; leading
        // spaces stay so an indented code block can open the document
        markdown
            .trim_start_matches(['\n', '\r'])
            .trim_end_matches([' ', '\t', '\n', '\r'])
            .to_string()
    }

    fn process_node(&self, node: NodeRef<'_>, collapsed: &CollapsedText) -> String {
        match node.kind() {
            NodeKind::Text => self.process_text(node, collapsed),
            NodeKind::Element => self.replacement_for_node(node, collapsed),
            NodeKind::Document => self.process_children(node, collapsed),
            NodeKind::Comment => String::new(),
        }
    }

    fn process_children(&self, parent: NodeRef<'_>, collapsed: &CollapsedText) -> String {
        let mut output = String::new();
        for child in parent.children() {
            let addition = self.process_node(child, collapsed);
            output = join_chunks(&output, &addition);
        }
        output
    }

    fn process_text(&self, node: NodeRef<'_>, collapsed: &CollapsedText) -> String {
        let text = collected_text(node, collapsed);
        if text.is_empty() {
            return String::new();
        }
        if is_code(node) {
            return text;
        }
        (self.options.escape)(&text)
    }

    fn replacement_for_node(&self, node: NodeRef<'_>, collapsed: &CollapsedText) -> String {
        if node
            .tag_name()
            .is_some_and(|tag| self.options.keep_tags.iter().any(|keep| keep == tag))
        {
            let kept = self.process_children(node, collapsed);
            return (self.options.keep_replacement)(&kept, node);
        }

        let mut content = self.process_children(node, collapsed);
        let flanking = flanking_whitespace(node, collapsed, self.options.preformatted_code);
        if !flanking.leading.is_empty() || !flanking.trailing.is_empty() {
            content = trim_str(&content).to_string();
        }

        let converted = match self.rules.resolve(node, &self.options) {
            Resolution::Blank => (self.options.blank_replacement)(&content, node),
            Resolution::Matched(rule) => rule.replace(&content, node, &self.options),
            Resolution::Keep => (self.options.keep_replacement)(&content, node),
            Resolution::Remove => String::new(),
            Resolution::Default => (self.options.default_replacement)(&content, node),
        };

        format!("{}{}{}", flanking.leading, converted, flanking.trailing)
    }
}

impl Default for HtmldownService {
    fn default() -> Self {
        Self::new()
    }
}

/// Concatenate two Markdown chunks, collapsing the newlines where they meet
/// to at most one blank line.
fn join_chunks(output: &str, addition: &str) -> String {
    if output.is_empty() {
        return addition.to_string();
    }
    if addition.is_empty() {
        return output.to_string();
    }

    let left = output.trim_end_matches(['\n', '\r']);
    let right = addition.trim_start_matches(['\n', '\r']);
    let stripped_left = output.len() - left.len();
    let stripped_right = addition.len() - right.len();
    let separator = stripped_left.max(stripped_right).min(2);

    format!("{left}{}{right}", "\n".repeat(separator))
}
