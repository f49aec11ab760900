//! Rule and Filter types for HTML conversion.

use std::sync::Arc;

use crate::node::NodeRef;
use crate::service::HtmldownOptions;

/// Predicate deciding which nodes a rule applies to.
pub type FilterFn =
    Arc<dyn for<'a> Fn(NodeRef<'a>, &HtmldownOptions) -> bool + Send + Sync>;

/// Replacement producing Markdown from converted content and the node.
pub type ReplacementFn =
    Arc<dyn for<'a> Fn(&str, NodeRef<'a>, &HtmldownOptions) -> String + Send + Sync>;

/// Trailer contributed by a rule after the document body (e.g. the
/// reference-link table). Invoked once per conversion.
pub type AppendFn = Arc<dyn Fn(&HtmldownOptions) -> String + Send + Sync>;

/// A filter determines which elements a rule applies to.
#[derive(Clone)]
pub enum Filter {
    /// Match a single tag name
    TagName(String),
    /// Match any of multiple tag names
    TagNames(Vec<String>),
    /// Match using a predicate function
    Predicate(FilterFn),
}

impl Filter {
    /// Create a filter for a single tag.
    pub fn tag(name: &str) -> Self {
        Filter::TagName(name.to_lowercase())
    }

    /// Create a filter for multiple tags.
    pub fn tags(names: &[&str]) -> Self {
        Filter::TagNames(names.iter().map(|s| s.to_lowercase()).collect())
    }

    /// Create a filter from a predicate.
    pub fn predicate<F>(f: F) -> Self
    where
        F: for<'a> Fn(NodeRef<'a>, &HtmldownOptions) -> bool + Send + Sync + 'static,
    {
        Filter::Predicate(Arc::new(f))
    }

    /// Check if this filter matches a node.
    pub fn matches(&self, node: NodeRef<'_>, options: &HtmldownOptions) -> bool {
        match self {
            Filter::TagName(tag) => node.has_tag(tag),
            Filter::TagNames(tags) => node
                .tag_name()
                .is_some_and(|tag| tags.iter().any(|t| t == tag)),
            Filter::Predicate(f) => f(node, options),
        }
    }
}

/// A rule converts a matched HTML node into Markdown.
///
/// Filters must be side-effect-free. Replacements may carry rule-local state
/// behind an `Arc` as long as the rule's `append` resets it, so that every
/// conversion starts fresh.
#[derive(Clone)]
pub struct Rule {
    /// Decides which nodes this rule applies to
    pub filter: Filter,
    /// Produces the Markdown for a matched node
    pub replacement: ReplacementFn,
    /// Optional per-conversion trailer
    pub append: Option<AppendFn>,
}

impl Rule {
    /// Create a rule from a filter and a replacement.
    pub fn new<F>(filter: Filter, replacement: F) -> Self
    where
        F: for<'a> Fn(&str, NodeRef<'a>, &HtmldownOptions) -> String + Send + Sync + 'static,
    {
        Self {
            filter,
            replacement: Arc::new(replacement),
            append: None,
        }
    }

    /// Create a rule matching a single tag.
    pub fn for_tag<F>(tag: &str, replacement: F) -> Self
    where
        F: for<'a> Fn(&str, NodeRef<'a>, &HtmldownOptions) -> String + Send + Sync + 'static,
    {
        Self::new(Filter::tag(tag), replacement)
    }

    /// Create a rule matching multiple tags.
    pub fn for_tags<F>(tags: &[&str], replacement: F) -> Self
    where
        F: for<'a> Fn(&str, NodeRef<'a>, &HtmldownOptions) -> String + Send + Sync + 'static,
    {
        Self::new(Filter::tags(tags), replacement)
    }

    /// Attach an append hook to this rule.
    pub fn with_append<F>(mut self, append: F) -> Self
    where
        F: Fn(&HtmldownOptions) -> String + Send + Sync + 'static,
    {
        self.append = Some(Arc::new(append));
        self
    }

    /// Apply this rule's replacement.
    pub fn replace(&self, content: &str, node: NodeRef<'_>, options: &HtmldownOptions) -> String {
        (self.replacement)(content, node, options)
    }
}
