//! Rule system for HTML to Markdown conversion.

mod commonmark;
mod rule;

pub use commonmark::commonmark_rules;
pub use rule::{AppendFn, Filter, FilterFn, ReplacementFn, Rule};

use indexmap::IndexMap;

use crate::flanking::is_blank;
use crate::node::NodeRef;
use crate::service::HtmldownOptions;
use crate::utilities::is_void;

/// Where a batch of externally supplied rules sits relative to the
/// built-in CommonMark rules in match order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulePlacement {
    /// Matched before the built-in rules
    BeforeDefaults,
    /// Matched after the built-in rules (still before keep/remove filters)
    AfterDefaults,
}

/// How a node resolved against the rule set.
pub enum Resolution<'a> {
    /// The node is blank; the blank replacement applies
    Blank,
    /// A user or built-in rule matched
    Matched(&'a Rule),
    /// A keep filter matched; emit the node as raw HTML
    Keep,
    /// A remove filter matched; emit nothing
    Remove,
    /// Nothing matched; the default replacement applies
    Default,
}

/// Ordered rule containers with the precedence the converter relies on:
/// blank, then user rules (newest first), then built-ins, then post-default
/// rules, then keep filters, then remove filters, then the default.
pub struct Rules {
    user_rules: IndexMap<String, Rule>,
    builtin_rules: Vec<(&'static str, Rule)>,
    post_rules: IndexMap<String, Rule>,
    keep_filters: Vec<Filter>,
    remove_filters: Vec<Filter>,
}

impl Rules {
    /// Create a rule set holding the built-in CommonMark rules.
    pub fn new() -> Self {
        Self {
            user_rules: IndexMap::new(),
            builtin_rules: commonmark_rules(),
            post_rules: IndexMap::new(),
            keep_filters: Vec::new(),
            remove_filters: Vec::new(),
        }
    }

    /// Add a user rule. Re-adding a key replaces the rule and refreshes its
    /// recency, and the newest rule wins.
    pub fn add(&mut self, key: &str, rule: Rule) {
        self.user_rules.shift_remove(key);
        self.user_rules.insert(key.to_string(), rule);
    }

    /// Add a batch of keyed rules at the given placement.
    pub fn extend(&mut self, placement: RulePlacement, rules: Vec<(String, Rule)>) {
        let target = match placement {
            RulePlacement::BeforeDefaults => &mut self.user_rules,
            RulePlacement::AfterDefaults => &mut self.post_rules,
        };
        for (key, rule) in rules {
            target.shift_remove(&key);
            target.insert(key, rule);
        }
    }

    /// Add a keep filter. Newest filters take precedence.
    pub fn keep(&mut self, filter: Filter) {
        self.keep_filters.insert(0, filter);
    }

    /// Add a remove filter. Newest filters take precedence.
    pub fn remove(&mut self, filter: Filter) {
        self.remove_filters.insert(0, filter);
    }

    /// Resolve the rule for an element.
    ///
    /// Exactly one resolution applies to every node.
    pub fn resolve(&self, node: NodeRef<'_>, options: &HtmldownOptions) -> Resolution<'_> {
        if !is_void(node) && is_blank(node) {
            return Resolution::Blank;
        }

        let matched = self
            .user_rules
            .values()
            .rev()
            .chain(self.builtin_rules.iter().map(|(_, rule)| rule))
            .chain(self.post_rules.values())
            .find(|rule| rule.filter.matches(node, options));
        if let Some(rule) = matched {
            return Resolution::Matched(rule);
        }

        if self
            .keep_filters
            .iter()
            .any(|filter| filter.matches(node, options))
        {
            return Resolution::Keep;
        }
        if self
            .remove_filters
            .iter()
            .any(|filter| filter.matches(node, options))
        {
            return Resolution::Remove;
        }

        Resolution::Default
    }

    /// Iterate rules that may contribute an append trailer, in deterministic
    /// order: user rules in insertion order, then built-ins, then post rules.
    pub fn appendable(&self) -> impl Iterator<Item = &Rule> {
        self.user_rules
            .values()
            .chain(self.builtin_rules.iter().map(|(_, rule)| rule))
            .chain(self.post_rules.values())
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::Document;

    fn options() -> HtmldownOptions {
        HtmldownOptions::default()
    }

    fn constant_rule(filter: Filter, output: &'static str) -> Rule {
        Rule::new(filter, move |_, _, _| output.to_string())
    }

    #[test]
    fn test_builtin_rule_matches() {
        let rules = Rules::new();
        let document = Document::parse("<p>x</p>");
        let p = document.body().find_child("p").unwrap();
        assert!(matches!(rules.resolve(p, &options()), Resolution::Matched(_)));
    }

    #[test]
    fn test_user_rule_precedes_builtin() {
        let mut rules = Rules::new();
        rules.add("customParagraph", constant_rule(Filter::tag("p"), "custom"));
        let document = Document::parse("<p>x</p>");
        let p = document.body().find_child("p").unwrap();
        match rules.resolve(p, &options()) {
            Resolution::Matched(rule) => {
                assert_eq!(rule.replace("", p, &options()), "custom");
            }
            _ => panic!("expected a match"),
        }
    }

    #[test]
    fn test_newest_user_rule_wins() {
        let mut rules = Rules::new();
        rules.add("first", constant_rule(Filter::tag("x-tag"), "first"));
        rules.add("second", constant_rule(Filter::tag("x-tag"), "second"));
        let document = Document::parse("<x-tag>x</x-tag>");
        let node = document.body().find_child("x-tag").unwrap();
        match rules.resolve(node, &options()) {
            Resolution::Matched(rule) => {
                assert_eq!(rule.replace("", node, &options()), "second");
            }
            _ => panic!("expected a match"),
        }
    }

    #[test]
    fn test_blank_takes_precedence() {
        let rules = Rules::new();
        let document = Document::parse("<p>  </p>");
        let p = document.body().find_child("p").unwrap();
        assert!(matches!(rules.resolve(p, &options()), Resolution::Blank));
    }

    #[test]
    fn test_keep_beats_remove() {
        let mut rules = Rules::new();
        rules.remove(Filter::tag("aside"));
        rules.keep(Filter::tag("aside"));
        let document = Document::parse("<aside>x</aside>");
        let aside = document.body().find_child("aside").unwrap();
        assert!(matches!(rules.resolve(aside, &options()), Resolution::Keep));
    }

    #[test]
    fn test_unmatched_falls_to_default() {
        let rules = Rules::new();
        let document = Document::parse("<h7>x</h7>");
        let h7 = document.body().find_child("h7").unwrap();
        assert!(matches!(rules.resolve(h7, &options()), Resolution::Default));
    }
}
