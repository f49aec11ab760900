//! # htmldown
//!
//! Convert HTML fragments or documents into CommonMark Markdown.
//!
//! The engine mirrors what a browser would render: a whitespace-collapse
//! pass simulates CSS inline-whitespace handling, flanking whitespace is
//! hoisted outside Markdown delimiters, and an ordered rule set maps
//! elements to CommonMark constructs. Unknown elements degrade to their
//! content; keep and remove filters override that per tag or predicate.
//!
//! ## Example
//!
//! ```rust
//! use htmldown::HtmldownService;
//!
//! let service = HtmldownService::new();
//! let markdown = service.convert("<h1>Hello World</h1>").unwrap();
//! assert_eq!(markdown, "Hello World\n===========");
//! ```

mod collapse;
mod flanking;
mod html;
mod node;
mod rules;
mod service;
mod utilities;

pub use collapse::{collapse_whitespace, collected_text, CollapsedText};
pub use flanking::{
    flanking_whitespace, is_blank, is_flanked_by_whitespace, FlankSide, FlankingWhitespace,
};
pub use html::Document;
pub use node::{Children, DomTree, NodeData, NodeId, NodeKind, NodeRef};
pub use rules::{
    commonmark_rules, AppendFn, Filter, FilterFn, ReplacementFn, Resolution, Rule, RulePlacement,
    Rules,
};
pub use service::{
    CodeBlockStyle, EscapeFn, HeadingStyle, HtmldownOptions, HtmldownService, LinkReferenceStyle,
    LinkStyle, NodeReplacementFn,
};
pub use utilities::*;

/// Error type for conversion operations
#[derive(Debug, thiserror::Error)]
pub enum HtmldownError {
    #[error("failed to parse HTML: {0}")]
    ParseError(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, HtmldownError>;

/// Convert an HTML string to Markdown with default options.
pub fn convert(html: &str) -> Result<String> {
    HtmldownService::new().convert(html)
}

/// Convert an HTML string to Markdown with the given options.
pub fn convert_with(html: &str, options: HtmldownOptions) -> Result<String> {
    HtmldownService::with_options(options).convert(html)
}
