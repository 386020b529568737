//! # vaultpress Parser
//!
//! Front matter handling and note link rewrite rules for exporting Obsidian
//! notes as Jekyll posts.
//!
//! This crate provides:
//! - A front matter store: parse, serialize, and line-level attribute edits
//! - Template evaluation with `{{title}}`, `{{date}}`, `{{datetime}}`, `{{tags}}`
//! - Line classification and rewrite rules for `[[links]]` and `![[embeds]]`
//!
//! The transformation is line-granular and pattern based. It is not a
//! markdown renderer.
//!
//! ## Quick Start
//!
//! ### Front Matter
//!
//! ```
//! use vaultpress_parser::frontmatter;
//!
//! let content = "---\ntitle: My Note\ntags: [rust, blog]\n---\nBody text";
//! let (fm, body) = frontmatter::parse(content).unwrap();
//! assert_eq!(fm.title(), Some("My Note"));
//! assert_eq!(fm.tags(), vec!["rust", "blog"]);
//! assert_eq!(body, "Body text");
//!
//! let text = frontmatter::serialize(&fm, &body).unwrap();
//! assert_eq!(frontmatter::parse(&text).unwrap().0, fm);
//! ```
//!
//! ### Attribute Edits
//!
//! ```
//! use vaultpress_parser::frontmatter::{get_attribute, set_attribute};
//!
//! let text = "---\ntitle: T\n---\nBody";
//! let text = set_attribute(text, "nanoId", &"abc".into()).unwrap();
//! assert_eq!(get_attribute(&text, "nanoId").unwrap().as_str(), Some("abc"));
//! ```
//!
//! ### Link Rules
//!
//! ```
//! use vaultpress_parser::links::{LineKind, classify_line, rewrite_text_links};
//!
//! assert_eq!(classify_line("See [[Other Note|this]]"), LineKind::WikiLink);
//! assert_eq!(
//!     rewrite_text_links("See [[Other Note|this]]"),
//!     "See [this](other-note)"
//! );
//! ```
//!
//! ## Performance
//!
//! Regex patterns are compiled once through `std::sync::LazyLock`, and lines
//! without `[[` skip the link patterns entirely.

pub mod frontmatter;
pub mod links;
pub mod template;

pub use frontmatter::{
    get_attribute, has_front_matter, parse, serialize, set_attribute, split_raw,
    strip_empty_lines,
};
pub use links::{EmbedRef, LineKind, classify_line, sanitize_asset_name, sanitize_title, slugify};
pub use template::{Placeholder, TemplateContext, apply_template};

// Re-export core types for consumers
pub use vaultpress_core::{FrontMatter, FrontMatterValue};
