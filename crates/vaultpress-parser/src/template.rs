//! Front matter templates.
//!
//! A template is a small block of `key: value` lines. Values that are a
//! placeholder token (`{{title}}`, `{{date}}`, `{{datetime}}`, `{{tags}}`) are
//! computed at generation time, anything else is taken literally.

use chrono::{DateTime, Local};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use vaultpress_core::{FrontMatter, FrontMatterValue};

use crate::frontmatter::{DELIMITER, parse_mapping};

/// Matches `{{ name }}`
static PLACEHOLDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{\{\s*([A-Za-z_]+)\s*\}\}$").unwrap());

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Values available to placeholders
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub title: String,
    pub now: DateTime<Local>,
    pub tags: Vec<String>,
}

impl TemplateContext {
    /// Context for a note file: the title is the file name without extension
    pub fn for_file(path: &Path, now: DateTime<Local>) -> Self {
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            title,
            now,
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// A template value, classified once and evaluated against a context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    Title,
    Date,
    DateTime,
    Tags,
    Literal(String),
}

impl Placeholder {
    /// Classify a raw template value
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let unquoted = strip_quotes(trimmed);

        let Some(caps) = PLACEHOLDER_PATTERN.captures(unquoted) else {
            return Self::Literal(trimmed.to_string());
        };

        match caps[1].to_ascii_lowercase().as_str() {
            "title" => Self::Title,
            "date" => Self::Date,
            "datetime" => Self::DateTime,
            "tags" => Self::Tags,
            _ => Self::Literal(trimmed.to_string()),
        }
    }

    pub fn evaluate(&self, ctx: &TemplateContext) -> FrontMatterValue {
        match self {
            Self::Title => FrontMatterValue::Scalar(ctx.title.clone()),
            Self::Date => FrontMatterValue::Scalar(ctx.now.format(DATE_FORMAT).to_string()),
            Self::DateTime => {
                FrontMatterValue::Scalar(ctx.now.format(DATETIME_FORMAT).to_string())
            }
            Self::Tags => FrontMatterValue::List(ctx.tags.clone()),
            Self::Literal(raw) => literal_value(raw),
        }
    }
}

/// Literal values go through YAML so `[a, b]` becomes a list and quotes are
/// removed; anything YAML rejects is kept as typed.
fn literal_value(raw: &str) -> FrontMatterValue {
    if raw.is_empty() {
        return FrontMatterValue::Scalar(String::new());
    }
    match parse_mapping(&format!("v: {raw}\n")) {
        Ok(fm) => fm
            .get("v")
            .cloned()
            .unwrap_or_else(|| FrontMatterValue::Scalar(raw.to_string())),
        Err(_) => FrontMatterValue::Scalar(raw.to_string()),
    }
}

fn strip_quotes(raw: &str) -> &str {
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

/// Build front matter from a template.
///
/// A template that only contains delimiters yields an empty mapping; the
/// caller still writes a delimited block.
pub fn apply_template(template: &str, ctx: &TemplateContext) -> FrontMatter {
    let mut fm = FrontMatter::new();
    for line in template.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed == DELIMITER || trimmed.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            log::debug!("Ignoring template line without a key: {:?}", line);
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        fm.set(key, Placeholder::parse(value).evaluate(ctx));
    }
    fm
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use vaultpress_core::DEFAULT_FRONT_MATTER_TEMPLATE;

    fn ctx() -> TemplateContext {
        let now = Local.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap();
        TemplateContext::for_file(Path::new("notes/My Post.md"), now)
    }

    #[test]
    fn test_placeholder_parse() {
        assert_eq!(Placeholder::parse("{{title}}"), Placeholder::Title);
        assert_eq!(Placeholder::parse(" {{ date }} "), Placeholder::Date);
        assert_eq!(Placeholder::parse("\"{{datetime}}\""), Placeholder::DateTime);
        assert_eq!(Placeholder::parse("{{TAGS}}"), Placeholder::Tags);
        assert_eq!(
            Placeholder::parse("{{author}}"),
            Placeholder::Literal("{{author}}".to_string())
        );
        assert_eq!(
            Placeholder::parse("post"),
            Placeholder::Literal("post".to_string())
        );
    }

    #[test]
    fn test_title_from_file_stem() {
        assert_eq!(ctx().title, "My Post");
    }

    #[test]
    fn test_default_template() {
        let ctx = ctx().with_tags(vec!["rust".to_string()]);
        let fm = apply_template(DEFAULT_FRONT_MATTER_TEMPLATE, &ctx);

        assert_eq!(fm.title(), Some("My Post"));
        assert_eq!(fm.get_str("date"), Some("2024-03-05"));
        assert_eq!(fm.tags(), vec!["rust"]);
    }

    #[test]
    fn test_datetime_format() {
        let fm = apply_template("datetime: {{datetime}}", &ctx());
        assert!(fm.get_str("datetime").unwrap().starts_with("2024-03-05 09:30:00 "));
    }

    #[test]
    fn test_literals() {
        let template = "---\nlayout: post\ncategories: [dev, notes]\ncomments: true\nquoted: \"a: b\"\nempty:\n---\n";
        let fm = apply_template(template, &ctx());

        assert_eq!(fm.get_str("layout"), Some("post"));
        assert_eq!(
            fm.get("categories"),
            Some(&FrontMatterValue::List(vec![
                "dev".to_string(),
                "notes".to_string()
            ]))
        );
        assert_eq!(fm.get_str("comments"), Some("true"));
        assert_eq!(fm.get_str("quoted"), Some("a: b"));
        assert_eq!(fm.get_str("empty"), Some(""));
    }

    #[test]
    fn test_unknown_placeholder_kept_literally() {
        let fm = apply_template("author: {{author}}", &ctx());
        assert_eq!(fm.get_str("author"), Some("{{author}}"));
    }

    #[test]
    fn test_blank_template_is_empty() {
        assert!(apply_template("---\n---\n", &ctx()).is_empty());
        assert!(apply_template("", &ctx()).is_empty());
    }

    #[test]
    fn test_key_order_follows_template() {
        let fm = apply_template("b: 1\na: 2\nc: {{title}}", &ctx());
        let keys: Vec<_> = fm.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }
}
