//! Front matter store: `---\nYAML\n---\nbody`
//!
//! Parsing and serialization go through `serde_yaml`. Attribute lookups and
//! updates work on the raw lines of the block so unrelated keys keep their
//! formatting and order.

use serde_yaml::Value;
use vaultpress_core::{Error, FrontMatter, FrontMatterValue, Result};

/// Opening and closing line of a front matter block
pub const DELIMITER: &str = "---";

/// Byte layout of a delimited block inside a document
struct Block<'a> {
    /// Text between the delimiter lines
    yaml: &'a str,
    /// Byte offset where `yaml` starts
    yaml_start: usize,
    /// Opening delimiter through the closing delimiter line
    raw: &'a str,
    /// Everything after the closing delimiter line
    body: &'a str,
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

/// Locate the block. `Ok(None)` means the text has no opening delimiter.
fn locate(text: &str) -> Result<Option<Block<'_>>> {
    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok(None);
    };
    if !is_delimiter(first) {
        return Ok(None);
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if is_delimiter(line) {
            let end = offset + line.len();
            return Ok(Some(Block {
                yaml: &text[yaml_start..offset],
                yaml_start,
                raw: &text[..end],
                body: &text[end..],
            }));
        }
        offset += line.len();
    }

    Err(Error::malformed_front_matter(
        "opening '---' has no matching closing delimiter",
    ))
}

/// Split a document into front matter and body.
///
/// A document that does not start with `---` has empty front matter and is
/// all body.
pub fn parse(text: &str) -> Result<(FrontMatter, String)> {
    match locate(text)? {
        Some(block) => Ok((parse_mapping(block.yaml)?, block.body.to_string())),
        None => Ok((FrontMatter::new(), text.to_string())),
    }
}

/// Whether the text starts with a complete front matter block
pub fn has_front_matter(text: &str) -> bool {
    matches!(locate(text), Ok(Some(_)))
}

/// Verbatim block (delimiters included) and body, if the text has a complete block
pub fn split_raw(text: &str) -> Option<(&str, &str)> {
    match locate(text) {
        Ok(Some(block)) => Some((block.raw, block.body)),
        _ => None,
    }
}

/// Parse the YAML between the delimiters into a [`FrontMatter`]
pub fn parse_mapping(yaml: &str) -> Result<FrontMatter> {
    if yaml.trim().is_empty() {
        return Ok(FrontMatter::new());
    }

    let value: Value = serde_yaml::from_str(yaml)
        .map_err(|e| Error::malformed_front_matter(e.to_string()))?;

    let mapping = match value {
        Value::Null => return Ok(FrontMatter::new()),
        Value::Mapping(mapping) => mapping,
        other => {
            return Err(Error::malformed_front_matter(format!(
                "expected a key/value mapping, found {}",
                kind_of(&other)
            )));
        }
    };

    let mut fm = FrontMatter::new();
    for (key, value) in mapping {
        let key = scalar_text(&key).ok_or_else(|| {
            Error::malformed_front_matter(format!("unsupported key: {}", kind_of(&key)))
        })?;
        let value = to_front_matter_value(&key, value)?;
        fm.set(key, value);
    }
    Ok(fm)
}

fn to_front_matter_value(key: &str, value: Value) -> Result<FrontMatterValue> {
    if let Value::Sequence(items) = value {
        let items = items
            .iter()
            .map(|item| {
                scalar_text(item).ok_or_else(|| {
                    Error::malformed_front_matter(format!(
                        "list '{}' contains a {}",
                        key,
                        kind_of(item)
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        return Ok(FrontMatterValue::List(items));
    }

    scalar_text(&value)
        .map(FrontMatterValue::Scalar)
        .ok_or_else(|| {
            Error::malformed_front_matter(format!(
                "value of '{}' is a {}, expected text or a list",
                key,
                kind_of(&value)
            ))
        })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "nested mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Render `---\n<mapping>\n---\n<body>`
pub fn serialize(fm: &FrontMatter, body: &str) -> Result<String> {
    let mut out = String::with_capacity(body.len() + 128);
    out.push_str(DELIMITER);
    out.push('\n');
    if !fm.is_empty() {
        let yaml = serde_yaml::to_string(fm)
            .map_err(|e| Error::other(format!("Failed to serialize front matter: {}", e)))?;
        out.push_str(&yaml);
        if !yaml.ends_with('\n') {
            out.push('\n');
        }
    }
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(body);
    Ok(out)
}

/// Byte ranges (relative to the block's YAML) of each top-level entry
fn entry_ranges(yaml: &str) -> Vec<(&str, std::ops::Range<usize>)> {
    let mut ranges: Vec<(&str, std::ops::Range<usize>)> = Vec::new();
    let mut offset = 0;
    for line in yaml.split_inclusive('\n') {
        let start = offset;
        offset += line.len();

        let continues = line.starts_with(' ')
            || line.starts_with('\t')
            || line.starts_with("- ")
            || line.trim_end() == "-";
        if continues {
            if let Some(last) = ranges.last_mut() {
                last.1.end = offset;
            }
            continue;
        }

        if let Some((key, _)) = line.split_once(':') {
            let key = key.trim_end();
            if !key.is_empty() && !key.starts_with('#') {
                ranges.push((key, start..offset));
            }
        }
    }
    ranges
}

/// Look up one attribute by matching its line(s) in the block
pub fn get_attribute(text: &str, key: &str) -> Option<FrontMatterValue> {
    let block = locate(text).ok()??;
    let (_, range) = entry_ranges(block.yaml)
        .into_iter()
        .find(|(k, _)| *k == key)?;
    let entry = &block.yaml[range];

    match parse_mapping(entry) {
        Ok(fm) => fm.get(key).cloned(),
        Err(_) => {
            // Unparseable on its own (e.g. template placeholders): raw text
            let raw = entry.split_once(':')?.1.trim();
            Some(FrontMatterValue::Scalar(unquote(raw).to_string()))
        }
    }
}

/// Update or insert one attribute without re-serializing the rest of the block.
///
/// A text without a block gets a new block prepended.
pub fn set_attribute(text: &str, key: &str, value: &FrontMatterValue) -> Result<String> {
    let line = render_entry(key, value);

    let Some(block) = locate(text)? else {
        return Ok(format!("{DELIMITER}\n{line}\n{DELIMITER}\n{text}"));
    };

    let mut out = String::with_capacity(text.len() + line.len() + 1);
    match entry_ranges(block.yaml).into_iter().find(|(k, _)| *k == key) {
        Some((_, range)) => {
            let start = block.yaml_start + range.start;
            let end = block.yaml_start + range.end;
            out.push_str(&text[..start]);
            out.push_str(&line);
            out.push('\n');
            out.push_str(&text[end..]);
        }
        None => {
            let end = block.yaml_start + block.yaml.len();
            out.push_str(&text[..end]);
            out.push_str(&line);
            out.push('\n');
            out.push_str(&text[end..]);
        }
    }
    Ok(out)
}

/// Remove blank lines strictly inside the block; both delimiters stay
pub fn strip_empty_lines(text: &str) -> String {
    let Ok(Some(block)) = locate(text) else {
        return text.to_string();
    };

    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..block.yaml_start]);
    for line in block.yaml.split_inclusive('\n') {
        if !line.trim().is_empty() {
            out.push_str(line);
        }
    }
    out.push_str(&block.raw[block.yaml_start + block.yaml.len()..]);
    out.push_str(block.body);
    out
}

/// One `key: value` line. Lists are written in flow style.
fn render_entry(key: &str, value: &FrontMatterValue) -> String {
    match value {
        FrontMatterValue::Scalar(s) => format!("{}: {}", key, render_scalar(s, false)),
        FrontMatterValue::List(items) => {
            let items: Vec<String> = items.iter().map(|i| render_scalar(i, true)).collect();
            format!("{}: [{}]", key, items.join(", "))
        }
    }
}

fn render_scalar(s: &str, in_flow: bool) -> String {
    let needs_flow_quotes = in_flow && s.contains([',', '[', ']', '{', '}']);
    if !needs_flow_quotes
        && let Ok(yaml) = serde_yaml::to_string(s)
    {
        let yaml = yaml.trim_end_matches('\n');
        if !yaml.contains('\n') {
            return yaml.to_string();
        }
    }
    // JSON strings are valid double-quoted YAML scalars
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s.replace('"', "\\\"")))
}

fn unquote(raw: &str) -> &str {
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultpress_core::keys;

    fn list(items: &[&str]) -> FrontMatterValue {
        FrontMatterValue::List(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_simple_front_matter() {
        let (fm, body) = parse("---\ntitle: Test\n---\nContent here").unwrap();
        assert_eq!(fm.title(), Some("Test"));
        assert_eq!(body, "Content here");
    }

    #[test]
    fn test_lists_and_scalars() {
        let content = "---\ntitle: Test\ntags:\n  - rust\n  - parser\ndraft: true\ncount: 3\n---\nContent";
        let (fm, _) = parse(content).unwrap();
        assert_eq!(fm.tags(), vec!["rust", "parser"]);
        assert_eq!(fm.get_str("draft"), Some("true"));
        assert_eq!(fm.get_str("count"), Some("3"));
    }

    #[test]
    fn test_no_front_matter() {
        let content = "Just content\nNo front matter";
        let (fm, body) = parse(content).unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_empty_block() {
        let (fm, body) = parse("---\n---\nBody").unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_unterminated_block_is_malformed() {
        let result = parse("---\ntitle: Test\nNo closing");
        assert!(matches!(result, Err(Error::MalformedFrontMatter { .. })));
    }

    #[test]
    fn test_invalid_yaml_is_malformed() {
        let result = parse("---\ntitle: [unclosed\n---\nBody");
        assert!(matches!(result, Err(Error::MalformedFrontMatter { .. })));
    }

    #[test]
    fn test_nested_mapping_is_malformed() {
        let result = parse("---\nauthor:\n  name: Me\n---\nBody");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("author"));
    }

    #[test]
    fn test_crlf_delimiters() {
        let (fm, body) = parse("---\r\ntitle: Test\r\n---\r\nBody").unwrap();
        assert_eq!(fm.title(), Some("Test"));
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_serialize_roundtrip() {
        let mut fm = FrontMatter::new();
        fm.set(keys::TITLE, "Hello: World");
        fm.set(keys::DATE, "2024-03-05");
        fm.set(keys::TAGS, list(&["rust", "true", "1"]));
        fm.set("empty", "");
        fm.set("empty_list", list(&[]));
        fm.set("multi", "line one\nline two");
        let body = "First line\n\n[[Link]] and more\n";

        let text = serialize(&fm, body).unwrap();
        assert!(text.starts_with("---\n"));

        let (parsed, parsed_body) = parse(&text).unwrap();
        assert_eq!(parsed, fm);
        assert_eq!(parsed_body, body);
    }

    #[test]
    fn test_serialize_empty_mapping_keeps_delimiters() {
        let text = serialize(&FrontMatter::new(), "Body").unwrap();
        assert_eq!(text, "---\n---\nBody");
    }

    #[test]
    fn test_split_raw() {
        let text = "---\nnanoId: X\n---\nOld body";
        let (raw, body) = split_raw(text).unwrap();
        assert_eq!(raw, "---\nnanoId: X\n---\n");
        assert_eq!(body, "Old body");

        assert!(split_raw("no block").is_none());
        assert!(split_raw("---\nunterminated").is_none());
    }

    #[test]
    fn test_get_attribute() {
        let text = "---\ntitle: \"Quoted\"\ntags:\n  - a\n  - b\nnanoId: abc\n---\nBody";
        assert_eq!(
            get_attribute(text, "title"),
            Some(FrontMatterValue::from("Quoted"))
        );
        assert_eq!(get_attribute(text, "tags"), Some(list(&["a", "b"])));
        assert_eq!(get_attribute(text, "nanoId"), Some(FrontMatterValue::from("abc")));
        assert_eq!(get_attribute(text, "missing"), None);
        assert_eq!(get_attribute("no block", "title"), None);
    }

    #[test]
    fn test_get_attribute_placeholder_falls_back_to_raw() {
        let text = "---\ntags: {{tags}}\n---\n";
        assert_eq!(
            get_attribute(text, "tags"),
            Some(FrontMatterValue::from("{{tags}}"))
        );
    }

    #[test]
    fn test_set_attribute_replaces_in_place() {
        let text = "---\ntitle: A\n# comment stays\ndate: 2024-01-01\n---\nBody";
        let updated = set_attribute(text, "title", &"B".into()).unwrap();
        assert_eq!(
            updated,
            "---\ntitle: B\n# comment stays\ndate: 2024-01-01\n---\nBody"
        );
    }

    #[test]
    fn test_set_attribute_replaces_block_list() {
        let text = "---\ntags:\n  - old\n  - older\ntitle: T\n---\nBody";
        let updated = set_attribute(text, "tags", &list(&["new", "a, b"])).unwrap();
        assert_eq!(updated, "---\ntags: [new, \"a, b\"]\ntitle: T\n---\nBody");

        let (fm, _) = parse(&updated).unwrap();
        assert_eq!(fm.tags(), vec!["new", "a, b"]);
    }

    #[test]
    fn test_set_attribute_appends_missing_key() {
        let text = "---\ntitle: T\n---\nBody";
        let updated = set_attribute(text, "permalink", &"/abc/".into()).unwrap();
        assert_eq!(updated, "---\ntitle: T\npermalink: /abc/\n---\nBody");
    }

    #[test]
    fn test_set_attribute_creates_block() {
        let updated = set_attribute("Body", "nanoId", &"abc".into()).unwrap();
        assert_eq!(updated, "---\nnanoId: abc\n---\nBody");
    }

    #[test]
    fn test_set_attribute_quotes_ambiguous_scalars() {
        let updated = set_attribute("---\n---\n", "count", &"42".into()).unwrap();
        let (fm, _) = parse(&updated).unwrap();
        assert_eq!(fm.get_str("count"), Some("42"));
        assert_ne!(updated, "---\ncount: 42\n---\n");
    }

    #[test]
    fn test_set_attribute_unterminated_fails() {
        assert!(set_attribute("---\ntitle: T\n", "title", &"X".into()).is_err());
    }

    #[test]
    fn test_strip_empty_lines() {
        let text = "---\n\ntitle: T\n\n\ndate: D\n\n---\n\nBody\n";
        assert_eq!(strip_empty_lines(text), "---\ntitle: T\ndate: D\n---\n\nBody\n");
    }

    #[test]
    fn test_strip_empty_lines_without_block() {
        let text = "\n\nBody";
        assert_eq!(strip_empty_lines(text), text);
    }
}
