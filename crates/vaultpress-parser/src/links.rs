//! Line classification and rewrite rules for note-internal links.
//!
//! - Text links: `[[Note]]`, `[[Note|Title]]` become `[Title](note)`
//! - Embeds: `![[image.png]]`, `![[image.png|300]]` become `![](path){:width="300px"}`
//!
//! Everything here is pure string work. Resolving embedded assets and copying
//! them is left to the caller, which passes the result of each embed to
//! [`render_embed`].

use regex::Regex;
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

/// Already-conformant markdown link: `[text](url)`
static MARKDOWN_LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]\([^)]*\)").unwrap());

/// Matches ![[...]]
static EMBED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[\[([^\]]+)\]\]").unwrap());

/// Matches [[...]] (embeds filtered out by the preceding `!`)
static WIKILINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").unwrap());

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// What a body line contains, decided in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Contains a standard markdown link; never touched
    MarkdownLink,
    /// Contains at least one `![[...]]`
    Embed,
    /// Contains `[[...]]` but no embed
    WikiLink,
    /// Nothing to rewrite
    Plain,
}

/// Classify a single body line
pub fn classify_line(line: &str) -> LineKind {
    if MARKDOWN_LINK_PATTERN.is_match(line) {
        LineKind::MarkdownLink
    } else if !line.contains("[[") {
        LineKind::Plain
    } else if EMBED_PATTERN.is_match(line) {
        LineKind::Embed
    } else if WIKILINK_PATTERN.is_match(line) {
        LineKind::WikiLink
    } else {
        LineKind::Plain
    }
}

/// Absolute URLs are never treated as note references
pub fn is_external(target: &str) -> bool {
    target.trim_start().to_ascii_lowercase().starts_with("http")
}

/// Link slug: lowercase, spaces to hyphens, everything outside `[a-z0-9-]` dropped
pub fn slugify(target: &str) -> String {
    target
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

/// File-name form of a note title: whitespace runs become a single hyphen
pub fn sanitize_title(title: &str) -> String {
    WHITESPACE_RUN.replace_all(title.trim(), "-").into_owned()
}

/// Exported asset file name: base name, lowercase, whitespace runs to hyphens
pub fn sanitize_asset_name(reference: &str) -> String {
    let base = Path::new(reference)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| reference.to_string());
    WHITESPACE_RUN
        .replace_all(base.trim(), "-")
        .to_lowercase()
}

/// Split `target|rest` on the first pipe
fn split_pipe(inner: &str) -> (&str, Option<&str>) {
    match inner.split_once('|') {
        Some((target, rest)) => (target, Some(rest)),
        None => (inner, None),
    }
}

/// Rewrite every `[[target]]` / `[[target|title]]` on a line.
///
/// External targets and targets whose slug is empty are left verbatim.
/// Embeds (`![[...]]`) are skipped.
pub fn rewrite_text_links(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut last = 0;

    for caps in WIKILINK_PATTERN.captures_iter(line) {
        let Some(full_match) = caps.get(0) else {
            continue;
        };
        let start = full_match.start();

        if start > 0 && line.as_bytes().get(start - 1) == Some(&b'!') {
            continue;
        }

        let (target, display) = split_pipe(&caps[1]);
        let slug = slugify(target);
        if is_external(target) || slug.is_empty() {
            continue;
        }

        let title = display.filter(|d| !d.is_empty()).unwrap_or(target);
        out.push_str(&line[last..start]);
        out.push_str(&format!("[{}]({})", title, slug));
        last = full_match.end();
    }

    out.push_str(&line[last..]);
    out
}

/// A parsed `![[reference|width]]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedRef {
    /// Byte range of the whole construct in its line
    pub span: Range<usize>,
    pub target: String,
    pub width: Option<u32>,
}

impl EmbedRef {
    pub fn is_external(&self) -> bool {
        is_external(&self.target)
    }
}

/// All embeds on a line, in order
pub fn find_embeds(line: &str) -> Vec<EmbedRef> {
    EMBED_PATTERN
        .captures_iter(line)
        .filter_map(|caps| {
            let full_match = caps.get(0)?;
            let (target, rest) = split_pipe(caps.get(1)?.as_str());
            Some(EmbedRef {
                span: full_match.range(),
                target: target.trim().to_string(),
                width: rest.and_then(parse_width),
            })
        })
        .collect()
}

/// `300` or `300x200` (width only is used)
fn parse_width(raw: &str) -> Option<u32> {
    raw.trim().split('x').next()?.trim().parse().ok()
}

/// Markdown image with the kramdown width attribute
pub fn render_embed(url: &str, width: Option<u32>) -> String {
    match width {
        Some(w) => format!("![]({}){{:width=\"{}px\"}}", url, w),
        None => format!("![]({})", url),
    }
}

/// Site-relative URL of a copied asset
pub fn asset_url(image_folder: &str, sanitized_name: &str) -> String {
    let folder = image_folder.trim_matches('/');
    if folder.is_empty() {
        sanitized_name.to_string()
    } else {
        format!("{}/{}", folder, sanitized_name)
    }
}

/// Replace each embed span with its rendered replacement
pub fn splice_embeds(line: &str, replacements: &[(Range<usize>, String)]) -> String {
    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    for (span, replacement) in replacements {
        out.push_str(&line[last..span.start]);
        out.push_str(replacement);
        last = span.end;
    }
    out.push_str(&line[last..]);
    out
}
