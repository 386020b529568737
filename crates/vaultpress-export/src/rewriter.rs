//! Body rewriting with asset staging.
//!
//! Wraps the pure rules in [`vaultpress_parser::links`] with the one side
//! effect they need: embedded vault files are read and staged for the site's
//! image folder so the rewritten `![](...)` links resolve. Staged files are
//! written by the pipeline in the same transaction as the post.

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use vaultpress_core::{Error, Result};
use vaultpress_parser::links::{
    LineKind, asset_url, classify_line, find_embeds, render_embed, rewrite_text_links,
    sanitize_asset_name, splice_embeds,
};
use vaultpress_vault::{AssetIndex, FileOp};

/// An embed that was left verbatim
#[derive(Debug, Serialize)]
pub struct AssetWarning {
    /// 1-based line number in the body
    pub line: usize,
    pub reference: String,
    #[serde(rename = "reason", serialize_with = "as_display")]
    pub error: Error,
}

fn as_display<S>(error: &Error, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(error)
}

impl fmt::Display for AssetWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.error)
    }
}

/// A vault file to be written into the site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedAsset {
    pub destination: PathBuf,
    pub bytes: Vec<u8>,
}

/// Result of rewriting a body
#[derive(Debug, Default)]
pub struct RewriteOutput {
    pub body: String,
    pub warnings: Vec<AssetWarning>,
    /// One entry per destination, in first-use order
    pub assets: Vec<StagedAsset>,
}

impl RewriteOutput {
    pub fn asset_paths(&self) -> Vec<PathBuf> {
        self.assets.iter().map(|a| a.destination.clone()).collect()
    }

    /// Write operations for the staged assets
    pub fn asset_ops(&self) -> Vec<FileOp> {
        self.assets
            .iter()
            .map(|a| FileOp::write(&a.destination, a.bytes.clone()))
            .collect()
    }
}

/// Rewrites note links and stages embedded assets for an export root
pub struct LinkRewriter<'a> {
    export_root: PathBuf,
    image_folder: String,
    assets: &'a AssetIndex,
}

impl<'a> LinkRewriter<'a> {
    pub fn new(export_root: &Path, image_folder: &str, assets: &'a AssetIndex) -> Self {
        Self {
            export_root: export_root.to_path_buf(),
            image_folder: image_folder.to_string(),
            assets,
        }
    }

    /// Rewrite every line of `body`.
    ///
    /// Lines with a markdown link, or without any `[[...]]`, pass through.
    /// If any embed on a line cannot be resolved or read, that whole line is
    /// kept as written, none of its assets are staged, and a warning is
    /// recorded.
    pub async fn rewrite(&self, body: &str) -> RewriteOutput {
        let mut output = RewriteOutput::default();
        let mut lines = Vec::new();

        for (idx, line) in body.lines().enumerate() {
            let rewritten = match classify_line(line) {
                LineKind::MarkdownLink | LineKind::Plain => line.to_string(),
                LineKind::WikiLink => rewrite_text_links(line),
                LineKind::Embed => self.rewrite_embed_line(idx + 1, line, &mut output).await,
            };
            lines.push(rewritten);
        }

        output.body = lines.join("\n").trim().to_string();
        output
    }

    async fn rewrite_embed_line(
        &self,
        line_no: usize,
        line: &str,
        output: &mut RewriteOutput,
    ) -> String {
        let mut replacements = Vec::new();
        let mut staged_here = Vec::new();

        for embed in find_embeds(line) {
            if embed.is_external() {
                replacements.push((embed.span, render_embed(&embed.target, embed.width)));
                continue;
            }

            match self.stage_asset(&embed.target).await {
                Ok((url, staged)) => {
                    staged_here.push(staged);
                    replacements.push((embed.span, render_embed(&url, embed.width)));
                }
                Err(error) => {
                    let warning = AssetWarning {
                        line: line_no,
                        reference: embed.target,
                        error,
                    };
                    log::warn!("Keeping embed line unchanged, {}", warning);
                    output.warnings.push(warning);
                    return line.to_string();
                }
            }
        }

        for staged in staged_here {
            if !output.assets.iter().any(|a| a.destination == staged.destination) {
                output.assets.push(staged);
            }
        }
        rewrite_text_links(&splice_embeds(line, &replacements))
    }

    /// Read an asset, returning its site URL and where it goes
    async fn stage_asset(&self, reference: &str) -> Result<(String, StagedAsset)> {
        let asset = self
            .assets
            .find(reference)
            .ok_or_else(|| Error::asset_resolution(reference, "not found in vault"))?;
        let bytes = self.assets.read(asset).await?;

        let name = sanitize_asset_name(reference);
        let destination = self.export_root.join(&self.image_folder).join(&name);
        log::debug!(
            "Staged {} as {}",
            asset.relative_path.display(),
            destination.display()
        );

        Ok((
            asset_url(&self.image_folder, &name),
            StagedAsset { destination, bytes },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        _vault: TempDir,
        site: TempDir,
        index: AssetIndex,
    }

    fn fixture() -> Fixture {
        let vault = TempDir::new().unwrap();
        std::fs::create_dir_all(vault.path().join("attachments")).unwrap();
        std::fs::write(vault.path().join("attachments/cat.png"), b"meow").unwrap();
        std::fs::write(vault.path().join("attachments/My Dog.JPG"), b"woof").unwrap();
        let index = AssetIndex::scan(vault.path(), &[]).unwrap();
        Fixture {
            _vault: vault,
            site: TempDir::new().unwrap(),
            index,
        }
    }

    #[tokio::test]
    async fn test_embed_and_link_on_one_line() {
        let f = fixture();
        let rewriter = LinkRewriter::new(f.site.path(), "images", &f.index);

        let out = rewriter
            .rewrite("Some text ![[cat.png|100]] and [[Other Note|See]]")
            .await;

        assert_eq!(
            out.body,
            "Some text ![](images/cat.png){:width=\"100px\"} and [See](other-note)"
        );
        assert!(out.warnings.is_empty());
        assert_eq!(
            out.assets,
            vec![StagedAsset {
                destination: f.site.path().join("images/cat.png"),
                bytes: b"meow".to_vec(),
            }]
        );
        // Nothing touches the site until the pipeline commits
        assert!(!f.site.path().join("images").exists());
    }

    #[tokio::test]
    async fn test_sanitized_asset_name() {
        let f = fixture();
        let rewriter = LinkRewriter::new(f.site.path(), "assets/img", &f.index);

        let out = rewriter.rewrite("![[My Dog.JPG]]").await;
        assert_eq!(out.body, "![](assets/img/my-dog.jpg)");
        assert_eq!(out.asset_paths(), vec![f.site.path().join("assets/img/my-dog.jpg")]);
    }

    #[tokio::test]
    async fn test_repeated_embed_staged_once() {
        let f = fixture();
        let rewriter = LinkRewriter::new(f.site.path(), "images", &f.index);

        let out = rewriter.rewrite("![[cat.png]]\n![[cat.png|20]]").await;
        assert_eq!(out.assets.len(), 1);
        assert_eq!(out.asset_ops().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_asset_keeps_line() {
        let f = fixture();
        let rewriter = LinkRewriter::new(f.site.path(), "images", &f.index);

        let line = "![[cat.png]] next to ![[ghost.png]] and [[Note]]";
        let out = rewriter.rewrite(line).await;

        assert_eq!(out.body, line);
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].reference, "ghost.png");
        assert_eq!(out.warnings[0].line, 1);
        assert!(matches!(
            &out.warnings[0].error,
            Error::AssetResolution { asset, .. } if asset == "ghost.png"
        ));
        assert!(out.assets.is_empty());
        assert!(!f.site.path().join("images/cat.png").exists());
    }

    #[tokio::test]
    async fn test_warning_serializes_reason() {
        let f = fixture();
        let rewriter = LinkRewriter::new(f.site.path(), "images", &f.index);

        let out = rewriter.rewrite("text\n![[ghost.png]]").await;
        let json = serde_json::to_value(&out.warnings[0]).unwrap();
        assert_eq!(json["line"], 2);
        assert_eq!(json["reference"], "ghost.png");
        assert_eq!(
            json["reason"],
            "Could not resolve asset 'ghost.png': not found in vault"
        );
        assert_eq!(
            out.warnings[0].to_string(),
            "line 2: Could not resolve asset 'ghost.png': not found in vault"
        );
    }

    #[tokio::test]
    async fn test_external_embed() {
        let f = fixture();
        let rewriter = LinkRewriter::new(f.site.path(), "images", &f.index);

        let out = rewriter.rewrite("![[https://example.com/a.png|50]]").await;
        assert_eq!(out.body, "![](https://example.com/a.png){:width=\"50px\"}");
        assert!(out.assets.is_empty());
    }

    #[tokio::test]
    async fn test_markdown_and_plain_lines_untouched() {
        let f = fixture();
        let rewriter = LinkRewriter::new(f.site.path(), "images", &f.index);

        let body = "\n\n[site](https://x.org) and [[Note]]\nplain line\n\n";
        let out = rewriter.rewrite(body).await;
        assert_eq!(out.body, "[site](https://x.org) and [[Note]]\nplain line");
    }

    #[tokio::test]
    async fn test_rewrite_is_idempotent() {
        let f = fixture();
        let rewriter = LinkRewriter::new(f.site.path(), "images", &f.index);

        let body = "# Title\n\n![[cat.png|100]] and [[Other Note|See]]\n[[Second]]\n![[ghost.png]]";
        let once = rewriter.rewrite(body).await;
        let twice = rewriter.rewrite(&once.body).await;
        assert_eq!(once.body, twice.body);
    }
}
