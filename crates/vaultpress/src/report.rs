//! Printing export results

use clap::ValueEnum;
use serde_json::json;
use std::path::Path;
use vaultpress_core::Result;
use vaultpress_export::{ConflictState, ExportOutcome, ExportReport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Render the outcome of exporting `note`
pub fn render(outcome: &ExportOutcome, note: &Path, format: ReportFormat) -> Result<String> {
    match (outcome, format) {
        (ExportOutcome::Written(report), ReportFormat::Text) => Ok(render_text(report, note)),
        (ExportOutcome::Written(report), ReportFormat::Json) => report.to_json(),
        (ExportOutcome::Cancelled, ReportFormat::Text) => {
            Ok(format!("Export of {} was cancelled", note.display()))
        }
        (ExportOutcome::Cancelled, ReportFormat::Json) => Ok(json!({
            "source": note,
            "cancelled": true,
        })
        .to_string()),
    }
}

fn render_text(report: &ExportReport, note: &Path) -> String {
    let mut out = format!("Exported {} -> {}", note.display(), report.destination.display());

    match report.conflict {
        ConflictState::ResolvedOverwriteAll => out.push_str(" (overwrote date and content)"),
        ConflictState::ResolvedBodyOnly => out.push_str(" (overwrote content only)"),
        _ => {}
    }
    if let Some(id) = &report.nano_id {
        out.push_str(&format!("\n  permalink: /{}/", id));
    }
    if let Some(old) = &report.replaced {
        out.push_str(&format!("\n  removed: {}", old.display()));
    }
    if !report.copied_assets.is_empty() {
        out.push_str(&format!("\n  assets copied: {}", report.copied_assets.len()));
    }
    if report.source_updated {
        out.push_str("\n  source front matter updated");
    }
    for warning in &report.warnings {
        out.push_str(&format!("\n  warning: {}", warning));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use vaultpress_core::Error;
    use vaultpress_export::AssetWarning;

    fn report() -> ExportReport {
        ExportReport {
            source: PathBuf::from("/vault/Post.md"),
            destination: PathBuf::from("/site/_posts/2024-03-05-Post.md"),
            nano_id: Some("abc".to_string()),
            conflict: ConflictState::ResolvedOverwriteAll,
            replaced: Some(PathBuf::from("/site/_posts/2024-03-01-Post.md")),
            source_updated: true,
            copied_assets: vec![PathBuf::from("/site/images/cat.png")],
            warnings: vec![AssetWarning {
                line: 3,
                reference: "ghost.png".to_string(),
                error: Error::asset_resolution("ghost.png", "not found in vault"),
            }],
            exported_at: "2024-03-05T09:30:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_text_report() {
        let outcome = ExportOutcome::Written(report());
        let text = render(&outcome, Path::new("Post.md"), ReportFormat::Text).unwrap();

        assert!(text.starts_with(
            "Exported Post.md -> /site/_posts/2024-03-05-Post.md (overwrote date and content)"
        ));
        assert!(text.contains("permalink: /abc/"));
        assert!(text.contains("removed: /site/_posts/2024-03-01-Post.md"));
        assert!(text.contains("assets copied: 1"));
        assert!(text.contains("warning: line 3: Could not resolve asset 'ghost.png'"));
    }

    #[test]
    fn test_cancelled_report() {
        let text = render(&ExportOutcome::Cancelled, Path::new("Post.md"), ReportFormat::Text)
            .unwrap();
        assert_eq!(text, "Export of Post.md was cancelled");

        let json = render(&ExportOutcome::Cancelled, Path::new("Post.md"), ReportFormat::Json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["cancelled"], true);
    }

    #[test]
    fn test_json_report() {
        let outcome = ExportOutcome::Written(report());
        let json = render(&outcome, Path::new("Post.md"), ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["conflict"], "resolved_overwrite_all");
        assert_eq!(value["warnings"][0]["reference"], "ghost.png");
        assert_eq!(
            value["warnings"][0]["reason"],
            "Could not resolve asset 'ghost.png': not found in vault"
        );
    }
}
