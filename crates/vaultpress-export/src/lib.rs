//! # Export Pipeline
//!
//! Turns an Obsidian note into a Jekyll post:
//!
//! 1. Front matter is read from the note, or generated from the configured
//!    template when the note has none
//! 2. Tags are suggested by the tag service when the note has none
//! 3. The post is named `<relative dir>/_posts/YYYY-MM-DD-<Title>.md`
//! 4. An earlier export of the same note suspends the pipeline until the
//!    operator picks a [`ConflictChoice`]
//! 5. `[[links]]` and `![[embeds]]` are rewritten, embedded files staged
//! 6. The post is written together with its assets and the note's updated
//!    front matter
//!
//! ## Quick Start
//!
//! ```no_run
//! use vaultpress_export::prelude::*;
//! use std::path::Path;
//!
//! # async fn example() -> Result<()> {
//! let config = ExportConfig::builder().target("~/sites/blog").build()?;
//! let mut pipeline = ExportPipeline::new(config, "/path/to/vault")?;
//!
//! match pipeline.export(Path::new("blog/My Post.md")).await? {
//!     ExportStep::Done(report) => println!("Wrote {}", report.destination.display()),
//!     ExportStep::AwaitingChoice(pending) => {
//!         println!("{} already exists", pending.existing_path().display());
//!         let outcome = pipeline.resolve(pending, ConflictChoice::BodyOnly).await?;
//!         if let Some(report) = outcome.report() {
//!             println!("Updated {}", report.destination.display());
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Conflict Choices
//!
//! | Choice | Label | Effect |
//! |---|---|---|
//! | [`ConflictChoice::OverwriteAll`] | Overwrite Date and Content | New post at today's path keeping the old `nanoId`; the old file is removed |
//! | [`ConflictChoice::BodyOnly`] | Overwrite Content Only | Old front matter block kept verbatim, body replaced in place |
//! | [`ConflictChoice::Cancel`] | Cancel | Nothing is written |
//!
//! ## Reports
//!
//! Every written export yields an [`ExportReport`], which serializes to JSON
//! for scripting:
//!
//! ```ignore
//! let json = report.to_json()?;
//! ```

pub mod conflict;
pub mod identity;
pub mod pipeline;
pub mod rewriter;

pub use conflict::{ConflictChoice, ConflictState, find_conflict};
pub use identity::{ensure_identity, generate_nano_id, permalink_for};
pub use pipeline::{
    ConflictPrompt, ExportOutcome, ExportPipeline, ExportReport, ExportStep, PendingConflict,
    PipelineState, POSTS_DIR,
};
pub use rewriter::{AssetWarning, LinkRewriter, RewriteOutput, StagedAsset};

pub mod prelude {
    pub use crate::conflict::{ConflictChoice, ConflictState};
    pub use crate::pipeline::{
        ConflictPrompt, ExportOutcome, ExportPipeline, ExportReport, ExportStep, PendingConflict,
        PipelineState,
    };
    pub use vaultpress_core::prelude::*;
    pub use vaultpress_tags::{DisabledTagSuggester, OpenAiTagSuggester, TagExtractor};
}
