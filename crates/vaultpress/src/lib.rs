//! # vaultpress
//!
//! Export Obsidian notes as Jekyll posts.
//!
//! This crate is the command line front end. The work is done by:
//! - `vaultpress-core`: configuration, errors, front matter model
//! - `vaultpress-parser`: front matter editing, templates, link rules
//! - `vaultpress-vault`: source notes, asset index, atomic writes
//! - `vaultpress-tags`: tag suggestions from a chat-completions service
//! - `vaultpress-export`: the export pipeline and conflict handling

pub mod cli;
pub mod logging;
pub mod prompt;
pub mod report;

pub use prompt::LinePrompt;
pub use vaultpress_core::prelude::*;
pub use vaultpress_export::{
    ConflictChoice, ConflictPrompt, ExportOutcome, ExportPipeline, ExportReport, ExportStep,
    PendingConflict,
};
pub use vaultpress_tags::{OpenAiTagSuggester, TagExtractor};
