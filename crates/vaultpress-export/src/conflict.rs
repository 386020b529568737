//! Detecting an earlier export of the same note and the operator's choices
//! for replacing it.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use vaultpress_core::{Error, Result};

/// Where an export stands with respect to an existing post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictState {
    NoConflict,
    AwaitingChoice,
    ResolvedOverwriteAll,
    ResolvedBodyOnly,
    ResolvedCancel,
}

/// How to treat an existing post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictChoice {
    /// New front matter and body, written under today's file name
    OverwriteAll,
    /// Keep the existing front matter block, replace the body in place
    BodyOnly,
    Cancel,
}

impl ConflictChoice {
    /// Choices in the order they are offered
    pub const ALL: [ConflictChoice; 3] = [Self::OverwriteAll, Self::BodyOnly, Self::Cancel];

    /// Label shown to the operator
    pub fn label(self) -> &'static str {
        match self {
            Self::OverwriteAll => "Overwrite Date and Content",
            Self::BodyOnly => "Overwrite Content Only",
            Self::Cancel => "Cancel",
        }
    }

    pub fn resolved_state(self) -> ConflictState {
        match self {
            Self::OverwriteAll => ConflictState::ResolvedOverwriteAll,
            Self::BodyOnly => ConflictState::ResolvedBodyOnly,
            Self::Cancel => ConflictState::ResolvedCancel,
        }
    }
}

impl fmt::Display for ConflictChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ConflictChoice {
    type Err = Error;

    /// Accepts the short forms `overwrite`, `body-only`, `cancel` or a full label
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "overwrite" | "overwrite-all" => return Ok(Self::OverwriteAll),
            "body-only" | "body" => return Ok(Self::BodyOnly),
            "cancel" => return Ok(Self::Cancel),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::config_error(format!("Unknown conflict choice: {}", s)))
    }
}

/// Find the post a note was exported to before.
///
/// Any `.md` file in `posts_dir` whose name contains `sanitized_title` counts.
/// A missing directory means no conflict; two or more matches is an
/// [`Error::AmbiguousConflict`].
pub async fn find_conflict(posts_dir: &Path, sanitized_title: &str) -> Result<Option<PathBuf>> {
    let mut entries = match fs::read_dir(posts_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io(e)),
    };

    let mut matches = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(Error::io)? {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();

        let is_markdown = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("md"));
        if is_markdown
            && name.contains(sanitized_title)
            && entry.file_type().await.map_err(Error::io)?.is_file()
        {
            matches.push(path);
        }
    }

    matches.sort();
    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        _ => Err(Error::ambiguous_conflict(sanitized_title, matches)),
    }
}
