//! The note being exported.

use std::path::{Path, PathBuf};
use tokio::fs;
use vaultpress_core::{Error, PathValidator, Result};

/// A markdown note read from the vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    vault_root: PathBuf,
    relative_path: PathBuf,
    content: String,
}

impl SourceDocument {
    /// Read a note. `path` may be relative to the vault root or absolute
    /// inside it.
    pub async fn load(vault_root: &Path, path: &Path) -> Result<Self> {
        let relative = match path.strip_prefix(vault_root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) if path.is_absolute() => return Err(Error::path_traversal(path)),
            Err(_) => path.to_path_buf(),
        };

        let full_path = PathValidator::validate_path_exists(vault_root, &relative)?;
        let content = fs::read_to_string(&full_path).await.map_err(Error::io)?;

        Ok(Self {
            vault_root: vault_root.to_path_buf(),
            relative_path: relative,
            content,
        })
    }

    /// Wrap text that is already in memory
    pub fn from_parts(
        vault_root: impl Into<PathBuf>,
        relative_path: impl Into<PathBuf>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            vault_root: vault_root.into(),
            relative_path: relative_path.into(),
            content: content.into(),
        }
    }

    /// File name without the extension
    pub fn title(&self) -> String {
        self.relative_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn vault_root(&self) -> &Path {
        &self.vault_root
    }

    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    pub fn absolute_path(&self) -> PathBuf {
        self.vault_root.join(&self.relative_path)
    }

    /// Folder of the note relative to the vault root (empty at the root)
    pub fn relative_dir(&self) -> &Path {
        self.relative_path.parent().unwrap_or(Path::new(""))
    }
}
