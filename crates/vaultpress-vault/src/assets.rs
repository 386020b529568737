//! Index of embeddable files in a vault.
//!
//! Embeds name an asset by file name or by a trailing part of its vault
//! path (`![[cat.png]]`, `![[attachments/cat.png]]`). The index is built once
//! per export and answers those lookups without touching the disk again.

use std::path::{Path, PathBuf};
use tokio::fs;
use vaultpress_core::{Error, Result};
use walkdir::{DirEntry, WalkDir};

/// A non-note file inside the vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultAsset {
    /// Path relative to the vault root
    pub relative_path: PathBuf,
    pub absolute_path: PathBuf,
}

/// Sorted list of the vault's non-markdown files
#[derive(Debug, Clone, Default)]
pub struct AssetIndex {
    assets: Vec<VaultAsset>,
}

impl AssetIndex {
    /// Walk `vault_root`, skipping any entry whose name matches an exclude pattern
    #[tracing::instrument(skip(exclude_patterns), fields(root = %vault_root.display()))]
    pub fn scan(vault_root: &Path, exclude_patterns: &[String]) -> Result<Self> {
        if !vault_root.is_dir() {
            return Err(Error::file_not_found(vault_root));
        }

        let mut assets = Vec::new();
        let walker = WalkDir::new(vault_root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_excluded(entry, exclude_patterns));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable vault entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || is_markdown(entry.path()) {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(vault_root) else {
                continue;
            };
            assets.push(VaultAsset {
                relative_path: relative.to_path_buf(),
                absolute_path: entry.path().to_path_buf(),
            });
        }

        log::debug!("Indexed {} asset(s) under {}", assets.len(), vault_root.display());
        Ok(Self::from_assets(assets))
    }

    /// Build an index from an already known list of assets
    pub fn from_assets(mut assets: Vec<VaultAsset>) -> Self {
        assets.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Self { assets }
    }

    /// Resolve an embed reference.
    ///
    /// The reference matches when it equals the trailing components of an
    /// asset's vault path. Several matches resolve to the first in path order.
    pub fn find(&self, reference: &str) -> Option<&VaultAsset> {
        let reference = reference.trim().trim_start_matches("./");
        if reference.is_empty() {
            return None;
        }
        let wanted = Path::new(reference);
        self.assets.iter().find(|a| a.relative_path.ends_with(wanted))
    }

    /// Read an asset's bytes
    pub async fn read(&self, asset: &VaultAsset) -> Result<Vec<u8>> {
        fs::read(&asset.absolute_path).await.map_err(|e| {
            Error::asset_resolution(asset.relative_path.display().to_string(), e.to_string())
        })
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VaultAsset> {
        self.assets.iter()
    }
}

fn is_excluded(entry: &DirEntry, patterns: &[String]) -> bool {
    let name = entry.file_name().to_string_lossy();
    patterns.iter().any(|p| p == name.as_ref())
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vault() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("attachments/2024")).unwrap();
        std::fs::create_dir_all(root.join(".obsidian")).unwrap();
        std::fs::write(root.join("attachments/cat.png"), b"cat").unwrap();
        std::fs::write(root.join("attachments/2024/cat.png"), b"cat2").unwrap();
        std::fs::write(root.join("attachments/My Dog.jpg"), b"dog").unwrap();
        std::fs::write(root.join(".obsidian/icon.png"), b"x").unwrap();
        std::fs::write(root.join("Note.md"), "# Note").unwrap();
        dir
    }

    fn excludes() -> Vec<String> {
        vec![".obsidian".to_string()]
    }

    #[test]
    fn test_scan_skips_notes_and_excluded() {
        let dir = vault();
        let index = AssetIndex::scan(dir.path(), &excludes()).unwrap();

        assert_eq!(index.len(), 3);
        assert!(index.iter().all(|a| !a.relative_path.starts_with(".obsidian")));
        assert!(index.find("Note.md").is_none());
    }

    #[test]
    fn test_find_by_name_and_suffix() {
        let dir = vault();
        let index = AssetIndex::scan(dir.path(), &excludes()).unwrap();

        let first = index.find("cat.png").unwrap();
        assert_eq!(first.relative_path, PathBuf::from("attachments/2024/cat.png"));

        let exact = index.find("attachments/cat.png").unwrap();
        assert_eq!(exact.relative_path, PathBuf::from("attachments/cat.png"));

        assert!(index.find("My Dog.jpg").is_some());
        assert!(index.find("at.png").is_none());
        assert!(index.find("").is_none());
    }

    #[test]
    fn test_scan_missing_root() {
        let dir = TempDir::new().unwrap();
        let result = AssetIndex::scan(&dir.path().join("nope"), &[]);
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[tokio::test]
    async fn test_read_asset() {
        let dir = vault();
        let index = AssetIndex::scan(dir.path(), &excludes()).unwrap();
        let asset = index.find("attachments/cat.png").unwrap().clone();

        assert_eq!(index.read(&asset).await.unwrap(), b"cat");

        std::fs::remove_file(&asset.absolute_path).unwrap();
        let err = index.read(&asset).await.unwrap_err();
        assert!(err.is_recoverable());
    }
}
