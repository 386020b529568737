//! Atomic file operations with rollback support.
//!
//! An export writes the post, the assets it embeds, and the source note's
//! updated front matter. These run as one transaction: every file is backed
//! up first, and a failure part way through restores the backups before the
//! error is returned.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;
use vaultpress_core::{Error, Result};

/// Backup information for a file operation
#[derive(Debug, Clone)]
struct Backup {
    original_path: PathBuf,
    backup_path: PathBuf,
    /// Whether the original file existed
    existed: bool,
}

/// A single file operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOp {
    /// Replace a file's content, creating parent directories
    Write(PathBuf, Vec<u8>),
}

impl FileOp {
    pub fn write(path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        Self::Write(path.into(), content.into())
    }

    /// Get the path affected by this operation
    pub fn path(&self) -> &Path {
        match self {
            Self::Write(p, _) => p,
        }
    }
}

/// Result of a committed transaction
#[derive(Debug)]
pub struct TransactionResult {
    /// Number of operations executed
    pub operations: usize,
    /// Paths affected by the transaction
    pub affected_paths: Vec<PathBuf>,
}

/// Transactional file operations
///
/// Backups live in a private temporary directory that is removed when the
/// value is dropped.
pub struct AtomicFileOps {
    backups: TempDir,
}

impl AtomicFileOps {
    pub fn scratch() -> Result<Self> {
        Ok(Self {
            backups: TempDir::new().map_err(Error::io)?,
        })
    }

    /// Execute multiple file operations as one transaction
    ///
    /// Operations run in order. If one fails, every file is restored from
    /// its backup and the failing operation's error is returned.
    #[tracing::instrument(skip_all, fields(ops = ops.len()))]
    pub async fn execute_transaction(&self, ops: Vec<FileOp>) -> Result<TransactionResult> {
        if ops.is_empty() {
            return Ok(TransactionResult {
                operations: 0,
                affected_paths: Vec::new(),
            });
        }

        let backups = self.create_backups(&ops).await?;

        let mut affected_paths = Vec::with_capacity(ops.len());
        for op in &ops {
            if let Err(e) = self.execute_op(op).await {
                log::warn!(
                    "File operation on {} failed, rolling back {} operation(s): {}",
                    op.path().display(),
                    ops.len(),
                    e
                );
                self.rollback(&backups).await;
                return Err(e);
            }
            affected_paths.push(op.path().to_path_buf());
        }

        self.cleanup_backups(&backups).await;

        Ok(TransactionResult {
            operations: ops.len(),
            affected_paths,
        })
    }

    async fn create_backups(&self, ops: &[FileOp]) -> Result<Vec<Backup>> {
        let mut backups = Vec::with_capacity(ops.len());
        for (idx, op) in ops.iter().enumerate() {
            match self.backup_file(op.path(), idx).await {
                Ok(backup) => backups.push(backup),
                Err(e) => {
                    self.cleanup_backups(&backups).await;
                    return Err(e);
                }
            }
        }
        Ok(backups)
    }

    /// Only regular files are copied; anything else is restored by removal
    async fn backup_file(&self, path: &Path, idx: usize) -> Result<Backup> {
        let existed = matches!(fs::metadata(path).await, Ok(meta) if meta.is_file());
        let backup_path = self.backups.path().join(format!("backup_{}.tmp", idx));

        if existed {
            fs::copy(path, &backup_path).await.map_err(Error::io)?;
        }

        Ok(Backup {
            original_path: path.to_path_buf(),
            backup_path,
            existed,
        })
    }

    async fn execute_op(&self, op: &FileOp) -> Result<()> {
        match op {
            FileOp::Write(path, content) => write_atomic(path, content).await,
        }
    }

    /// Restore every file, last operation first
    async fn rollback(&self, backups: &[Backup]) {
        for backup in backups.iter().rev() {
            let restored = if backup.existed {
                fs::copy(&backup.backup_path, &backup.original_path)
                    .await
                    .map(|_| ())
            } else {
                match fs::remove_file(&backup.original_path).await {
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                    other => other,
                }
            };

            if let Err(e) = restored {
                log::error!(
                    "Rollback failed for {}: {}",
                    backup.original_path.display(),
                    e
                );
            }
        }

        self.cleanup_backups(backups).await;
    }

    async fn cleanup_backups(&self, backups: &[Backup]) {
        for backup in backups.iter().filter(|b| b.existed) {
            let _ = fs::remove_file(&backup.backup_path).await;
        }
    }
}

/// Write a file through a sibling temp file and a rename, creating parent
/// directories as needed
pub async fn write_atomic(path: &Path, content: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await.map_err(Error::io)?;
    }

    let temp_path = temp_sibling(path);
    fs::write(&temp_path, content.as_ref()).await.map_err(Error::io)?;

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(Error::io(e));
    }
    Ok(())
}

/// Delete a file, logging instead of failing. Returns whether it was removed.
pub async fn remove_quietly(path: &Path) -> bool {
    match fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Could not remove {}: {}", path.display(), e);
            false
        }
    }
}

/// `dir/.name.tmp` next to `dir/name`
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[tokio::test]
    async fn test_post_write_creates_posts_dir() {
        let site = TempDir::new().unwrap();
        let post = site.path().join("blog/_posts/2024-01-01-Post.md");

        let result = AtomicFileOps::scratch()
            .unwrap()
            .execute_transaction(vec![FileOp::write(&post, "---\n---\nBody")])
            .await
            .unwrap();

        assert_eq!(result.operations, 1);
        assert_eq!(read(&post), "---\n---\nBody");
        assert!(!site.path().join("blog/_posts/.2024-01-01-Post.md.tmp").exists());
    }

    #[tokio::test]
    async fn test_post_assets_and_mirror_in_one_transaction() {
        let site = TempDir::new().unwrap();
        let post = site.path().join("_posts/2024-03-05-Post.md");
        let image = site.path().join("images/cat.png");
        let source = site.path().join("Post.md");
        std::fs::write(&source, "body").unwrap();

        let result = AtomicFileOps::scratch()
            .unwrap()
            .execute_transaction(vec![
                FileOp::write(&image, b"meow".to_vec()),
                FileOp::write(&post, "new post"),
                FileOp::write(&source, "---\nnanoId: abc\n---\nbody"),
            ])
            .await
            .unwrap();

        assert_eq!(result.operations, 3);
        assert_eq!(
            result.affected_paths,
            vec![image.clone(), post.clone(), source.clone()]
        );
        assert_eq!(std::fs::read(&image).unwrap(), b"meow");
        assert_eq!(read(&post), "new post");
        assert!(read(&source).contains("nanoId: abc"));
    }

    #[tokio::test]
    async fn test_failed_mirror_rolls_back_post_and_assets() {
        let site = TempDir::new().unwrap();
        let existing = site.path().join("2024-01-01-Post.md");
        let image = site.path().join("images/cat.png");
        std::fs::write(&existing, "original").unwrap();

        // A regular file where a directory is needed makes the last write fail
        let blocker = site.path().join("vault");
        std::fs::write(&blocker, "").unwrap();

        let result = AtomicFileOps::scratch()
            .unwrap()
            .execute_transaction(vec![
                FileOp::write(&image, b"meow".to_vec()),
                FileOp::write(&existing, "changed"),
                FileOp::write(blocker.join("Post.md"), "mirrored"),
            ])
            .await;
        assert!(matches!(result, Err(Error::Io(_))));

        assert_eq!(read(&existing), "original");
        assert!(!image.exists());
        assert_eq!(read(&blocker), "");
    }

    #[tokio::test]
    async fn test_nothing_to_do() {
        let result = AtomicFileOps::scratch()
            .unwrap()
            .execute_transaction(Vec::new())
            .await
            .unwrap();
        assert_eq!(result.operations, 0);
        assert!(result.affected_paths.is_empty());
    }

    #[tokio::test]
    async fn test_write_atomic_replaces_content() {
        let site = TempDir::new().unwrap();
        let path = site.path().join("a.md");

        write_atomic(&path, "one").await.unwrap();
        write_atomic(&path, "two").await.unwrap();
        assert_eq!(read(&path), "two");
    }

    #[tokio::test]
    async fn test_remove_quietly() {
        let site = TempDir::new().unwrap();
        let path = site.path().join("a.md");
        std::fs::write(&path, "x").unwrap();

        assert!(remove_quietly(&path).await);
        assert!(!remove_quietly(&path).await);
    }

    #[test]
    fn test_temp_sibling() {
        assert_eq!(
            temp_sibling(Path::new("/t/_posts/a.md")),
            PathBuf::from("/t/_posts/.a.md.tmp")
        );
    }
}
