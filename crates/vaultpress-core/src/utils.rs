//! Shared path utilities.

use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Expand `~` and environment variables in a user-supplied path
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::full(&path_str).map_err(|e| {
        Error::config_error(format!("Failed to expand path {}: {}", path.display(), e))
    })?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Path validation helpers
pub struct PathValidator;

impl PathValidator {
    /// Ensure a path is within a root folder (prevents directory traversal)
    pub fn validate_path_in_root(root: &Path, path: &Path) -> Result<PathBuf> {
        let full_path = root.join(path);

        let canonical_root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

        if let Ok(canonical_full) = full_path.canonicalize() {
            if !canonical_full.starts_with(&canonical_root) {
                return Err(Error::path_traversal(full_path));
            }
        } else {
            // Path doesn't exist yet, check statically
            let normalized = Self::normalize(&full_path);
            if !normalized.starts_with(Self::normalize(root)) {
                return Err(Error::path_traversal(full_path));
            }
        }

        Ok(full_path)
    }

    /// Ensure a path exists under the root
    pub fn validate_path_exists(root: &Path, path: &Path) -> Result<PathBuf> {
        let full_path = Self::validate_path_in_root(root, path)?;
        if !full_path.exists() {
            return Err(Error::file_not_found(&full_path));
        }
        Ok(full_path)
    }

    /// Lexically resolve `.` and `..` components
    fn normalize(path: &Path) -> PathBuf {
        let mut normalized = PathBuf::new();
        for component in path.components() {
            match component {
                Component::ParentDir => {
                    normalized.pop();
                }
                Component::CurDir => {}
                other => normalized.push(other.as_os_str()),
            }
        }
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_validator_valid() {
        let root = PathBuf::from("/vault");
        let result = PathValidator::validate_path_in_root(&root, Path::new("notes/file.md"));
        assert_eq!(result.unwrap(), PathBuf::from("/vault/notes/file.md"));
    }

    #[test]
    fn test_path_validator_traversal() {
        let root = PathBuf::from("/vault");
        let result = PathValidator::validate_path_in_root(&root, Path::new("../../../etc/passwd"));
        assert!(matches!(result, Err(Error::PathTraversalAttempt { .. })));
    }

    #[test]
    fn test_path_validator_missing_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let result = PathValidator::validate_path_exists(temp.path(), Path::new("nope.md"));
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_expand_plain_path_is_unchanged() {
        let path = Path::new("/tmp/site");
        assert_eq!(expand_path(path).unwrap(), PathBuf::from("/tmp/site"));
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_path(Path::new("~/blog")).unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
