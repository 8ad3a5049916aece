//! Index location management.
//!
//! Every index lives in `.catalog/index/<name>/` and holds the SQLite
//! database plus the embedding settings it was built with.

use catalog_core::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the directory of a named index.
pub fn get_index_dir(workspace: &Path, index_name: &str) -> PathBuf {
    workspace.join(".catalog").join("index").join(index_name)
}

/// Get the SQLite database path of a named index.
pub fn get_index_path(workspace: &Path, index_name: &str) -> PathBuf {
    get_index_dir(workspace, index_name).join("index.sqlite")
}

/// Get the embedding settings path of a named index.
pub fn get_embedding_config_path(workspace: &Path, index_name: &str) -> PathBuf {
    get_index_dir(workspace, index_name).join("embedding.yaml")
}

/// Remove an index directory and everything in it.
///
/// A missing directory is not an error.
pub fn remove_index_dir(workspace: &Path, index_name: &str) -> AppResult<()> {
    let dir = get_index_dir(workspace, index_name);
    if dir.exists() {
        fs::remove_dir_all(&dir).map_err(|e| {
            AppError::Knowledge(format!("Failed to remove index directory {:?}: {}", dir, e))
        })?;
        tracing::info!("Removed existing index at {:?}", dir);
    }
    Ok(())
}

/// Check that an index directory exists and is not empty.
pub fn ensure_index_present(workspace: &Path, index_name: &str) -> AppResult<PathBuf> {
    let dir = get_index_dir(workspace, index_name);

    let mut entries = fs::read_dir(&dir).map_err(|_| {
        AppError::IndexUnavailable(format!(
            "Index '{}' not found at {:?}. Run 'catalog index build' first.",
            index_name, dir
        ))
    })?;

    if entries.next().is_none() {
        return Err(AppError::IndexUnavailable(format!(
            "Index directory {:?} is empty. Run 'catalog index build' first.",
            dir
        )));
    }

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_index_paths() {
        let workspace = Path::new("/ws");
        assert_eq!(
            get_index_path(workspace, "catalog"),
            PathBuf::from("/ws/.catalog/index/catalog/index.sqlite")
        );
        assert_eq!(
            get_embedding_config_path(workspace, "catalog"),
            PathBuf::from("/ws/.catalog/index/catalog/embedding.yaml")
        );
    }

    #[test]
    fn test_missing_index_is_unavailable() {
        let temp = TempDir::new().unwrap();
        let result = ensure_index_present(temp.path(), "catalog");
        assert!(matches!(result, Err(AppError::IndexUnavailable(_))));
    }

    #[test]
    fn test_empty_index_is_unavailable() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(get_index_dir(temp.path(), "catalog")).unwrap();

        let result = ensure_index_present(temp.path(), "catalog");
        assert!(matches!(result, Err(AppError::IndexUnavailable(_))));
    }

    #[test]
    fn test_remove_index_dir() {
        let temp = TempDir::new().unwrap();
        let dir = get_index_dir(temp.path(), "catalog");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("index.sqlite"), b"x").unwrap();

        remove_index_dir(temp.path(), "catalog").unwrap();
        assert!(!dir.exists());

        // Removing again is fine
        remove_index_dir(temp.path(), "catalog").unwrap();
    }
}
