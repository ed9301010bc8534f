//! Recursive file enumeration over an extraction tree.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::ProcessingResult;

/// List every regular file under `dir`, recursively.
///
/// Directories are descended with an explicit stack rather than call
/// recursion, so arbitrarily deep trees cannot exhaust the stack. Only
/// regular files are yielded, sorted by path: the order is stable for an
/// unchanged tree, which keeps record-folder processing order
/// deterministic.
pub async fn list_files(dir: &Path) -> ProcessingResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut entries = fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn yields_only_regular_files_sorted() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b/Source")).await.unwrap();
        fs::create_dir_all(root.join("a")).await.unwrap();
        fs::create_dir_all(root.join("empty")).await.unwrap();
        fs::write(root.join("b/data.json"), b"{}").await.unwrap();
        fs::write(root.join("b/Source/1 - x.eml"), b"x").await.unwrap();
        fs::write(root.join("a/z.pdf"), b"z").await.unwrap();

        let files = list_files(root).await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a/z.pdf", "b/Source/1 - x.eml", "b/data.json"]);
    }

    #[tokio::test]
    async fn order_is_stable_across_calls() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        for name in ["c.txt", "a.txt", "b.txt"] {
            fs::write(root.join(name), b"x").await.unwrap();
        }

        let first = list_files(root).await.unwrap();
        let second = list_files(root).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unreadable_directory_is_an_io_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        let result = list_files(&missing).await;
        assert!(matches!(result, Err(crate::ProcessingError::Io(_))));
    }
}
