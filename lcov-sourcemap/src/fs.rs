// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;

/// Whether `entry` is on disk. Errors other than a missing entry, such as a permission
/// failure, are returned rather than read as absence.
pub async fn exists(entry: impl AsRef<Path>) -> Result<bool> {
    let entry = entry.as_ref();

    match fs::metadata(entry).await {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err).with_context(|| format!("unable to stat: {}", entry.display())),
    }
}

/// Write `content`, creating missing parent directories first.
pub async fn write_file(path: impl AsRef<Path>, content: &str) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("unable to create nested path: {}", parent.display()))?;
    }

    fs::write(path, content)
        .await
        .with_context(|| format!("unable to write file: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn test_exists() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("a.js");

        assert!(!exists(&file).await?);
        fs::write(&file, "").await?;
        assert!(exists(&file).await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_exists_reports_other_errors() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("a.js");
        fs::write(&file, "").await?;

        // A regular file used as a directory is an error, not a missing entry.
        assert!(exists(file.join("b.js")).await.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_write_file_creates_parents() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("coverage").join("nested").join("lcov.info");

        write_file(&file, "TN:\n").await?;

        assert_eq!(fs::read_to_string(&file).await?, "TN:\n");
        Ok(())
    }
}
