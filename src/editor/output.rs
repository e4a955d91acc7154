//! Editing a copy of a filenode instead of the filenode itself.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempPath};
use tracing::{debug, info};

use super::error::EditorError;

/// A copy of a filenode staged in a temporary file beside its destination.
///
/// Edit the file at [`path`](Self::path), then [`commit`](Self::commit) to
/// rename it onto the destination. Dropping an uncommitted copy deletes the
/// temporary file, so a failed edit leaves nothing at the destination.
#[derive(Debug)]
pub struct StagedCopy {
    staging: TempPath,
    target: PathBuf,
}

impl StagedCopy {
    /// Copies `source` into a temporary file in `target`'s directory.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::SameFile` if `target` resolves to `source`
    /// (same path after canonicalization, or a hard link to it), and
    /// `EditorError::Output` if the copy cannot be made.
    pub async fn stage(source: &Path, target: &Path) -> Result<Self, EditorError> {
        if same_file(source, target).await? {
            return Err(EditorError::SameFile(target.to_path_buf()));
        }

        let dir = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let staging = Builder::new()
            .prefix(".filenode-editor-")
            .tempfile_in(dir)
            .map_err(|source| output_error(target, source))?
            .into_temp_path();

        let bytes = tokio::fs::copy(source, staging.to_path_buf())
            .await
            .map_err(|source| output_error(target, source))?;
        debug!(from = %source.display(), staging = %staging.display(), bytes, "staged filenode copy");

        Ok(Self {
            staging,
            target: target.to_path_buf(),
        })
    }

    /// Path of the staged copy; open the editor on this.
    pub fn path(&self) -> &Path {
        &self.staging
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Renames the staged copy onto the destination, replacing any file
    /// already there.
    pub fn commit(self) -> Result<PathBuf, EditorError> {
        let Self { staging, target } = self;
        staging
            .persist(&target)
            .map_err(|err| output_error(&target, err.error))?;
        info!(target = %target.display(), "wrote edited copy");
        Ok(target)
    }
}

fn output_error(path: &Path, source: io::Error) -> EditorError {
    EditorError::Output {
        path: path.to_path_buf(),
        source,
    }
}

async fn same_file(source: &Path, target: &Path) -> Result<bool, EditorError> {
    let source = tokio::fs::canonicalize(source)
        .await
        .map_err(|err| output_error(source, err))?;
    let target_path = target;
    let target = match tokio::fs::canonicalize(target_path).await {
        Ok(target) => target,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(output_error(target_path, err)),
    };
    if source == target {
        return Ok(true);
    }
    same_inode(&source, &target)
        .await
        .map_err(|err| output_error(target_path, err))
}

#[cfg(unix)]
async fn same_inode(a: &Path, b: &Path) -> io::Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let a = tokio::fs::metadata(a).await?;
    let b = tokio::fs::metadata(b).await?;
    Ok(a.dev() == b.dev() && a.ino() == b.ino())
}

#[cfg(not(unix))]
async fn same_inode(_a: &Path, _b: &Path) -> io::Result<bool> {
    Ok(false)
}
