//! Writing outputs and intermediate files.
//!
//! Final outputs go through a temporary file in the destination directory
//! followed by a rename, so a failed run never leaves a partial file behind.

use headerpack_core::{Error, Result, Stage};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Create a temporary file next to `target`, creating the directory if needed
///
/// The file gets the permissions a plain write would give it, so the output
/// does not end up private to the current user.
pub(crate) fn staging_file(stage: Stage, target: &Path) -> Result<NamedTempFile> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let write_error = |e| Error::Write {
        stage,
        path: target.to_path_buf(),
        source: e,
    };

    fs::create_dir_all(dir).map_err(write_error)?;

    let mut builder = tempfile::Builder::new();
    builder.prefix(".headerpack-");
    // Created like a plain file so the umask applies, not tempfile's 0600
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let staged = builder.tempfile_in(dir).map_err(write_error)?;

    // Replacing an existing file keeps its mode
    if let Ok(existing) = fs::metadata(target) {
        fs::set_permissions(staged.path(), existing.permissions()).map_err(write_error)?;
    }
    Ok(staged)
}

/// Move a staged file onto its target
pub(crate) fn commit(stage: Stage, staged: NamedTempFile, target: &Path) -> Result<()> {
    staged.persist(target).map_err(|e| Error::Write {
        stage,
        path: target.to_path_buf(),
        source: e.error,
    })?;
    debug!("Wrote {:?}", target);
    Ok(())
}

/// Atomically replace `target` with `content`
pub fn write_atomic(stage: Stage, target: &Path, content: &[u8]) -> Result<()> {
    let mut staged = staging_file(stage, target)?;
    let write_error = |e| Error::Write {
        stage,
        path: target.to_path_buf(),
        source: e,
    };

    staged.write_all(content).map_err(write_error)?;
    staged.as_file().sync_all().map_err(write_error)?;
    commit(stage, staged, target)
}

/// Write an intermediate file the user asked to keep
pub fn write_artifact(stage: Stage, target: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::Write {
            stage,
            path: target.to_path_buf(),
            source: e,
        })?;
    }
    fs::write(target, content).map_err(|e| Error::Write {
        stage,
        path: target.to_path_buf(),
        source: e,
    })?;
    debug!("Kept {} artifact at {:?}", stage, target);
    Ok(())
}
