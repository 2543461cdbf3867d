//! Ignore Set
//!
//! Decides which headers the collector skips. Entries are globs, base names
//! or paths, classified by their shape.

use globset::{Glob, GlobSet, GlobSetBuilder};
use headerpack_core::{Error, Result};
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Set of ignore patterns
#[derive(Debug)]
pub struct IgnoreSet {
    /// Canonical paths to ignore
    paths: HashSet<PathBuf>,
    /// File names to ignore wherever they live
    names: HashSet<OsString>,
    /// Compiled glob patterns
    globs: GlobSet,
}

impl IgnoreSet {
    /// Build an ignore set from raw entries
    pub fn new<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
        let mut paths = HashSet::new();
        let mut names = HashSet::new();
        let mut globs = GlobSetBuilder::new();

        for entry in entries {
            let entry = entry.as_ref();
            if entry.is_empty() {
                continue;
            }

            if is_glob(entry) {
                let glob = Glob::new(entry)
                    .map_err(|e| Error::InvalidPattern(format!("{}: {}", entry, e)))?;
                globs.add(glob);
                debug!("Ignoring glob {}", entry);
            } else if !entry.contains(['/', '\\']) {
                names.insert(OsString::from(entry));
                debug!("Ignoring base name {}", entry);
            } else {
                let path = canonical_or_absolute(Path::new(entry));
                debug!("Ignoring path {:?}", path);
                paths.insert(path);
            }
        }

        let globs = globs
            .build()
            .map_err(|e| Error::InvalidPattern(e.to_string()))?;

        Ok(Self {
            paths,
            names,
            globs,
        })
    }

    /// An ignore set that matches nothing
    pub fn empty() -> Self {
        Self {
            paths: HashSet::new(),
            names: HashSet::new(),
            globs: GlobSet::empty(),
        }
    }

    /// Check a header, given as written and in canonical form
    pub fn matches(&self, written: &Path, canonical: &Path) -> bool {
        if self.paths.contains(canonical) {
            return true;
        }

        if let Some(name) = written.file_name().or_else(|| canonical.file_name()) {
            if self.names.contains(name) {
                return true;
            }
        }

        self.globs.is_match(written) || self.globs.is_match(canonical)
    }

    /// Check a header path that may not exist on disk
    pub fn matches_path(&self, written: &Path) -> bool {
        self.matches(written, &canonical_or_absolute(written))
    }
}

impl Default for IgnoreSet {
    fn default() -> Self {
        Self::empty()
    }
}

fn is_glob(entry: &str) -> bool {
    entry.contains(['*', '?', '[', '{'])
}

/// Canonicalize a path, falling back to a lexically normalized absolute path
pub(crate) fn canonical_or_absolute(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
