//! Header File Resolver
//!
//! Locates headers named on the command line or in `#include` directives.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Header file resolver over an ordered list of search paths
#[derive(Debug, Clone)]
pub struct HeaderResolver {
    /// Include search paths, searched in order
    include_paths: Vec<PathBuf>,
}

impl HeaderResolver {
    /// Create a resolver over the given search paths
    pub fn new(include_paths: Vec<PathBuf>) -> Self {
        let mut resolver = Self {
            include_paths: Vec::new(),
        };
        for path in include_paths {
            resolver.add_include_path(path);
        }
        resolver
    }

    /// Add an include path
    pub fn add_include_path(&mut self, path: PathBuf) {
        if !self.include_paths.contains(&path) {
            self.include_paths.push(path);
        }
    }

    /// Resolve a header named on the command line
    ///
    /// The path is used as given when it names a file, otherwise the include
    /// paths are searched.
    pub fn resolve_listed(&self, header: &Path) -> Option<PathBuf> {
        if header.is_file() {
            debug!("Resolved {:?} as given", header);
            return Some(header.to_path_buf());
        }
        self.resolve_include(header)
    }

    /// Resolve a header named by an `#include` directive
    pub fn resolve_include(&self, header: &Path) -> Option<PathBuf> {
        for include_path in &self.include_paths {
            let full_path = include_path.join(header);
            if full_path.is_file() {
                debug!("Resolved {:?} in {:?}", header, include_path);
                return Some(full_path);
            }
        }

        debug!("Failed to resolve header: {:?}", header);
        None
    }
}
