//! Header Collector
//!
//! Concatenates an ordered list of headers into one text blob, optionally
//! inlining the headers they `#include`.

pub mod ignore;
pub mod resolver;

pub use ignore::IgnoreSet;
pub use resolver::HeaderResolver;

use headerpack_core::{Error, PackConfig, Result, Stage};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use self::ignore::canonical_or_absolute;

static INCLUDE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*#\s*include\s+["<]([^">]+)[">]"#).unwrap());

static INCLUDE_NEXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*#\s*include_next").unwrap());

/// Options for header collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    /// Inline `#include`d headers, each file at most once
    pub follow_includes: bool,
    /// Precede each file with a comment naming it
    pub boundary_markers: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            follow_includes: false,
            boundary_markers: true,
        }
    }
}

/// Result of header collection
#[derive(Debug, Default, Clone)]
pub struct CollectedHeaders {
    /// Concatenated header text
    pub text: String,
    /// Files read, in emission order
    pub files: Vec<PathBuf>,
}

/// Header collector
pub struct HeaderCollector {
    resolver: HeaderResolver,
    ignore: IgnoreSet,
    options: CollectOptions,
}

impl HeaderCollector {
    /// Create a collector with default options
    pub fn new(resolver: HeaderResolver, ignore: IgnoreSet) -> Self {
        Self {
            resolver,
            ignore,
            options: CollectOptions::default(),
        }
    }

    /// Replace the collection options
    pub fn with_options(mut self, options: CollectOptions) -> Self {
        self.options = options;
        self
    }

    /// Build a collector from a run configuration
    pub fn from_config(config: &PackConfig) -> Result<Self> {
        let resolver = HeaderResolver::new(config.search_paths());
        let ignore = IgnoreSet::new(&config.ignore)?;
        Ok(Self::new(resolver, ignore).with_options(CollectOptions {
            follow_includes: config.follow_includes,
            boundary_markers: config.boundary_markers,
        }))
    }

    /// Collect the given headers in order
    pub fn collect(&self, headers: &[PathBuf]) -> Result<CollectedHeaders> {
        let mut collected = CollectedHeaders::default();

        if self.options.follow_includes {
            let mut processed = HashSet::new();
            for header in headers {
                if self.ignore.matches_path(header) {
                    debug!("Ignoring {:?}", header);
                    continue;
                }
                let path = self
                    .resolver
                    .resolve_listed(header)
                    .ok_or_else(|| Error::FileNotFound(header.clone()))?;
                self.inline_header(&path, &mut processed, &mut collected)?;
            }
        } else {
            for header in headers {
                self.append_header(header, &mut collected)?;
            }
        }

        info!(
            "Collected {} header(s), {} bytes",
            collected.files.len(),
            collected.text.len()
        );
        Ok(collected)
    }

    /// Append one listed header verbatim
    fn append_header(&self, header: &Path, collected: &mut CollectedHeaders) -> Result<()> {
        if self.ignore.matches_path(header) {
            debug!("Ignoring {:?}", header);
            return Ok(());
        }

        let path = self
            .resolver
            .resolve_listed(header)
            .ok_or_else(|| Error::FileNotFound(header.to_path_buf()))?;
        if self.ignore.matches(header, &canonical_or_absolute(&path)) {
            debug!("Ignoring {:?} (resolved to {:?})", header, path);
            return Ok(());
        }

        let contents = read_header(&path)?;
        debug!("Appending {:?} ({} bytes)", path, contents.len());

        self.push_marker(&path, collected);
        collected.text.push_str(&contents);
        if !contents.is_empty() && !contents.ends_with('\n') {
            collected.text.push('\n');
        }
        collected.files.push(path);
        Ok(())
    }

    /// Inline a header and, recursively, the headers it includes
    fn inline_header(
        &self,
        path: &Path,
        processed: &mut HashSet<PathBuf>,
        collected: &mut CollectedHeaders,
    ) -> Result<()> {
        let canonical = canonical_or_absolute(path);
        if processed.contains(&canonical) {
            debug!("Already processed {:?}", path);
            return Ok(());
        }
        processed.insert(canonical.clone());

        if self.ignore.matches(path, &canonical) {
            debug!("Ignoring {:?}", path);
            return Ok(());
        }

        let contents = read_header(path)?;
        debug!("Inlining {:?} ({} bytes)", path, contents.len());

        self.push_marker(path, collected);
        collected.files.push(path.to_path_buf());

        for raw_line in contents.lines() {
            let line = raw_line.trim_end();

            if let Some(captures) = INCLUDE_RE.captures(line) {
                let child = Path::new(&captures[1]);
                let child_path = self
                    .resolver
                    .resolve_include(child)
                    .ok_or_else(|| Error::FileNotFound(child.to_path_buf()))?;
                self.inline_header(&child_path, processed, collected)?;
            } else if INCLUDE_NEXT_RE.is_match(line) {
                return Err(Error::Unsupported {
                    file: path.to_path_buf(),
                    directive: line.trim().to_string(),
                });
            } else {
                collected.text.push_str(line);
                collected.text.push('\n');
            }
        }

        Ok(())
    }

    fn push_marker(&self, path: &Path, collected: &mut CollectedHeaders) {
        if self.options.boundary_markers {
            let name = path.display().to_string().replace("*/", "* /");
            collected.text.push_str(&format!("/* headerpack: {} */\n", name));
        }
    }
}

fn read_header(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
        _ => Error::Io(e),
    })?;
    String::from_utf8(bytes).map_err(|e| Error::Encoding {
        stage: Stage::Collect,
        path: path.to_path_buf(),
        offset: e.utf8_error().valid_up_to(),
    })
}
