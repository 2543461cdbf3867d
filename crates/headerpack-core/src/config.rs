//! Configuration types
//!
//! A [`PackConfig`] describes one complete run of the pipeline. It can be
//! loaded from YAML and is then overridden by command-line flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Preprocessor executable used when none is configured (resolved via `PATH`)
pub const DEFAULT_PREPROCESSOR: &str = "clang++";

/// Payload emitter executable used when none is configured (resolved via `PATH`)
pub const DEFAULT_BUILD_PAYLOAD: &str = "build_payload";

/// Highest zlib compression level
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// HeaderPack run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Headers to collect, in order
    pub headers: Vec<PathBuf>,

    /// Include search paths (collector lookup and `-I` switches)
    pub include_paths: Vec<PathBuf>,

    /// Ignore patterns (paths, base names or globs)
    pub ignore: Vec<String>,

    /// Inline `#include`d headers instead of concatenating verbatim
    pub follow_includes: bool,

    /// Emit a comment marker before each collected file
    pub boundary_markers: bool,

    /// Preprocessor configuration
    pub preprocessor: PreprocessorConfig,

    /// Whitespace reduction configuration
    pub reduce: ReduceConfig,

    /// Compression configuration
    pub compression: CompressionConfig,

    /// Payload emitter configuration
    pub payload: PayloadConfig,

    /// Output and intermediate files
    pub artifacts: ArtifactPaths,

    /// Stop after this stage and write its text to the output
    pub stop_after: Option<StopAfter>,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            headers: Vec::new(),
            include_paths: Vec::new(),
            ignore: Vec::new(),
            follow_includes: false,
            boundary_markers: true,
            preprocessor: PreprocessorConfig::default(),
            reduce: ReduceConfig::default(),
            compression: CompressionConfig::default(),
            payload: PayloadConfig::default(),
            artifacts: ArtifactPaths::default(),
            stop_after: None,
        }
    }
}

impl PackConfig {
    /// Load configuration from a YAML file
    pub fn load_yaml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        Self::from_yaml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Include search paths, falling back to the current directory
    pub fn search_paths(&self) -> Vec<PathBuf> {
        if self.include_paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.include_paths.clone()
        }
    }

    /// Fill in the output path from the intermediate files when it is missing
    ///
    /// The packed file wins over the preprocessed file, which wins over the
    /// aggregation file; the output is that path with `.inc` appended.
    pub fn resolve_output(&mut self) -> Result<&Path> {
        if self.artifacts.output.is_none() {
            let base = self
                .artifacts
                .packed
                .as_ref()
                .or(self.artifacts.preprocessed.as_ref())
                .or(self.artifacts.aggregation.as_ref())
                .ok_or_else(|| Error::Config("no output specified".to_string()))?;
            self.artifacts.output = Some(append_extension(base, "inc"));
        }

        self.artifacts
            .output
            .as_deref()
            .ok_or_else(|| Error::Config("no output specified".to_string()))
    }

    /// Check value ranges and required settings
    pub fn validate(&self) -> Result<()> {
        if self.compression.level > MAX_COMPRESSION_LEVEL {
            return Err(Error::Config(format!(
                "compression level {} is out of range 0-{}",
                self.compression.level, MAX_COMPRESSION_LEVEL
            )));
        }

        if self.artifacts.output.is_none() {
            return Err(Error::Config("no output specified".to_string()));
        }

        if self.payload.copyright.is_some() && self.payload.no_copyright {
            return Err(Error::Config(
                "copyright and no_copyright are mutually exclusive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Append `.ext` to a path without replacing an existing extension
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Preprocessor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessorConfig {
    /// Path to the preprocessor executable
    pub executable: PathBuf,

    /// Macro definitions, `NAME` or `NAME=VALUE`
    pub defines: Vec<String>,

    /// Macros to undefine
    pub undefines: Vec<String>,

    /// Raw switches appended to the command line
    pub switches: Vec<String>,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_PREPROCESSOR),
            defines: Vec::new(),
            undefines: Vec::new(),
            switches: Vec::new(),
        }
    }
}

/// Whitespace reduction configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReduceConfig {
    /// Longest run of blank lines kept in the output
    pub max_blank_lines: usize,

    /// Trim leading whitespace as well as trailing whitespace
    pub trim_leading: bool,
}

impl Default for ReduceConfig {
    fn default() -> Self {
        Self {
            max_blank_lines: 0,
            trim_leading: true,
        }
    }
}

/// Compression configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// zlib compress the reduced text
    pub enabled: bool,

    /// zlib level, 0-9
    pub level: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: MAX_COMPRESSION_LEVEL,
        }
    }
}

/// Payload emitter configuration, forwarded to `build_payload`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadConfig {
    /// Path to the `build_payload` executable
    pub executable: PathBuf,
    pub copyright: Option<String>,
    pub no_copyright: bool,
    pub description: Option<String>,
    pub indentation: Option<u32>,
    pub width: Option<u32>,
    pub namespace: Option<String>,
    pub variables: Vec<String>,
    pub variable_type: Option<String>,
    pub size_variables: Vec<String>,
    pub size_variable_type: Option<String>,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_BUILD_PAYLOAD),
            copyright: None,
            no_copyright: false,
            description: None,
            indentation: None,
            width: None,
            namespace: None,
            variables: Vec::new(),
            variable_type: None,
            size_variables: Vec::new(),
            size_variable_type: None,
        }
    }
}

/// Output and intermediate file locations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    /// Generated source file
    pub output: Option<PathBuf>,
    /// Keep the concatenated headers here
    pub aggregation: Option<PathBuf>,
    /// Keep the raw preprocessor output here
    pub preprocessed: Option<PathBuf>,
    /// Keep the compressed payload here
    pub packed: Option<PathBuf>,
}

/// Early stopping point for the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopAfter {
    Aggregate,
    Preprocess,
    Reduce,
}
