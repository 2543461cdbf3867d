//! Error types for HeaderPack

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage an error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Collect,
    Preprocess,
    Reduce,
    Compress,
    Emit,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Collect => "collect",
            Stage::Preprocess => "preprocess",
            Stage::Reduce => "reduce",
            Stage::Compress => "compress",
            Stage::Emit => "emit",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HeaderPack error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("{stage} stage: executable not found: {}", .path.display())]
    ToolNotFound { stage: Stage, path: PathBuf },

    #[error("{stage} stage: failed to run {}: {source}", .path.display())]
    ToolSpawn {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} stage: {} {status}\n{diagnostics}", .tool.display())]
    ToolFailed {
        stage: Stage,
        tool: PathBuf,
        status: String,
        diagnostics: String,
    },

    #[error("{stage} stage: failed to write {}: {source}", .path.display())]
    Write {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} stage: {} is not valid UTF-8 (byte offset {offset})", .path.display())]
    Encoding {
        stage: Stage,
        path: PathBuf,
        offset: usize,
    },

    #[error("Unsupported directive in {}: {directive}", .file.display())]
    Unsupported { file: PathBuf, directive: String },

    #[error("Invalid ignore pattern: {0}")]
    InvalidPattern(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Stage the error belongs to, when it carries one
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::FileNotFound(_) | Error::Unsupported { .. } | Error::InvalidPattern(_) => {
                Some(Stage::Collect)
            }
            Error::ToolNotFound { stage, .. }
            | Error::ToolSpawn { stage, .. }
            | Error::ToolFailed { stage, .. }
            | Error::Encoding { stage, .. }
            | Error::Write { stage, .. } => Some(*stage),
            Error::Io(_) | Error::Config(_) => None,
        }
    }
}

/// Result type alias for HeaderPack
pub type Result<T> = std::result::Result<T, Error>;
