//! Payload Emitter
//!
//! Hands the payload bytes to the external `build_payload` tool, which turns
//! them into a compilable C++ source file.

use headerpack_core::config::PayloadConfig;
use headerpack_core::{Error, Result, Stage};
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::artifact::{commit, staging_file, write_artifact};
use crate::process::run_tool;

/// Wrapper around the `build_payload` executable
pub struct PayloadEmitter {
    config: PayloadConfig,
}

impl PayloadEmitter {
    pub fn new(config: PayloadConfig) -> Self {
        Self { config }
    }

    /// Emit `payload` as generated source at `output`
    ///
    /// The payload is written to `keep_packed_at` when given, otherwise to a
    /// temporary file. `output` is only replaced once the tool has succeeded.
    pub fn emit(
        &self,
        payload: &[u8],
        output: &Path,
        keep_packed_at: Option<&Path>,
    ) -> Result<()> {
        let _packed_temp;
        let packed_path: PathBuf = match keep_packed_at {
            Some(path) => {
                write_artifact(Stage::Compress, path, payload)?;
                path.to_path_buf()
            }
            None => {
                let mut temp = tempfile::Builder::new()
                    .prefix("headerpack-")
                    .suffix(".pk")
                    .tempfile()
                    .map_err(|e| Error::Write {
                        stage: Stage::Compress,
                        path: std::env::temp_dir(),
                        source: e,
                    })?;
                let path = temp.path().to_path_buf();
                temp.write_all(payload)
                    .and_then(|_| temp.as_file().sync_all())
                    .map_err(|e| Error::Write {
                        stage: Stage::Compress,
                        path: path.clone(),
                        source: e,
                    })?;
                _packed_temp = temp;
                path
            }
        };

        let staged = staging_file(Stage::Emit, output)?;
        let args = self.build_args(&packed_path, staged.path());
        debug!("Running build_payload with args: {:?}", args);

        let mut command = Command::new(&self.config.executable);
        command.args(&args);
        let result = run_tool(Stage::Emit, &self.config.executable, &mut command)?;

        let written = fs::metadata(staged.path()).map(|m| m.len()).unwrap_or(0);
        if written == 0 {
            return Err(Error::ToolFailed {
                stage: Stage::Emit,
                tool: self.config.executable.clone(),
                status: "produced no output".to_string(),
                diagnostics: String::from_utf8_lossy(&result.stderr).into_owned(),
            });
        }

        commit(Stage::Emit, staged, output)?;
        info!(
            "Emitted {:?} ({} bytes from a {} byte payload)",
            output,
            written,
            payload.len()
        );
        Ok(())
    }

    /// Build `build_payload` command line arguments
    fn build_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let config = &self.config;
        let mut args: Vec<OsString> = vec!["--output".into(), output.into()];

        if let Some(copyright) = &config.copyright {
            args.push("--copyright".into());
            args.push(copyright.into());
        } else if config.no_copyright {
            args.push("--no-copyright".into());
        }

        if let Some(description) = &config.description {
            args.push("--description".into());
            args.push(description.into());
        }

        if let Some(indentation) = config.indentation {
            args.push("--indentation".into());
            args.push(indentation.to_string().into());
        }

        if let Some(width) = config.width {
            args.push("--width".into());
            args.push(width.to_string().into());
        }

        if let Some(namespace) = &config.namespace {
            args.push("--namespace".into());
            args.push(namespace.into());
        }

        for variable in &config.variables {
            args.push("--variable".into());
            args.push(variable.into());
        }

        if let Some(variable_type) = &config.variable_type {
            args.push("--type".into());
            args.push(variable_type.into());
        }

        for size_variable in &config.size_variables {
            args.push("--size-variable".into());
            args.push(size_variable.into());
        }

        if let Some(size_type) = &config.size_variable_type {
            args.push("--size-type".into());
            args.push(size_type.into());
        }

        // Compression already happened upstream; embed the bytes as they are.
        args.push("--no-zlib".into());
        args.push(input.into());

        args
    }
}
