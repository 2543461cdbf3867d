//! Pipeline driver
//!
//! Runs collect → preprocess → reduce → compress → emit in order. Any stage
//! failure aborts the run; the output file is only replaced on success.

use headerpack_core::config::StopAfter;
use headerpack_core::{PackConfig, Result, Stage};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::artifact::{write_artifact, write_atomic};
use crate::collector::HeaderCollector;
use crate::compress::encode_payload;
use crate::emitter::PayloadEmitter;
use crate::preprocessor::{ClangPreprocessor, PreprocessOptions};
use crate::reduce::reduce_whitespace;

/// Sizes observed along the pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackReport {
    /// Headers read by the collector
    pub headers: Vec<PathBuf>,
    pub collected_bytes: usize,
    pub preprocessed_bytes: usize,
    pub reduced_bytes: usize,
    pub payload_bytes: usize,
    /// File written as the run's output
    pub output: PathBuf,
    /// Every file the run wrote, kept intermediates first
    pub written: Vec<PathBuf>,
    /// Stage the run stopped after, if it stopped early
    pub stopped_after: Option<StopAfter>,
}

/// Header packing pipeline
pub struct Packer {
    config: PackConfig,
}

impl Packer {
    /// Create a packer, deriving the output path and validating the config
    pub fn new(mut config: PackConfig) -> Result<Self> {
        config.resolve_output()?;
        config.validate()?;
        Ok(Self { config })
    }

    /// Path the run writes to
    pub fn output(&self) -> &Path {
        // `new` guarantees the output is set
        self.config.artifacts.output.as_deref().unwrap_or(Path::new(""))
    }

    /// Run the whole pipeline
    pub fn run(&self) -> Result<PackReport> {
        let config = &self.config;
        let artifacts = &config.artifacts;
        let output = self.output();
        let mut report = PackReport {
            output: output.to_path_buf(),
            ..PackReport::default()
        };

        info!("[{}] {} header(s)", Stage::Collect, config.headers.len());
        let collected = HeaderCollector::from_config(config)?.collect(&config.headers)?;
        report.headers = collected.files;
        report.collected_bytes = collected.text.len();

        if let Some(path) = &artifacts.aggregation {
            write_artifact(Stage::Collect, path, collected.text.as_bytes())?;
            report.written.push(path.clone());
        }
        if config.stop_after == Some(StopAfter::Aggregate) {
            return self.finish_early(Stage::Collect, collected.text.as_bytes(), report);
        }

        info!("[{}] using {:?}", Stage::Preprocess, config.preprocessor.executable);
        let preprocessor = ClangPreprocessor::with_path(config.preprocessor.executable.clone());
        let options = PreprocessOptions::from_config(config)?.with_header_dirs(&report.headers);
        let preprocessed = match &artifacts.aggregation {
            Some(path) => preprocessor.preprocess_file(path, &options)?,
            None => preprocessor.preprocess_string(&collected.text, &options)?,
        };
        report.preprocessed_bytes = preprocessed.code.len();

        if let Some(path) = &artifacts.preprocessed {
            write_artifact(Stage::Preprocess, path, preprocessed.code.as_bytes())?;
            report.written.push(path.clone());
        }
        if config.stop_after == Some(StopAfter::Preprocess) {
            return self.finish_early(Stage::Preprocess, preprocessed.code.as_bytes(), report);
        }

        let reduced = reduce_whitespace(&preprocessed.code, config.reduce);
        report.reduced_bytes = reduced.len();
        info!(
            "[{}] {} -> {} bytes",
            Stage::Reduce,
            report.preprocessed_bytes,
            report.reduced_bytes
        );
        if config.stop_after == Some(StopAfter::Reduce) {
            return self.finish_early(Stage::Reduce, reduced.as_bytes(), report);
        }

        let payload = encode_payload(reduced.as_bytes(), config.compression)?;
        report.payload_bytes = payload.len();

        info!("[{}] using {:?}", Stage::Emit, config.payload.executable);
        PayloadEmitter::new(config.payload.clone()).emit(
            &payload,
            output,
            artifacts.packed.as_deref(),
        )?;
        report.written.extend(artifacts.packed.iter().cloned());
        report.written.push(output.to_path_buf());

        Ok(report)
    }

    fn finish_early(
        &self,
        stage: Stage,
        content: &[u8],
        mut report: PackReport,
    ) -> Result<PackReport> {
        write_atomic(stage, self.output(), content)?;
        report.written.push(report.output.clone());
        report.stopped_after = self.config.stop_after;
        info!("Stopped after {} stage, wrote {:?}", stage, report.output);
        Ok(report)
    }
}

/// Run the pipeline for a configuration
pub fn pack(config: PackConfig) -> Result<PackReport> {
    Packer::new(config)?.run()
}
