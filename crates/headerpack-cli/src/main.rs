//! HeaderPack CLI
//!
//! Collects C++ headers, preprocesses them with Clang, strips redundant
//! whitespace and embeds the compressed result as generated source.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use headerpack_core::config::StopAfter;
use headerpack_core::{Error, PackConfig};
use headerpack_packer::Packer;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "headerpack")]
#[command(author, version, about = "Pack C++ headers into an embeddable payload", long_about = None)]
struct Cli {
    /// Headers to pack, in order
    #[arg(value_name = "HEADER")]
    headers: Vec<PathBuf>,

    /// YAML configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Preprocessor executable
    #[arg(long, value_name = "PATH")]
    clang: Option<PathBuf>,

    /// build_payload executable
    #[arg(short = 'b', long, value_name = "PATH")]
    build_payload: Option<PathBuf>,

    /// Header to leave out (path, base name or glob)
    #[arg(short = 'i', long, value_name = "PATTERN")]
    ignore: Vec<String>,

    /// Include search path
    #[arg(short = 'I', long, value_name = "DIR")]
    include_path: Vec<PathBuf>,

    /// Macro definition passed to the preprocessor
    #[arg(short = 'D', long, value_name = "NAME[=VALUE]")]
    define: Vec<String>,

    /// Macro to undefine
    #[arg(short = 'U', long, value_name = "NAME")]
    undefine: Vec<String>,

    /// Extra preprocessor switch, passed through as is
    #[arg(short = 'w', long = "switch", value_name = "ARG", allow_hyphen_values = true)]
    switches: Vec<String>,

    /// Generated source file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Keep the concatenated headers here
    #[arg(short = 'a', long, value_name = "FILE")]
    aggregation_file: Option<PathBuf>,

    /// Keep the preprocessor output here
    #[arg(short = 'p', long, value_name = "FILE")]
    preprocessed: Option<PathBuf>,

    /// Keep the compressed payload here
    #[arg(short = 'P', long, value_name = "FILE")]
    packed_file: Option<PathBuf>,

    /// Compress the payload (default)
    #[arg(short = 'z', long, overrides_with = "no_zlib")]
    zlib: bool,

    /// Embed the reduced text uncompressed
    #[arg(short = 'Z', long, overrides_with = "zlib")]
    no_zlib: bool,

    /// zlib compression level
    #[arg(long, value_name = "0-9", value_parser = clap::value_parser!(u32).range(0..=9))]
    level: Option<u32>,

    /// Inline #include'd headers, each at most once
    #[arg(long)]
    follow_includes: bool,

    /// Do not mark where each collected file starts
    #[arg(long)]
    no_markers: bool,

    /// Keep up to N consecutive blank lines
    #[arg(long, value_name = "N")]
    keep_blank_lines: Option<usize>,

    /// Keep leading whitespace on each line
    #[arg(long)]
    keep_indentation: bool,

    /// Write this stage's text to the output and stop
    #[arg(long, value_enum, value_name = "STAGE")]
    stop_after: Option<StopStage>,

    /// Copyright notice for the generated file
    #[arg(short = 'c', long, conflicts_with = "no_copyright")]
    copyright: Option<String>,

    /// Omit the copyright notice
    #[arg(short = 'C', long)]
    no_copyright: bool,

    /// Description comment for the generated file
    #[arg(short = 'd', long)]
    description: Option<String>,

    /// Indentation of the generated source
    #[arg(short = 'e', long, value_name = "N")]
    indentation: Option<u32>,

    /// Line width of the generated source
    #[arg(short = 'W', long, value_name = "N")]
    width: Option<u32>,

    /// Namespace enclosing the generated variables
    #[arg(short = 'n', long)]
    namespace: Option<String>,

    /// Payload variable name
    #[arg(short = 'v', long = "variable", value_name = "NAME")]
    variables: Vec<String>,

    /// Payload variable type
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    variable_type: Option<String>,

    /// Size variable name
    #[arg(long = "size-variable", value_name = "NAME")]
    size_variables: Vec<String>,

    /// Size variable type
    #[arg(short = 'T', long = "size-type", value_name = "TYPE")]
    size_type: Option<String>,

    /// More log output (repeatable)
    #[arg(long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StopStage {
    Aggregate,
    Preprocess,
    Reduce,
}

impl From<StopStage> for StopAfter {
    fn from(stage: StopStage) -> Self {
        match stage {
            StopStage::Aggregate => StopAfter::Aggregate,
            StopStage::Preprocess => StopAfter::Preprocess,
            StopStage::Reduce => StopAfter::Reduce,
        }
    }
}

impl Cli {
    fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Start from the config file, if any, and apply flags on top
    fn load_config(&self) -> Result<PackConfig> {
        let mut config = match &self.config {
            Some(path) => PackConfig::load_yaml(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => PackConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut PackConfig) {
        replace_if_given(&mut config.headers, &self.headers);
        replace_if_given(&mut config.include_paths, &self.include_path);
        replace_if_given(&mut config.ignore, &self.ignore);
        config.follow_includes |= self.follow_includes;
        if self.no_markers {
            config.boundary_markers = false;
        }

        let preprocessor = &mut config.preprocessor;
        set_if_given(&mut preprocessor.executable, &self.clang);
        replace_if_given(&mut preprocessor.defines, &self.define);
        replace_if_given(&mut preprocessor.undefines, &self.undefine);
        replace_if_given(&mut preprocessor.switches, &self.switches);

        set_if_given(&mut config.reduce.max_blank_lines, &self.keep_blank_lines);
        if self.keep_indentation {
            config.reduce.trim_leading = false;
        }

        if self.no_zlib {
            config.compression.enabled = false;
        } else if self.zlib {
            config.compression.enabled = true;
        }
        set_if_given(&mut config.compression.level, &self.level);

        let payload = &mut config.payload;
        set_if_given(&mut payload.executable, &self.build_payload);
        if self.copyright.is_some() {
            payload.copyright = self.copyright.clone();
            payload.no_copyright = false;
        } else if self.no_copyright {
            payload.copyright = None;
            payload.no_copyright = true;
        }
        optional_if_given(&mut payload.description, &self.description);
        optional_if_given(&mut payload.indentation, &self.indentation);
        optional_if_given(&mut payload.width, &self.width);
        optional_if_given(&mut payload.namespace, &self.namespace);
        replace_if_given(&mut payload.variables, &self.variables);
        optional_if_given(&mut payload.variable_type, &self.variable_type);
        replace_if_given(&mut payload.size_variables, &self.size_variables);
        optional_if_given(&mut payload.size_variable_type, &self.size_type);

        let artifacts = &mut config.artifacts;
        optional_if_given(&mut artifacts.output, &self.output);
        optional_if_given(&mut artifacts.aggregation, &self.aggregation_file);
        optional_if_given(&mut artifacts.preprocessed, &self.preprocessed);
        optional_if_given(&mut artifacts.packed, &self.packed_file);

        if let Some(stage) = self.stop_after {
            config.stop_after = Some(stage.into());
        }
    }
}

fn replace_if_given<T: Clone>(target: &mut Vec<T>, flags: &[T]) {
    if !flags.is_empty() {
        *target = flags.to_vec();
    }
}

fn set_if_given<T: Clone>(target: &mut T, flag: &Option<T>) {
    if let Some(value) = flag {
        *target = value.clone();
    }
}

fn optional_if_given<T: Clone>(target: &mut Option<T>, flag: &Option<T>) {
    if flag.is_some() {
        *target = flag.clone();
    }
}

/// Prefix errors whose message does not already name their stage
fn with_stage(err: Error) -> anyhow::Error {
    match err.stage() {
        Some(stage) if !err.to_string().starts_with(stage.as_str()) => {
            anyhow::Error::new(err).context(format!("{} stage failed", stage))
        }
        _ => err.into(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.load_config()?;
    debug!("Effective configuration: {:?}", config);

    let packer = Packer::new(config).map_err(with_stage)?;
    let report = packer.run().map_err(with_stage)?;

    match report.stopped_after {
        Some(stage) => info!(
            "Wrote {:?} output to {}",
            stage,
            report.output.display()
        ),
        None => info!(
            "Packed {} header(s): {} -> {} -> {} -> {} bytes, wrote {}",
            report.headers.len(),
            report.collected_bytes,
            report.preprocessed_bytes,
            report.reduced_bytes,
            report.payload_bytes,
            report.output.display()
        ),
    }

    Ok(())
}
