//! Clang Preprocessor Integration
//!
//! Runs the external preprocessor in "preprocess only" mode on the collected
//! headers and captures its standard output.

use headerpack_core::{Error, PackConfig, Result, Stage};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

use super::macros::MacroDefinition;
use crate::process::run_tool;

/// Options for preprocessing
#[derive(Debug, Clone)]
pub struct PreprocessOptions {
    /// Source language passed to `-x`
    pub language: String,
    /// Macro definitions (-D/-U flags)
    pub defines: Vec<MacroDefinition>,
    /// Directories searched for `#include "..."` only (-iquote flags)
    pub quote_includes: Vec<PathBuf>,
    /// Include paths (-I flags)
    pub includes: Vec<PathBuf>,
    /// Additional clang arguments
    pub extra_args: Vec<String>,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            language: "c++".to_string(),
            defines: Vec::new(),
            quote_includes: Vec::new(),
            includes: Vec::new(),
            extra_args: Vec::new(),
        }
    }
}

impl PreprocessOptions {
    /// Build options from a run configuration
    pub fn from_config(config: &PackConfig) -> Result<Self> {
        let mut defines = config
            .preprocessor
            .defines
            .iter()
            .map(|d| d.parse::<MacroDefinition>())
            .collect::<Result<Vec<_>>>()?;
        defines.extend(
            config
                .preprocessor
                .undefines
                .iter()
                .map(|name| MacroDefinition::undefined(name)),
        );

        Ok(Self {
            defines,
            includes: config.search_paths(),
            extra_args: config.preprocessor.switches.clone(),
            ..Self::default()
        })
    }

    /// Search the directories of the collected headers for quoted includes
    ///
    /// The concatenated text is preprocessed away from its source files, so a
    /// header's siblings are only found through these directories.
    pub fn with_header_dirs<'a, I>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = &'a PathBuf>,
    {
        for header in headers {
            let dir = match header.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            if !self.quote_includes.contains(&dir) {
                self.quote_includes.push(dir);
            }
        }
        self
    }
}

/// Result of preprocessing
#[derive(Debug)]
pub struct PreprocessResult {
    /// Preprocessed source code
    pub code: String,
    /// Warnings generated during preprocessing
    pub warnings: Vec<String>,
}

/// Clang preprocessor wrapper
pub struct ClangPreprocessor {
    /// Path to clang executable
    clang_path: PathBuf,
}

impl ClangPreprocessor {
    /// Create a preprocessor with a specific clang path
    pub fn with_path(clang_path: PathBuf) -> Self {
        Self { clang_path }
    }

    /// Preprocess a source file
    pub fn preprocess_file(
        &self,
        source_path: &Path,
        options: &PreprocessOptions,
    ) -> Result<PreprocessResult> {
        if !source_path.is_file() {
            return Err(Error::FileNotFound(source_path.to_path_buf()));
        }

        let args = self.build_args(options);
        debug!("Preprocessing {:?} with args: {:?}", source_path, args);

        let mut command = Command::new(&self.clang_path);
        command.args(&args).arg(source_path);
        let output = run_tool(Stage::Preprocess, &self.clang_path, &mut command)?;

        let code = String::from_utf8(output.stdout).map_err(|e| Error::Encoding {
            stage: Stage::Preprocess,
            path: source_path.to_path_buf(),
            offset: e.utf8_error().valid_up_to(),
        })?;
        let warnings = self.parse_warnings(&output.stderr);
        for warning in &warnings {
            warn!("{}", warning);
        }

        info!(
            "Preprocessed {:?}: {} bytes, {} warning(s)",
            source_path,
            code.len(),
            warnings.len()
        );

        Ok(PreprocessResult { code, warnings })
    }

    /// Preprocess source text through a temporary file
    pub fn preprocess_string(
        &self,
        source: &str,
        options: &PreprocessOptions,
    ) -> Result<PreprocessResult> {
        let scratch_error = |path: PathBuf| {
            move |e| Error::Write {
                stage: Stage::Preprocess,
                path,
                source: e,
            }
        };

        let mut temp = tempfile::Builder::new()
            .prefix("headerpack-")
            .suffix(".hpp")
            .tempfile()
            .map_err(scratch_error(std::env::temp_dir()))?;
        let temp_path = temp.path().to_path_buf();
        temp.write_all(source.as_bytes())
            .and_then(|_| temp.as_file().sync_all())
            .map_err(scratch_error(temp_path))?;

        self.preprocess_file(temp.path(), options)
    }

    /// Build clang command line arguments
    fn build_args(&self, options: &PreprocessOptions) -> Vec<String> {
        let mut args = vec![
            "-x".to_string(),
            options.language.clone(),
            "-E".to_string(), // Preprocess only
        ];

        // Add macro definitions
        for macro_def in &options.defines {
            args.push(macro_def.to_clang_arg());
        }

        // Quoted-include directories come before the general search paths
        for dir in &options.quote_includes {
            args.push("-iquote".to_string());
            args.push(dir.display().to_string());
        }

        // Add include paths
        for include in &options.includes {
            args.push(format!("-I{}", include.display()));
        }

        // Add extra args
        args.extend(options.extra_args.iter().cloned());

        args
    }

    /// Parse warnings from stderr
    fn parse_warnings(&self, stderr: &[u8]) -> Vec<String> {
        let stderr_str = String::from_utf8_lossy(stderr);
        stderr_str
            .lines()
            .filter(|line| line.contains("warning:"))
            .map(|s| s.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_args() {
        let preprocessor = ClangPreprocessor::with_path(PathBuf::from("clang++"));
        let mut options = PreprocessOptions::default();
        options.defines.push(MacroDefinition::defined("FOO"));
        options.defines.push(MacroDefinition::undefined("BAR"));
        options.includes.push(PathBuf::from("/usr/include"));
        options.extra_args.push("-std=c++17".to_string());

        let args = preprocessor.build_args(&options);

        assert_eq!(
            args,
            vec!["-x", "c++", "-E", "-DFOO=1", "-UBAR", "-I/usr/include", "-std=c++17"]
        );
    }

    #[test]
    fn test_header_dirs_become_quote_includes() {
        let preprocessor = ClangPreprocessor::with_path(PathBuf::from("clang++"));
        let headers = vec![
            PathBuf::from("include/a.h"),
            PathBuf::from("include/b.h"),
            PathBuf::from("c.h"),
        ];
        let options = PreprocessOptions {
            includes: vec![PathBuf::from(".")],
            ..PreprocessOptions::default()
        }
        .with_header_dirs(&headers);

        assert_eq!(
            options.quote_includes,
            vec![PathBuf::from("include"), PathBuf::from(".")]
        );
        assert_eq!(
            preprocessor.build_args(&options),
            vec!["-x", "c++", "-E", "-iquote", "include", "-iquote", ".", "-I."]
        );
    }

    #[test]
    fn test_options_from_config() {
        let mut config = PackConfig::default();
        config.include_paths = vec![PathBuf::from("include")];
        config.preprocessor.defines = vec!["NDEBUG".into(), "LEVEL=2".into()];
        config.preprocessor.undefines = vec!["DEBUG".into()];
        config.preprocessor.switches = vec!["-std=c++17".into()];

        let options = PreprocessOptions::from_config(&config).unwrap();

        assert_eq!(
            options.defines,
            vec![
                MacroDefinition::defined("NDEBUG"),
                MacroDefinition::with_value("LEVEL", "2"),
                MacroDefinition::undefined("DEBUG"),
            ]
        );
        assert_eq!(options.includes, vec![PathBuf::from("include")]);
        assert_eq!(options.extra_args, vec!["-std=c++17".to_string()]);
        assert!(options.quote_includes.is_empty());
    }

    #[test]
    fn test_default_search_path_is_forwarded() {
        let options = PreprocessOptions::from_config(&PackConfig::default()).unwrap();
        assert_eq!(options.includes, vec![PathBuf::from(".")]);
    }

    #[test]
    fn test_options_from_config_rejects_bad_define() {
        let mut config = PackConfig::default();
        config.preprocessor.defines = vec!["9LIVES".into()];
        assert!(matches!(
            PreprocessOptions::from_config(&config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_parse_warnings() {
        let preprocessor = ClangPreprocessor::with_path(PathBuf::from("clang++"));
        let stderr = b"a.h:3:9: warning: 'FOO' macro redefined\nnote: previous definition\n";

        let warnings = preprocessor.parse_warnings(stderr);
        assert_eq!(warnings, vec!["a.h:3:9: warning: 'FOO' macro redefined".to_string()]);
    }

    #[test]
    fn test_missing_clang() {
        let preprocessor =
            ClangPreprocessor::with_path(PathBuf::from("/nonexistent/bin/clang++"));

        let result = preprocessor.preprocess_string("int a;\n", &PreprocessOptions::default());
        assert!(matches!(
            result,
            Err(Error::ToolNotFound { stage: Stage::Preprocess, .. })
        ));
    }
}
