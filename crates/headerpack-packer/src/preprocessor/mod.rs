//! C++ Preprocessor Integration
//!
//! Hands the collected headers to an external Clang preprocessor to strip
//! comments and expand macros.

pub mod clang;
pub mod macros;

pub use clang::{ClangPreprocessor, PreprocessOptions, PreprocessResult};
pub use macros::MacroDefinition;
