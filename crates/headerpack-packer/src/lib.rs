//! HeaderPack Packer
//!
//! Turns a set of C++ headers into a compressed payload embedded in generated
//! source.
//!
//! ## Modules
//!
//! - `collector` - Header concatenation, include following and ignore patterns
//! - `preprocessor` - Clang preprocessor integration
//! - `reduce` - Whitespace and line-marker reduction
//! - `compress` - zlib compression of the reduced text
//! - `emitter` - `build_payload` invocation
//! - `pipeline` - The linear pipeline tying the stages together

pub mod artifact;
pub mod collector;
pub mod compress;
pub mod emitter;
pub mod pipeline;
pub mod preprocessor;
pub mod reduce;

mod process;

pub use collector::{CollectOptions, CollectedHeaders, HeaderCollector};
pub use compress::{decompress, Compressor};
pub use emitter::PayloadEmitter;
pub use pipeline::{pack, PackReport, Packer};
pub use preprocessor::{ClangPreprocessor, PreprocessOptions};
pub use reduce::{reduce_whitespace, WhitespaceReducer};
