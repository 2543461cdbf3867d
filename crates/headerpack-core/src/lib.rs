//! HeaderPack Core
//!
//! Core types shared by the HeaderPack pipeline and its command-line front end.

pub mod config;
pub mod error;

pub use config::PackConfig;
pub use error::{Error, Result, Stage};
