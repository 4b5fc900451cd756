//! Pre-commit hooks that keep Python repositories configured consistently.
//!
//! Every hook edits its files through [`document::edit`], which writes only
//! when the parsed content actually changed and records what it wrote.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod git;
pub mod hooks;
pub mod logging;
pub mod process;
pub mod requirements;
pub mod runner;
pub mod throttle;
pub mod version;

pub use error::{Error, Result};
