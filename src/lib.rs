//! autosync - keep a video library in sync across devices
//!
//! Devices share state through a single JSON snapshot in a directory they
//! can all reach. Export merges the local library into the snapshot without
//! dropping what other devices contributed; import applies the snapshot to
//! the local library without deleting anything.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Library records and the snapshot document
//! - [`storage`] - SQLite library store behind read/write traits
//! - [`sync`] - Merge, export, import, and supervised runs
//! - [`config`] - Paths and persisted settings
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod sync;

pub use error::{Error, Result};
