//! Strata CLI - command-line interface for Strata migrations.
//!
//! This crate provides the `strata` binary for applying, inspecting,
//! verifying and rolling back SQLite schema migrations stored as
//! `NNNN_name/up.sql` directories.

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod output;

pub use context::{CliContext, ConnectionOptions, DefaultStoreOpener, StoreOpener};
pub use error::{CliError, CliResult};
