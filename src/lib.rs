//! trigger-watcher - wait for an upstream trigger file on a local directory
//! or an SFTP server.
//!
//! This library exposes modules for use in integration tests.

pub mod adapters;
pub mod auth;
pub mod cli;
pub mod cli_output;
pub mod config;
pub mod error;
pub mod logging;
pub mod traits;
pub mod tunnel;
pub mod watcher;
