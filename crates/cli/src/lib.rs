//! Command-line tooling for Binary Web Tokens.
//!
//! The `bwt` binary issues tokens backed by a session database, inspects and
//! verifies them, and revokes sessions. The pieces live here so they can be
//! tested without spawning the binary.

pub mod commands;
pub mod config;

pub use commands::{describe, init_db, inspect, issue, parse_expiry, revoke, verify, IssueOptions};
pub use config::{CliConfig, Settings};
