//! Shared utilities for the jinc incremental builder.
//!
//! This crate provides cross-cutting concerns used by all other jinc crates:
//! error types, filesystem helpers with crash-safe atomic writes, and
//! terminal status output.

pub mod errors;
pub mod fs;
pub mod progress;
