//! Core data types for the jinc incremental builder.
//!
//! This crate defines the vocabulary shared by the graph, the build driver and
//! the operations layer: source identities and digests, compiled nodes with
//! their metadata facets, the `Jinc.toml` project manifest, global
//! configuration, source discovery and the on-disk output layout.
//!
//! This crate is intentionally free of async code and build logic.

/// Version of the persisted graph/state schema. Bumping it invalidates every
/// stored graph and forces a full rebuild.
pub const SCHEMA_VERSION: u32 = 1;

pub mod config;
pub mod digest;
pub mod facet;
pub mod manifest;
pub mod node;
pub mod paths;
pub mod source;
pub mod source_set;
