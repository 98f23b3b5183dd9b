//! The jinc dependency graph.
//!
//! A [`DependencyGraph`] maps every compiled source to the nodes (classes) it
//! produced and records node-to-node usage edges. [`differentiate`] computes
//! the dirty scope of a round from it, and [`MapletStore`] persists it between
//! rounds.

pub mod differentiate;
pub mod error;
pub mod graph;
pub mod maplet;
pub mod persist;

pub use differentiate::{differentiate, DirtyScope};
pub use error::GraphError;
pub use graph::DependencyGraph;
pub use maplet::MapletStore;
