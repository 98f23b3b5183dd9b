//! Incremental build rounds for one jinc target.
//!
//! A round runs Load -> Digest -> Diff -> Scope -> Compile -> Merge -> Commit
//! (see [`driver`]), then regenerates the Kotlin module index, packages the
//! output archive and records the build log and a diagnostics session.

pub mod build_log;
pub mod compiler;
pub mod config_state;
pub mod descriptor;
pub mod diagnostics;
pub mod digest;
pub mod driver;
pub mod output;
pub mod process;
pub mod reconcile;
pub mod validate;

pub use compiler::{CompileOutcome, CompileRequest, Compiler, CompilerFailure};
pub use driver::{run_round, BuildContext, RoundSummary};
