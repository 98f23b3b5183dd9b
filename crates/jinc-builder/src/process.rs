//! Compiler collaborator running an external command.
//!
//! The command receives three environment variables:
//!
//! - `JINC_REQUEST`: path of a JSON file describing the request,
//! - `JINC_RESPONSE`: path where it must write its JSON response,
//! - `JINC_OUTPUT_DIR`: directory where it must write class files.
//!
//! Response shape:
//!
//! ```json
//! { "results": {
//!     "src/A.java": { "status": "compiled", "nodes": [ { "id": "p/A", "out-file-path": "p/A.class" } ] },
//!     "src/B.java": { "status": "failed", "diagnostics": [ { "severity": "error", "message": "..." } ] }
//! } }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde::{Deserialize, Serialize};

use jinc_core::node::Node;
use jinc_core::source::NodeSource;

use crate::compiler::{CompileOutcome, CompileRequest, CompiledSource, Compiler, CompilerFailure};
use crate::compiler::Diagnostic;

pub const REQUEST_ENV: &str = "JINC_REQUEST";
pub const RESPONSE_ENV: &str = "JINC_RESPONSE";
pub const OUTPUT_DIR_ENV: &str = "JINC_OUTPUT_DIR";

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct WireRequest<'a> {
    scope: &'a BTreeSet<NodeSource>,
    sources: &'a BTreeSet<NodeSource>,
    project_root: &'a Path,
    classpath: &'a [PathBuf],
    flags: &'a [String],
    output_dir: &'a Path,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    results: BTreeMap<NodeSource, WireResult>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
enum WireResult {
    Compiled {
        #[serde(default)]
        nodes: Vec<Node>,
    },
    Failed {
        #[serde(default)]
        diagnostics: Vec<Diagnostic>,
    },
}

pub struct ProcessCompiler {
    command: String,
    args: Vec<String>,
    staging_dir: PathBuf,
}

impl ProcessCompiler {
    /// `staging_dir` is wiped at the start of every invocation.
    pub fn new(command: impl Into<String>, args: Vec<String>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            args,
            staging_dir: staging_dir.into(),
        }
    }

    fn run(
        &self,
        project_root: &Path,
        request_path: &Path,
        response_path: &Path,
        output_dir: &Path,
    ) -> Result<Output, CompilerFailure> {
        tracing::debug!("exec: {} {}", self.command, self.args.join(" "));
        Command::new(&self.command)
            .args(&self.args)
            .env(REQUEST_ENV, request_path)
            .env(RESPONSE_ENV, response_path)
            .env(OUTPUT_DIR_ENV, output_dir)
            .current_dir(project_root)
            .output()
            .map_err(|e| CompilerFailure::new(format!("cannot run `{}`: {e}", self.command)))
    }

    fn prepare_staging(&self) -> Result<(PathBuf, PathBuf, PathBuf), CompilerFailure> {
        if self.staging_dir.exists() {
            std::fs::remove_dir_all(&self.staging_dir).map_err(|e| {
                CompilerFailure::new(format!(
                    "cannot clear staging directory {}: {e}",
                    self.staging_dir.display()
                ))
            })?;
        }
        let output_dir = self.staging_dir.join("classes");
        jinc_util::fs::ensure_dir(&output_dir).map_err(|e| {
            CompilerFailure::new(format!("cannot create {}: {e}", output_dir.display()))
        })?;
        Ok((
            self.staging_dir.join("request.json"),
            self.staging_dir.join("response.json"),
            output_dir,
        ))
    }
}

impl Compiler for ProcessCompiler {
    fn id(&self) -> &str {
        &self.command
    }

    fn compile(&self, request: &CompileRequest) -> Result<CompileOutcome, CompilerFailure> {
        let (request_path, response_path, output_dir) = self.prepare_staging()?;

        let wire = WireRequest {
            scope: &request.scope,
            sources: &request.sources,
            project_root: &request.project_root,
            classpath: &request.classpath,
            flags: &request.flags,
            output_dir: &output_dir,
        };
        let json = serde_json::to_vec_pretty(&wire)
            .map_err(|e| CompilerFailure::new(format!("cannot encode request: {e}")))?;
        std::fs::write(&request_path, json)
            .map_err(|e| CompilerFailure::new(format!("cannot write request: {e}")))?;

        let output = self.run(&request.project_root, &request_path, &response_path, &output_dir)?;

        let response = match std::fs::read(&response_path) {
            Ok(bytes) => serde_json::from_slice::<WireResponse>(&bytes)
                .map_err(|e| CompilerFailure::new(format!("malformed compiler response: {e}")))?,
            Err(_) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                return Err(CompilerFailure {
                    message: format!("`{}` exited with {} and wrote no response", self.command, output.status),
                    diagnostics: if stderr.is_empty() {
                        Vec::new()
                    } else {
                        vec![Diagnostic::error(stderr)]
                    },
                });
            }
        };
        if !output.status.success() {
            tracing::debug!("`{}` exited with {}", self.command, output.status);
        }

        let mut outcome = CompileOutcome::default();
        for (source, result) in response.results {
            match result {
                WireResult::Compiled { nodes } => {
                    let outputs = read_outputs(&output_dir, &nodes);
                    outcome.compiled(source, CompiledSource { nodes, outputs });
                }
                WireResult::Failed { mut diagnostics } => {
                    if diagnostics.is_empty() {
                        diagnostics.push(Diagnostic::error("compilation failed"));
                    }
                    for diagnostic in &mut diagnostics {
                        if diagnostic.file.is_none() {
                            diagnostic.file = Some(source.to_string());
                        }
                    }
                    outcome.failed(source, diagnostics);
                }
            }
        }
        Ok(outcome)
    }
}

/// Class files the command wrote for `nodes`. Missing files are left out.
fn read_outputs(output_dir: &Path, nodes: &[Node]) -> BTreeMap<String, Vec<u8>> {
    nodes
        .iter()
        .filter_map(|node| {
            let path = output_dir.join(&node.out_file_path);
            std::fs::read(&path)
                .ok()
                .map(|bytes| (node.out_file_path.clone(), bytes))
        })
        .collect()
}
