//! The compiler collaborator contract.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use jinc_core::node::Node;
use jinc_core::source::NodeSource;

/// What a round asks the compiler to do.
#[derive(Debug, Clone)]
pub struct CompileRequest {
    /// Sources to recompile.
    pub scope: BTreeSet<NodeSource>,
    /// Every current source of the target, compiled or not.
    pub sources: BTreeSet<NodeSource>,
    pub project_root: PathBuf,
    pub classpath: Vec<PathBuf>,
    pub flags: Vec<String>,
}

/// Successful compilation of one source.
#[derive(Debug, Clone, Default)]
pub struct CompiledSource {
    pub nodes: Vec<Node>,
    /// Class file contents keyed by output path relative to the classes directory.
    pub outputs: BTreeMap<String, Vec<u8>>,
}

#[derive(Debug, Clone)]
pub enum SourceResult {
    Compiled(CompiledSource),
    Failed(Vec<Diagnostic>),
}

/// Per-source results of one compiler invocation, in no particular order.
#[derive(Debug, Clone, Default)]
pub struct CompileOutcome {
    pub results: BTreeMap<NodeSource, SourceResult>,
}

impl CompileOutcome {
    pub fn compiled(&mut self, source: NodeSource, compiled: CompiledSource) {
        self.results.insert(source, SourceResult::Compiled(compiled));
    }

    pub fn failed(&mut self, source: NodeSource, diagnostics: Vec<Diagnostic>) {
        self.results.insert(source, SourceResult::Failed(diagnostics));
    }
}

/// The compiler could not run at all; every requested source failed.
#[derive(Debug, Clone, Error)]
#[error("compiler failed: {message}")]
pub struct CompilerFailure {
    pub message: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilerFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            diagnostics: Vec::new(),
        }
    }
}

/// Compiles a set of sources into nodes and class files.
pub trait Compiler {
    /// Short name used in the build log.
    fn id(&self) -> &str;

    fn compile(&self, request: &CompileRequest) -> Result<CompileOutcome, CompilerFailure>;
}

/// A single compiler diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub message: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            message: message.into(),
            file: None,
            line: None,
        }
    }

    pub fn in_file(mut self, file: impl Into<String>, line: Option<u32>) -> Self {
        self.file = Some(file.into());
        self.line = line;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Info => "info",
        };
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{file}:{line}: {severity}: {}", self.message),
            (Some(file), None) => write!(f, "{file}: {severity}: {}", self.message),
            _ => write!(f, "{severity}: {}", self.message),
        }
    }
}
