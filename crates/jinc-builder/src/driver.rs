//! The incremental build round.
//!
//! ```text
//! Load -> Digest -> Diff -> Scope -> Compile -> Merge -> Commit -> Reconcile & package
//! ```
//!
//! Only Commit makes state durable. Before any output file is touched, a
//! round-in-progress marker is written next to the graph store; it is removed
//! by Commit. A round that finds the marker, or whose graph and configuration
//! state disagree on their commit generation, discards the previous state and
//! rebuilds from scratch.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use jinc_core::digest::Digest;
use jinc_core::paths::OutputLayout;
use jinc_core::source::{NodeSource, PathSourceMapper};
use jinc_graph::persist::{load_graph, save_graph};
use jinc_graph::{differentiate, DependencyGraph, DirtyScope, MapletStore};
use jinc_util::errors::JincError;

use crate::build_log::{BatchBuildProcessLogger, BuildProcessLogger, TextBuildProcessLogger};
use crate::compiler::{CompileRequest, CompiledSource, Compiler, Diagnostic, SourceResult};
use crate::config_state::{ConfigurationState, SourceChanges};
use crate::output::{self, is_safe_relative};
use crate::{diagnostics, digest, reconcile};

/// Everything a round needs to know about the target.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub project_root: PathBuf,
    pub layout: OutputLayout,
    /// Every current source of the target.
    pub sources: BTreeSet<NodeSource>,
    pub config_fingerprint: String,
    pub module_name: String,
    pub classpath: Vec<PathBuf>,
    pub flags: Vec<String>,
    pub jobs: usize,
    pub write_log: bool,
    pub diagnostic_sessions: usize,
}

/// Why the previous state was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildReason {
    NoPreviousState,
    GraphUnreadable,
    StateUnreadable,
    InterruptedRound,
    GenerationMismatch,
    ConfigurationChanged,
}

impl fmt::Display for RebuildReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RebuildReason::NoPreviousState => "no previous build",
            RebuildReason::GraphUnreadable => "dependency graph is missing or corrupt",
            RebuildReason::StateUnreadable => "configuration state is missing or corrupt",
            RebuildReason::InterruptedRound => "previous round was interrupted",
            RebuildReason::GenerationMismatch => "graph and configuration state are out of step",
            RebuildReason::ConfigurationChanged => "build configuration changed",
        };
        f.write_str(text)
    }
}

/// Graph and configuration state from the last commit.
#[derive(Debug)]
pub struct PreviousState {
    pub graph: DependencyGraph,
    pub state: ConfigurationState,
    /// Set when nothing from the last commit can be trusted.
    pub rebuild: Option<RebuildReason>,
}

/// Read the last committed state, falling back to an empty one.
pub fn load_previous(store: &MapletStore, layout: &OutputLayout, fingerprint: &str) -> PreviousState {
    let fresh = |reason: RebuildReason| {
        tracing::debug!("discarding previous state: {reason}");
        PreviousState {
            graph: DependencyGraph::new(),
            state: ConfigurationState::new(fingerprint),
            rebuild: Some(reason),
        }
    };

    if store.recovered() {
        if store.path().exists() {
            return fresh(RebuildReason::GraphUnreadable);
        }
        return fresh(RebuildReason::NoPreviousState);
    }
    if layout.round_marker_path().exists() {
        tracing::warn!("previous build round did not finish; rebuilding from scratch");
        return fresh(RebuildReason::InterruptedRound);
    }
    let Some(state) = ConfigurationState::load(&layout.config_state_path()) else {
        return fresh(RebuildReason::StateUnreadable);
    };
    if state.generation != store.generation() {
        tracing::warn!(
            "graph generation {} does not match state generation {}",
            store.generation(),
            state.generation
        );
        return fresh(RebuildReason::GenerationMismatch);
    }
    if state.config_fingerprint != fingerprint {
        return fresh(RebuildReason::ConfigurationChanged);
    }
    let Some(graph) = load_graph(store) else {
        return fresh(RebuildReason::GraphUnreadable);
    };
    PreviousState {
        graph,
        state,
        rebuild: None,
    }
}

/// Digests, changes and dirty scope of a round.
#[derive(Debug, Clone)]
pub struct RoundPlan {
    pub digests: BTreeMap<NodeSource, Digest>,
    pub changes: SourceChanges,
    pub scope: DirtyScope,
}

/// Digest the current sources, diff them against `state` and compute the scope.
pub fn plan_round(
    ctx: &BuildContext,
    state: &ConfigurationState,
    graph: &DependencyGraph,
) -> miette::Result<RoundPlan> {
    let mapper = PathSourceMapper::new(&ctx.project_root);
    let digests = digest::digest_all(&mapper, &ctx.sources, ctx.jobs)?;
    let changes = state.diff(&digests);
    let scope = differentiate(graph, &changes.changed());
    tracing::debug!(
        "{} added, {} modified, {} removed; scope {}",
        changes.added.len(),
        changes.modified.len(),
        changes.removed.len(),
        scope.len()
    );
    Ok(RoundPlan {
        digests,
        changes,
        scope,
    })
}

/// What the next round would do, without locking or touching anything.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub plan: RoundPlan,
    pub rebuild: Option<RebuildReason>,
    /// Sources recorded dirty by the last commit.
    pub dirty: BTreeSet<NodeSource>,
}

pub fn status(ctx: &BuildContext) -> miette::Result<StatusReport> {
    let store = MapletStore::open_read_only(&ctx.layout.graph_path());
    let previous = load_previous(&store, &ctx.layout, &ctx.config_fingerprint);
    let plan = plan_round(ctx, &previous.state, &previous.graph)?;
    Ok(StatusReport {
        plan,
        rebuild: previous.rebuild,
        dirty: previous.state.dirty_sources(),
    })
}

/// Outcome of one round.
#[derive(Debug, Clone, Default)]
pub struct RoundSummary {
    /// No source failed; every source is up to date.
    pub success: bool,
    pub full_rebuild: bool,
    /// Whether new state was committed (false for an up-to-date round).
    pub committed: bool,
    pub dirty_scope: BTreeSet<NodeSource>,
    pub compiled: BTreeSet<NodeSource>,
    pub failed: BTreeSet<NodeSource>,
    pub removed: BTreeSet<NodeSource>,
    pub deleted_outputs: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RoundSummary {
    /// Plain-text description recorded in the diagnostics archive.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let kind = if self.full_rebuild { "full rebuild" } else { "incremental" };
        out.push_str(&format!("Round: {kind}\n"));
        out.push_str(&format!(
            "Result: {}\n",
            if self.success { "OK" } else { "ERROR" }
        ));
        let mut list = |title: &str, items: Vec<String>| {
            out.push_str(&format!("{title}:\n"));
            for item in items {
                out.push_str(&format!("  {item}\n"));
            }
        };
        let keys = |set: &BTreeSet<NodeSource>| -> Vec<String> { set.iter().map(|s| s.to_string()).collect() };
        list("Dirty scope", keys(&self.dirty_scope));
        list("Compiled", keys(&self.compiled));
        list("Failed", keys(&self.failed));
        list("Removed", keys(&self.removed));
        list("Deleted outputs", self.deleted_outputs.clone());
        list(
            "Diagnostics",
            self.diagnostics.iter().map(|d| d.to_string()).collect(),
        );
        out
    }
}

/// Run one build round for `ctx` with `compiler`.
///
/// Compile failures are reported in the summary. Invariant violations and
/// storage failures are returned as errors, and nothing is committed.
pub fn run_round(ctx: &BuildContext, compiler: &dyn Compiler) -> miette::Result<RoundSummary> {
    let layout = &ctx.layout;
    let classes_dir = layout.classes_dir();
    let mut store = MapletStore::open(&layout.graph_path(), &layout.lock_path())?;

    // Load
    let PreviousState {
        mut graph,
        state: old_state,
        rebuild,
    } = load_previous(&store, layout, &ctx.config_fingerprint);
    if let Some(reason) = rebuild {
        tracing::info!("rebuilding from scratch: {reason}");
        store.clear();
        mark_round_started(layout)?;
        output::wipe_classes(&classes_dir)?;
    }

    // Digest, Diff, Scope
    let plan = plan_round(ctx, &old_state, &graph)?;
    let mut summary = RoundSummary {
        full_rebuild: rebuild.is_some(),
        dirty_scope: plan.scope.sources().clone(),
        removed: plan.changes.removed.clone(),
        ..Default::default()
    };
    let mut log = BatchBuildProcessLogger::new(TextBuildProcessLogger::new());
    log.start_batch();

    if plan.scope.is_empty() && rebuild.is_none() {
        tracing::info!("all {} sources are up to date", ctx.sources.len());
        summary.success = true;
        finish_round(ctx, &graph, &summary, log)?;
        store.close()?;
        return Ok(summary);
    }

    // Compile
    let to_compile: BTreeSet<NodeSource> = plan
        .scope
        .sources()
        .iter()
        .filter(|s| ctx.sources.contains(*s))
        .cloned()
        .collect();
    let results = compile_scope(ctx, compiler, &to_compile);

    // Merge
    let mut stale_outputs: BTreeMap<NodeSource, Vec<String>> = BTreeMap::new();
    for source in plan.scope.sources() {
        let removed = graph.remove(source);
        if !removed.is_empty() {
            stale_outputs.insert(
                source.clone(),
                removed.into_iter().map(|n| n.out_file_path).collect(),
            );
        }
    }
    let merged = merge_results(&mut graph, results, &plan.digests);
    let dangling = graph.dangling_edges();
    if let Some((user, target)) = dangling.first() {
        return Err(JincError::Invariant {
            message: format!(
                "{} dangling edges after merge, e.g. {user} -> {target}",
                dangling.len()
            ),
        }
        .into());
    }

    // Outputs
    mark_round_started(layout)?;
    for (source, paths) in &stale_outputs {
        let deleted = output::delete_outputs(&classes_dir, paths)?;
        if !deleted.is_empty() {
            tracing::debug!("deleted {} outputs of {source}", deleted.len());
            log.log_deleted_paths(deleted.clone());
            summary.deleted_outputs.extend(deleted);
        }
    }
    if !to_compile.is_empty() {
        log.log_compiled_paths(
            to_compile.iter().map(|s| s.to_string()).collect(),
            compiler.id(),
            "",
        );
    }
    for compiled in merged.compiled.values() {
        output::write_outputs(&classes_dir, &compiled.outputs)?;
    }
    for (owner, node) in graph.nodes() {
        if !classes_dir.join(&node.out_file_path).is_file() {
            return Err(JincError::Invariant {
                message: format!("output {} of {owner} is missing", node.out_file_path),
            }
            .into());
        }
    }

    // Commit
    let mut new_state = ConfigurationState::new(&ctx.config_fingerprint);
    for (source, digest) in &plan.digests {
        let digest = if merged.failed.contains_key(source) {
            Digest::empty()
        } else {
            digest.clone()
        };
        new_state.sources.insert(source.clone(), digest);
    }
    save_graph(&mut store, &graph)?;
    new_state.generation = store.snapshot()?;
    new_state.save(&layout.config_state_path())?;
    clear_round_marker(layout)?;
    tracing::debug!("committed generation {}", new_state.generation);

    summary.committed = true;
    summary.compiled = merged.compiled.keys().cloned().collect();
    summary.failed = merged.failed.keys().cloned().collect();
    summary.diagnostics = merged.failed.into_values().flatten().collect();
    summary.success = summary.failed.is_empty();
    tracing::info!(
        "compiled {} sources, {} failed",
        summary.compiled.len(),
        summary.failed.len()
    );

    finish_round(ctx, &graph, &summary, log)?;
    store.close()?;
    Ok(summary)
}

/// Ask the compiler for the scope and classify every source in it.
fn compile_scope(
    ctx: &BuildContext,
    compiler: &dyn Compiler,
    scope: &BTreeSet<NodeSource>,
) -> BTreeMap<NodeSource, SourceResult> {
    if scope.is_empty() {
        return BTreeMap::new();
    }
    let request = CompileRequest {
        scope: scope.clone(),
        sources: ctx.sources.clone(),
        project_root: ctx.project_root.clone(),
        classpath: ctx.classpath.clone(),
        flags: ctx.flags.clone(),
    };
    let mut results = match compiler.compile(&request) {
        Ok(outcome) => outcome.results,
        Err(failure) => {
            tracing::warn!("{failure}");
            let mut diagnostics = failure.diagnostics.clone();
            if diagnostics.is_empty() {
                diagnostics.push(Diagnostic::error(failure.message.clone()));
            }
            return scope
                .iter()
                .map(|s| (s.clone(), SourceResult::Failed(diagnostics.clone())))
                .collect();
        }
    };
    results.retain(|source, _| {
        let requested = scope.contains(source);
        if !requested {
            tracing::warn!("ignoring result for {source}, which was not requested");
        }
        requested
    });
    for source in scope {
        results.entry(source.clone()).or_insert_with(|| {
            SourceResult::Failed(vec![Diagnostic::error(
                "compiler returned no result for this source",
            )
            .in_file(source.as_str(), None)])
        });
    }
    results
}

struct MergeResult {
    compiled: BTreeMap<NodeSource, CompiledSource>,
    failed: BTreeMap<NodeSource, Vec<Diagnostic>>,
}

/// Fold compile results into `graph`, whose scope sources were already removed.
///
/// Successful sources that use nodes no longer in the graph are demoted to
/// failed until no such source remains.
fn merge_results(
    graph: &mut DependencyGraph,
    results: BTreeMap<NodeSource, SourceResult>,
    digests: &BTreeMap<NodeSource, Digest>,
) -> MergeResult {
    let mut compiled = BTreeMap::new();
    let mut failed: BTreeMap<NodeSource, Vec<Diagnostic>> = BTreeMap::new();

    for (source, result) in results {
        let compiled_source = match result {
            SourceResult::Failed(diagnostics) => {
                failed.insert(source, diagnostics);
                continue;
            }
            SourceResult::Compiled(c) => c,
        };
        if digests.get(&source).map_or(true, Digest::is_empty) {
            failed.insert(
                source.clone(),
                vec![Diagnostic::error("source could not be read").in_file(source.as_str(), None)],
            );
            continue;
        }
        if let Some(problem) = output_problem(&compiled_source) {
            failed.insert(
                source.clone(),
                vec![Diagnostic::error(problem).in_file(source.as_str(), None)],
            );
            continue;
        }
        if let Err(e) = graph.merge(&source, compiled_source.nodes.clone()) {
            failed.insert(
                source.clone(),
                vec![Diagnostic::error(e.to_string()).in_file(source.as_str(), None)],
            );
            continue;
        }
        compiled.insert(source, compiled_source);
    }

    loop {
        let mut demoted: BTreeMap<NodeSource, Vec<Diagnostic>> = BTreeMap::new();
        for (user, target) in graph.dangling_edges() {
            let Some(owner) = graph.owner_of(&user) else {
                continue;
            };
            if compiled.contains_key(owner) {
                demoted.entry(owner.clone()).or_default().push(
                    Diagnostic::error(format!("{user} uses {target}, which is no longer produced by any source"))
                        .in_file(owner.as_str(), None),
                );
            }
        }
        if demoted.is_empty() {
            break;
        }
        for (source, diagnostics) in demoted {
            tracing::debug!("demoting {source}: depends on a failed source");
            graph.remove(&source);
            compiled.remove(&source);
            failed.insert(source, diagnostics);
        }
    }

    MergeResult { compiled, failed }
}

/// Why a compiled source's outputs cannot be accepted, if they cannot.
fn output_problem(compiled: &CompiledSource) -> Option<String> {
    for node in &compiled.nodes {
        if !is_safe_relative(&node.out_file_path) {
            return Some(format!(
                "output path '{}' of {} escapes the classes directory",
                node.out_file_path, node.id
            ));
        }
        if !compiled.outputs.contains_key(&node.out_file_path) {
            return Some(format!("no class file produced for {}", node.id));
        }
    }
    let declared: BTreeSet<&String> = compiled.nodes.iter().map(|n| &n.out_file_path).collect();
    compiled
        .outputs
        .keys()
        .find(|path| !declared.contains(path))
        .map(|path| format!("class file {path} does not belong to any produced class"))
}

/// Regenerate derived artifacts and record the round.
fn finish_round(
    ctx: &BuildContext,
    graph: &DependencyGraph,
    summary: &RoundSummary,
    mut log: BatchBuildProcessLogger<TextBuildProcessLogger>,
) -> miette::Result<()> {
    let layout = &ctx.layout;
    let classes_dir = layout.classes_dir();
    reconcile::reconcile(graph, &summary.failed, &ctx.module_name, &classes_dir)?;
    output::package_archive(&classes_dir, &layout.archive_path())?;
    if ctx.write_log {
        let text = log.collected_data();
        std::fs::write(layout.build_log_path(), text).map_err(JincError::Io)?;
    }
    diagnostics::append_session(
        &layout.diagnostic_path(),
        &summary.describe(),
        ctx.diagnostic_sessions,
    )?;
    Ok(())
}

fn mark_round_started(layout: &OutputLayout) -> miette::Result<()> {
    let marker = layout.round_marker_path();
    if !marker.exists() {
        jinc_util::fs::write_atomic(&marker, b"").map_err(|e| JincError::Storage {
            message: format!("cannot write {}: {e}", marker.display()),
        })?;
    }
    Ok(())
}

fn clear_round_marker(layout: &OutputLayout) -> miette::Result<()> {
    let marker = layout.round_marker_path();
    match std::fs::remove_file(&marker) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(JincError::Storage {
            message: format!("cannot remove {}: {e}", marker.display()),
        }
        .into()),
    }
}
