//! A declarative compiler for class descriptor files.
//!
//! Each source file lists the classes it "compiles" to, one directive per line:
//!
//! ```text
//! # comment
//! class com/example/Service          a Java class
//! kclass com/example/Model           a Kotlin class
//! facade com/example/UtilsKt         a Kotlin file facade
//! multifile com/example/Multi        a Kotlin multi-file class facade
//! part com/example/Multi__AKt of com/example/Multi
//! synthetic com/example/Model$1      a Kotlin synthetic class
//! uses com/example/Model             usage edge from the last declared class
//! error message                      fail compilation of this file
//! ```
//!
//! A `uses` target must be declared by some source of the target that does not
//! itself contain `error`; references to `java/`, `javax/` and `kotlin/`
//! classes are treated as platform classes and produce no edge.

use std::collections::{BTreeMap, BTreeSet};

use jinc_core::facet::{Facet, KotlinClassKind, KotlinMeta};
use jinc_core::node::{Node, NodeId};
use jinc_core::source::{NodeSource, PathSourceMapper};

use crate::compiler::{CompileOutcome, CompileRequest, CompiledSource, Compiler, CompilerFailure, Diagnostic};

const PLATFORM_PREFIXES: &[&str] = &["java/", "javax/", "kotlin/"];

/// Marker embedded in class files carrying Kotlin metadata.
pub const KOTLIN_METADATA_MARKER: &[u8] = b"Lkotlin/Metadata;";

#[derive(Debug, Default)]
pub struct DescriptorCompiler;

impl DescriptorCompiler {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Default)]
struct ParsedSource {
    nodes: Vec<Node>,
    references: Vec<(NodeId, u32)>,
    errors: Vec<(u32, String)>,
}

fn parse(text: &str) -> ParsedSource {
    let mut parsed = ParsedSource::default();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx as u32 + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        let (directive, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let kotlin = |kind| Facet::Kotlin(KotlinMeta::new(kind));
        let declared = match directive {
            "class" => Some(Node::class(rest)),
            "kclass" => Some(Node::class(rest).with_facet(kotlin(KotlinClassKind::Class))),
            "facade" => Some(Node::class(rest).with_facet(kotlin(KotlinClassKind::FileFacade))),
            "multifile" => Some(
                Node::class(rest).with_facet(kotlin(KotlinClassKind::MultiFileClassFacade)),
            ),
            "synthetic" => {
                Some(Node::class(rest).with_facet(kotlin(KotlinClassKind::SyntheticClass)))
            }
            "part" => match rest.split_once(" of ") {
                Some((part, facade)) if !part.trim().is_empty() && !facade.trim().is_empty() => {
                    Some(Node::class(part.trim()).with_facet(kotlin(
                        KotlinClassKind::part_of(facade.trim()),
                    )))
                }
                _ => {
                    parsed
                        .errors
                        .push((line_no, "expected `part <class> of <facade>`".to_string()));
                    None
                }
            },
            "uses" => {
                match parsed.nodes.last_mut() {
                    Some(node) if !rest.is_empty() => {
                        let target = NodeId::new(rest);
                        parsed.references.push((target.clone(), line_no));
                        if !is_platform(&target) && target != node.id {
                            node.usages.insert(target);
                        }
                    }
                    Some(_) => parsed.errors.push((line_no, "`uses` needs a class name".to_string())),
                    None => parsed
                        .errors
                        .push((line_no, "`uses` before any class declaration".to_string())),
                }
                continue;
            }
            "error" => {
                parsed.errors.push((line_no, rest.to_string()));
                continue;
            }
            other => {
                parsed
                    .errors
                    .push((line_no, format!("unknown directive `{other}`")));
                continue;
            }
        };
        match declared {
            Some(node) if rest.split_whitespace().count() == 1 || directive == "part" => {
                parsed.nodes.push(node)
            }
            Some(_) => parsed
                .errors
                .push((line_no, format!("`{directive}` takes exactly one class name"))),
            None => {}
        }
    }
    parsed
}

fn is_platform(id: &NodeId) -> bool {
    PLATFORM_PREFIXES.iter().any(|p| id.as_str().starts_with(p))
}

/// Deterministic class file contents for `node`.
fn render_class(source: &NodeSource, node: &Node) -> Vec<u8> {
    let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE];
    let mut text = format!("\nclass {}\nsource {source}\n", node.id);
    for usage in &node.usages {
        text.push_str(&format!("uses {usage}\n"));
    }
    if let Some(meta) = node.facet::<KotlinMeta>() {
        let kind = match &meta.class_kind {
            KotlinClassKind::Class => "class".to_string(),
            KotlinClassKind::FileFacade => "file-facade".to_string(),
            KotlinClassKind::MultiFileClassFacade => "multi-file-class-facade".to_string(),
            KotlinClassKind::MultiFileClassPart { facade_class_name } => {
                format!("multi-file-class-part {facade_class_name}")
            }
            KotlinClassKind::SyntheticClass => "synthetic-class".to_string(),
        };
        bytes.extend_from_slice(text.as_bytes());
        bytes.extend_from_slice(b"annotation ");
        bytes.extend_from_slice(KOTLIN_METADATA_MARKER);
        bytes.extend_from_slice(format!(" {kind}\n").as_bytes());
        return bytes;
    }
    bytes.extend_from_slice(text.as_bytes());
    bytes
}

impl Compiler for DescriptorCompiler {
    fn id(&self) -> &str {
        "descriptor"
    }

    fn compile(&self, request: &CompileRequest) -> Result<CompileOutcome, CompilerFailure> {
        let mapper = PathSourceMapper::new(&request.project_root);
        let mut parsed: BTreeMap<&NodeSource, Result<ParsedSource, String>> = BTreeMap::new();
        for source in request.sources.iter().chain(&request.scope) {
            if parsed.contains_key(source) {
                continue;
            }
            let result = std::fs::read_to_string(mapper.to_path(source))
                .map(|text| parse(&text))
                .map_err(|e| format!("cannot read source: {e}"));
            parsed.insert(source, result);
        }

        let declared: BTreeSet<&NodeId> = parsed
            .values()
            .filter_map(|p| p.as_ref().ok())
            .filter(|p| p.errors.is_empty())
            .flat_map(|p| p.nodes.iter().map(|n| &n.id))
            .collect();

        let mut outcome = CompileOutcome::default();
        for source in &request.scope {
            let file = source.as_str();
            let parsed_source = match parsed.get(source) {
                Some(Ok(p)) => p,
                Some(Err(message)) => {
                    outcome.failed(
                        source.clone(),
                        vec![Diagnostic::error(message.clone()).in_file(file, None)],
                    );
                    continue;
                }
                None => continue,
            };

            let mut diagnostics: Vec<Diagnostic> = parsed_source
                .errors
                .iter()
                .map(|(line, msg)| Diagnostic::error(msg.clone()).in_file(file, Some(*line)))
                .collect();
            for (target, line) in &parsed_source.references {
                if !is_platform(target) && !declared.contains(target) {
                    diagnostics.push(
                        Diagnostic::error(format!("unresolved reference: {target}"))
                            .in_file(file, Some(*line)),
                    );
                }
            }
            if !diagnostics.is_empty() {
                outcome.failed(source.clone(), diagnostics);
                continue;
            }

            let outputs = parsed_source
                .nodes
                .iter()
                .map(|node| (node.out_file_path.clone(), render_class(source, node)))
                .collect();
            outcome.compiled(
                source.clone(),
                CompiledSource {
                    nodes: parsed_source.nodes.clone(),
                    outputs,
                },
            );
        }
        tracing::debug!("descriptor compiler processed {} sources", request.scope.len());
        Ok(outcome)
    }
}
