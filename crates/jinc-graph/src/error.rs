use jinc_core::node::NodeId;
use jinc_core::source::NodeSource;
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by graph mutations. A failed mutation leaves the graph unchanged.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("node {node} from {incoming} is already produced by {existing}")]
    #[diagnostic(help("Two sources declare the same class; rename or remove one of them"))]
    DuplicateNode {
        node: NodeId,
        existing: NodeSource,
        incoming: NodeSource,
    },
}
