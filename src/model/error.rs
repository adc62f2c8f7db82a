use super::id::{LinkId, NodeId};
use std::path::PathBuf;

/// Errors raised by topology/flow/failure model operations.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("unknown link {0}")]
    UnknownLink(LinkId),

    #[error("node {0} has no free port")]
    NoFreePort(NodeId),

    #[error("port {port} on node {node} does not exist")]
    UnknownPort { node: NodeId, port: u32 },

    #[error("port {port} on node {node} is already connected")]
    PortInUse { node: NodeId, port: u32 },

    #[error("a link already joins these two ports")]
    DuplicateLink,

    #[error("link {link} references missing port {port} on node {node}")]
    DanglingPort { link: LinkId, node: NodeId, port: u32 },

    #[error("link {link} and port {port} on node {node} disagree about their binding")]
    BindingMismatch { link: LinkId, node: NodeId, port: u32 },

    #[error("unsupported topology schema version {0}")]
    SchemaVersion(u32),

    #[error("failure event '{0}' targets a missing node or link")]
    UnknownFailureTarget(String),

    #[error("failure event '{event}' is scheduled at {at_s}s, past the {duration_s}s simulation end")]
    EventPastEnd { event: String, at_s: f64, duration_s: f64 },

    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
