//! Error types for the graph-store crate.
//!
//! Every fallible graph operation returns [`Result`]. The variants separate
//! missing nodes (a caller asked for an edge to something that was never
//! synced) from malformed writes and snapshot I/O problems.

use thiserror::Error;

use crate::types::EdgeKind;

/// Errors raised by a [`GraphStore`](crate::GraphStore) implementation
#[derive(Error, Debug)]
pub enum GraphError {
    /// An edge write referenced a node that does not exist
    #[error("{label} node not found: {key}")]
    NodeNotFound { label: &'static str, key: String },

    /// RATED edges only accept scores 1..=10
    #[error("Invalid score {0}: must be between 1 and 10")]
    InvalidScore(u8),

    /// The edge kind cannot be written through the generic edge API
    #[error("{0} edges carry properties and must be written with a dedicated call")]
    InvalidEdge(EdgeKind),

    /// Snapshot file could not be read or written
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Snapshot file is not valid JSON for the snapshot shape
    #[error("Snapshot format error: {0}")]
    SnapshotFormat(#[from] serde_json::Error),

    /// A snapshot edge points at a node the snapshot does not define
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: String, id: String },
}

impl GraphError {
    pub(crate) fn film_not_found(id: u64) -> Self {
        GraphError::NodeNotFound {
            label: "Film",
            key: id.to_string(),
        }
    }

    pub(crate) fn genre_not_found(id: u32) -> Self {
        GraphError::NodeNotFound {
            label: "Genre",
            key: id.to_string(),
        }
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, GraphError>;
