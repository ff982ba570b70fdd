use thiserror::Error;

/// Structural violations found while merging snapshots or deltas into the model.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum GraphError {
    #[error("snapshot link {link_id} references unknown node {missing_node_id}")]
    InvalidSnapshot {
        link_id: String,
        missing_node_id: String,
    },

    #[error("link {link_id} references unknown node {missing_node_id}; link skipped")]
    DanglingLink {
        link_id: String,
        missing_node_id: String,
    },
}

impl GraphError {
    pub fn link_id(&self) -> &str {
        match self {
            Self::InvalidSnapshot { link_id, .. } | Self::DanglingLink { link_id, .. } => link_id,
        }
    }
}
