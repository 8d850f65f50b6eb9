#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// A query arrived before any graph was built.
    #[error("highlight engine not ready: no reply graph has been built yet")]
    NotReady,

    /// The thread has more posts than a packed edge key can address.
    #[error("reply graph has {nodes} nodes, packed edge keys address at most {limit}")]
    CapacityExceeded { nodes: usize, limit: u64 },

    #[error("node index {index} is outside the reply graph ({node_count} nodes)")]
    UnknownNode { index: usize, node_count: usize },
}
