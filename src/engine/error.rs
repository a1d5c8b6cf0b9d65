use thiserror::Error;

use super::graph::NodeId;

/// Configuration problems caught at server construction, before any block
/// runs. Non-recoverable: fix the config and build a new server.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("sample rate must be positive and finite, got {0}")]
    SampleRate(f32),
    #[error("block size must be between 1 and {}, got {0}", crate::MAX_BLOCK_SIZE)]
    BlockSize(usize),
    #[error("channel count must be at least 1, got {0}")]
    Channels(usize),
}

/// Problems with a mutating graph operation. Reported synchronously to the
/// caller; the graph stays in its last valid state and the per-block path
/// never raises.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("{0} is not registered in this graph")]
    UnknownNode(NodeId),
    #[error("{0} would depend on its own current-block output")]
    Cycle(NodeId),
    #[error("{node} has no parameter named `{name}`")]
    UnknownParam { node: NodeId, name: String },
    #[error("{0} is still an input of {1} and cannot be removed")]
    NodeInUse(NodeId, NodeId),
}
