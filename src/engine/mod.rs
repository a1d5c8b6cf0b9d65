//! The execution engine: server clock, graph walk, routing, snapshots.
//!
//! Nodes themselves live in [`crate::graph`]; this module owns them once
//! they are registered and drives their per-block recomputation.

/// Configuration and graph mutation errors.
pub mod error;
/// Node arena, dependency ordering, block walk.
pub mod graph;
/// Stream-to-physical-channel assignment.
pub mod router;
/// Server clock and tick loop.
pub mod server;
/// Atomic block snapshots for display consumers.
pub mod snapshot;

pub use error::{ConfigError, GraphError};
pub use graph::{Graph, NodeId};
pub use router::ChannelMap;
pub use server::{Server, ServerConfig};
pub use snapshot::{BlockSnapshot, Monitor};
