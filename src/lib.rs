pub mod engine; // Server clock, graph execution, routing, snapshots
pub mod graph; // Signal node library
pub mod io; // Device-boundary buffer helpers
pub mod param; // Parameters, expansion, control descriptors
pub mod stream; // Block buffers

pub const MAX_BLOCK_SIZE: usize = 2048;
