use crate::engine::NodeId;
use crate::param::{ControlSpec, Param};
use crate::stream::Stream;

/// Per-tick context handed to every node.
///
/// `start` is the absolute sample index of the block's first frame; control
/// generators schedule their update ticks against it so a session is
/// reproducible from the sample clock alone. `rng` is the server's single
/// seeded random source; every draw in the graph goes through it.
pub struct BlockCtx<'a> {
    pub sample_rate: f32,
    pub block_size: usize,
    pub start: u64,
    pub rng: &'a mut fastrand::Rng,
}

/// Read access to the current block of every already-computed node.
///
/// The graph walks nodes in dependency order, so by the time a node runs,
/// each of its inputs holds this tick's samples. Stream indices wrap around
/// the producing node's width, the same rule sequences follow.
pub struct Inputs<'a> {
    pub(crate) banks: &'a [Vec<Stream>],
}

impl Inputs<'_> {
    /// Stream count of a node.
    pub fn width(&self, id: NodeId) -> usize {
        self.banks[id.index()].len()
    }

    /// One stream of a node's current block, wrapping `stream` around its width.
    pub fn stream(&self, id: NodeId, stream: usize) -> &[f32] {
        let bank = &self.banks[id.index()];
        debug_assert!(!bank.is_empty(), "input node read before it was computed");
        bank[stream % bank.len()].samples()
    }

    /// A single sample of a node's current block.
    pub fn sample(&self, id: NodeId, stream: usize, frame: usize) -> f32 {
        self.stream(id, stream)[frame]
    }
}

/// Error returned by [`SignalNode::set_param`] for names the node does not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoSuchParam;

/// Core trait for signal graph nodes.
///
/// A node owns `width` output streams, sized once when the graph resolves
/// its expansion, and rewrites them every tick from its inputs' current
/// block. The width never changes afterwards; reassigning a parameter with
/// a different fan just changes how values wrap across the existing streams.
pub trait SignalNode: Send {
    /// Parameters that drive expansion and dependency resolution.
    fn params(&self) -> Vec<&Param>;

    /// Node inputs that are wired directly rather than through a `Param`
    /// (a mixer's source, a selector's candidates). Their widths still
    /// count toward expansion.
    fn inputs(&self) -> Vec<NodeId> {
        Vec::new()
    }

    /// Output width pinned by the node itself, overriding expansion
    /// (a mixer always has exactly `voices` streams).
    fn fixed_width(&self) -> Option<usize> {
        None
    }

    /// Expansion slots the node asks for beyond its parameters, counted
    /// into the width maximum like any parameter fan. A `Choice` carrying
    /// one candidate set per stream reports the set count here.
    fn fan(&self) -> usize {
        1
    }

    /// Called once, after expansion resolution, before the first block.
    /// Nodes size their per-stream state here.
    fn allocate(&mut self, width: usize, sample_rate: f32) {
        let _ = (width, sample_rate);
    }

    /// Recompute this node's streams for the current block.
    fn process_block(&mut self, inputs: &Inputs, out: &mut [Stream], ctx: &mut BlockCtx);

    /// Reassign a named parameter.
    ///
    /// The graph only calls this between blocks, so a running node never
    /// observes a torn parameter; see [`crate::engine::Graph::set_param`].
    fn set_param(&mut self, name: &str, value: Param) -> Result<(), NoSuchParam> {
        let _ = (name, value);
        Err(NoSuchParam)
    }

    /// Bounds and scaling for the parameters an external control surface
    /// may drive. Empty for nodes with nothing worth a slider.
    fn controls(&self) -> Vec<ControlSpec> {
        Vec::new()
    }
}

/// Multiply-then-offset shaping every generator applies on the way out.
///
/// `mul` scales each sample, `add` offsets it, multiplication first:
/// `Sine::new(400.0).with_mul(0.5).with_add(0.5)` lands in [0, 1].
#[inline]
pub(crate) fn shape(sample: f32, mul: f32, add: f32) -> f32 {
    sample * mul + add
}
