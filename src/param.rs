#[cfg(feature = "serde")]
use serde::Serialize;

use crate::engine::NodeId;
use crate::graph::node::Inputs;

/*
Parameters and Multichannel Expansion
=====================================

Every constructor argument of a signal node is a Param: a constant, an
ordered sequence of constants, or a reference to another node's streams.
The same value can drive one stream or many, because nodes expand to as
many parallel streams as their widest parameter:

  Sine::new(440.0)                       1 stream
  Sine::new(vec![100.0, 150.0, 200.0])   3 streams
  Filt::lowpass(noise_id, lfo_id, 1.0)   width follows the widest input

Expansion rule (the wrap-around rule):
--------------------------------------
  width = max(len(p) for every multi-valued parameter), default 1

and parameter `p` feeds stream `i` with `p[i % len(p)]`. Scalars behave as
length-1 sequences, so they broadcast. Node-valued parameters count their
stream width as their length and wrap the same way. Mismatched lengths are
never an error; wrapping is the defined behavior:

  freq: [100, 150, 200, 250]   (len 4)
  ratio: [0.50, 0.75, 1.25]    (len 3)   -> width 4, ratio wraps to 0.50

A node-valued parameter is read at audio rate, one sample per frame, which
is what makes `Filt::bandpass(src, lfo, q)` sweep smoothly.
*/

/// A node constructor argument: constant, sequence, or another node's streams.
#[derive(Debug, Clone)]
pub enum Param {
    Constant(f32),
    Sequence(Vec<f32>),
    Node(NodeId),
}

impl Param {
    /// Number of expansion slots this parameter asks for on its own.
    ///
    /// Node-valued parameters are resolved by the graph, which knows the
    /// referenced node's width; `node_width` supplies that lookup.
    pub fn fan(&self, node_width: &dyn Fn(NodeId) -> usize) -> usize {
        match self {
            Param::Constant(_) => 1,
            Param::Sequence(values) => values.len().max(1),
            Param::Node(id) => node_width(*id).max(1),
        }
    }

    /// Value for `stream` at `frame`, applying the wrap-around rule.
    pub fn at(&self, inputs: &Inputs, stream: usize, frame: usize) -> f32 {
        match self {
            Param::Constant(value) => *value,
            Param::Sequence(values) => {
                if values.is_empty() {
                    0.0
                } else {
                    values[stream % values.len()]
                }
            }
            Param::Node(id) => inputs.sample(*id, stream, frame),
        }
    }

    /// Value for `stream` ignoring audio-rate sources.
    ///
    /// Used where a node needs a value before any block has run (initial
    /// phases, for example). Node-valued parameters read as 0.0 here.
    pub fn fixed(&self, stream: usize) -> f32 {
        match self {
            Param::Constant(value) => *value,
            Param::Sequence(values) => {
                if values.is_empty() {
                    0.0
                } else {
                    values[stream % values.len()]
                }
            }
            Param::Node(_) => 0.0,
        }
    }

    /// The referenced node, if this parameter is node-valued.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Param::Node(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<f32> for Param {
    fn from(value: f32) -> Self {
        Param::Constant(value)
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Constant(value as f32)
    }
}

impl From<Vec<f32>> for Param {
    fn from(values: Vec<f32>) -> Self {
        Param::Sequence(values)
    }
}

impl From<&[f32]> for Param {
    fn from(values: &[f32]) -> Self {
        Param::Sequence(values.to_vec())
    }
}

impl From<NodeId> for Param {
    fn from(id: NodeId) -> Self {
        Param::Node(id)
    }
}

/// Expansion width for a set of parameters: the widest one wins.
pub fn expansion_width<'a, I>(params: I, node_width: &dyn Fn(NodeId) -> usize) -> usize
where
    I: IntoIterator<Item = &'a Param>,
{
    params
        .into_iter()
        .map(|p| p.fan(node_width))
        .max()
        .unwrap_or(1)
}

/// `mul`/`add` pair mapping a nominally [-1, 1] signal onto `[min, max]`.
///
/// Mirrors the `range(min, max)` convenience of the source environment:
/// `Sine::new(400.0).with_range(-0.25, 0.5)` instead of working out the
/// multiplier and offset by hand.
pub fn amp_range(min: f32, max: f32) -> (f32, f32) {
    let mul = (max - min) * 0.5;
    (mul, min + mul)
}

/// Mapping curve an external control surface should use for a parameter.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Linear,
    Log,
}

/// Bounds and scaling for one mutable parameter, enough for an external
/// UI to build a meaningful slider. The engine itself never clamps with
/// these; they describe intent, not enforcement.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSpec {
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub scale: Scale,
    pub units: &'static str,
}

impl ControlSpec {
    pub const fn new(name: &'static str, min: f32, max: f32, scale: Scale) -> Self {
        Self {
            name,
            min,
            max,
            scale,
            units: "",
        }
    }

    pub const fn with_units(mut self, units: &'static str) -> Self {
        self.units = units;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_nodes(_: NodeId) -> usize {
        1
    }

    #[test]
    fn scalar_parameters_yield_width_one() {
        let params = [Param::Constant(1.0), Param::Constant(2.0)];
        assert_eq!(expansion_width(params.iter(), &no_nodes), 1);
    }

    #[test]
    fn widest_sequence_wins() {
        let params = [
            Param::Sequence(vec![1.0, 2.0, 3.0]),
            Param::Constant(0.5),
            Param::Sequence(vec![1.0, 2.0, 3.0, 4.0, 5.0]),
        ];
        assert_eq!(expansion_width(params.iter(), &no_nodes), 5);
    }

    #[test]
    fn node_parameters_count_their_stream_width() {
        let params = [
            Param::Sequence(vec![1.0, 2.0]),
            Param::Node(NodeId::for_tests(0)),
        ];
        let lookup = |_: NodeId| 7usize;
        assert_eq!(expansion_width(params.iter(), &lookup), 7);
    }

    #[test]
    fn sequences_wrap_around() {
        let p = Param::Sequence(vec![10.0, 20.0, 30.0]);
        assert_eq!(p.fixed(0), 10.0);
        assert_eq!(p.fixed(3), 10.0);
        assert_eq!(p.fixed(4), 20.0);
    }

    #[test]
    fn empty_sequence_reads_as_silence() {
        let p = Param::Sequence(Vec::new());
        assert_eq!(p.fixed(2), 0.0);
    }

    #[test]
    fn amp_range_matches_hand_computed_values() {
        // range(-0.25, 0.5) on a [-1, 1] source
        let (mul, add) = amp_range(-0.25, 0.5);
        assert!((mul - 0.375).abs() < 1e-6);
        assert!((add - 0.125).abs() < 1e-6);
        assert!((-1.0 * mul + add - -0.25).abs() < 1e-6);
        assert!((1.0 * mul + add - 0.5).abs() < 1e-6);
    }
}
