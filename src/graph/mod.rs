//! The node library and the [`SignalNode`] trait everything implements.
//!
//! Nodes are plain structs built with `new` plus `with_*` modifiers, then
//! handed to [`crate::engine::Server::add`], which resolves their stream
//! width and owns them from there.

/// Biquad lowpass/highpass/bandpass.
pub mod filter;
/// Arithmetic on signals: constants, products, powers, sums.
pub mod math;
/// Many-streams-to-few mixdown.
pub mod mix;
/// MIDI note numbers to frequencies.
pub mod mtof;
/// The `SignalNode` trait and block context.
pub mod node;
/// Sound sources: sine, feedback sine, noise, LFO shapes.
pub mod oscillator;
/// Seeded control-rate random generators.
pub mod random;
/// Crossfading selection between candidate nodes.
pub mod select;

pub use filter::{Filt, FiltMode};
pub use math::{Power, Product, Sig, Sum};
pub use mix::Mixer;
pub use mtof::{midi_to_freq, MToF};
pub use node::{BlockCtx, Inputs, NoSuchParam, SignalNode};
pub use oscillator::{Lfo, Noise, Sine, SineLoop, Waveform};
pub use random::{Choice, RandInt, Randh, Randi};
pub use select::{Fade, Selector};
