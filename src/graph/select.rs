use std::f32::consts::FRAC_PI_2;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::engine::NodeId;
use crate::graph::node::{shape, BlockCtx, Inputs, NoSuchParam, SignalNode};
use crate::param::{ControlSpec, Param, Scale};
use crate::stream::Stream;

/// Crossfade law between adjacent candidates.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fade {
    /// Constant-gain: weights sum to 1. Right for correlated sources.
    Linear,
    /// Constant-power: squared weights sum to 1. Right for uncorrelated
    /// sources, where a linear fade dips in the middle.
    EqualPower,
}

/// Continuous crossfader over an ordered list of candidate nodes.
///
/// `voice` is a position on the list, not a switch: 0.0 is the first
/// candidate alone, 1.0 the second, 0.5 an even blend of the two. Sweep
/// it with an LFO or a ramping generator for audible morphs. Out-of-range
/// positions clamp to the ends.
pub struct Selector {
    candidates: Vec<NodeId>,
    voice: Param,
    fade: Fade,
    mul: Param,
    add: Param,
}

impl Selector {
    pub fn new(candidates: Vec<NodeId>, voice: impl Into<Param>) -> Self {
        Self {
            candidates,
            voice: voice.into(),
            fade: Fade::Linear,
            mul: Param::Constant(1.0),
            add: Param::Constant(0.0),
        }
    }

    pub fn with_fade(mut self, fade: Fade) -> Self {
        self.fade = fade;
        self
    }

    pub fn with_mul(mut self, mul: impl Into<Param>) -> Self {
        self.mul = mul.into();
        self
    }

    pub fn with_add(mut self, add: impl Into<Param>) -> Self {
        self.add = add.into();
        self
    }
}

impl SignalNode for Selector {
    fn params(&self) -> Vec<&Param> {
        vec![&self.voice, &self.mul, &self.add]
    }

    fn inputs(&self) -> Vec<NodeId> {
        self.candidates.clone()
    }

    fn process_block(&mut self, inputs: &Inputs, out: &mut [Stream], _ctx: &mut BlockCtx) {
        if self.candidates.is_empty() {
            for stream in out.iter_mut() {
                stream.samples_mut().fill(0.0);
            }
            return;
        }
        let top = (self.candidates.len() - 1) as f32;
        for (i, stream) in out.iter_mut().enumerate() {
            let buf = stream.samples_mut();
            for n in 0..buf.len() {
                let pos = self.voice.at(inputs, i, n).clamp(0.0, top);
                let lo = pos.floor() as usize;
                let hi = (lo + 1).min(self.candidates.len() - 1);
                let frac = pos - lo as f32;
                let (w_lo, w_hi) = match self.fade {
                    Fade::Linear => (1.0 - frac, frac),
                    Fade::EqualPower => {
                        let theta = frac * FRAC_PI_2;
                        (theta.cos(), theta.sin())
                    }
                };
                let blended = w_lo * inputs.sample(self.candidates[lo], i, n)
                    + w_hi * inputs.sample(self.candidates[hi], i, n);
                buf[n] = shape(blended, self.mul.at(inputs, i, n), self.add.at(inputs, i, n));
            }
        }
    }

    fn set_param(&mut self, name: &str, value: Param) -> Result<(), NoSuchParam> {
        match name {
            "voice" => self.voice = value,
            "mul" => self.mul = value,
            "add" => self.add = value,
            _ => return Err(NoSuchParam),
        }
        Ok(())
    }

    fn controls(&self) -> Vec<ControlSpec> {
        let top = self.candidates.len().saturating_sub(1) as f32;
        vec![ControlSpec::new("voice", 0.0, top, Scale::Linear)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Server, ServerConfig};
    use crate::graph::math::Sig;

    fn server() -> Server {
        let mut s = Server::new(ServerConfig::default()).unwrap();
        s.start();
        s
    }

    #[test]
    fn integer_positions_pick_one_candidate() {
        let mut s = server();
        let a = s.add(Sig::new(1.0)).unwrap();
        let b = s.add(Sig::new(5.0)).unwrap();
        let sel = s.add(Selector::new(vec![a, b], 1.0)).unwrap();
        s.tick();
        assert_eq!(s.bank(sel).unwrap()[0].samples()[0], 5.0);
    }

    #[test]
    fn midpoint_blends_linearly() {
        let mut s = server();
        let a = s.add(Sig::new(1.0)).unwrap();
        let b = s.add(Sig::new(5.0)).unwrap();
        let sel = s.add(Selector::new(vec![a, b], 0.5)).unwrap();
        s.tick();
        assert!((s.bank(sel).unwrap()[0].samples()[0] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn equal_power_midpoint_carries_more_gain() {
        let mut s = server();
        let a = s.add(Sig::new(1.0)).unwrap();
        let b = s.add(Sig::new(1.0)).unwrap();
        let sel = s
            .add(Selector::new(vec![a, b], 0.5).with_fade(Fade::EqualPower))
            .unwrap();
        s.tick();
        let x = s.bank(sel).unwrap()[0].samples()[0];
        // cos(pi/4) + sin(pi/4) = sqrt(2)
        assert!((x - std::f32::consts::SQRT_2).abs() < 1e-5);
    }

    #[test]
    fn voice_clamps_to_the_ends() {
        let mut s = server();
        let a = s.add(Sig::new(1.0)).unwrap();
        let b = s.add(Sig::new(5.0)).unwrap();
        let sel = s.add(Selector::new(vec![a, b], 7.0)).unwrap();
        let sel_low = s.add(Selector::new(vec![a, b], -3.0)).unwrap();
        s.tick();
        assert_eq!(s.bank(sel).unwrap()[0].samples()[0], 5.0);
        assert_eq!(s.bank(sel_low).unwrap()[0].samples()[0], 1.0);
    }

    #[test]
    fn width_follows_the_widest_candidate_with_wraparound() {
        let mut s = server();
        let a = s.add(Sig::new(vec![1.0, 2.0, 3.0])).unwrap();
        let b = s.add(Sig::new(vec![10.0, 20.0])).unwrap();
        let sel = s.add(Selector::new(vec![a, b], 0.5)).unwrap();
        assert_eq!(s.width(sel), Some(3));
        s.tick();
        let bank = s.bank(sel).unwrap();
        // The narrow candidate wraps on stream 2: (3 + 10) / 2.
        assert!((bank[2].samples()[0] - 6.5).abs() < 1e-6);
    }

    #[test]
    fn no_candidates_is_silence() {
        let mut s = server();
        let sel = s.add(Selector::new(Vec::new(), 0.0)).unwrap();
        s.tick();
        assert!(s.bank(sel).unwrap()[0].samples().iter().all(|&x| x == 0.0));
    }
}
