use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::graph::node::{shape, BlockCtx, Inputs, NoSuchParam, SignalNode};
use crate::param::{amp_range, ControlSpec, Param, Scale};
use crate::stream::Stream;

/*
Oscillators
===========

The sound sources of the library. All of them expand: pass a list (or a
multi-stream node) for any parameter and you get one independent phase
accumulator per stream. The classic additive-synthesis square wave is just

  let harms = vec![100.0, 300.0, 500.0, ...];     // odd harmonics
  let amps  = vec![0.33, 0.11, 0.066, ...];       // 1/n amplitudes
  let bank = Sine::new(harms).with_mul(amps);     // N streams at once

Every oscillator carries the universal `mul`/`add` pair, applied after the
waveform (multiplication first), and `with_range(min, max)` computes them
for you from a target range.

Sine      pure tone; `freq` may be audio-rate for FM-style patches
SineLoop  sine with self-feedback on the phase; `feedback` around
          0.05-0.25 adds brightness, large values get chaotic. The
          feedback is per-stream internal state, not a graph cycle.
Noise     white noise from the server's seeded random source, so a
          seeded session reproduces it exactly
Lfo       control-rate shapes (sine, ramp, square, triangle) meant to
          drive other nodes' parameters
*/

/// Sine wave oscillator. `phase` is the starting phase in [0, 1) and is
/// read once at construction.
pub struct Sine {
    freq: Param,
    phase: Param,
    mul: Param,
    add: Param,
    phases: Vec<f32>,
}

impl Sine {
    pub fn new(freq: impl Into<Param>) -> Self {
        Self {
            freq: freq.into(),
            phase: Param::Constant(0.0),
            mul: Param::Constant(1.0),
            add: Param::Constant(0.0),
            phases: Vec::new(),
        }
    }

    pub fn with_phase(mut self, phase: impl Into<Param>) -> Self {
        self.phase = phase.into();
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

    /// Scale the nominally [-1, 1] output onto `[min, max]`.
    pub fn with_range(self, min: f32, max: f32) -> Self {
        let (mul, add) = amp_range(min, max);
        self.with_mul(mul).with_add(add)
    }
}

impl SignalNode for Sine {
    fn params(&self) -> Vec<&Param> {
        vec![&self.freq, &self.phase, &self.mul, &self.add]
    }

    fn allocate(&mut self, width: usize, _sample_rate: f32) {
        self.phases = (0..width)
            .map(|i| self.phase.fixed(i).rem_euclid(1.0))
            .collect();
    }

    fn process_block(&mut self, inputs: &Inputs, out: &mut [Stream], ctx: &mut BlockCtx) {
        let sr = ctx.sample_rate;
        for (i, stream) in out.iter_mut().enumerate() {
            let mut ph = self.phases[i];
            let buf = stream.samples_mut();
            for n in 0..buf.len() {
                let sample = (TAU * ph).sin();
                buf[n] = shape(sample, self.mul.at(inputs, i, n), self.add.at(inputs, i, n));
                ph = (ph + self.freq.at(inputs, i, n) / sr).rem_euclid(1.0);
            }
            self.phases[i] = ph;
        }
    }

    fn set_param(&mut self, name: &str, value: Param) -> Result<(), NoSuchParam> {
        match name {
            "freq" => self.freq = value,
            "mul" => self.mul = value,
            "add" => self.add = value,
            _ => return Err(NoSuchParam),
        }
        Ok(())
    }

    fn controls(&self) -> Vec<ControlSpec> {
        vec![
            ControlSpec::new("freq", 20.0, 20_000.0, Scale::Log).with_units("Hz"),
            ControlSpec::new("mul", 0.0, 1.0, Scale::Linear),
            ControlSpec::new("add", -1.0, 1.0, Scale::Linear),
        ]
    }
}

/// Sine oscillator with waveshaping feedback on the phase.
pub struct SineLoop {
    freq: Param,
    feedback: Param,
    mul: Param,
    add: Param,
    phases: Vec<f32>,
    last: Vec<f32>,
}

impl SineLoop {
    pub fn new(freq: impl Into<Param>, feedback: impl Into<Param>) -> Self {
        Self {
            freq: freq.into(),
            feedback: feedback.into(),
            mul: Param::Constant(1.0),
            add: Param::Constant(0.0),
            phases: Vec::new(),
            last: Vec::new(),
        }
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

impl SignalNode for SineLoop {
    fn params(&self) -> Vec<&Param> {
        vec![&self.freq, &self.feedback, &self.mul, &self.add]
    }

    fn allocate(&mut self, width: usize, _sample_rate: f32) {
        self.phases = vec![0.0; width];
        self.last = vec![0.0; width];
    }

    fn process_block(&mut self, inputs: &Inputs, out: &mut [Stream], ctx: &mut BlockCtx) {
        let sr = ctx.sample_rate;
        for (i, stream) in out.iter_mut().enumerate() {
            let mut ph = self.phases[i];
            let mut last = self.last[i];
            let buf = stream.samples_mut();
            for n in 0..buf.len() {
                let fb = self.feedback.at(inputs, i, n);
                let sample = (TAU * (ph + fb * last)).sin();
                last = sample;
                buf[n] = shape(sample, self.mul.at(inputs, i, n), self.add.at(inputs, i, n));
                ph = (ph + self.freq.at(inputs, i, n) / sr).rem_euclid(1.0);
            }
            self.phases[i] = ph;
            self.last[i] = last;
        }
    }

    fn set_param(&mut self, name: &str, value: Param) -> Result<(), NoSuchParam> {
        match name {
            "freq" => self.freq = value,
            "feedback" => self.feedback = value,
            "mul" => self.mul = value,
            "add" => self.add = value,
            _ => return Err(NoSuchParam),
        }
        Ok(())
    }

    fn controls(&self) -> Vec<ControlSpec> {
        vec![
            ControlSpec::new("freq", 20.0, 20_000.0, Scale::Log).with_units("Hz"),
            ControlSpec::new("feedback", 0.0, 1.0, Scale::Linear),
            ControlSpec::new("mul", 0.0, 1.0, Scale::Linear),
        ]
    }
}

/// White noise. Width follows `mul`/`add`, so `Noise::new().with_mul(amps)`
/// gives one independent noise stream per amplitude.
pub struct Noise {
    mul: Param,
    add: Param,
}

impl Noise {
    pub fn new() -> Self {
        Self {
            mul: Param::Constant(1.0),
            add: Param::Constant(0.0),
        }
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

impl Default for Noise {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalNode for Noise {
    fn params(&self) -> Vec<&Param> {
        vec![&self.mul, &self.add]
    }

    fn process_block(&mut self, inputs: &Inputs, out: &mut [Stream], ctx: &mut BlockCtx) {
        for (i, stream) in out.iter_mut().enumerate() {
            let buf = stream.samples_mut();
            for n in 0..buf.len() {
                let sample = ctx.rng.f32() * 2.0 - 1.0;
                buf[n] = shape(sample, self.mul.at(inputs, i, n), self.add.at(inputs, i, n));
            }
        }
    }

    fn set_param(&mut self, name: &str, value: Param) -> Result<(), NoSuchParam> {
        match name {
            "mul" => self.mul = value,
            "add" => self.add = value,
            _ => return Err(NoSuchParam),
        }
        Ok(())
    }
}

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Ramp,
    Square,
    Triangle,
}

/// Low-frequency oscillator for driving other nodes' parameters.
pub struct Lfo {
    wave: Waveform,
    freq: Param,
    mul: Param,
    add: Param,
    phases: Vec<f32>,
}

impl Lfo {
    fn new(wave: Waveform, freq: impl Into<Param>) -> Self {
        Self {
            wave,
            freq: freq.into(),
            mul: Param::Constant(1.0),
            add: Param::Constant(0.0),
            phases: Vec::new(),
        }
    }

    pub fn sine(freq: impl Into<Param>) -> Self {
        Self::new(Waveform::Sine, freq)
    }

    pub fn ramp(freq: impl Into<Param>) -> Self {
        Self::new(Waveform::Ramp, freq)
    }

    pub fn square(freq: impl Into<Param>) -> Self {
        Self::new(Waveform::Square, freq)
    }

    pub fn triangle(freq: impl Into<Param>) -> Self {
        Self::new(Waveform::Triangle, freq)
    }

    pub fn with_mul(mut self, mul: impl Into<Param>) -> Self {
        self.mul = mul.into();
        self
    }

    pub fn with_add(mut self, add: impl Into<Param>) -> Self {
        self.add = add.into();
        self
    }

    /// Scale the nominally [-1, 1] output onto `[min, max]`: the usual way
    /// to aim an LFO at a filter's frequency or Q.
    pub fn with_range(self, min: f32, max: f32) -> Self {
        let (mul, add) = amp_range(min, max);
        self.with_mul(mul).with_add(add)
    }
}

impl SignalNode for Lfo {
    fn params(&self) -> Vec<&Param> {
        vec![&self.freq, &self.mul, &self.add]
    }

    fn allocate(&mut self, width: usize, _sample_rate: f32) {
        self.phases = vec![0.0; width];
    }

    fn process_block(&mut self, inputs: &Inputs, out: &mut [Stream], ctx: &mut BlockCtx) {
        let sr = ctx.sample_rate;
        for (i, stream) in out.iter_mut().enumerate() {
            let mut ph = self.phases[i];
            let buf = stream.samples_mut();
            for n in 0..buf.len() {
                let sample = match self.wave {
                    Waveform::Sine => (TAU * ph).sin(),
                    Waveform::Ramp => 2.0 * ph - 1.0,
                    Waveform::Square => {
                        if ph < 0.5 {
                            1.0
                        } else {
                            -1.0
                        }
                    }
                    Waveform::Triangle => 1.0 - 4.0 * (ph - 0.5).abs(),
                };
                buf[n] = shape(sample, self.mul.at(inputs, i, n), self.add.at(inputs, i, n));
                ph = (ph + self.freq.at(inputs, i, n) / sr).rem_euclid(1.0);
            }
            self.phases[i] = ph;
        }
    }

    fn set_param(&mut self, name: &str, value: Param) -> Result<(), NoSuchParam> {
        match name {
            "freq" => self.freq = value,
            "mul" => self.mul = value,
            "add" => self.add = value,
            _ => return Err(NoSuchParam),
        }
        Ok(())
    }

    fn controls(&self) -> Vec<ControlSpec> {
        vec![
            ControlSpec::new("freq", 0.01, 20.0, Scale::Log).with_units("Hz"),
            ControlSpec::new("mul", 0.0, 1.0, Scale::Linear),
        ]
    }
}
