use std::f32::consts::TAU;

use crate::graph::node::{shape, BlockCtx, Inputs, NoSuchParam, SignalNode};
use crate::param::{ControlSpec, Param, Scale};
use crate::stream::Stream;

/*
Biquad Filter
=============

Second-order filter with the standard audio-cookbook lowpass, highpass,
and bandpass responses. `freq` and `q` accept nodes, so an LFO sweeping
the cutoff is just another wiring; coefficients are refreshed once per
block from the values at the block's first frame, which keeps sweeps
smooth at typical block sizes without a per-sample trig call.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiltMode {
    Lowpass,
    Highpass,
    Bandpass,
}

/// Per-stream direct-form-I state and coefficients.
#[derive(Clone, Copy, Default)]
struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    fn retune(&mut self, mode: FiltMode, freq: f32, q: f32, sample_rate: f32) {
        let freq = freq.clamp(1.0, 0.49 * sample_rate);
        let q = q.max(0.05);
        let w0 = TAU * freq / sample_rate;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * q);
        let a0 = 1.0 + alpha;
        let (b0, b1, b2) = match mode {
            FiltMode::Lowpass => {
                let b1 = 1.0 - cos;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            FiltMode::Highpass => {
                let b1 = -(1.0 + cos);
                (-b1 / 2.0, b1, -b1 / 2.0)
            }
            FiltMode::Bandpass => (alpha, 0.0, -alpha),
        };
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = -2.0 * cos / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    fn run(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

/// Second-order lowpass/highpass/bandpass filter.
pub struct Filt {
    input: Param,
    freq: Param,
    q: Param,
    mode: FiltMode,
    mul: Param,
    add: Param,
    state: Vec<Biquad>,
}

impl Filt {
    fn new(input: impl Into<Param>, freq: impl Into<Param>, q: impl Into<Param>, mode: FiltMode) -> Self {
        Self {
            input: input.into(),
            freq: freq.into(),
            q: q.into(),
            mode,
            mul: Param::Constant(1.0),
            add: Param::Constant(0.0),
            state: Vec::new(),
        }
    }

    pub fn lowpass(input: impl Into<Param>, freq: impl Into<Param>, q: impl Into<Param>) -> Self {
        Self::new(input, freq, q, FiltMode::Lowpass)
    }

    pub fn highpass(input: impl Into<Param>, freq: impl Into<Param>, q: impl Into<Param>) -> Self {
        Self::new(input, freq, q, FiltMode::Highpass)
    }

    pub fn bandpass(input: impl Into<Param>, freq: impl Into<Param>, q: impl Into<Param>) -> Self {
        Self::new(input, freq, q, FiltMode::Bandpass)
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

impl SignalNode for Filt {
    fn params(&self) -> Vec<&Param> {
        vec![&self.input, &self.freq, &self.q, &self.mul, &self.add]
    }

    fn allocate(&mut self, width: usize, _sample_rate: f32) {
        self.state = vec![Biquad::default(); width];
    }

    fn process_block(&mut self, inputs: &Inputs, out: &mut [Stream], ctx: &mut BlockCtx) {
        for (i, stream) in out.iter_mut().enumerate() {
            let biquad = &mut self.state[i];
            biquad.retune(
                self.mode,
                self.freq.at(inputs, i, 0),
                self.q.at(inputs, i, 0),
                ctx.sample_rate,
            );
            let buf = stream.samples_mut();
            for n in 0..buf.len() {
                let filtered = biquad.run(self.input.at(inputs, i, n));
                buf[n] = shape(filtered, self.mul.at(inputs, i, n), self.add.at(inputs, i, n));
            }
        }
    }

    fn set_param(&mut self, name: &str, value: Param) -> Result<(), NoSuchParam> {
        match name {
            "input" => self.input = value,
            "freq" => self.freq = value,
            "q" => self.q = value,
            "mul" => self.mul = value,
            "add" => self.add = value,
            _ => return Err(NoSuchParam),
        }
        Ok(())
    }

    fn controls(&self) -> Vec<ControlSpec> {
        vec![
            ControlSpec::new("freq", 20.0, 20_000.0, Scale::Log).with_units("Hz"),
            ControlSpec::new("q", 0.1, 20.0, Scale::Log),
        ]
    }
}
