use crate::graph::node::{shape, BlockCtx, Inputs, NoSuchParam, SignalNode};
use crate::param::{ControlSpec, Param, Scale};
use crate::stream::Stream;

/*
Random Generators
=================

Control-rate sources that redraw at `freq` updates per second and either
hold or interpolate between draws. All draws come from the server's seeded
random source, so a session started from the same seed replays the same
"random" melody, sample for sample.

Choice    picks uniformly from a fixed candidate list; with a scale's MIDI
          degrees as candidates and an MToF downstream this is a random
          melody generator. One candidate set per stream turns the melody
          into random chords.
Randi     uniform in [min, max], linear ramp between draws
Randh     uniform in [min, max], held flat between draws
RandInt   integer draw in [0, max] inclusive, held; `add` shifts the
          register, e.g. `.with_add(60.0)` for MIDI around middle C

Redraw instants are computed on the absolute sample clock, so they fall on
exact samples regardless of block size and do not drift over long runs.
*/

/// Per-stream redraw scheduling shared by every generator. `next` is an
/// absolute sample index; the first block always draws because it starts
/// at zero.
struct UpdateClock {
    last: u64,
    next: u64,
    prev: f32,
    target: f32,
    primed: bool,
}

impl UpdateClock {
    fn new() -> Self {
        Self {
            last: 0,
            next: 0,
            prev: 0.0,
            target: 0.0,
            primed: false,
        }
    }

    fn due(&self, t: u64) -> bool {
        t >= self.next
    }

    /// Record a fresh draw at sample `t` and schedule the next one.
    fn advance(&mut self, t: u64, drawn: f32, freq: f32, sample_rate: f32) {
        self.prev = if self.primed { self.target } else { drawn };
        self.target = drawn;
        self.primed = true;
        self.last = t;
        let period = (sample_rate / freq.max(1e-4)).max(1.0) as u64;
        self.next = t + period;
    }

    /// Position within the current ramp, in [0, 1).
    fn ramp_frac(&self, t: u64) -> f32 {
        let span = self.next.saturating_sub(self.last).max(1);
        (t - self.last) as f32 / span as f32
    }
}

/// Uniform pick from a fixed list of candidate values, held until the next
/// redraw.
///
/// [`Choice::per_stream`] gives each stream its own candidate set, so the
/// streams together draw a random chord: one set of low degrees for a bass
/// stream, one of high degrees for a lead, each redrawing on its own clock.
pub struct Choice {
    sets: Vec<Vec<f32>>,
    freq: Param,
    mul: Param,
    add: Param,
    clocks: Vec<UpdateClock>,
}

impl Choice {
    /// One candidate set shared by every stream.
    pub fn new(choices: Vec<f32>, freq: impl Into<Param>) -> Self {
        Self::per_stream(vec![choices], freq)
    }

    /// One candidate set per stream, wrapping when the node expands wider
    /// than the number of sets. The set count itself drives expansion.
    pub fn per_stream(sets: Vec<Vec<f32>>, freq: impl Into<Param>) -> Self {
        Self {
            sets,
            freq: freq.into(),
            mul: Param::Constant(1.0),
            add: Param::Constant(0.0),
            clocks: Vec::new(),
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

impl SignalNode for Choice {
    fn params(&self) -> Vec<&Param> {
        vec![&self.freq, &self.mul, &self.add]
    }

    fn fan(&self) -> usize {
        self.sets.len().max(1)
    }

    fn allocate(&mut self, width: usize, _sample_rate: f32) {
        self.clocks = (0..width).map(|_| UpdateClock::new()).collect();
    }

    fn process_block(&mut self, inputs: &Inputs, out: &mut [Stream], ctx: &mut BlockCtx) {
        for (i, stream) in out.iter_mut().enumerate() {
            let clock = &mut self.clocks[i];
            let set = if self.sets.is_empty() {
                &[][..]
            } else {
                self.sets[i % self.sets.len()].as_slice()
            };
            let buf = stream.samples_mut();
            for n in 0..buf.len() {
                let t = ctx.start + n as u64;
                if clock.due(t) && !set.is_empty() {
                    let pick = set[ctx.rng.usize(0..set.len())];
                    clock.advance(t, pick, self.freq.at(inputs, i, n), ctx.sample_rate);
                }
                buf[n] = shape(
                    clock.target,
                    self.mul.at(inputs, i, n),
                    self.add.at(inputs, i, n),
                );
            }
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
        vec![ControlSpec::new("freq", 0.01, 100.0, Scale::Log).with_units("Hz")]
    }
}

/// Uniform values in `[min, max]` with a linear ramp between successive
/// draws.
pub struct Randi {
    min: Param,
    max: Param,
    freq: Param,
    mul: Param,
    add: Param,
    clocks: Vec<UpdateClock>,
}

impl Randi {
    pub fn new(min: impl Into<Param>, max: impl Into<Param>, freq: impl Into<Param>) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
            freq: freq.into(),
            mul: Param::Constant(1.0),
            add: Param::Constant(0.0),
            clocks: Vec::new(),
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

impl SignalNode for Randi {
    fn params(&self) -> Vec<&Param> {
        vec![&self.min, &self.max, &self.freq, &self.mul, &self.add]
    }

    fn allocate(&mut self, width: usize, _sample_rate: f32) {
        self.clocks = (0..width).map(|_| UpdateClock::new()).collect();
    }

    fn process_block(&mut self, inputs: &Inputs, out: &mut [Stream], ctx: &mut BlockCtx) {
        for (i, stream) in out.iter_mut().enumerate() {
            let clock = &mut self.clocks[i];
            let buf = stream.samples_mut();
            for n in 0..buf.len() {
                let t = ctx.start + n as u64;
                if clock.due(t) {
                    let lo = self.min.at(inputs, i, n);
                    let hi = self.max.at(inputs, i, n);
                    let drawn = lo + ctx.rng.f32() * (hi - lo);
                    clock.advance(t, drawn, self.freq.at(inputs, i, n), ctx.sample_rate);
                }
                let value = clock.prev + (clock.target - clock.prev) * clock.ramp_frac(t);
                buf[n] = shape(value, self.mul.at(inputs, i, n), self.add.at(inputs, i, n));
            }
        }
    }

    fn set_param(&mut self, name: &str, value: Param) -> Result<(), NoSuchParam> {
        match name {
            "min" => self.min = value,
            "max" => self.max = value,
            "freq" => self.freq = value,
            "mul" => self.mul = value,
            "add" => self.add = value,
            _ => return Err(NoSuchParam),
        }
        Ok(())
    }

    fn controls(&self) -> Vec<ControlSpec> {
        vec![ControlSpec::new("freq", 0.01, 100.0, Scale::Log).with_units("Hz")]
    }
}

/// Uniform values in `[min, max]`, held flat between draws.
pub struct Randh {
    min: Param,
    max: Param,
    freq: Param,
    mul: Param,
    add: Param,
    clocks: Vec<UpdateClock>,
}

impl Randh {
    pub fn new(min: impl Into<Param>, max: impl Into<Param>, freq: impl Into<Param>) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
            freq: freq.into(),
            mul: Param::Constant(1.0),
            add: Param::Constant(0.0),
            clocks: Vec::new(),
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

impl SignalNode for Randh {
    fn params(&self) -> Vec<&Param> {
        vec![&self.min, &self.max, &self.freq, &self.mul, &self.add]
    }

    fn allocate(&mut self, width: usize, _sample_rate: f32) {
        self.clocks = (0..width).map(|_| UpdateClock::new()).collect();
    }

    fn process_block(&mut self, inputs: &Inputs, out: &mut [Stream], ctx: &mut BlockCtx) {
        for (i, stream) in out.iter_mut().enumerate() {
            let clock = &mut self.clocks[i];
            let buf = stream.samples_mut();
            for n in 0..buf.len() {
                let t = ctx.start + n as u64;
                if clock.due(t) {
                    let lo = self.min.at(inputs, i, n);
                    let hi = self.max.at(inputs, i, n);
                    let drawn = lo + ctx.rng.f32() * (hi - lo);
                    clock.advance(t, drawn, self.freq.at(inputs, i, n), ctx.sample_rate);
                }
                buf[n] = shape(
                    clock.target,
                    self.mul.at(inputs, i, n),
                    self.add.at(inputs, i, n),
                );
            }
        }
    }

    fn set_param(&mut self, name: &str, value: Param) -> Result<(), NoSuchParam> {
        match name {
            "min" => self.min = value,
            "max" => self.max = value,
            "freq" => self.freq = value,
            "mul" => self.mul = value,
            "add" => self.add = value,
            _ => return Err(NoSuchParam),
        }
        Ok(())
    }

    fn controls(&self) -> Vec<ControlSpec> {
        vec![ControlSpec::new("freq", 0.01, 100.0, Scale::Log).with_units("Hz")]
    }
}

/// Integer draws in `[0, max]` inclusive, held between redraws. Combine
/// with `add` to shift the register and an [`crate::graph::mtof::MToF`]
/// downstream for random pitches.
pub struct RandInt {
    max: Param,
    freq: Param,
    mul: Param,
    add: Param,
    clocks: Vec<UpdateClock>,
}

impl RandInt {
    pub fn new(max: impl Into<Param>, freq: impl Into<Param>) -> Self {
        Self {
            max: max.into(),
            freq: freq.into(),
            mul: Param::Constant(1.0),
            add: Param::Constant(0.0),
            clocks: Vec::new(),
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

impl SignalNode for RandInt {
    fn params(&self) -> Vec<&Param> {
        vec![&self.max, &self.freq, &self.mul, &self.add]
    }

    fn allocate(&mut self, width: usize, _sample_rate: f32) {
        self.clocks = (0..width).map(|_| UpdateClock::new()).collect();
    }

    fn process_block(&mut self, inputs: &Inputs, out: &mut [Stream], ctx: &mut BlockCtx) {
        for (i, stream) in out.iter_mut().enumerate() {
            let clock = &mut self.clocks[i];
            let buf = stream.samples_mut();
            for n in 0..buf.len() {
                let t = ctx.start + n as u64;
                if clock.due(t) {
                    let hi = self.max.at(inputs, i, n).max(0.0) as i64;
                    let drawn = ctx.rng.i64(0..=hi) as f32;
                    clock.advance(t, drawn, self.freq.at(inputs, i, n), ctx.sample_rate);
                }
                buf[n] = shape(
                    clock.target,
                    self.mul.at(inputs, i, n),
                    self.add.at(inputs, i, n),
                );
            }
        }
    }

    fn set_param(&mut self, name: &str, value: Param) -> Result<(), NoSuchParam> {
        match name {
            "max" => self.max = value,
            "freq" => self.freq = value,
            "mul" => self.mul = value,
            "add" => self.add = value,
            _ => return Err(NoSuchParam),
        }
        Ok(())
    }

    fn controls(&self) -> Vec<ControlSpec> {
        vec![ControlSpec::new("freq", 0.01, 100.0, Scale::Log).with_units("Hz")]
    }
}
