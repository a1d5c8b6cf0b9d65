use crate::graph::node::{shape, BlockCtx, Inputs, NoSuchParam, SignalNode};
use crate::param::Param;
use crate::stream::Stream;

/// MIDI note number to frequency, 12-tone equal temperament tuned to
/// A4 = 440 Hz. Fractional note numbers land between the keys, so a
/// ramping generator upstream glides in pitch rather than stepping.
pub struct MToF {
    pitch: Param,
    mul: Param,
    add: Param,
}

impl MToF {
    pub fn new(pitch: impl Into<Param>) -> Self {
        Self {
            pitch: pitch.into(),
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

/// The conversion itself, usable outside the graph.
pub fn midi_to_freq(note: f32) -> f32 {
    440.0 * 2f32.powf((note - 69.0) / 12.0)
}

impl SignalNode for MToF {
    fn params(&self) -> Vec<&Param> {
        vec![&self.pitch, &self.mul, &self.add]
    }

    fn process_block(&mut self, inputs: &Inputs, out: &mut [Stream], _ctx: &mut BlockCtx) {
        for (i, stream) in out.iter_mut().enumerate() {
            let buf = stream.samples_mut();
            for n in 0..buf.len() {
                let freq = midi_to_freq(self.pitch.at(inputs, i, n));
                buf[n] = shape(freq, self.mul.at(inputs, i, n), self.add.at(inputs, i, n));
            }
        }
    }

    fn set_param(&mut self, name: &str, value: Param) -> Result<(), NoSuchParam> {
        match name {
            "pitch" => self.pitch = value,
            "mul" => self.mul = value,
            "add" => self.add = value,
            _ => return Err(NoSuchParam),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Server, ServerConfig};
    use crate::graph::math::Sig;

    #[test]
    fn concert_pitch_and_octaves() {
        assert!((midi_to_freq(69.0) - 440.0).abs() < 1e-3);
        assert!((midi_to_freq(81.0) - 880.0).abs() < 1e-3);
        assert!((midi_to_freq(57.0) - 220.0).abs() < 1e-3);
        // Middle C.
        assert!((midi_to_freq(60.0) - 261.626).abs() < 1e-2);
    }

    #[test]
    fn converts_an_upstream_node_per_sample() {
        let mut s = Server::new(ServerConfig::default()).unwrap();
        s.start();
        let note = s.add(Sig::new(vec![69.0, 81.0])).unwrap();
        let freq = s.add(MToF::new(note)).unwrap();
        assert_eq!(s.width(freq), Some(2));
        s.tick();
        let bank = s.bank(freq).unwrap();
        assert!((bank[0].samples()[0] - 440.0).abs() < 1e-3);
        assert!((bank[1].samples()[0] - 880.0).abs() < 1e-3);
    }
}
