use crate::engine::NodeId;
use crate::graph::node::{shape, BlockCtx, Inputs, NoSuchParam, SignalNode};
use crate::param::Param;
use crate::stream::Stream;

/// Folds a wide node down to exactly `voices` streams: source stream `i`
/// lands in output stream `i % voices`, so a 40-stream additive bank
/// mixed to 1 is a mono sum and mixed to 2 interleaves the partials
/// across a stereo pair.
pub struct Mixer {
    source: NodeId,
    voices: usize,
    mul: Param,
    add: Param,
}

impl Mixer {
    pub fn new(source: NodeId, voices: usize) -> Self {
        Self {
            source,
            voices: voices.max(1),
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

impl SignalNode for Mixer {
    fn params(&self) -> Vec<&Param> {
        vec![&self.mul, &self.add]
    }

    fn inputs(&self) -> Vec<NodeId> {
        vec![self.source]
    }

    fn fixed_width(&self) -> Option<usize> {
        Some(self.voices)
    }

    fn process_block(&mut self, inputs: &Inputs, out: &mut [Stream], _ctx: &mut BlockCtx) {
        let source_width = inputs.width(self.source);
        for (j, stream) in out.iter_mut().enumerate() {
            let buf = stream.samples_mut();
            buf.fill(0.0);
            for i in (j..source_width).step_by(self.voices) {
                let src = inputs.stream(self.source, i);
                for n in 0..buf.len() {
                    buf[n] += src[n];
                }
            }
            for n in 0..buf.len() {
                buf[n] = shape(buf[n], self.mul.at(inputs, j, n), self.add.at(inputs, j, n));
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
    fn folds_streams_modulo_voices() {
        let mut s = server();
        let src = s.add(Sig::new(vec![1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
        let m = s.add(Mixer::new(src, 2)).unwrap();
        assert_eq!(s.width(m), Some(2));
        s.tick();
        let bank = s.bank(m).unwrap();
        // Streams 0, 2, 4 fold into voice 0; streams 1, 3 into voice 1.
        assert_eq!(bank[0].samples()[0], 9.0);
        assert_eq!(bank[1].samples()[0], 6.0);
    }

    #[test]
    fn mono_mix_sums_everything() {
        let mut s = server();
        let src = s.add(Sig::new(vec![0.1, 0.2, 0.3])).unwrap();
        let m = s.add(Mixer::new(src, 1).with_mul(0.5)).unwrap();
        s.tick();
        let x = s.bank(m).unwrap()[0].samples()[0];
        assert!((x - 0.3).abs() < 1e-6);
    }

    #[test]
    fn voices_wider_than_the_source_leave_silence() {
        let mut s = server();
        let src = s.add(Sig::new(vec![1.0, 2.0])).unwrap();
        let m = s.add(Mixer::new(src, 4)).unwrap();
        assert_eq!(s.width(m), Some(4));
        s.tick();
        let bank = s.bank(m).unwrap();
        assert_eq!(bank[2].samples()[0], 0.0);
        assert_eq!(bank[3].samples()[0], 0.0);
    }
}
