//! Block buffers.
//!
//! A [`Stream`] is one audio-rate channel of samples: a fixed-length block of
//! `f32` owned by the node that produces it and rewritten in place once per
//! tick. Consumers never hold a reference across ticks; they read the current
//! block through the graph's input accessor while the producer is guaranteed
//! to have finished writing it.

/// One audio-rate channel of samples for a single block.
#[derive(Debug, Clone)]
pub struct Stream {
    samples: Vec<f32>,
}

impl Stream {
    /// A silent block of `block_size` samples.
    pub fn new(block_size: usize) -> Self {
        Self {
            samples: vec![0.0; block_size],
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Reset the block to silence.
    pub fn clear(&mut self) {
        self.samples.fill(0.0);
    }

    /// Add another block into this one, sample by sample.
    ///
    /// The shorter length wins when the blocks disagree, which only happens
    /// if callers mix streams from servers with different block sizes.
    pub fn accumulate(&mut self, other: &[f32]) {
        for (dst, src) in self.samples.iter_mut().zip(other) {
            *dst += src;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stream_is_silent() {
        let s = Stream::new(64);
        assert_eq!(s.len(), 64);
        assert!(s.samples().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn accumulate_sums_elementwise() {
        let mut a = Stream::new(4);
        a.samples_mut().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        a.accumulate(&[0.5, 0.5, 0.5, 0.5]);
        assert_eq!(a.samples(), &[1.5, 2.5, 3.5, 4.5]);
    }

    #[test]
    fn clear_resets_to_silence() {
        let mut s = Stream::new(8);
        s.samples_mut().fill(0.7);
        s.clear();
        assert!(s.samples().iter().all(|&x| x == 0.0));
    }
}
