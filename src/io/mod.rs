//! The device boundary.
//!
//! The engine computes channel-separated blocks; audio devices want
//! interleaved frames in whatever callback size they choose. The
//! conversion lives here, and [`crate::engine::Server::render_interleaved`]
//! wraps it with block carry so a callback never has to care about the
//! engine's block size.

use crate::stream::Stream;

/// Interleave a channel-separated bank into `out`, frame-major:
/// `out[frame * channels + channel]`. `out` must hold exactly
/// `channels.len() * block_size` samples.
pub fn interleave(channels: &[Stream], out: &mut [f32]) {
    let width = channels.len();
    debug_assert_eq!(out.len(), width * channels.first().map_or(0, Stream::len));
    for (c, stream) in channels.iter().enumerate() {
        for (n, &sample) in stream.samples().iter().enumerate() {
            out[n * width + c] = sample;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_alternate_across_channels() {
        let mut left = Stream::new(3);
        let mut right = Stream::new(3);
        left.samples_mut().copy_from_slice(&[1.0, 2.0, 3.0]);
        right.samples_mut().copy_from_slice(&[10.0, 20.0, 30.0]);

        let mut out = [0.0f32; 6];
        interleave(&[left, right], &mut out);
        assert_eq!(out, [1.0, 10.0, 2.0, 20.0, 3.0, 30.0]);
    }

    #[test]
    fn mono_is_a_plain_copy() {
        let mut mono = Stream::new(2);
        mono.samples_mut().copy_from_slice(&[0.5, -0.5]);
        let mut out = [0.0f32; 2];
        interleave(&[mono], &mut out);
        assert_eq!(out, [0.5, -0.5]);
    }
}
