//! Benchmarks for the per-block graph walk.
//!
//! Run with: cargo bench
//!
//! One tick must comfortably beat the block deadline. Reference timing at
//! 48kHz sample rate:
//!   - 64 samples  = 1.33ms deadline
//!   - 128 samples = 2.67ms deadline
//!   - 256 samples = 5.33ms deadline
//!   - 512 samples = 10.67ms deadline

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use polystream::engine::{Server, ServerConfig};
use polystream::graph::{Choice, Filt, Lfo, MToF, Mixer, Noise, Sine};

/// Common buffer sizes used in audio applications.
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

fn server(block_size: usize) -> Server {
    let mut s = Server::new(ServerConfig {
        sample_rate: 48_000.0,
        block_size,
        channels: 2,
        seed: 0,
    })
    .unwrap();
    s.start();
    s
}

/// 40-partial additive bank folded to stereo: the expansion-heavy case.
fn bench_additive(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/additive_40");
    for &size in BLOCK_SIZES {
        let mut s = server(size);
        let harms: Vec<f32> = (0..40).map(|n| 100.0 * (n + 1) as f32).collect();
        let amps: Vec<f32> = (0..40).map(|n| 0.3 / (n + 1) as f32).collect();
        let bank = s.add(Sine::new(harms).with_mul(amps)).unwrap();
        let stereo = s.add(Mixer::new(bank, 2)).unwrap();
        s.out(stereo).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                black_box(s.tick());
            })
        });
    }
    group.finish();
}

/// Melody patch: random pitch, converter, oscillator, swept filter.
fn bench_melody_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/melody_chain");
    for &size in BLOCK_SIZES {
        let mut s = server(size);
        let pitch = s.add(Choice::new(vec![60.0, 62.0, 64.0, 67.0], 4.0)).unwrap();
        let freq = s.add(MToF::new(pitch)).unwrap();
        let voice = s.add(Sine::new(freq).with_mul(0.3)).unwrap();
        let cutoff = s.add(Lfo::sine(0.5).with_range(400.0, 4000.0)).unwrap();
        let filtered = s.add(Filt::lowpass(voice, cutoff, 2.0)).unwrap();
        s.out(filtered).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                black_box(s.tick());
            })
        });
    }
    group.finish();
}

/// Seeded noise into per-stream biquads, the state-heavy case.
fn bench_filtered_noise(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/filtered_noise_8");
    for &size in BLOCK_SIZES {
        let mut s = server(size);
        let amps = vec![0.2f32; 8];
        let noise = s.add(Noise::new().with_mul(amps)).unwrap();
        let banded = s.add(Filt::bandpass(noise, 800.0, 6.0)).unwrap();
        let stereo = s.add(Mixer::new(banded, 2)).unwrap();
        s.out(stereo).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                black_box(s.tick());
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_additive, bench_melody_chain, bench_filtered_noise);
criterion_main!(benches);
