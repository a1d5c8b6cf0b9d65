/// Builds a square-ish wave from odd harmonics with a single expanding
/// oscillator, then folds it to mono. Offline: prints widths and levels
/// instead of playing audio.

use polystream::engine::{Server, ServerConfig};
use polystream::graph::Sine;

fn main() {
    println!("=== Additive Square (Offline) ===\n");

    let mut server = Server::new(ServerConfig::default()).unwrap();

    // Odd harmonics of 100 Hz with 1/n amplitudes: ten partials from one
    // node, because list parameters expand.
    let fundamental = 100.0;
    let partials = 10;
    let harms: Vec<f32> = (0..partials)
        .map(|n| fundamental * (2 * n + 1) as f32)
        .collect();
    let amps: Vec<f32> = (0..partials)
        .map(|n| 0.33 / (2 * n + 1) as f32)
        .collect();

    println!("Harmonics: {:?}", harms);
    println!("Amplitudes: {:?}\n", amps);

    let bank = server.add(Sine::new(harms).with_mul(amps)).unwrap();
    println!("Oscillator bank width: {}", server.width(bank).unwrap());

    // Fold all ten partials into one stream and route it out.
    let mono = server.mix(bank, 1).unwrap();
    println!("Mixed width: {}", server.width(mono).unwrap());
    server.out(mono).unwrap();

    server.start();
    let mut peak = 0.0f32;
    let mut sum_sq = 0.0f64;
    let mut count = 0usize;
    for _ in 0..100 {
        let out = server.tick();
        for &x in out[0].samples() {
            peak = peak.max(x.abs());
            sum_sq += (x * x) as f64;
            count += 1;
        }
    }
    let rms = (sum_sq / count as f64).sqrt();

    println!("\nRendered 100 blocks:");
    println!("  Peak amplitude: {:.3}", peak);
    println!("  RMS level: {:.3}", rms);
    println!("\nOne node, ten streams, one mixer. That is the whole patch.");
}
