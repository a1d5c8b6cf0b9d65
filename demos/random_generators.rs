/// The control-rate random generators driving pitch: a Choice melody over
/// scale degrees, a Randi vibrato, and a SineLoop whose brightness drifts
/// with a Randh. Offline; prints the values the generators land on.

use polystream::engine::{Server, ServerConfig};
use polystream::graph::{Choice, MToF, Randh, Randi, SineLoop};

fn main() {
    println!("=== Random Generators (Offline) ===\n");

    let mut server = Server::new(ServerConfig {
        seed: 2024,
        ..ServerConfig::default()
    })
    .unwrap();

    // A minor pentatonic melody: Choice redraws a degree twice a second,
    // MToF turns it into Hz.
    let degrees = vec![57.0, 60.0, 62.0, 64.0, 67.0];
    let pitch = server.add(Choice::new(degrees.clone(), 2.0)).unwrap();
    let freq = server.add(MToF::new(pitch)).unwrap();

    // Randi adds a slow interpolated jitter of a few Hz on top.
    let jitter = server.add(Randi::new(-3.0, 3.0, 1.0)).unwrap();

    // Feedback sine as the voice; its feedback amount drifts between dull
    // and bright four times a second.
    let feedback = server.add(Randh::new(0.05, 0.25, 4.0)).unwrap();
    let sum = server
        .add(polystream::graph::Sum::new(vec![freq.into(), jitter.into()]))
        .unwrap();
    let voice = server.add(SineLoop::new(sum, feedback).with_mul(0.3)).unwrap();
    server.out(voice).unwrap();

    server.start();
    println!("Scale degrees: {:?}", degrees);
    println!("Seed: 2024 (rerun and the melody repeats exactly)\n");

    for second in 0..4 {
        // 44100 / 256 is about 172 blocks per second.
        for _ in 0..172 {
            server.tick();
        }
        let degree = server.bank(pitch).unwrap()[0].samples()[0];
        let hz = server.bank(freq).unwrap()[0].samples()[0];
        let fb = server.bank(feedback).unwrap()[0].samples()[0];
        println!(
            "t={}s  degree {:>4.1}  ({:>6.1} Hz)  feedback {:.3}",
            second + 1,
            degree,
            hz,
            fb
        );
    }

    println!("\nEvery draw comes from one seeded source on the sample clock,");
    println!("so the whole session replays from the seed alone.");
}
