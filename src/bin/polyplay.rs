//! polyplay - play a small generative patch on the default output device

use std::sync::{Arc, Mutex};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use polystream::engine::{Server, ServerConfig};
use polystream::graph::{Choice, MToF, Randh, Sine};

fn main() -> EyreResult<()> {
    color_eyre::install()?;

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;

    println!("=== polyplay ===");
    println!("Sample rate: {} Hz", sample_rate);
    println!("Channels: {}", channels);

    let mut server = Server::new(ServerConfig {
        sample_rate,
        channels,
        ..ServerConfig::default()
    })?;

    // A random pentatonic melody over a slowly drifting drone. The Choice
    // generator redraws four degrees per second; fractional note numbers
    // from the drifting Randh give the drone a slow detune wobble.
    let degrees = vec![60.0, 62.0, 65.0, 67.0, 69.0, 72.0];
    let melody_pitch = server.add(Choice::new(degrees, 4.0))?;
    let melody_freq = server.add(MToF::new(melody_pitch))?;
    let melody = server.add(Sine::new(melody_freq).with_mul(vec![0.2, 0.15]))?;
    server.out(melody)?;

    let drone_pitch = server.add(Randh::new(47.7, 48.3, 0.3))?;
    let drone_freq = server.add(MToF::new(drone_pitch))?;
    let drone = server.add(Sine::new(drone_freq).with_mul(0.1))?;
    server.out(drone)?;

    server.start();
    let server = Arc::new(Mutex::new(server));

    let state = Arc::clone(&server);
    let stream = device
        .build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let mut server = state.lock().unwrap();
                server.render_interleaved(data);
            },
            |err| eprintln!("stream error: {err}"),
            None,
        )
        .wrap_err("failed to build output stream")?;
    stream.play().wrap_err("failed to start output stream")?;

    println!("Playing... Press Ctrl+C to stop");
    loop {
        std::thread::sleep(std::time::Duration::from_secs(1));
    }
}
