use chorus_core::{
    ChorusEngine, DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE_HZ, EngineConfig,
    Locale,
};
use chorus_player::{DeviceSelection, Player, StreamSettings};
use clap::Parser;
use std::io;

mod control;

#[derive(Parser)]
#[command(name = "chorus")]
#[command(
    about = "Real-time chorus effect from an audio input to an audio output, controlled from the terminal"
)]
struct Cli {
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE_HZ)]
    sample_rate: u32,
    /// Frames per processing block
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,
    #[arg(short, long, default_value_t = 2)]
    channels: u16,
    /// Label language (en or it)
    #[arg(short, long, default_value_t = Locale::English)]
    locale: Locale,
    #[arg(long)]
    input_device: Option<String>,
    #[arg(long)]
    output_device: Option<String>,
    /// Start with the chorus switched on
    #[arg(long)]
    enabled: bool,
    /// Print the available audio devices and exit
    #[arg(long)]
    list_devices: bool,
}

fn list_devices() -> anyhow::Result<()> {
    let devices = Player::list_devices()?;
    println!("input devices:");
    for name in devices.inputs {
        println!("  {name}");
    }
    println!("output devices:");
    for name in devices.outputs {
        println!("  {name}");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    if cli.list_devices {
        return list_devices();
    }
    let (mut engine, mut controller) = ChorusEngine::new(EngineConfig {
        sample_rate_hz: cli.sample_rate,
        block_size: cli.block_size,
        locale: cli.locale,
    })?;
    controller.set_enabled(cli.enabled);
    let player = Player::new(&DeviceSelection {
        input: cli.input_device,
        output: cli.output_device,
    })?;
    let channels = cli.channels as usize;
    let stream = player.open_stream(
        StreamSettings {
            sample_rate_hz: cli.sample_rate,
            channels: cli.channels,
            block_size: cli.block_size,
        },
        move |input, output, _num_frames, status| {
            if !status.is_empty() {
                log::warn!("audio: {status}");
            }
            engine.process_interleaved(input, channels, output, channels);
        },
    )?;
    stream.start()?;
    let result = control::run(&mut controller, io::stdin().lock(), io::stdout());
    stream.stop()?;
    result
}
