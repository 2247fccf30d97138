/// Cadence - terminal audio player
use anyhow::Context;
use cadence_cli::{
    commands::Command,
    config::CliConfig,
    render::spawn_printer,
    session::{add_files, execute, Flow},
};
use cadence_desktop::CpalSinkFactory;
use cadence_playback::memory::NullSinkFactory;
use cadence_playback::{PlaybackController, SinkFactory};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Queued audio player driven from stdin", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    /// Start with loop enabled
    #[arg(long = "loop")]
    looping: bool,

    /// Start with shuffle enabled
    #[arg(long)]
    shuffle: bool,

    /// Discard audio instead of opening the output device
    #[arg(long)]
    null_audio: bool,

    /// Audio files to queue
    files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref()).context("loading configuration")?;
    config.playback.looping |= cli.looping;
    config.playback.shuffle |= cli.shuffle;
    config.audio.null_output |= cli.null_audio;
    config.validate()?;

    // Initialize tracing (stderr, stdout carries player output)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    tracing::info!("Starting Cadence");

    let sinks = sink_factory(&config);
    let (mut controller, events) = PlaybackController::new(config.playback_config(), sinks);
    let printer = spawn_printer(events, io::stdout()).context("starting event printer")?;

    let added = add_files(&controller, &cli.files);
    if added > 0 {
        controller.play_at(0)?;
    }

    println!("Type 'help' for commands.");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let result = line
            .parse::<Command>()
            .and_then(|command| execute(&mut controller, command, &mut io::stdout()));
        match result {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => println!("  error: {}", e),
        }
        io::stdout().flush()?;
    }

    // Dropping the controller closes the event channel and ends the printer
    controller.shutdown();
    drop(controller);
    if printer.join().is_err() {
        tracing::warn!("Event printer panicked");
    }

    tracing::info!("Cadence stopped");
    Ok(())
}

/// Output device, or a paced null sink when there is none
fn sink_factory(config: &CliConfig) -> Arc<dyn SinkFactory> {
    if config.audio.null_output {
        return Arc::new(NullSinkFactory::paced());
    }

    match CpalSinkFactory::probe_device() {
        Ok(()) => Arc::new(CpalSinkFactory::new(config.audio.buffer_frames)),
        Err(e) => {
            tracing::warn!("{}; discarding audio", e);
            Arc::new(NullSinkFactory::paced())
        }
    }
}
