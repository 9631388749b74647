//! retimbre - play a recording and hear its melody re-synthesized
//!
//! Run with: cargo run -- path/to/voice.wav --instrument flute

mod app;
mod ui;

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Mutex,
};

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use retimbre::{
    config::{PipelineConfig, DEFAULT_WINDOW_SIZE},
    runtime::{CpalOutput, PreviewPlayer, TransportController},
    synth::Instrument,
};
use tracing_subscriber::EnvFilter;

use app::App;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Follow the pitch of a recording and play it back with a chosen timbre"
)]
struct Args {
    /// Audio file to load on startup (wav, flac, ogg, mp3, ...)
    file: Option<PathBuf>,

    /// Instrument for the tracking voice
    #[arg(short, long, default_value_t = Instrument::Piano)]
    instrument: Instrument,

    /// Analysis window in samples
    #[arg(short, long, default_value_t = DEFAULT_WINDOW_SIZE)]
    window: usize,

    /// Write tracing output to this file (RUST_LOG controls the filter)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        init_tracing(path)?;
    }

    let config = PipelineConfig::new()
        .window_size(args.window)
        .instrument(args.instrument);
    let output = CpalOutput::new().wrap_err("failed to open the default audio output")?;
    let transport =
        TransportController::new(output, config).wrap_err("invalid pipeline configuration")?;

    let preview = CpalOutput::new().wrap_err("failed to open the preview audio output")?;

    let mut app = App::new(transport, PreviewPlayer::new(preview));
    if let Some(path) = args.file {
        app.open(path);
    }

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();
    result
}

/// Log to a file; the terminal belongs to the UI.
fn init_tracing(path: &Path) -> EyreResult<()> {
    let file = File::create(path)
        .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
