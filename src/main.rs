//! Waveslab player window.
//!
//! Set RUST_LOG=debug for verbose output.

use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;

use waveslab::app::{self, Options, ViewMode};
use waveslab::Config;

#[derive(Parser, Debug)]
#[command(name = "waveslab", version, about = "Audio player with waveform and spectrum views")]
struct Cli {
    /// File path or http(s) URL to load on startup
    url: Option<String>,

    /// JSON file with waveform/spectrum settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Visualizer to show
    #[arg(long, value_enum, default_value_t = ViewMode::Waveform)]
    view: ViewMode,
}

fn main() -> iced::Result {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    log::info!("waveslab v{} starting up", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{e}");
                std::process::exit(2);
            }
        },
        None => Config::default(),
    };

    app::run(Options {
        url: cli.url,
        config,
        view: cli.view,
    })
}
