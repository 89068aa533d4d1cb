//! Waveslab: an audio player widget with two visualizers, a seekable
//! waveform and a live frequency spectrum, driven by one playback transport.

pub mod app;
pub mod audio;
pub mod config;
pub mod error;
pub mod render_loop;
pub mod renderer;
pub mod seek;
pub mod surface;
pub mod transport;
pub mod ui;
pub mod visualizer;
pub mod waveform_cache;

pub use config::{Config, SpectrumConfig, WaveformConfig};
pub use error::{Error, Result};
pub use renderer::{Renderer, SpectrumRenderer, WaveformRenderer};
pub use transport::{Transport, TransportEvent, TransportState};
pub use visualizer::Visualizer;
