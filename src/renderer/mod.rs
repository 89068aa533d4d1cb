//! Per-frame painters.
//!
//! A renderer owns its layout cache (column envelope, bar width) and paints
//! one frame from a [`PlaybackView`]. It never changes playback state.

mod spectrum;
mod waveform;

pub use spectrum::{Bar, BarPainter, MirroredBars, SpectrumRenderer};
pub use waveform::WaveformRenderer;

use iced::Size;

use crate::audio::types::AudioData;
use crate::surface::Surface;
use crate::transport::PlaybackView;

pub trait Renderer {
    /// A new asset finished loading.
    fn load(&mut self, audio: &AudioData);

    /// The asset was dropped (a new load started).
    fn unload(&mut self);

    /// The drawing surface changed size. Layout must be current before the
    /// next `paint`.
    fn resize(&mut self, size: Size);

    fn paint(&mut self, view: &PlaybackView, surface: &mut dyn Surface);

    /// Whether pointer input on this renderer should seek.
    fn seekable(&self) -> bool {
        false
    }
}
