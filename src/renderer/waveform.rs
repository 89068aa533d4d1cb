use iced::Size;

use super::Renderer;
use crate::audio::types::AudioData;
use crate::config::WaveformConfig;
use crate::error::Result;
use crate::surface::Surface;
use crate::transport::PlaybackView;
use crate::waveform_cache::{build_envelope, column_count, Peak};

/// Static waveform: one bar per column, colored by playback progress, plus a cursor.
pub struct WaveformRenderer {
    config: WaveformConfig,
    /// Channel 0 of the loaded asset.
    samples: Vec<f32>,
    size: Size,
    envelope: Vec<Peak>,
}

impl WaveformRenderer {
    pub fn new(config: WaveformConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            samples: Vec::new(),
            size: Size::ZERO,
            envelope: Vec::new(),
        })
    }

    pub fn config(&self) -> &WaveformConfig {
        &self.config
    }

    /// The render buffer: one entry per drawable column.
    pub fn envelope(&self) -> &[Peak] {
        &self.envelope
    }

    fn rebuild(&mut self) {
        if self.samples.is_empty() {
            self.envelope.clear();
            return;
        }
        let columns = column_count(self.size.width, self.config.column_stride());
        self.envelope = build_envelope(&self.samples, columns, self.config.fidelity);
        log::debug!(
            "Waveform envelope rebuilt: {columns} columns for {:.0}px",
            self.size.width
        );
    }
}

impl Renderer for WaveformRenderer {
    fn load(&mut self, audio: &AudioData) {
        self.samples = audio.channel(0);
        self.rebuild();
    }

    fn unload(&mut self) {
        self.samples = Vec::new();
        self.envelope.clear();
    }

    fn resize(&mut self, size: Size) {
        let width_changed = size.width != self.size.width;
        self.size = size;
        if width_changed {
            self.rebuild();
        }
    }

    fn paint(&mut self, view: &PlaybackView, surface: &mut dyn Surface) {
        surface.clear();
        if self.envelope.is_empty() || view.duration <= 0.0 {
            return;
        }

        let Size { width, height } = self.size;
        let mid = height / 2.0;
        let scale = self.config.amplitude * height / 2.0;
        let stride = self.config.column_stride();

        for (i, peak) in self.envelope.iter().enumerate() {
            let x = i as f32 * stride;
            let column_time = x as f64 / width as f64 * view.duration;
            let color = if column_time <= view.playback_time {
                self.config.progression_color.0
            } else {
                self.config.main_color.0
            };
            let bar_height = (peak.amplitude() * scale).max(1.0);
            surface.fill_rect(x, mid - peak.max * scale, self.config.bar_size, bar_height, color);
        }

        let cursor_x = view.progress() as f32 * width;
        surface.fill_rect(
            cursor_x,
            mid - scale,
            self.config.cursor_size,
            2.0 * scale,
            self.config.cursor_color.0,
        );
    }

    fn seekable(&self) -> bool {
        true
    }
}
