use iced::Size;

use super::Renderer;
use crate::audio::analyzer::{SpectralAnalyzer, SpectrumSource};
use crate::audio::types::AudioData;
use crate::config::SpectrumConfig;
use crate::error::{Error, Result};
use crate::surface::Surface;
use crate::transport::PlaybackView;

/// One displayed bin, laid out for painting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub index: usize,
    pub x: f32,
    pub width: f32,
    /// Magnitude in `[0, 1]`.
    pub level: f32,
    /// Half the surface height; bars grow away from this line.
    pub half_height: f32,
}

/// Draws a single bar. Swap it out to restyle the chart without replacing
/// the layout or the analyzer plumbing.
pub trait BarPainter {
    fn paint_bar(&mut self, bar: &Bar, config: &SpectrumConfig, surface: &mut dyn Surface);
}

impl<F> BarPainter for F
where
    F: FnMut(&Bar, &SpectrumConfig, &mut dyn Surface),
{
    fn paint_bar(&mut self, bar: &Bar, config: &SpectrumConfig, surface: &mut dyn Surface) {
        self(bar, config, surface)
    }
}

/// Default style: a bar above the midline in `main_color` and its mirror
/// below in `bottom_color`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MirroredBars;

impl BarPainter for MirroredBars {
    fn paint_bar(&mut self, bar: &Bar, config: &SpectrumConfig, surface: &mut dyn Surface) {
        let level = bar.level * bar.half_height;
        let top = level * config.amplitude;
        surface.fill_rect(bar.x, bar.half_height - top, bar.width, top, config.main_color.0);
        surface.fill_rect(
            bar.x,
            bar.half_height.floor(),
            bar.width,
            level * config.bottom_amplitude(),
            config.bottom_color(),
        );
    }
}

/// Live spectrum: one bar per bin up to the hertz ceiling, mirrored by default.
pub struct SpectrumRenderer<S = SpectralAnalyzer> {
    config: SpectrumConfig,
    source: S,
    painter: Box<dyn BarPainter>,
    snapshot: Vec<u8>,
    /// Bins actually drawn, from 0 Hz up to the configured ceiling.
    displayed: usize,
    bar_width: f32,
    size: Size,
}

impl SpectrumRenderer<SpectralAnalyzer> {
    /// Renderer backed by a fresh analyzer sized from `config`.
    pub fn with_analyzer(config: SpectrumConfig) -> Result<Self> {
        config.validate()?;
        let analyzer = SpectralAnalyzer::with_exponent(config.fft_exponent)?;
        Self::new(config, analyzer)
    }
}

impl<S: SpectrumSource> SpectrumRenderer<S> {
    pub fn new(config: SpectrumConfig, source: S) -> Result<Self> {
        config.validate()?;
        let bins = source.bin_count();
        if bins != config.fft_size() / 2 {
            return Err(Error::Configuration(format!(
                "analyzer has {bins} bins, config expects {}",
                config.fft_size() / 2
            )));
        }

        let displayed = ((bins as f32 * config.hertz_ceiling).floor() as usize).clamp(1, bins);
        let bar_width = config.bar_width.unwrap_or(0.0);
        Ok(Self {
            config,
            source,
            painter: Box::new(MirroredBars),
            snapshot: vec![0; bins],
            displayed,
            bar_width,
            size: Size::ZERO,
        })
    }

    /// Replace how each bar is drawn.
    pub fn with_bar_painter(mut self, painter: impl BarPainter + 'static) -> Self {
        self.painter = Box::new(painter);
        self
    }

    pub fn displayed_bins(&self) -> usize {
        self.displayed
    }

    pub fn bar_width(&self) -> f32 {
        self.bar_width
    }

    /// Magnitudes pulled during the last paint.
    pub fn snapshot(&self) -> &[u8] {
        &self.snapshot
    }
}

impl<S: SpectrumSource> Renderer for SpectrumRenderer<S> {
    // The spectrum works from the live analyzer, not from decoded samples.
    fn load(&mut self, _audio: &AudioData) {}

    fn unload(&mut self) {}

    fn resize(&mut self, size: Size) {
        self.size = size;
        if self.config.bar_width.is_none() {
            self.bar_width = size.width / self.displayed as f32;
        }
    }

    fn paint(&mut self, _view: &PlaybackView, surface: &mut dyn Surface) {
        self.source.byte_frequency_data(&mut self.snapshot);
        surface.clear();

        let half_height = self.size.height / 2.0;
        let mut x = 0.0;
        for (index, &byte) in self.snapshot[..self.displayed].iter().enumerate() {
            let bar = Bar {
                index,
                x,
                width: self.bar_width,
                level: byte as f32 / 255.0,
                half_height,
            };
            self.painter.paint_bar(&bar, &self.config, surface);
            x += self.bar_width + self.config.spacing;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HexColor;
    use crate::surface::Scene;

    /// Source that returns a fixed ramp and counts how often it was asked.
    struct Fixed {
        bins: usize,
        pulls: usize,
    }

    impl SpectrumSource for Fixed {
        fn bin_count(&self) -> usize {
            self.bins
        }

        fn byte_frequency_data(&mut self, out: &mut [u8]) {
            self.pulls += 1;
            for (i, b) in out.iter_mut().take(self.bins).enumerate() {
                *b = if i % 2 == 0 { 255 } else { 0 };
            }
        }
    }

    fn config() -> SpectrumConfig {
        SpectrumConfig {
            fft_exponent: 5,
            amplitude: 1.0,
            bottom_amplitude: Some(0.5),
            spacing: 1.0,
            bottom_color: HexColor::parse("#ff0000"),
            ..Default::default()
        }
    }

    fn renderer(config: SpectrumConfig) -> SpectrumRenderer<Fixed> {
        SpectrumRenderer::new(config, Fixed { bins: 16, pulls: 0 }).unwrap()
    }

    #[test]
    fn bin_count_must_match_window() {
        let err = SpectrumRenderer::new(config(), Fixed { bins: 8, pulls: 0 });
        assert!(matches!(err, Err(Error::Configuration(_))));
    }

    #[test]
    fn hertz_ceiling_limits_displayed_bins() {
        let r = renderer(SpectrumConfig {
            hertz_ceiling: 0.5,
            ..config()
        });
        assert_eq!(r.displayed_bins(), 8);

        let r = renderer(SpectrumConfig {
            hertz_ceiling: 0.01,
            ..config()
        });
        assert_eq!(r.displayed_bins(), 1);
    }

    #[test]
    fn derived_bar_width_tracks_resize() {
        let mut r = renderer(config());
        r.resize(Size::new(160.0, 100.0));
        assert_eq!(r.bar_width(), 10.0);
        r.resize(Size::new(320.0, 100.0));
        assert_eq!(r.bar_width(), 20.0);
        assert_eq!(r.displayed_bins(), 16);
    }

    #[test]
    fn fixed_bar_width_survives_resize() {
        let mut r = renderer(SpectrumConfig {
            bar_width: Some(3.0),
            ..config()
        });
        r.resize(Size::new(500.0, 100.0));
        assert_eq!(r.bar_width(), 3.0);
    }

    #[test]
    fn paints_mirrored_pairs() {
        let mut r = renderer(config());
        r.resize(Size::new(160.0, 100.0));
        let mut scene = Scene::new(Size::new(160.0, 100.0));

        r.paint(&PlaybackView::default(), &mut scene);

        // Eight loud bins, each a top and a bottom bar; silent bins draw nothing.
        let rects = scene.rects();
        assert_eq!(rects.len(), 16);

        let top = rects[0];
        assert_eq!(top.bounds.x, 0.0);
        assert_eq!(top.bounds.y, 0.0);
        assert_eq!(top.bounds.height, 50.0);
        assert_eq!(top.color, r.config.main_color.0);

        let bottom = rects[1];
        assert_eq!(bottom.bounds.y, 50.0);
        assert_eq!(bottom.bounds.height, 25.0);
        assert_eq!(bottom.color.into_rgba8(), [255, 0, 0, 255]);

        // Second loud bin is bin 2: x = 2 * (10 + 1).
        assert_eq!(rects[2].bounds.x, 22.0);
    }

    #[test]
    fn custom_bar_painter_replaces_style_but_keeps_layout() {
        let mut r = renderer(config()).with_bar_painter(
            |bar: &Bar, _: &SpectrumConfig, surface: &mut dyn Surface| {
                let height = bar.level * bar.half_height * 2.0;
                let bottom = 2.0 * bar.half_height;
                surface.fill_rect(bar.x, bottom - height, bar.width, height, iced::Color::WHITE);
            },
        );
        r.resize(Size::new(160.0, 100.0));
        let mut scene = Scene::new(Size::new(160.0, 100.0));

        r.paint(&PlaybackView::default(), &mut scene);

        // One full-height bar per loud bin, no mirror.
        let rects = scene.rects();
        assert_eq!(rects.len(), 8);
        assert_eq!(rects[0].bounds.y, 0.0);
        assert_eq!(rects[0].bounds.height, 100.0);
        assert_eq!(rects[1].bounds.x, 22.0);
        assert_eq!(rects[1].color, iced::Color::WHITE);
    }

    #[test]
    fn pulls_a_fresh_snapshot_every_paint() {
        let mut r = renderer(config());
        r.resize(Size::new(160.0, 100.0));
        let mut scene = Scene::new(Size::new(160.0, 100.0));
        for _ in 0..3 {
            r.paint(&PlaybackView::default(), &mut scene);
        }
        assert_eq!(r.source.pulls, 3);
        assert_eq!(r.snapshot()[0], 255);
    }

    #[test]
    fn with_analyzer_sizes_from_config() {
        let r = SpectrumRenderer::with_analyzer(SpectrumConfig::default()).unwrap();
        assert_eq!(r.snapshot().len(), 128);
        assert!(SpectrumRenderer::with_analyzer(SpectrumConfig {
            fft_exponent: 20,
            ..Default::default()
        })
        .is_err());
    }
}
