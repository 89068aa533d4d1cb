//! Construction parameters for the two renderers.
//!
//! Everything has a default, so a config file only needs the fields it
//! changes:
//!
//! ```json
//! { "waveform": { "bar_size": 3, "progression_color": "#ff8800" },
//!   "spectrum": { "fft_exponent": 10, "hertz_ceiling": 0.5 } }
//! ```

use std::fmt;
use std::path::Path;

use iced::Color;
use serde::{Deserialize, Serialize};

use crate::audio::analyzer::{MAX_FFT_EXPONENT, MIN_FFT_EXPONENT};
use crate::error::{Error, Result};

/// `#rrggbb` / `#rrggbbaa` color.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(pub Color);

impl HexColor {
    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(HexColor(Color::from_rgb8(byte(0)?, byte(2)?, byte(4)?))),
            8 => Some(HexColor(Color::from_rgba8(
                byte(0)?,
                byte(2)?,
                byte(4)?,
                byte(6)? as f32 / 255.0,
            ))),
            _ => None,
        }
    }
}

impl TryFrom<String> for HexColor {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        HexColor::parse(&value).ok_or_else(|| format!("invalid color {value:?}"))
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.to_string()
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0.into_rgba8();
        if a == 255 {
            write!(f, "#{r:02x}{g:02x}{b:02x}")
        } else {
            write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

fn hex(s: &str) -> HexColor {
    HexColor::parse(s).unwrap_or(HexColor(Color::WHITE))
}

/// How the waveform envelope summarizes each column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fidelity {
    /// Min/max of every sample in the column.
    #[default]
    Peaks,
    /// One sample per column, drawn symmetrically around the midline.
    Sampled,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformConfig {
    /// Bar width in pixels.
    pub bar_size: f32,
    /// Gap between bars in pixels.
    pub spacing: f32,
    /// Fraction of the surface height a full-scale column may cover.
    pub amplitude: f32,
    pub cursor_size: f32,
    pub main_color: HexColor,
    pub progression_color: HexColor,
    pub cursor_color: HexColor,
    pub fidelity: Fidelity,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            bar_size: 5.0,
            spacing: 1.0,
            amplitude: 1.0,
            cursor_size: 2.0,
            main_color: hex("#ffffff"),
            progression_color: hex("#869aba"),
            cursor_color: hex("#ffffff"),
            fidelity: Fidelity::Peaks,
        }
    }
}

impl WaveformConfig {
    /// Horizontal distance between the left edges of two adjacent columns.
    pub fn column_stride(&self) -> f32 {
        self.bar_size + self.spacing
    }

    pub fn validate(&self) -> Result<()> {
        positive("bar_size", self.bar_size)?;
        non_negative("spacing", self.spacing)?;
        unit("amplitude", self.amplitude)?;
        non_negative("cursor_size", self.cursor_size)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumConfig {
    /// Fixed bar width; derived from the surface width when unset.
    pub bar_width: Option<f32>,
    pub amplitude: f32,
    /// Height factor of the lower half. Falls back to `amplitude`.
    pub bottom_amplitude: Option<f32>,
    /// Window size is `2^fft_exponent` samples.
    pub fft_exponent: u32,
    pub spacing: f32,
    /// Fraction of the bins (from 0 Hz up to Nyquist) that get drawn.
    pub hertz_ceiling: f32,
    pub main_color: HexColor,
    /// Color of the lower half. Falls back to `main_color`.
    pub bottom_color: Option<HexColor>,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            bar_width: None,
            amplitude: 0.5,
            bottom_amplitude: None,
            fft_exponent: 8,
            spacing: 2.0,
            hertz_ceiling: 1.0,
            main_color: hex("#42cef4"),
            bottom_color: None,
        }
    }
}

impl SpectrumConfig {
    pub fn fft_size(&self) -> usize {
        1usize << self.fft_exponent
    }

    pub fn bottom_amplitude(&self) -> f32 {
        self.bottom_amplitude.unwrap_or(self.amplitude)
    }

    pub fn bottom_color(&self) -> Color {
        self.bottom_color.unwrap_or(self.main_color).0
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_FFT_EXPONENT..=MAX_FFT_EXPONENT).contains(&self.fft_exponent) {
            return Err(Error::Configuration(format!(
                "fft_exponent must be in {MIN_FFT_EXPONENT}..={MAX_FFT_EXPONENT}, got {}",
                self.fft_exponent
            )));
        }
        if let Some(width) = self.bar_width {
            positive("bar_width", width)?;
        }
        unit("amplitude", self.amplitude)?;
        unit("bottom_amplitude", self.bottom_amplitude())?;
        non_negative("spacing", self.spacing)?;
        if !(self.hertz_ceiling > 0.0 && self.hertz_ceiling <= 1.0) {
            return Err(Error::Configuration(format!(
                "hertz_ceiling must be in (0, 1], got {}",
                self.hertz_ceiling
            )));
        }
        Ok(())
    }
}

/// Both renderer configs, as read from a JSON file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub waveform: WaveformConfig,
    pub spectrum: SpectrumConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Configuration(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(text).map_err(|e| Error::Configuration(e.to_string()))?;
        config.waveform.validate()?;
        config.spectrum.validate()?;
        Ok(config)
    }
}

fn positive(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::Configuration(format!("{name} must be > 0, got {value}")))
    }
}

fn non_negative(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::Configuration(format!("{name} must be >= 0, got {value}")))
    }
}

fn unit(name: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::Configuration(format!("{name} must be in [0, 1], got {value}")))
    }
}
