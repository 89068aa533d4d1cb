//! Real-time spectral analysis.
//!
//! `SpectralAnalyzer` keeps the most recent window of mono samples and, on
//! request, produces one byte per frequency bin the same way a browser
//! analyser node does: Blackman window, forward FFT, magnitude normalized by
//! the window size, exponential smoothing over time, then a dB range mapped
//! onto `0..=255`.

use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::error::{Error, Result};

pub const MIN_FFT_EXPONENT: u32 = 5;
pub const MAX_FFT_EXPONENT: u32 = 15;

const SMOOTHING_TIME_CONSTANT: f32 = 0.8;
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

/// Anything that can hand out a fresh magnitude snapshot per frame.
pub trait SpectrumSource {
    /// Number of bins per snapshot (half the window size).
    fn bin_count(&self) -> usize;

    /// Fill `out` with the latest magnitudes, one byte per bin. Extra slots
    /// beyond `bin_count` are left untouched.
    fn byte_frequency_data(&mut self, out: &mut [u8]);
}

pub struct SpectralAnalyzer {
    fft_size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    history: VecDeque<f32>,
    smoothed: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    tap: Option<Receiver<Vec<f32>>>,
}

impl SpectralAnalyzer {
    /// Analyzer with a window of `2^exponent` samples.
    pub fn with_exponent(exponent: u32) -> Result<Self> {
        if !(MIN_FFT_EXPONENT..=MAX_FFT_EXPONENT).contains(&exponent) {
            return Err(Error::Configuration(format!(
                "fft exponent {exponent} outside {MIN_FFT_EXPONENT}..={MAX_FFT_EXPONENT}"
            )));
        }
        Ok(Self::new(1usize << exponent))
    }

    fn new(fft_size: usize) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(fft_size);
        Self {
            fft_size,
            fft,
            window: blackman(fft_size),
            history: VecDeque::from(vec![0.0; fft_size]),
            smoothed: vec![0.0; fft_size / 2],
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            tap: None,
        }
    }

    /// Pull samples from an output tap before every snapshot.
    pub fn with_tap(mut self, tap: Receiver<Vec<f32>>) -> Self {
        self.tap = Some(tap);
        self
    }

    /// Append mono samples; only the newest `fft_size` are retained.
    pub fn push_samples(&mut self, samples: &[f32]) {
        let skip = samples.len().saturating_sub(self.fft_size);
        for &s in &samples[skip..] {
            if self.history.len() == self.fft_size {
                self.history.pop_front();
            }
            self.history.push_back(s);
        }
    }

    fn drain_tap(&mut self) {
        let blocks: Vec<Vec<f32>> = match &self.tap {
            Some(rx) => rx.try_iter().collect(),
            None => return,
        };
        for block in blocks {
            self.push_samples(&block);
        }
    }

    fn analyze(&mut self) {
        for (slot, (&s, &w)) in self
            .scratch
            .iter_mut()
            .zip(self.history.iter().zip(&self.window))
        {
            *slot = Complex::new(s * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        let norm = 1.0 / self.fft_size as f32;
        for (k, smoothed) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.scratch[k].norm() * norm;
            *smoothed = SMOOTHING_TIME_CONSTANT * *smoothed
                + (1.0 - SMOOTHING_TIME_CONSTANT) * magnitude;
        }
    }
}

impl SpectrumSource for SpectralAnalyzer {
    fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.drain_tap();
        self.analyze();
        for (byte, &magnitude) in out.iter_mut().zip(&self.smoothed) {
            *byte = to_byte(magnitude);
        }
    }
}

fn to_byte(magnitude: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = 255.0 / (MAX_DECIBELS - MIN_DECIBELS) * (db - MIN_DECIBELS);
    scaled.clamp(0.0, 255.0) as u8
}

fn blackman(size: usize) -> Vec<f32> {
    let (a0, a1, a2) = (0.42, 0.5, 0.08);
    (0..size)
        .map(|i| {
            let x = i as f32 / size as f32;
            a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq_bin: usize, fft_size: usize, len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * freq_bin as f32 * i as f32 / fft_size as f32).sin())
            .collect()
    }

    #[test]
    fn rejects_out_of_range_exponent() {
        assert!(matches!(
            SpectralAnalyzer::with_exponent(4),
            Err(Error::Configuration(_))
        ));
        assert!(SpectralAnalyzer::with_exponent(16).is_err());
        assert_eq!(SpectralAnalyzer::with_exponent(8).unwrap().bin_count(), 128);
    }

    #[test]
    fn silence_gives_zero_bins() {
        let mut analyzer = SpectralAnalyzer::with_exponent(6).unwrap();
        let mut out = vec![7u8; 32];
        analyzer.byte_frequency_data(&mut out);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn tone_peaks_at_its_bin() {
        let mut analyzer = SpectralAnalyzer::with_exponent(8).unwrap();
        analyzer.push_samples(&sine(20, 256, 256, 1.0));

        let mut out = vec![0u8; 128];
        for _ in 0..20 {
            analyzer.byte_frequency_data(&mut out);
        }

        assert_eq!(out[20], *out.iter().max().unwrap());
        assert!(out[20] > out[60]);
    }

    #[test]
    fn smoothing_decays_after_silence() {
        let mut analyzer = SpectralAnalyzer::with_exponent(8).unwrap();
        // Quiet enough to sit inside the dB window rather than clip at 255.
        analyzer.push_samples(&sine(10, 256, 256, 0.02));
        let mut out = vec![0u8; 128];
        for _ in 0..20 {
            analyzer.byte_frequency_data(&mut out);
        }
        let loud = out[10];

        analyzer.push_samples(&vec![0.0; 256]);
        analyzer.byte_frequency_data(&mut out);
        let after = out[10];

        assert!(after < loud);
        assert!(after > 0, "smoothing keeps some energy for one frame");
    }

    #[test]
    fn drains_tap_blocks() {
        let (tx, rx) = crossbeam_channel::bounded(4);
        let mut analyzer = SpectralAnalyzer::with_exponent(6).unwrap().with_tap(rx);
        tx.send(sine(4, 64, 64, 1.0)).unwrap();

        let mut out = vec![0u8; 32];
        analyzer.byte_frequency_data(&mut out);
        assert!(out[4] > 0);
        assert!(rx_is_empty(&analyzer));
    }

    fn rx_is_empty(analyzer: &SpectralAnalyzer) -> bool {
        analyzer.tap.as_ref().map(|rx| rx.is_empty()).unwrap_or(true)
    }

    #[test]
    fn keeps_only_newest_window() {
        let mut analyzer = SpectralAnalyzer::with_exponent(5).unwrap();
        analyzer.push_samples(&vec![1.0; 100]);
        assert_eq!(analyzer.history.len(), 32);
    }
}
