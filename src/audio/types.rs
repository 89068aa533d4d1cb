use std::sync::Arc;

/// Decoded audio data stored entirely in memory.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioData {
    /// Interleaved samples normalized to [-1.0, 1.0].
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
    /// Duration in seconds.
    pub duration: f64,
}

impl AudioData {
    /// Build a single-channel asset; the duration follows from the sample count.
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        let duration = samples.len() as f64 / sample_rate as f64;
        Self {
            samples,
            sample_rate,
            channels: 1,
            duration,
        }
    }

    /// Total number of frames (samples per channel).
    pub fn num_frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// De-interleave one channel. Out-of-range indices yield an empty vector.
    pub fn channel(&self, index: usize) -> Vec<f32> {
        let ch = self.channels as usize;
        if index >= ch {
            return Vec::new();
        }
        if ch == 1 {
            return self.samples.clone();
        }
        self.samples
            .chunks_exact(ch)
            .map(|frame| frame[index])
            .collect()
    }
}

/// Commands sent from the UI thread to the audio thread.
#[derive(Debug, Clone)]
pub enum AudioCommand {
    /// Bind a decoded buffer. Playback stays stopped.
    Bind(Arc<AudioData>),
    /// Drop the bound buffer.
    Unbind,
    /// Stop whatever is playing and start again from the given offset in seconds.
    StartAt(f64),
    Stop,
}
