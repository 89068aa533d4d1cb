use std::sync::Arc;

use super::types::AudioData;
use crate::error::Result;

/// Something that can play a decoded buffer from an arbitrary offset and
/// report a monotonic audio clock.
///
/// The transport never drives playback any other way: every play or seek
/// is a single `restart_at`, which must stop the previous source before
/// starting the new one so two sources are never audible at once.
pub trait AudioOutput {
    /// Audio-system time in seconds. Advances continuously, playing or not.
    fn clock(&self) -> f64;

    /// Make `audio` the buffer used by subsequent `restart_at` calls.
    fn bind(&mut self, audio: Arc<AudioData>) -> Result<()>;

    /// Stop playback and release the bound buffer.
    fn unbind(&mut self);

    /// Stop the current source (if any) and start playing at `offset` seconds.
    /// On error nothing has changed.
    fn restart_at(&mut self, offset: f64) -> Result<()>;

    fn stop(&mut self);
}
