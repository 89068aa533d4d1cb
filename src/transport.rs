//! Playback transport.
//!
//! Owns the playback state (position, playing flag, audio clock anchor) and is
//! the only thing allowed to change it. Renderers get a [`PlaybackView`] copy;
//! the seek controller and the host go through the methods here.
//!
//! ```text
//!   Idle --complete_load--> Ready --play--> Playing
//!     ^                       ^               |
//!     |                       +---stop/end----+
//!     +-------- begin_load (from any state)
//! ```
//!
//! A seek while playing restarts the output at the new offset, so the audible
//! position always matches the cursor. `PlayStarted` is raised only on the
//! `Ready -> Playing` edge, never on such a restart.

use std::fmt;
use std::sync::Arc;

use crate::audio::output::AudioOutput;
use crate::audio::types::AudioData;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    /// No asset bound.
    #[default]
    Idle,
    Ready,
    Playing,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportState::Idle => write!(f, "idle"),
            TransportState::Ready => write!(f, "ready"),
            TransportState::Playing => write!(f, "playing"),
        }
    }
}

/// Lifecycle notifications delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportEvent {
    AudioReady { duration: f64 },
    PlayStarted,
    Stopped,
    PlaybackTimeChanged { time_seconds: f64 },
    PlaybackComplete,
}

/// Read-only snapshot handed to renderers each frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackView {
    pub state: TransportState,
    pub playback_time: f64,
    pub duration: f64,
}

impl PlaybackView {
    /// Played fraction in `[0, 1]`; zero without an asset.
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            (self.playback_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Identifies one `begin_load` call. Only the newest ticket can complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    url: String,
}

impl LoadTicket {
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Ready,
    /// A newer load was started before this one finished; the result was dropped.
    Superseded,
}

#[derive(Debug, Clone, Copy, Default)]
struct PlaybackState {
    is_playing: bool,
    playback_time: f64,
    clock_anchor: f64,
}

type Listener = Box<dyn FnMut(&TransportEvent) + Send>;

pub struct Transport<O> {
    output: O,
    asset: Option<Arc<AudioData>>,
    playback: PlaybackState,
    generation: u64,
    listeners: Vec<Listener>,
}

impl<O: AudioOutput> Transport<O> {
    pub fn new(output: O) -> Self {
        Self {
            output,
            asset: None,
            playback: PlaybackState::default(),
            generation: 0,
            listeners: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    pub fn subscribe(&mut self, listener: impl FnMut(&TransportEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn on_ready(&mut self, mut f: impl FnMut(f64) + Send + 'static) {
        self.subscribe(move |e| {
            if let TransportEvent::AudioReady { duration } = e {
                f(*duration)
            }
        });
    }

    pub fn on_play_started(&mut self, mut f: impl FnMut() + Send + 'static) {
        self.subscribe(move |e| {
            if matches!(e, TransportEvent::PlayStarted) {
                f()
            }
        });
    }

    pub fn on_stopped(&mut self, mut f: impl FnMut() + Send + 'static) {
        self.subscribe(move |e| {
            if matches!(e, TransportEvent::Stopped) {
                f()
            }
        });
    }

    pub fn on_playback_time_changed(&mut self, mut f: impl FnMut(f64) + Send + 'static) {
        self.subscribe(move |e| {
            if let TransportEvent::PlaybackTimeChanged { time_seconds } = e {
                f(*time_seconds)
            }
        });
    }

    pub fn on_playback_complete(&mut self, mut f: impl FnMut() + Send + 'static) {
        self.subscribe(move |e| {
            if matches!(e, TransportEvent::PlaybackComplete) {
                f()
            }
        });
    }

    fn emit(&mut self, event: TransportEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn state(&self) -> TransportState {
        match (&self.asset, self.playback.is_playing) {
            (None, _) => TransportState::Idle,
            (Some(_), true) => TransportState::Playing,
            (Some(_), false) => TransportState::Ready,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing
    }

    pub fn playback_time(&self) -> f64 {
        self.playback.playback_time
    }

    /// Duration of the loaded asset, zero while idle.
    pub fn duration(&self) -> f64 {
        self.asset.as_ref().map(|a| a.duration).unwrap_or(0.0)
    }

    pub fn asset(&self) -> Option<&Arc<AudioData>> {
        self.asset.as_ref()
    }

    pub fn view(&self) -> PlaybackView {
        PlaybackView {
            state: self.state(),
            playback_time: self.playback.playback_time,
            duration: self.duration(),
        }
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Drop the current asset and hand out a ticket for the fetch about to start.
    pub fn begin_load(&mut self, url: &str) -> LoadTicket {
        self.stop();
        self.output.unbind();
        self.asset = None;
        self.generation += 1;
        self.set_time(0.0);
        log::debug!("Load #{} started: {url}", self.generation);

        LoadTicket {
            generation: self.generation,
            url: url.to_string(),
        }
    }

    /// Commit the result of a fetch + decode started by `begin_load`.
    ///
    /// Results for superseded tickets are dropped without touching any state.
    pub fn complete_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<AudioData>,
    ) -> Result<LoadOutcome> {
        if ticket.generation != self.generation {
            log::debug!(
                "Discarding load #{} ({}), #{} is current",
                ticket.generation,
                ticket.url,
                self.generation
            );
            return Ok(LoadOutcome::Superseded);
        }

        let data = result.map_err(|e| match e {
            Error::LoadFailure { .. } => e,
            other => Error::load_failure(&ticket.url, other),
        })?;
        if !(data.duration.is_finite() && data.duration > 0.0) {
            return Err(Error::load_failure(
                &ticket.url,
                format!("asset has no playable duration ({})", data.duration),
            ));
        }

        let asset = Arc::new(data);
        self.output
            .bind(asset.clone())
            .map_err(|e| Error::load_failure(&ticket.url, e))?;

        let duration = asset.duration;
        self.asset = Some(asset);
        self.playback = PlaybackState::default();
        log::info!("Audio ready: {} ({duration:.2}s)", ticket.url);
        self.emit(TransportEvent::AudioReady { duration });
        Ok(LoadOutcome::Ready)
    }

    // ------------------------------------------------------------------
    // Transport controls
    // ------------------------------------------------------------------

    /// Start (or restart) playback at `at`, or at the current position.
    pub fn play(&mut self, at: Option<f64>) -> Result<()> {
        self.require_asset("play")?;
        let target = match at {
            Some(t) => self.clamp_time(t, "play")?,
            None => self.playback.playback_time,
        };

        self.output.restart_at(target)?;

        let was_playing = self.playback.is_playing;
        self.playback.clock_anchor = self.output.clock();
        self.playback.is_playing = true;
        self.set_time(target);

        if !was_playing {
            log::debug!("Play from {target:.3}s");
            self.emit(TransportEvent::PlayStarted);
        }
        Ok(())
    }

    /// Stop playback, keeping the position. No-op unless playing.
    pub fn stop(&mut self) {
        if !self.playback.is_playing {
            return;
        }
        self.output.stop();
        self.playback.is_playing = false;
        log::debug!("Stopped at {:.3}s", self.playback.playback_time);
        self.emit(TransportEvent::Stopped);
    }

    pub fn pause(&mut self) {
        self.stop();
    }

    pub fn play_pause(&mut self) -> Result<()> {
        if self.playback.is_playing {
            self.stop();
            Ok(())
        } else {
            self.play(None)
        }
    }

    /// Move the playback position, restarting the output if playing.
    pub fn seek(&mut self, seconds: f64) -> Result<()> {
        self.require_asset("seek")?;
        let target = self.clamp_time(seconds, "seek")?;

        if self.playback.is_playing {
            self.output.restart_at(target)?;
            self.playback.clock_anchor = self.output.clock();
        }
        self.set_time(target);
        Ok(())
    }

    /// Advance the position against the audio clock. Call once per frame.
    ///
    /// This is also where the end of the track is detected: once the position
    /// reaches the duration the transport stops, rewinds to zero and raises
    /// `PlaybackComplete`.
    pub fn sync(&mut self) {
        if self.playback.is_playing {
            let now = self.output.clock();
            let elapsed = (now - self.playback.clock_anchor).max(0.0);
            self.playback.clock_anchor = now;
            self.set_time(self.playback.playback_time + elapsed);
        }

        let Some(duration) = self.asset.as_ref().map(|a| a.duration) else {
            return;
        };
        if self.playback.playback_time >= duration {
            self.stop();
            self.set_time(0.0);
            log::debug!("Playback complete");
            self.emit(TransportEvent::PlaybackComplete);
        }
    }

    fn set_time(&mut self, seconds: f64) {
        self.playback.playback_time = seconds;
        self.emit(TransportEvent::PlaybackTimeChanged {
            time_seconds: seconds,
        });
    }

    fn require_asset(&self, operation: &'static str) -> Result<()> {
        if self.asset.is_none() {
            return Err(Error::InvalidState {
                operation,
                state: TransportState::Idle,
            });
        }
        Ok(())
    }

    fn clamp_time(&self, seconds: f64, operation: &str) -> Result<f64> {
        if !seconds.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "{operation} target must be finite, got {seconds}"
            )));
        }
        Ok(seconds.clamp(0.0, self.duration()))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Bind(f64),
        Unbind,
        Restart(f64),
        Stop,
    }

    /// Output with a hand-driven clock that records every call.
    #[derive(Clone, Default)]
    pub struct FakeOutput {
        pub clock: Arc<Mutex<f64>>,
        pub calls: Arc<Mutex<Vec<Call>>>,
        pub fail_restart: Arc<Mutex<bool>>,
    }

    impl FakeOutput {
        pub fn advance(&self, seconds: f64) {
            *self.clock.lock().unwrap() += seconds;
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AudioOutput for FakeOutput {
        fn clock(&self) -> f64 {
            *self.clock.lock().unwrap()
        }

        fn bind(&mut self, audio: Arc<AudioData>) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Bind(audio.duration));
            Ok(())
        }

        fn unbind(&mut self) {
            self.calls.lock().unwrap().push(Call::Unbind);
        }

        fn restart_at(&mut self, offset: f64) -> Result<()> {
            if *self.fail_restart.lock().unwrap() {
                return Err(Error::Output("device gone".into()));
            }
            self.calls.lock().unwrap().push(Call::Restart(offset));
            Ok(())
        }

        fn stop(&mut self) {
            self.calls.lock().unwrap().push(Call::Stop);
        }
    }

    pub fn asset(duration: f64) -> AudioData {
        AudioData::from_mono(vec![0.0; (duration * 100.0) as usize], 100)
    }

    /// Transport with a loaded asset and a log of every event.
    pub fn loaded(
        duration: f64,
    ) -> (Transport<FakeOutput>, FakeOutput, Arc<Mutex<Vec<TransportEvent>>>) {
        let output = FakeOutput::default();
        let mut transport = Transport::new(output.clone());
        let ticket = transport.begin_load("test.wav");
        transport.complete_load(&ticket, Ok(asset(duration))).unwrap();

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        transport.subscribe(move |e| sink.lock().unwrap().push(*e));
        (transport, output, events)
    }
}
