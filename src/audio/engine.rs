use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, TrySendError};

use super::output::AudioOutput;
use super::types::{AudioCommand, AudioData};
use crate::error::{Error, Result};

/// Capacity of the analyzer tap, in callback-sized blocks.
const TAP_CAPACITY: usize = 64;

struct EngineState {
    audio: Option<Arc<AudioData>>,
    /// Fractional source frame position.
    position: f64,
    playing: bool,
    output_sample_rate: u32,
}

impl EngineState {
    fn new(output_sample_rate: u32) -> Self {
        Self {
            audio: None,
            position: 0.0,
            playing: false,
            output_sample_rate,
        }
    }

    fn handle_command(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Bind(data) => {
                self.audio = Some(data);
                self.position = 0.0;
                self.playing = false;
            }
            AudioCommand::Unbind => {
                self.audio = None;
                self.position = 0.0;
                self.playing = false;
            }
            AudioCommand::StartAt(time) => {
                if let Some(audio) = &self.audio {
                    let frame = (time.max(0.0) * audio.sample_rate as f64)
                        .min(audio.num_frames() as f64);
                    self.position = frame;
                    self.playing = true;
                }
            }
            AudioCommand::Stop => {
                self.playing = false;
            }
        }
    }

    /// Fill the output buffer and the mono tap block for the analyzer.
    fn fill_buffer(&mut self, output: &mut [f32], channels: u16, tap: &mut Vec<f32>) {
        let out_channels = channels as usize;
        let out_frames = output.len() / out_channels;
        tap.clear();
        tap.resize(out_frames, 0.0);

        let audio = match (&self.audio, self.playing) {
            (Some(a), true) => a.clone(),
            _ => {
                output.fill(0.0);
                return;
            }
        };

        let audio_channels = audio.channels as usize;
        let total_frames = audio.num_frames();
        let step = audio.sample_rate as f64 / self.output_sample_rate as f64;

        for f in 0..out_frames {
            let src = self.position as usize;
            if src >= total_frames {
                // Past the end: silence until the transport notices and stops us.
                self.playing = false;
                output[f * out_channels..].fill(0.0);
                return;
            }

            let mut mono = 0.0;
            for c in 0..out_channels {
                let src_c = c % audio_channels;
                let sample = audio.samples[src * audio_channels + src_c];
                output[f * out_channels + c] = sample;
                mono += sample;
            }
            tap[f] = mono / out_channels as f32;
            self.position += step;
        }
    }
}

/// Handle to the cpal output stream.
///
/// Cloning shares the same stream. The stream is torn down when the last
/// clone is dropped.
#[derive(Clone, Debug)]
pub struct AudioEngine {
    cmd_tx: Sender<AudioCommand>,
    tap_rx: Receiver<Vec<f32>>,
    frames_rendered: Arc<AtomicU64>,
    sample_rate: u32,
    _shutdown: Sender<()>,
}

impl AudioEngine {
    /// Receiver of mono blocks exactly as they were sent to the device.
    pub fn tap(&self) -> Receiver<Vec<f32>> {
        self.tap_rx.clone()
    }

    fn send(&self, cmd: AudioCommand) -> Result<()> {
        try_send(&self.cmd_tx, cmd)
    }
}

/// Never blocks the caller: a stalled callback surfaces as an error instead.
fn try_send(tx: &Sender<AudioCommand>, cmd: AudioCommand) -> Result<()> {
    tx.try_send(cmd).map_err(|e| match e {
        TrySendError::Full(_) => Error::Output("audio engine not draining commands".into()),
        TrySendError::Disconnected(_) => Error::Output("audio engine disconnected".into()),
    })
}

impl AudioOutput for AudioEngine {
    fn clock(&self) -> f64 {
        self.frames_rendered.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    fn bind(&mut self, audio: Arc<AudioData>) -> Result<()> {
        self.send(AudioCommand::Bind(audio))
    }

    fn unbind(&mut self) {
        if let Err(e) = self.send(AudioCommand::Unbind) {
            log::warn!("Unbind ignored: {e}");
        }
    }

    fn restart_at(&mut self, offset: f64) -> Result<()> {
        // A single command: the callback swaps position and state atomically.
        self.send(AudioCommand::StartAt(offset))
    }

    fn stop(&mut self) {
        if let Err(e) = self.send(AudioCommand::Stop) {
            log::warn!("Stop ignored: {e}");
        }
    }
}

/// Open the default output device and start the stream.
pub fn spawn_engine() -> Result<AudioEngine> {
    let (cmd_tx, cmd_rx) = crossbeam_channel::bounded::<AudioCommand>(64);
    let (tap_tx, tap_rx) = crossbeam_channel::bounded::<Vec<f32>>(TAP_CAPACITY);
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::Output("No audio output device found".into()))?;

    let config = device
        .default_output_config()
        .map_err(|e| Error::Output(format!("Failed to get output config: {e}")))?;

    let sample_rate = config.sample_rate();
    let channels = config.channels();
    let sample_format = config.sample_format();

    let mut state = EngineState::new(sample_rate);
    let frames_rendered = Arc::new(AtomicU64::new(0));
    let clock = frames_rendered.clone();
    let mut tap_block = Vec::new();

    let stream = match sample_format {
        cpal::SampleFormat::F32 => device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    while let Ok(cmd) = cmd_rx.try_recv() {
                        state.handle_command(cmd);
                    }
                    state.fill_buffer(data, channels, &mut tap_block);
                    let _ = tap_tx.try_send(tap_block.clone());
                    clock.fetch_add((data.len() / channels as usize) as u64, Ordering::Release);
                },
                |err| {
                    log::error!("Audio stream error: {err}");
                },
                None,
            )
            .map_err(|e| Error::Output(format!("Failed to build output stream: {e}")))?,
        _ => {
            return Err(Error::Output(format!(
                "Unsupported sample format: {sample_format:?}"
            )))
        }
    };

    stream
        .play()
        .map_err(|e| Error::Output(format!("Failed to start stream: {e}")))?;

    // cpal streams are not Send on every backend; park it on its own thread
    // until every engine handle is gone.
    std::thread::Builder::new()
        .name("audio-keepalive".into())
        .spawn(move || {
            let _stream = stream;
            let _ = shutdown_rx.recv();
            log::debug!("Audio stream shut down");
        })
        .map_err(|e| Error::Output(format!("Failed to spawn keepalive thread: {e}")))?;

    log::info!("Audio output running: {channels} ch @ {sample_rate} Hz");

    Ok(AudioEngine {
        cmd_tx,
        tap_rx,
        frames_rendered,
        sample_rate,
        _shutdown: shutdown_tx,
    })
}
