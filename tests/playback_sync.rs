//! End-to-end checks of the transport, frame loop and waveform widget
//! against a scripted audio clock.

use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;
use iced::Size;

use waveslab::audio::output::AudioOutput;
use waveslab::audio::types::AudioData;
use waveslab::transport::LoadOutcome;
use waveslab::{
    Error, Result, Transport, TransportEvent, TransportState, Visualizer, WaveformConfig,
    WaveformRenderer,
};

/// Output whose clock only moves when the test says so.
#[derive(Clone, Default)]
struct ScriptedOutput {
    clock: Arc<Mutex<f64>>,
    restarts: Arc<Mutex<Vec<f64>>>,
}

impl ScriptedOutput {
    fn advance(&self, seconds: f64) {
        *self.clock.lock().unwrap() += seconds;
    }

    fn restarts(&self) -> Vec<f64> {
        self.restarts.lock().unwrap().clone()
    }
}

impl AudioOutput for ScriptedOutput {
    fn clock(&self) -> f64 {
        *self.clock.lock().unwrap()
    }

    fn bind(&mut self, _audio: Arc<AudioData>) -> Result<()> {
        Ok(())
    }

    fn unbind(&mut self) {}

    fn restart_at(&mut self, offset: f64) -> Result<()> {
        self.restarts.lock().unwrap().push(offset);
        Ok(())
    }

    fn stop(&mut self) {}
}

fn tone(duration: f64) -> AudioData {
    let rate = 100;
    let samples = (0..(duration * rate as f64) as usize)
        .map(|i| ((i as f32) * 0.3).sin() * 0.8)
        .collect();
    AudioData::from_mono(samples, rate)
}

fn ready_transport(
    duration: f64,
) -> (
    Transport<ScriptedOutput>,
    ScriptedOutput,
    Arc<Mutex<Vec<TransportEvent>>>,
) {
    let output = ScriptedOutput::default();
    let mut transport = Transport::new(output.clone());
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    transport.subscribe(move |e| sink.lock().unwrap().push(*e));

    let ticket = transport.begin_load("tone.wav");
    transport.complete_load(&ticket, Ok(tone(duration))).unwrap();
    (transport, output, events)
}

#[test]
fn seek_keeps_state_and_reports_new_time() {
    let (mut transport, _, _) = ready_transport(10.0);

    transport.seek(3.0).unwrap();
    assert_eq!(transport.state(), TransportState::Ready);
    assert_relative_eq!(transport.playback_time(), 3.0);

    transport.play(None).unwrap();
    transport.seek(7.0).unwrap();
    assert_eq!(transport.state(), TransportState::Playing);
    assert_relative_eq!(transport.playback_time(), 7.0);
}

#[test]
fn sync_does_nothing_while_ready() {
    let (mut transport, output, _) = ready_transport(10.0);
    transport.seek(4.0).unwrap();

    output.advance(3.0);
    transport.sync();
    transport.sync();
    assert_relative_eq!(transport.playback_time(), 4.0);
}

#[test]
fn stop_then_play_resumes_where_it_stopped() {
    let (mut transport, output, _) = ready_transport(10.0);

    transport.play(Some(5.0)).unwrap();
    transport.stop();
    output.advance(2.0);
    transport.play(None).unwrap();

    assert_eq!(output.restarts(), vec![5.0, 5.0]);
    assert_relative_eq!(transport.playback_time(), 5.0);
}

#[test]
fn reaching_the_end_completes_exactly_once() {
    let (mut transport, output, events) = ready_transport(2.0);
    transport.play(None).unwrap();

    output.advance(2.5);
    transport.sync();
    transport.sync();

    assert_eq!(transport.state(), TransportState::Ready);
    assert_eq!(transport.playback_time(), 0.0);
    let completions = events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, TransportEvent::PlaybackComplete))
        .count();
    assert_eq!(completions, 1);
}

#[test]
fn only_the_newest_load_wins() {
    let output = ScriptedOutput::default();
    let mut transport = Transport::new(output);

    let first = transport.begin_load("first.wav");
    let second = transport.begin_load("second.wav");

    assert_eq!(
        transport.complete_load(&second, Ok(tone(3.0))).unwrap(),
        LoadOutcome::Ready
    );
    assert_eq!(
        transport.complete_load(&first, Ok(tone(8.0))).unwrap(),
        LoadOutcome::Superseded
    );
    assert_relative_eq!(transport.duration(), 3.0);
}

#[test]
fn failed_load_stays_idle() {
    let mut transport = Transport::new(ScriptedOutput::default());
    let ticket = transport.begin_load("missing.wav");
    let err = transport
        .complete_load(&ticket, Err(Error::Decode("no audio track".into())))
        .unwrap_err();

    assert!(matches!(err, Error::LoadFailure { .. }));
    assert_eq!(transport.state(), TransportState::Idle);
    assert!(transport.play(None).is_err());
}

#[test]
fn waveform_envelope_depends_only_on_width() {
    let output = ScriptedOutput::default();
    let renderer = WaveformRenderer::new(WaveformConfig::default()).unwrap();
    let mut vis = Visualizer::new(renderer, output);
    vis.resize(Size::new(300.0, 80.0));

    let ticket = vis.generate("tone.wav");
    vis.finish_load(&ticket, Ok(tone(4.0))).unwrap();
    let original = vis.renderer().envelope().to_vec();
    assert_eq!(original.len(), 50);

    vis.resize(Size::new(120.0, 80.0));
    vis.frame();
    assert_eq!(vis.renderer().envelope().len(), 20);

    vis.resize(Size::new(300.0, 80.0));
    vis.frame();
    assert_eq!(vis.renderer().envelope(), original.as_slice());
}

#[test]
fn frames_advance_the_cursor_while_playing() {
    let output = ScriptedOutput::default();
    let renderer = WaveformRenderer::new(WaveformConfig::default()).unwrap();
    let mut vis = Visualizer::new(renderer, output.clone());
    vis.resize(Size::new(300.0, 80.0));

    let ticket = vis.generate("tone.wav");
    vis.finish_load(&ticket, Ok(tone(4.0))).unwrap();
    vis.play(None).unwrap();

    for _ in 0..10 {
        output.advance(0.1);
        assert!(vis.frame());
    }
    assert_relative_eq!(vis.playback_time(), 1.0, epsilon = 1e-9);

    for _ in 0..40 {
        output.advance(0.1);
        vis.frame();
    }
    assert_eq!(vis.state(), TransportState::Ready);
    assert_eq!(vis.playback_time(), 0.0);
}
