//! Frame-driven paint/sync loop.
//!
//! The loop does not schedule anything itself. The host asks for the next
//! frame only while [`RenderLoop::is_active`] is true and calls
//! [`RenderLoop::tick`] from it. Stopping therefore lets at most the frame
//! already requested run, and that frame returns without painting.

use crate::audio::output::AudioOutput;
use crate::renderer::Renderer;
use crate::surface::Surface;
use crate::transport::Transport;

#[derive(Debug, Default)]
pub struct RenderLoop {
    active: bool,
    frames: u64,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the loop. Returns `false` if it was already running.
    pub fn start(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        log::debug!("Render loop started");
        true
    }

    pub fn stop(&mut self) {
        if self.active {
            log::debug!("Render loop stopped after {} frames", self.frames);
        }
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Frames painted since construction.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one frame: paint with the time as of the start of the frame, then
    /// let the transport catch up with the audio clock.
    ///
    /// Returns whether another frame should be requested.
    pub fn tick<R, O>(
        &mut self,
        renderer: &mut R,
        transport: &mut Transport<O>,
        surface: &mut dyn Surface,
    ) -> bool
    where
        R: Renderer + ?Sized,
        O: AudioOutput,
    {
        if !self.active {
            return false;
        }
        renderer.paint(&transport.view(), surface);
        transport.sync();
        self.frames += 1;
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Scene;
    use crate::transport::testing::loaded;
    use crate::transport::PlaybackView;
    use iced::Size;

    /// Records the playback time it was asked to paint.
    #[derive(Default)]
    struct Probe {
        painted: Vec<f64>,
    }

    impl Renderer for Probe {
        fn load(&mut self, _audio: &crate::audio::types::AudioData) {}
        fn unload(&mut self) {}
        fn resize(&mut self, _size: Size) {}
        fn paint(&mut self, view: &PlaybackView, _surface: &mut dyn Surface) {
            self.painted.push(view.playback_time);
        }
    }

    #[test]
    fn start_is_idempotent() {
        let mut rl = RenderLoop::new();
        assert!(rl.start());
        assert!(!rl.start());
        assert!(rl.is_active());
    }

    #[test]
    fn inactive_loop_does_nothing() {
        let (mut transport, _, _) = loaded(10.0);
        let mut probe = Probe::default();
        let mut scene = Scene::new(Size::new(10.0, 10.0));
        let mut rl = RenderLoop::new();

        assert!(!rl.tick(&mut probe, &mut transport, &mut scene));
        assert!(probe.painted.is_empty());
        assert_eq!(rl.frames(), 0);
    }

    #[test]
    fn paints_before_sync() {
        let (mut transport, output, _) = loaded(10.0);
        transport.play(Some(1.0)).unwrap();
        let mut probe = Probe::default();
        let mut scene = Scene::new(Size::new(10.0, 10.0));
        let mut rl = RenderLoop::new();
        rl.start();

        output.advance(0.5);
        assert!(rl.tick(&mut probe, &mut transport, &mut scene));
        output.advance(0.5);
        assert!(rl.tick(&mut probe, &mut transport, &mut scene));

        // Each frame shows the time from before its own sync.
        assert_eq!(probe.painted, vec![1.0, 1.5]);
        assert_eq!(transport.playback_time(), 2.0);
        assert_eq!(rl.frames(), 2);
    }

    #[test]
    fn stop_ends_after_current_frame() {
        let (mut transport, _, _) = loaded(10.0);
        let mut probe = Probe::default();
        let mut scene = Scene::new(Size::new(10.0, 10.0));
        let mut rl = RenderLoop::new();
        rl.start();

        assert!(rl.tick(&mut probe, &mut transport, &mut scene));
        rl.stop();
        assert!(!rl.tick(&mut probe, &mut transport, &mut scene));
        assert_eq!(probe.painted.len(), 1);
    }

    #[test]
    fn end_of_track_is_detected_by_the_loop() {
        let (mut transport, output, events) = loaded(1.0);
        transport.play(None).unwrap();
        let mut probe = Probe::default();
        let mut scene = Scene::new(Size::new(10.0, 10.0));
        let mut rl = RenderLoop::new();
        rl.start();

        for _ in 0..5 {
            output.advance(0.4);
            rl.tick(&mut probe, &mut transport, &mut scene);
        }

        assert!(!transport.is_playing());
        assert!(rl.is_active(), "the loop keeps painting after completion");
        let completions = events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, crate::transport::TransportEvent::PlaybackComplete))
            .count();
        assert_eq!(completions, 1);
    }
}
