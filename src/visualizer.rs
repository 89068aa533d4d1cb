//! One widget instance: a transport, a renderer, the frame loop driving both,
//! pointer seeking, and the scene the last frame was painted into.

use iced::Size;

use crate::audio::output::AudioOutput;
use crate::audio::types::AudioData;
use crate::error::Result;
use crate::render_loop::RenderLoop;
use crate::renderer::Renderer;
use crate::seek::{SeekArea, SeekController};
use crate::surface::Scene;
use crate::transport::{LoadOutcome, LoadTicket, Transport, TransportEvent, TransportState};

pub struct Visualizer<R, O> {
    transport: Transport<O>,
    renderer: R,
    render_loop: RenderLoop,
    seek: SeekController,
    scene: Scene,
}

impl<R: Renderer, O: AudioOutput> Visualizer<R, O> {
    pub fn new(renderer: R, output: O) -> Self {
        Self {
            transport: Transport::new(output),
            renderer,
            render_loop: RenderLoop::new(),
            seek: SeekController::new(),
            scene: Scene::default(),
        }
    }

    /// Forget the current asset and start loading `url`. The host runs the
    /// fetch and passes its result to [`Visualizer::finish_load`] with the
    /// returned ticket.
    pub fn generate(&mut self, url: &str) -> LoadTicket {
        self.renderer.unload();
        self.transport.begin_load(url)
    }

    /// Commit a finished load. Starts the render loop on success.
    pub fn finish_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<AudioData>,
    ) -> Result<LoadOutcome> {
        let outcome = self.transport.complete_load(ticket, result)?;
        if outcome == LoadOutcome::Ready {
            if let Some(asset) = self.transport.asset().cloned() {
                self.renderer.load(&asset);
            }
            self.render_loop.start();
        }
        Ok(outcome)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&TransportEvent) + Send + 'static) {
        self.transport.subscribe(listener);
    }

    pub fn play_pause(&mut self) -> Result<()> {
        self.transport.play_pause()
    }

    pub fn play(&mut self, at: Option<f64>) -> Result<()> {
        self.transport.play(at)
    }

    pub fn stop(&mut self) {
        self.transport.stop();
    }

    pub fn seek(&mut self, seconds: f64) -> Result<()> {
        self.transport.seek(seconds)
    }

    pub fn playback_time(&self) -> f64 {
        self.transport.playback_time()
    }

    pub fn duration(&self) -> f64 {
        self.transport.duration()
    }

    pub fn state(&self) -> TransportState {
        self.transport.state()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// What the last frame painted.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn resize(&mut self, size: Size) {
        if size == self.scene.size() {
            return;
        }
        self.scene.set_size(size);
        self.renderer.resize(size);
    }

    pub fn start_render_loop(&mut self) -> bool {
        self.render_loop.start()
    }

    pub fn stop_render_loop(&mut self) {
        self.render_loop.stop();
    }

    pub fn is_rendering(&self) -> bool {
        self.render_loop.is_active()
    }

    /// One frame from the host's scheduler. Returns whether to request another.
    pub fn frame(&mut self) -> bool {
        self.render_loop
            .tick(&mut self.renderer, &mut self.transport, &mut self.scene)
    }

    // Pointer coordinates are relative to the left edge of the surface.

    pub fn pointer_down(&mut self, x: f32) -> Result<()> {
        if !self.renderer.seekable() {
            return Ok(());
        }
        let area = self.seek_area();
        self.seek.pointer_down(x, area, &mut self.transport)
    }

    pub fn pointer_move(&mut self, x: f32) -> Result<()> {
        if !self.renderer.seekable() {
            return Ok(());
        }
        let area = self.seek_area();
        self.seek.pointer_move(x, area, &mut self.transport)
    }

    pub fn pointer_up(&mut self, x: f32) -> Result<()> {
        if !self.renderer.seekable() {
            return Ok(());
        }
        let area = self.seek_area();
        self.seek.pointer_up(x, area, &mut self.transport)
    }

    fn seek_area(&self) -> SeekArea {
        SeekArea::new(0.0, self.scene.size().width)
    }
}
