//! Pointer-driven seeking over the drawing surface.
//!
//! Every pointer event becomes a `Transport::seek`; the controller itself only
//! remembers whether a drag is in progress and whether playback was running
//! when it began.

use crate::audio::output::AudioOutput;
use crate::error::Result;
use crate::transport::{Transport, TransportState};

/// Horizontal extent of the surface in pointer coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekArea {
    pub left: f32,
    pub width: f32,
}

impl SeekArea {
    pub fn new(left: f32, width: f32) -> Self {
        Self { left, width }
    }

    pub fn fraction(&self, pointer_x: f32) -> f64 {
        if self.width <= 0.0 {
            return 0.0;
        }
        (((pointer_x - self.left) / self.width) as f64).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Default)]
pub struct SeekController {
    pressed: bool,
    resume: bool,
}

impl SeekController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn pointer_down<O: AudioOutput>(
        &mut self,
        pointer_x: f32,
        area: SeekArea,
        transport: &mut Transport<O>,
    ) -> Result<()> {
        if transport.state() == TransportState::Idle {
            return Ok(());
        }
        self.pressed = true;
        self.resume = transport.is_playing();
        seek_to(pointer_x, area, transport)
    }

    pub fn pointer_move<O: AudioOutput>(
        &mut self,
        pointer_x: f32,
        area: SeekArea,
        transport: &mut Transport<O>,
    ) -> Result<()> {
        if !self.pressed {
            return Ok(());
        }
        seek_to(pointer_x, area, transport)
    }

    /// Final seek of the drag. If playback was running when the drag started
    /// and has stopped since (the cursor hit the end), it is resumed here.
    pub fn pointer_up<O: AudioOutput>(
        &mut self,
        pointer_x: f32,
        area: SeekArea,
        transport: &mut Transport<O>,
    ) -> Result<()> {
        if !self.pressed {
            return Ok(());
        }
        self.pressed = false;
        let resume = std::mem::take(&mut self.resume);
        if transport.state() == TransportState::Idle {
            return Ok(());
        }

        seek_to(pointer_x, area, transport)?;
        if resume && !transport.is_playing() {
            transport.play(None)?;
        }
        Ok(())
    }
}

fn seek_to<O: AudioOutput>(
    pointer_x: f32,
    area: SeekArea,
    transport: &mut Transport<O>,
) -> Result<()> {
    let target = area.fraction(pointer_x) * transport.duration();
    transport.seek(target)
}
