use iced::mouse;
use iced::widget::canvas::{self, Action, Event, Frame, Geometry};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use crate::surface::Scene;

/// Replays the scene painted by the last frame and reports pointer input
/// and size changes back to the widget.
pub struct SceneCanvas<'a> {
    scene: &'a Scene,
    background: Color,
}

/// Interactions on the drawing surface. X coordinates are relative to its left edge.
#[derive(Debug, Clone)]
pub enum CanvasMessage {
    Resized(Size),
    PointerDown(f32),
    PointerMoved(f32),
    PointerUp(f32),
}

#[derive(Debug, Default)]
pub struct CanvasState {
    size: Option<Size>,
    pressed: bool,
}

impl<'a> SceneCanvas<'a> {
    pub fn new(scene: &'a Scene) -> Self {
        Self {
            scene,
            background: Color::from_rgb(0.12, 0.12, 0.15),
        }
    }
}

impl canvas::Program<CanvasMessage> for SceneCanvas<'_> {
    type State = CanvasState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), self.background);

        for rect in self.scene.rects() {
            frame.fill_rectangle(
                Point::new(rect.bounds.x, rect.bounds.y),
                Size::new(rect.bounds.width, rect.bounds.height),
                rect.color,
            );
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<Action<CanvasMessage>> {
        match event {
            Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                let pos = cursor.position_in(bounds)?;
                state.pressed = true;
                return Some(Action::publish(CanvasMessage::PointerDown(pos.x)).and_capture());
            }
            Event::Mouse(mouse::Event::CursorMoved { .. }) if state.pressed => {
                // Keep tracking outside the bounds; the seek clamps.
                let x = cursor.position()?.x - bounds.x;
                return Some(Action::publish(CanvasMessage::PointerMoved(x)).and_capture());
            }
            Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) if state.pressed => {
                state.pressed = false;
                let x = cursor.position()?.x - bounds.x;
                return Some(Action::publish(CanvasMessage::PointerUp(x)).and_capture());
            }
            _ => {}
        }

        let size = bounds.size();
        if state.size != Some(size) {
            state.size = Some(size);
            return Some(Action::publish(CanvasMessage::Resized(size)));
        }
        None
    }
}
