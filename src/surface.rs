use iced::{Color, Rectangle, Size};

/// A 2D raster target that only knows how to clear and fill rectangles.
pub trait Surface {
    fn clear(&mut self);
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilledRect {
    pub bounds: Rectangle,
    pub color: Color,
}

/// Display list recorded by a renderer during one frame.
///
/// The canvas replays it when iced asks for geometry, so painting happens
/// inside the frame loop while drawing stays a read-only operation.
#[derive(Clone, Debug)]
pub struct Scene {
    size: Size,
    rects: Vec<FilledRect>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Size::ZERO)
    }
}

impl Scene {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            rects: Vec::new(),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    pub fn rects(&self) -> &[FilledRect] {
        &self.rects
    }
}

impl Surface for Scene {
    fn clear(&mut self) {
        self.rects.clear();
    }

    /// Negative extents are normalized; empty rectangles are dropped.
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        let (x, width) = if width < 0.0 { (x + width, -width) } else { (x, width) };
        let (y, height) = if height < 0.0 { (y + height, -height) } else { (y, height) };
        let finite = x.is_finite() && y.is_finite() && width.is_finite() && height.is_finite();
        if !finite || width <= 0.0 || height <= 0.0 {
            return;
        }
        self.rects.push(FilledRect {
            bounds: Rectangle {
                x,
                y,
                width,
                height,
            },
            color,
        });
    }
}
