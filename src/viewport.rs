use crate::config::ZoomLimits;
use crate::{Point, Rectangle, Size};
use serde::{Deserialize, Serialize};

/// Pan/zoom transform between screen and canvas space.
/// screen = canvas * zoom + offset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub offset: Point,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Point::new(0.0, 0.0),
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(offset: Point, zoom: f32) -> Self {
        Self { offset, zoom }
    }

    /// Set the zoom level, clamped to the limits
    pub fn set_zoom(&mut self, zoom: f32, limits: &ZoomLimits) {
        self.zoom = limits.clamp(zoom);
    }

    /// Zoom while keeping the canvas point under `anchor` (screen space) fixed
    pub fn zoom_at(&mut self, zoom: f32, anchor: Point, limits: &ZoomLimits) {
        let old_zoom = self.zoom;
        self.set_zoom(zoom, limits);
        let ratio = self.zoom / old_zoom;
        self.offset = Point::new(
            anchor.x - (anchor.x - self.offset.x) * ratio,
            anchor.y - (anchor.y - self.offset.y) * ratio,
        );
    }

    pub fn zoom_in(&mut self, limits: &ZoomLimits) {
        self.set_zoom(self.zoom * limits.step, limits);
    }

    pub fn zoom_out(&mut self, limits: &ZoomLimits) {
        self.set_zoom(self.zoom / limits.step, limits);
    }

    /// Shift the canvas by a screen-space delta
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.offset = self.offset.offset(Point::new(dx, dy));
    }

    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.offset.x) / self.zoom,
            (screen.y - self.offset.y) / self.zoom,
        )
    }

    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        Point::new(
            canvas.x * self.zoom + self.offset.x,
            canvas.y * self.zoom + self.offset.y,
        )
    }

    /// Center `content` inside a container of the given screen size,
    /// never zooming in past 100%
    pub fn fit_to(&mut self, content: Rectangle, container: Size, padding: f32, limits: &ZoomLimits) {
        let content_width = content.width + padding * 2.0;
        let content_height = content.height + padding * 2.0;
        if content_width <= 0.0 || content_height <= 0.0 {
            return;
        }

        let scale_x = container.width / content_width;
        let scale_y = container.height / content_height;
        self.set_zoom(scale_x.min(scale_y).min(1.0), limits);

        self.offset = Point::new(
            (container.width - content_width * self.zoom) / 2.0 + (padding - content.x) * self.zoom,
            (container.height - content_height * self.zoom) / 2.0
                + (padding - content.y) * self.zoom,
        );
    }
}
