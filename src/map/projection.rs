use geo::Rect;
use glam::DVec2;

/// Share of the canvas the fitted data occupies at zoom 1
const FIT_MARGIN: f64 = 0.95;

/// Planar view over pre-projected data, measured in braille dots
/// (2 per column, 4 per row, which makes dots roughly square).
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Data coordinate at the canvas center
    pub center: DVec2,
    /// Zoom multiplier over the fitted scale
    pub zoom: f64,
    /// Canvas width in dots
    pub width: usize,
    /// Canvas height in dots
    pub height: usize,
    bounds: Rect<f64>,
}

impl Viewport {
    /// Fit `bounds` into a `width` x `height` dot canvas
    pub fn fit(bounds: Rect<f64>, width: usize, height: usize) -> Self {
        let center = bounds.center();
        Self {
            center: DVec2::new(center.x, center.y),
            zoom: 1.0,
            width,
            height,
            bounds,
        }
    }

    /// Dots per data unit
    pub fn scale(&self) -> f64 {
        let (bw, bh) = (self.bounds.width(), self.bounds.height());
        if bw <= 0.0 || bh <= 0.0 {
            return self.zoom;
        }
        let fitted = (self.width as f64 / bw).min(self.height as f64 / bh) * FIT_MARGIN;
        fitted * self.zoom
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    fn half_extent(&self) -> DVec2 {
        DVec2::new(self.width as f64, self.height as f64) / 2.0
    }

    /// Data coordinate to dot coordinate
    pub fn project(&self, x: f64, y: f64) -> DVec2 {
        (DVec2::new(x, y) - self.center) * self.scale() + self.half_extent()
    }

    /// Dot coordinate back to data coordinate
    pub fn unproject(&self, px: f64, py: f64) -> DVec2 {
        (DVec2::new(px, py) - self.half_extent()) / self.scale() + self.center
    }

    /// Pan by a dot delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.center += DVec2::new(dx as f64, dy as f64) / self.scale();
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(50.0);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(0.5);
    }

    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    /// Zoom keeping the data point under (px, py) fixed on screen
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let anchor = self.unproject(px as f64, py as f64);
        self.zoom = (self.zoom * factor).clamp(0.5, 50.0);
        let drifted = self.project(anchor.x, anchor.y);
        self.center += (drifted - DVec2::new(px as f64, py as f64)) / self.scale();
    }

    /// Rough visibility check for a segment in dot space
    pub fn segment_might_be_visible(&self, a: DVec2, b: DVec2) -> bool {
        let min = a.min(b);
        let max = a.max(b);
        max.x >= 0.0 && min.x < self.width as f64 && max.y >= 0.0 && min.y < self.height as f64
    }
}
