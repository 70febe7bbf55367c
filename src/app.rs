use crate::config;
use crate::interaction::{HoverState, InteractionController, TooltipController};
use crate::map::{MapRenderer, Viewport};
use crate::svg;
use crate::ui;
use ratatui::layout::Rect;
use std::path::PathBuf;
use std::time::Instant;

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub interaction: InteractionController,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current pointer position in terminal cells
    pub mouse_pos: Option<(u16, u16)>,
    /// One-shot message for the status bar (export results)
    pub status: Option<String>,
    /// Terminal size in cells
    size: (u16, u16),
    svg_path: PathBuf,
}

impl App {
    pub fn new(map_renderer: MapRenderer, width: u16, height: u16, svg_path: PathBuf, now: Instant) -> Self {
        let inner = map_area(width, height);
        // Braille gives 2x4 resolution per character
        let viewport = Viewport::fit(
            map_renderer.scene().bounds,
            inner.width as usize * 2,
            inner.height as usize * 4,
        );
        let tooltip = TooltipController::new(
            config::TOOLTIP_OPACITY,
            config::TOOLTIP_FADE_IN,
            config::TOOLTIP_FADE_OUT,
            now,
        );

        Self {
            viewport,
            map_renderer,
            interaction: InteractionController::new(tooltip, config::TOOLTIP_OFFSET),
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            status: None,
            size: (width, height),
            svg_path,
        }
    }

    /// Inner map rectangle for the current terminal size
    pub fn map_area(&self) -> Rect {
        map_area(self.size.0, self.size.1)
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.size = (width, height);
        let inner = self.map_area();
        self.viewport.resize(inner.width as usize * 2, inner.height as usize * 4);
    }

    /// Fit the whole scene again
    pub fn reset(&mut self) {
        let inner = self.map_area();
        self.viewport = Viewport::fit(
            self.map_renderer.scene().bounds,
            inner.width as usize * 2,
            inner.height as usize * 4,
        );
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = self.dot_at(col, row);
        self.viewport.zoom_in_at(px, py);
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = self.dot_at(col, row);
        self.viewport.zoom_out_at(px, py);
    }

    /// Terminal cell to braille dot, relative to the map's inner area
    fn dot_at(&self, col: u16, row: u16) -> (i32, i32) {
        let inner = self.map_area();
        let px = (col as i32 - inner.x as i32) * 2;
        let py = (row as i32 - inner.y as i32) * 4;
        (px, py)
    }

    /// Map-local cell under a terminal position, if it lies on the map
    fn map_cell(&self, col: u16, row: u16) -> Option<(usize, usize)> {
        let inner = self.map_area();
        let inside = col >= inner.x
            && col < inner.x + inner.width
            && row >= inner.y
            && row < inner.y + inner.height;
        inside.then(|| ((col - inner.x) as usize, (row - inner.y) as usize))
    }

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }

    /// Handle mouse drag
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = (last_x as i32 - x as i32) * 2;
            let dy = (last_y as i32 - y as i32) * 4;
            self.pan(dx, dy);
        }
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    pub fn pointer_moved(&mut self, col: u16, row: u16, now: Instant) {
        self.mouse_pos = Some((col, row));
        self.refresh_hover(now);
    }

    /// Re-run the hit test under the pointer. The view may have moved
    /// beneath a still pointer, so this runs after every event.
    pub fn refresh_hover(&mut self, now: Instant) {
        let Some((col, row)) = self.mouse_pos else {
            return;
        };
        let hit = self
            .map_cell(col, row)
            .and_then(|(cx, cy)| self.map_renderer.region_at_cell(&self.viewport, cx, cy));
        self.interaction.pointer_move(
            hit,
            &self.map_renderer.scene().regions,
            (col as i32, row as i32),
            now,
        );
    }

    /// Index of the hovered region, if any
    pub fn hovered(&self) -> Option<usize> {
        match self.interaction.hover() {
            HoverState::Hovered(idx) => Some(idx),
            HoverState::Idle => None,
        }
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.interaction.is_animating(now)
    }

    /// Write the SVG rendition; failures land in the status bar
    pub fn export_svg(&mut self) {
        match svg::export_svg(self.map_renderer.scene(), &self.svg_path) {
            Ok(()) => self.status = Some(format!("saved {}", self.svg_path.display())),
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "SVG export failed");
                self.status = Some(format!("export failed: {err:#}"));
            }
        }
    }

    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    /// Viewport center in data coordinates
    pub fn center_coords(&self) -> String {
        format!("{:.0}, {:.0}", self.viewport.center.x, self.viewport.center.y)
    }
}

fn map_area(width: u16, height: u16) -> Rect {
    ui::layout(Rect::new(0, 0, width, height)).map_inner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::tests::scene;
    use std::time::Duration;

    // 40x20 terminal: map inner area is 38x11 starting at (1, 3)
    fn app(now: Instant) -> App {
        let path = std::env::temp_dir().join(format!("tui-choropleth-{}-app.svg", std::process::id()));
        App::new(MapRenderer::new(scene()), 40, 20, path, now)
    }

    #[test]
    fn test_viewport_fits_map_area() {
        let app = app(Instant::now());
        assert_eq!(app.map_area(), Rect::new(1, 3, 38, 11));
        assert_eq!((app.viewport.width, app.viewport.height), (76, 44));
    }

    #[test]
    fn test_hover_enters_and_leaves() {
        let t0 = Instant::now();
        let mut app = app(t0);

        app.pointer_moved(20, 8, t0);
        assert_eq!(app.hovered(), Some(1));
        assert_eq!(app.interaction.tooltip().content(), "Baldwin, AL: 50%");
        assert_eq!(app.interaction.tooltip().anchor(), (22, 7));

        let t1 = t0 + Duration::from_millis(200);
        app.pointer_moved(0, 0, t1);
        assert_eq!(app.hovered(), None);
        assert!(app.is_animating(t1 + Duration::from_millis(100)));
        assert!(!app.is_animating(t1 + Duration::from_millis(400)));
    }

    #[test]
    fn test_pan_updates_hover_under_still_pointer() {
        let t0 = Instant::now();
        let mut app = app(t0);
        app.pointer_moved(20, 8, t0);
        assert_eq!(app.hovered(), Some(1));

        // shift the view 10 data units right of the pointer
        let dots = (10.0 * app.viewport.scale()).round() as i32;
        app.pan(dots, 0);
        app.refresh_hover(t0);
        assert_eq!(app.hovered(), Some(2));
    }

    #[test]
    fn test_reset_restores_fit() {
        let mut app = app(Instant::now());
        app.zoom_in();
        app.pan(13, -7);
        app.reset();
        assert_eq!(app.viewport.zoom, 1.0);
        assert_eq!(app.center_coords(), "15, 5");
    }

    #[test]
    fn test_resize_updates_viewport() {
        let mut app = app(Instant::now());
        app.resize(80, 30);
        let inner = app.map_area();
        assert_eq!(app.viewport.width, inner.width as usize * 2);
        assert_eq!(app.viewport.height, inner.height as usize * 4);
    }

    #[test]
    fn test_export_reports_status() {
        let mut app = app(Instant::now());
        app.export_svg();
        assert!(app.status.as_deref().unwrap().starts_with("saved"));
        let _ = std::fs::remove_file(&app.svg_path);

        app.svg_path = PathBuf::from("/nonexistent-dir/for/sure/out.svg");
        app.export_svg();
        assert!(app.status.as_deref().unwrap().starts_with("export failed"));
    }
}
