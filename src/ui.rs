use crate::app::App;
use crate::color::Rgb;
use crate::config;
use crate::legend::{Legend, LegendColumns};
use crate::map::MapLayers;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};
use std::time::Instant;

const HEADER_ROWS: u16 = 2;
/// Swatches, ticks, two staggered label rows
const LEGEND_ROWS: u16 = 4;
/// Below this the tooltip is not drawn at all
const MIN_TOOLTIP_OPACITY: f64 = 0.05;

const BLACK: Rgb = Rgb::new(0, 0, 0);
const WHITE: Rgb = Rgb::new(255, 255, 255);
const TOOLTIP_BG: Rgb = Rgb::new(0x22, 0x22, 0x22);
const TOOLTIP_CHIP: char = '■';
/// Blend weight toward black for the hovered region
const HOVER_DARKEN: f64 = 0.3;

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

/// Screen regions for one frame
pub struct Areas {
    pub header: Rect,
    pub map: Rect,
    pub map_inner: Rect,
    pub legend: Rect,
    pub status: Rect,
}

pub fn layout(area: Rect) -> Areas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_ROWS),
            Constraint::Min(3),
            Constraint::Length(LEGEND_ROWS),
            Constraint::Length(1),
        ])
        .split(area);

    let map_inner = map_block().inner(chunks[1]);

    // Legend hugs the right edge, like on the SVG canvas
    let legend_row = chunks[2];
    let legend_width = config::LEGEND_COLUMNS.min(legend_row.width.saturating_sub(2));
    let legend = Rect::new(
        legend_row.x + legend_row.width.saturating_sub(legend_width + 1),
        legend_row.y,
        legend_width,
        legend_row.height,
    );

    Areas {
        header: chunks[0],
        map: chunks[1],
        map_inner,
        legend,
        status: chunks[3],
    }
}

fn map_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let now = Instant::now();
    let areas = layout(frame.area());

    render_header(frame, app, areas.header);
    render_map(frame, app, &areas);
    render_legend(frame, app, areas.legend);
    render_status_bar(frame, app, areas.status);
    render_tooltip(frame, app, now);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let scene = app.map_renderer.scene();
    let text = vec![
        Line::from(Span::styled(
            scene.title.as_str(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(scene.subtitle.as_str(), Style::default().fg(Color::Gray))),
    ];
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), area);
}

fn render_map(frame: &mut Frame, app: &App, areas: &Areas) {
    let inner = areas.map_inner;
    frame.render_widget(map_block(), areas.map);

    // Update viewport size for rendering
    let mut viewport = app.viewport.clone();
    viewport.resize(inner.width as usize * 2, inner.height as usize * 4);

    let layers = app.map_renderer.render(inner.width as usize, inner.height as usize, &viewport);
    let fills = app
        .map_renderer
        .scene()
        .regions
        .iter()
        .map(|region| region.fill)
        .collect();

    frame.render_widget(
        MapWidget {
            layers,
            fills,
            hovered: app.hovered(),
        },
        inner,
    );
}

/// Region fills as cell backgrounds with the braille mesh drawn over them
struct MapWidget {
    layers: MapLayers,
    fills: Vec<Rgb>,
    hovered: Option<usize>,
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rows = self.layers.height.min(area.height as usize);
        let cols = self.layers.width.min(area.width as usize);

        for cy in 0..rows {
            for cx in 0..cols {
                let cell = &mut buf[(area.x + cx as u16, area.y + cy as u16)];

                let bg = self.layers.region_at(cx, cy).map(|idx| {
                    let fill = self.fills[idx];
                    if self.hovered == Some(idx) {
                        fill.blend(BLACK, HOVER_DARKEN)
                    } else {
                        fill
                    }
                });
                if let Some(bg) = bg {
                    cell.set_bg(color(bg));
                }

                if let Some(ch) = self.layers.mesh.cell(cx, cy) {
                    // Keep the stroke visible on the palest fills
                    let fg = match bg {
                        Some(bg) if bg.luma() > 0.8 => Color::DarkGray,
                        _ => Color::White,
                    };
                    cell.set_char(ch).set_fg(fg);
                }
            }
        }
    }
}

fn render_legend(frame: &mut Frame, app: &App, area: Rect) {
    if area.width == 0 || area.height < LEGEND_ROWS {
        return;
    }
    let mut scales = app.map_renderer.scene().scales.clone();
    scales.position = scales.position.with_range((0.0, area.width as f64));
    let columns = Legend::build(&scales, config::LEGEND_OPACITY).columns(area.width as usize);

    frame.render_widget(LegendWidget { columns }, area);
}

struct LegendWidget {
    columns: LegendColumns,
}

impl Widget for LegendWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = area.width as usize;

        for (i, swatch) in self.columns.swatches.iter().take(width).enumerate() {
            if let Some((rgb, opacity)) = swatch {
                // SVG swatches sit on white
                buf[(area.x + i as u16, area.y)].set_char(' ').set_bg(color(WHITE.blend(*rgb, *opacity)));
            }
        }

        let tick_style = Style::default().fg(Color::Gray);
        for &col in &self.columns.ticks {
            if col < width {
                buf[(area.x + col as u16, area.y + 1)].set_char('│').set_style(tick_style);
            }
        }

        let label_style = Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD);
        for (row, labels) in self.columns.labels.iter().enumerate() {
            let y = area.y + 2 + row as u16;
            for (start, text) in labels {
                buf.set_stringn(area.x + *start as u16, y, text, width.saturating_sub(*start), label_style);
            }
        }
    }
}

fn render_tooltip(frame: &mut Frame, app: &App, now: Instant) {
    let tooltip = app.interaction.tooltip();
    let opacity = tooltip.opacity(now);
    if opacity < MIN_TOOLTIP_OPACITY || tooltip.content().is_empty() {
        return;
    }

    // Leading chip in the bucket color of the hovered metric
    let chip = tooltip
        .metric()
        .map(|metric| app.map_renderer.scene().scales.color.color_of(metric));
    let text = match chip {
        Some(_) => format!(" {TOOLTIP_CHIP} {} ", tooltip.content()),
        None => format!(" {} ", tooltip.content()),
    };
    let screen = frame.area();
    let width = (text.chars().count() as u16).min(screen.width);
    let (ax, ay) = tooltip.anchor();
    let x = ax.clamp(0, screen.width.saturating_sub(width) as i32) as u16;
    let y = ay.clamp(0, screen.height.saturating_sub(1) as i32) as u16;

    // No alpha channel: fade by mixing towards black
    let style = Style::default()
        .fg(color(BLACK.blend(WHITE, opacity)))
        .bg(color(BLACK.blend(TOOLTIP_BG, opacity)));
    let buf = frame.buffer_mut();
    buf.set_stringn(x, y, &text, width as usize, style);
    if let Some(rgb) = chip {
        if width > 1 {
            buf[(x + 1, y)].set_fg(color(BLACK.blend(rgb, opacity)));
        }
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let detail = match (&app.status, app.hovered()) {
        (Some(status), _) => Span::styled(status.clone(), Style::default().fg(Color::Yellow)),
        (None, Some(idx)) => {
            let region = &app.map_renderer.scene().regions[idx];
            Span::styled(
                format!("{} [{}]", region.name, region.key),
                Style::default().fg(Color::Cyan),
            )
        }
        (None, None) => Span::styled(
            format!("{} regions", app.map_renderer.scene().regions.len()),
            Style::default().fg(Color::DarkGray),
        ),
    };

    let status = Line::from(vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        detail,
        Span::styled(
            " | hjkl:pan +/-:zoom r:reset e:export q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::tests::scene;
    use crate::map::MapRenderer;
    use ratatui::{backend::TestBackend, Terminal};
    use std::path::PathBuf;

    fn draw(app: &App, width: u16, height: u16) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    #[test]
    fn test_layout_stacks_sections() {
        let areas = layout(Rect::new(0, 0, 100, 30));
        assert_eq!(areas.header.height, HEADER_ROWS);
        assert_eq!(areas.legend.height, LEGEND_ROWS);
        assert_eq!(areas.legend.width, config::LEGEND_COLUMNS);
        assert_eq!(areas.legend.x + areas.legend.width, 99);
        assert_eq!(areas.status.y, 29);
        assert_eq!(areas.map.height, 30 - HEADER_ROWS - LEGEND_ROWS - 1);
    }

    #[test]
    fn test_frame_shows_title_fills_and_legend() {
        let now = Instant::now();
        let app = App::new(MapRenderer::new(scene()), 80, 24, PathBuf::from("unused.svg"), now);
        let buf = draw(&app, 80, 24);

        assert!(row_text(&buf, 0).contains('T'));
        assert!(row_text(&buf, 1).contains('S'));

        let inner = app.map_area();
        let filled = (inner.y..inner.y + inner.height)
            .flat_map(|y| (inner.x..inner.x + inner.width).map(move |x| (x, y)))
            .filter(|&(x, y)| matches!(buf[(x, y)].bg, Color::Rgb(..)))
            .count();
        assert!(filled > 0);

        let legend = layout(buf.area).legend;
        assert!(row_text(&buf, legend.y + 2).contains('%') || row_text(&buf, legend.y + 3).contains('%'));
        assert!(row_text(&buf, 23).contains("Zoom"));
    }

    #[test]
    fn test_tooltip_drawn_when_visible() {
        let now = Instant::now();
        let mut app = App::new(MapRenderer::new(scene()), 80, 24, PathBuf::from("unused.svg"), now);
        let inner = app.map_area();
        let (col, row) = (inner.x + inner.width / 2, inner.y + inner.height / 2);

        // settle the fade-in before drawing
        app.pointer_moved(col, row, now - config::TOOLTIP_FADE_IN * 2);
        let buf = draw(&app, 80, 24);
        let tooltip_row = (row as i32 + config::TOOLTIP_OFFSET.1) as u16;
        assert!(row_text(&buf, tooltip_row).contains("Baldwin, AL: 50%"));

        // the chip carries the hovered region's bucket color
        let tooltip_col = (col as i32 + config::TOOLTIP_OFFSET.0) as u16;
        let chip = &buf[(tooltip_col + 1, tooltip_row)];
        assert_eq!(chip.symbol(), TOOLTIP_CHIP.to_string());
        let fill = app.map_renderer.scene().regions[1].fill;
        assert_eq!(chip.fg, color(BLACK.blend(fill, config::TOOLTIP_OPACITY)));
    }

    #[test]
    fn test_hovered_region_is_darkened() {
        let now = Instant::now();
        let mut app = App::new(MapRenderer::new(scene()), 80, 24, PathBuf::from("unused.svg"), now);
        let inner = app.map_area();
        let (col, row) = (inner.x + inner.width / 2, inner.y + inner.height / 2);
        app.pointer_moved(col, row, now);
        assert_eq!(app.hovered(), Some(1));

        let buf = draw(&app, 80, 24);
        let regions = &app.map_renderer.scene().regions;
        let darkened = color(regions[1].fill.blend(BLACK, HOVER_DARKEN));
        assert_eq!(buf[(col, row)].bg, darkened);

        let backgrounds: Vec<Color> = (inner.y..inner.y + inner.height)
            .flat_map(|y| (inner.x..inner.x + inner.width).map(move |x| (x, y)))
            .map(|(x, y)| buf[(x, y)].bg)
            .collect();
        assert!(!backgrounds.contains(&color(regions[1].fill)));
        assert!(backgrounds.contains(&color(regions[0].fill)));
    }
}
