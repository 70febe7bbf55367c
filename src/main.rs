use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use tui_choropleth::app::App;
use tui_choropleth::bind::{bind, Scene};
use tui_choropleth::color::parse_palette;
use tui_choropleth::config;
use tui_choropleth::data::{self, Source};
use tui_choropleth::map::MapRenderer;
use tui_choropleth::scale::Scales;
use tui_choropleth::ui;

fn main() -> Result<()> {
    init_tracing()?;

    // Load before touching the terminal so errors print normally
    let scene = build_scene()?;
    let renderer = MapRenderer::new(scene);

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, renderer);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(err) = &result {
        tracing::error!(error = %format!("{err:#}"), "event loop failed");
    }
    result
}

/// Log to a file: the terminal belongs to the UI while it runs
fn init_tracing() -> Result<()> {
    let path = config::log_path();
    let file = File::create(&path).with_context(|| format!("create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn build_scene() -> Result<Scene> {
    let geometry = Source::parse(&config::geometry_source());
    let statistics = Source::parse(&config::statistics_source());
    let datasets = data::load(&geometry, &statistics, config::http_timeout())?;

    let palette = parse_palette(&config::PALETTE)?;
    let scales = Scales::build(&datasets.statistics, &palette, config::LEGEND_RANGE)?;
    tracing::info!(
        min = scales.min,
        max = scales.max,
        thresholds = ?scales.color.thresholds(),
        "built scales"
    );

    let scene = bind(
        &datasets.geometry,
        &datasets.statistics,
        &scales,
        config::TITLE,
        config::SUBTITLE,
    )?;
    tracing::info!(regions = scene.regions.len(), mesh_lines = scene.mesh.0.len(), "scene ready");
    Ok(scene)
}

/// Handle mouse events for hovering, panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent, now: Instant) {
    match mouse.kind {
        MouseEventKind::Moved => app.pointer_moved(mouse.column, mouse.row, now),
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click and drag to pan
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
            app.mouse_pos = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, renderer: MapRenderer) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(renderer, size.width, size.height, config::svg_path(), Instant::now());

    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        // ~60fps while a fade runs, otherwise wait longer for input
        let timeout = if app.is_animating(Instant::now()) {
            Duration::from_millis(16)
        } else {
            Duration::from_millis(100)
        };

        if event::poll(timeout)? {
            let now = Instant::now();
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.status = None;
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.request_quit(),

                        // Pan with hjkl or arrow keys
                        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                        // Zoom
                        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                        KeyCode::Char('r') | KeyCode::Char('0') => app.reset(),
                        KeyCode::Char('e') => app.export_svg(),

                        _ => {}
                    }
                }
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse, now),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
            app.refresh_hover(now);
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
