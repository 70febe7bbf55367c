use std::path::PathBuf;
use std::time::Duration;

pub const GEOMETRY_URL: &str =
    "https://raw.githubusercontent.com/no-stack-dub-sack/testable-projects-fcc/master/src/data/choropleth_map/counties.json";
pub const STATISTICS_URL: &str =
    "https://raw.githubusercontent.com/no-stack-dub-sack/testable-projects-fcc/master/src/data/choropleth_map/for_user_education.json";

/// Topology object holding the region polygons
pub const REGIONS_OBJECT: &str = "counties";
/// Topology object whose internal boundaries form the mesh
pub const MESH_OBJECT: &str = "states";

pub const TITLE: &str = "United States Educational Attainment";
pub const SUBTITLE: &str = "Percentage of 25+ adults with at least a bachelor's degree (2010-2014)";

// SVG canvas, in the coordinate space of the pre-projected topology
pub const WIDTH: f64 = 1000.0;
pub const HEIGHT: f64 = 700.0;
pub const MARGIN_TOP: f64 = 150.0;
pub const MARGIN_LEFT: f64 = 50.0;

pub const LEGEND_WIDTH: f64 = 250.0;
pub const LEGEND_HEIGHT: f64 = LEGEND_WIDTH / 20.0;
/// Legend position range on the SVG canvas, right-aligned 40px from the edge
pub const LEGEND_RANGE: (f64, f64) = (WIDTH - LEGEND_WIDTH - 40.0, WIDTH - 40.0);
/// Legend swatch opacity
pub const LEGEND_OPACITY: f64 = 0.8;
/// Terminal legend width in columns
pub const LEGEND_COLUMNS: u16 = 60;

pub const PALETTE: [&str; 9] = [
    "#fcfbfd", "#efedf5", "#dadaeb", "#bcbddc", "#9e9ac8", "#807dba", "#6a51a3", "#54278f", "#3f007d",
];

pub const TOOLTIP_OPACITY: f64 = 0.9;
pub const TOOLTIP_FADE_IN: Duration = Duration::from_millis(100);
pub const TOOLTIP_FADE_OUT: Duration = Duration::from_millis(300);
/// Tooltip offset from the pointer in terminal cells (x right, y up is negative)
pub const TOOLTIP_OFFSET: (i32, i32) = (2, -1);

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SVG_PATH: &str = "choropleth.svg";
pub const DEFAULT_LOG_PATH: &str = "tui-choropleth.log";

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub fn geometry_source() -> String {
    env_or("CHOROPLETH_GEOMETRY_URL", GEOMETRY_URL)
}

pub fn statistics_source() -> String {
    env_or("CHOROPLETH_STATISTICS_URL", STATISTICS_URL)
}

pub fn svg_path() -> PathBuf {
    PathBuf::from(env_or("CHOROPLETH_SVG_PATH", DEFAULT_SVG_PATH))
}

pub fn log_path() -> PathBuf {
    PathBuf::from(env_or("CHOROPLETH_LOG", DEFAULT_LOG_PATH))
}

pub fn http_timeout() -> Duration {
    std::env::var("CHOROPLETH_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
}
