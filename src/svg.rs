//! SVG export of a bound scene.
//!
//! The document mirrors the terminal view: title and description, one
//! `path.county` per region carrying its join key and metric as data
//! attributes (plus a `<title>` so viewers show the tooltip on hover), the
//! `path.states` mesh, and the `#legend` group with swatches and ticks.

use crate::bind::Scene;
use crate::config;
use crate::interaction::tooltip_text;
use crate::legend::Legend;
use anyhow::{Context, Result};
use geo::{Coord, LineString, MultiLineString, MultiPolygon};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Escape the five XML special characters
fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Shortest decimal form, rounded to 1/1000 of a unit
fn num(v: f64) -> String {
    let rounded = (v * 1000.0).round() / 1000.0;
    // avoid "-0"
    if rounded == 0.0 {
        "0".to_string()
    } else {
        rounded.to_string()
    }
}

fn push_points(d: &mut String, points: &[Coord<f64>]) {
    for (i, c) in points.iter().enumerate() {
        d.push(if i == 0 { 'M' } else { 'L' });
        d.push_str(&num(c.x));
        d.push(',');
        d.push_str(&num(c.y));
    }
}

fn push_ring(d: &mut String, ring: &LineString<f64>) {
    // The closing coordinate is implied by Z.
    let points = match ring.0.as_slice() {
        [first, .., last] if first == last => &ring.0[..ring.0.len() - 1],
        all => all,
    };
    push_points(d, points);
    if !points.is_empty() {
        d.push('Z');
    }
}

/// Path description for a multipolygon: one `M..L..Z` run per ring,
/// exterior before holes
pub fn polygon_path(shape: &MultiPolygon<f64>) -> String {
    let mut d = String::new();
    for polygon in shape {
        push_ring(&mut d, polygon.exterior());
        for hole in polygon.interiors() {
            push_ring(&mut d, hole);
        }
    }
    d
}

/// Path description for open lines: `M..L..` per line
pub fn lines_path(lines: &MultiLineString<f64>) -> String {
    let mut d = String::new();
    for line in lines.iter().filter(|l| l.0.len() > 1) {
        push_points(&mut d, &line.0);
    }
    d
}

fn write_header<W: Write>(w: &mut W, scene: &Scene) -> Result<()> {
    let (width, height) = (config::WIDTH, config::HEIGHT);
    writeln!(w, r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#)?;
    writeln!(
        w,
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="map" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    )?;
    writeln!(w, "<title>{}</title>", xml_escape(&scene.title))?;
    writeln!(
        w,
        r##"<defs>
<style>
    .county {{ stroke: none; }}
    .states {{ fill: none; stroke: #ffffff; stroke-width: 1; stroke-linejoin: round; }}
    #legend text {{ font-family: sans-serif; }}
</style>
</defs>"##
    )?;
    writeln!(w, r##"<rect width="100%" height="100%" fill="#ffffff"/>"##)?;

    let title_y = config::MARGIN_TOP / 2.5;
    writeln!(
        w,
        r#"<text id="title" x="{}" y="{}" text-anchor="middle" font-size="42">{}</text>"#,
        num(width / 2.0),
        num(title_y),
        xml_escape(&scene.title)
    )?;
    writeln!(
        w,
        r#"<text id="description" x="{}" y="{}" text-anchor="middle" font-size="18">{}</text>"#,
        num(width / 2.0),
        num(title_y + 30.0),
        xml_escape(&scene.subtitle)
    )?;
    Ok(())
}

fn write_regions<W: Write>(w: &mut W, scene: &Scene) -> Result<()> {
    let transform = format!("translate({}, {})", num(config::MARGIN_LEFT), num(config::MARGIN_TOP / 2.0));

    writeln!(w, r#"<g class="counties" transform="{transform}">"#)?;
    for region in &scene.regions {
        writeln!(
            w,
            r#"<path class="county" data-fips="{}" data-education="{}" fill="{}" d="{}"><title>{}</title></path>"#,
            xml_escape(&region.key),
            region.metric,
            region.fill,
            polygon_path(&region.shape),
            xml_escape(&tooltip_text(region)),
        )?;
    }
    writeln!(w, "</g>")?;

    writeln!(
        w,
        r#"<path class="states" transform="{transform}" d="{}"/>"#,
        lines_path(&scene.mesh)
    )?;
    Ok(())
}

fn write_legend<W: Write>(w: &mut W, legend: &Legend) -> Result<()> {
    let tick_size = config::LEGEND_HEIGHT + 3.0;

    writeln!(
        w,
        r#"<g id="legend" transform="translate({}, {})" font-size="9" font-weight="bold">"#,
        num(-config::MARGIN_LEFT),
        num(config::MARGIN_TOP)
    )?;
    for swatch in &legend.swatches {
        writeln!(
            w,
            r#"<rect class="swatch" x="{}" y="0" width="{}" height="{}" fill="{}" opacity="{}"/>"#,
            num(swatch.x),
            num(swatch.width),
            num(config::LEGEND_HEIGHT),
            swatch.color,
            swatch.opacity
        )?;
    }
    for tick in &legend.ticks {
        writeln!(
            w,
            r##"<g class="tick" transform="translate({}, 0)"><line y2="{}" stroke="#000000"/><text y="{}" dy="0.71em" text-anchor="middle">{}</text></g>"##,
            num(tick.x),
            num(tick_size),
            num(tick_size + 3.0),
            xml_escape(&tick.label)
        )?;
    }
    writeln!(w, "</g>")?;
    Ok(())
}

/// Serialize the scene; the legend comes from the scene's own scales
pub fn write_svg<W: Write>(w: &mut W, scene: &Scene) -> Result<()> {
    let legend = Legend::build(&scene.scales, config::LEGEND_OPACITY);
    write_header(w, scene)?;
    write_regions(w, scene)?;
    write_legend(w, &legend)?;
    writeln!(w, "</svg>")?;
    Ok(())
}

pub fn export_svg(scene: &Scene, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_svg(&mut writer, scene).with_context(|| format!("write {}", path.display()))?;
    writer.flush().with_context(|| format!("flush {}", path.display()))?;
    tracing::info!(path = %path.display(), regions = scene.regions.len(), "exported SVG");
    Ok(())
}
