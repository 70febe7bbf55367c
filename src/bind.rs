//! Joins region geometry to statistic records and colors each region.

use crate::color::Rgb;
use crate::data::{GeometrySet, StatisticRecord};
use crate::scale::Scales;
use anyhow::{bail, Context, Result};
use geo::{BoundingRect, Coord, LineString, MultiLineString, MultiPolygon, Polygon, Rect};
use geojson::{feature::Id, Geometry, Value};
use std::collections::HashMap;

/// A region ready to draw, with the data its interaction handlers read
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub key: String,
    pub metric: f64,
    pub name: String,
    pub group: String,
    pub fill: Rgb,
    pub shape: MultiPolygon<f64>,
    /// `None` for a region without geometry
    pub bbox: Option<Rect<f64>>,
}

/// Everything a rendering surface needs; immutable once built
#[derive(Clone, Debug)]
pub struct Scene {
    pub title: String,
    pub subtitle: String,
    pub regions: Vec<Region>,
    /// Internal subdivision boundaries, stroked above the regions
    pub mesh: MultiLineString<f64>,
    pub bounds: Rect<f64>,
    pub scales: Scales,
}

fn key_of(id: &Id) -> String {
    match id {
        Id::String(s) => s.clone(),
        Id::Number(n) => n.to_string(),
    }
}

fn line(positions: &[Vec<f64>]) -> LineString<f64> {
    positions
        .iter()
        .filter_map(|p| match p.as_slice() {
            [x, y, ..] => Some(Coord { x: *x, y: *y }),
            _ => None,
        })
        .collect()
}

fn polygon(rings: &[Vec<Vec<f64>>]) -> Option<Polygon<f64>> {
    let (exterior, holes) = rings.split_first()?;
    Some(Polygon::new(line(exterior), holes.iter().map(|h| line(h)).collect()))
}

fn shape_of(geometry: &Geometry) -> MultiPolygon<f64> {
    match &geometry.value {
        Value::Polygon(rings) => polygon(rings).into_iter().collect(),
        Value::MultiPolygon(polygons) => polygons.iter().filter_map(|p| polygon(p)).collect(),
        _ => MultiPolygon::new(Vec::new()),
    }
}

fn lines_of(geometry: &Geometry) -> MultiLineString<f64> {
    match &geometry.value {
        Value::LineString(positions) => MultiLineString::new(vec![line(positions)]),
        Value::MultiLineString(lines) => lines.iter().map(|l| line(l)).collect(),
        _ => MultiLineString::new(Vec::new()),
    }
}

/// Join every region feature to the record sharing its key.
///
/// Fails on a feature without id, a key with no record, or duplicate record
/// keys. Records left without a feature are logged and ignored.
pub fn bind(
    geometry: &GeometrySet,
    records: &[StatisticRecord],
    scales: &Scales,
    title: &str,
    subtitle: &str,
) -> Result<Scene> {
    let mut by_key: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        if by_key.insert(record.key.as_str(), idx).is_some() {
            bail!("join error: duplicate statistic record for key {:?}", record.key);
        }
    }

    let mut used = vec![false; records.len()];
    let mut regions = Vec::with_capacity(geometry.regions.features.len());

    for (position, feature) in geometry.regions.features.iter().enumerate() {
        let Some(id) = feature.id.as_ref() else {
            bail!("join error: region feature #{position} has no identifier");
        };
        let key = key_of(id);
        let Some(&idx) = by_key.get(key.as_str()) else {
            bail!("join error: no statistic record for region {key:?}");
        };
        used[idx] = true;
        let record = &records[idx];

        let shape = feature
            .geometry
            .as_ref()
            .map(shape_of)
            .unwrap_or_else(|| MultiPolygon::new(Vec::new()));

        regions.push(Region {
            key,
            metric: record.metric,
            name: record.name.clone(),
            group: record.group.clone(),
            fill: scales.color.color_of(record.metric),
            bbox: shape.bounding_rect(),
            shape,
        });
    }

    let unused = used.iter().filter(|u| !**u).count();
    if unused > 0 {
        tracing::warn!(unused, "statistic records without a matching region");
    }

    let mesh = lines_of(&geometry.mesh);

    // Extent of every region box plus the mesh
    let bounds = regions
        .iter()
        .filter_map(|r| r.bbox)
        .chain(mesh.bounding_rect())
        .map(Polygon::from)
        .collect::<MultiPolygon<f64>>()
        .bounding_rect()
        .context("scene has no drawable geometry")?;

    tracing::debug!(regions = regions.len(), mesh_lines = mesh.0.len(), "bound scene");

    Ok(Scene {
        title: title.to_string(),
        subtitle: subtitle.to_string(),
        regions,
        mesh,
        bounds,
        scales: scales.clone(),
    })
}
