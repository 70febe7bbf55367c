//! TopoJSON decoding into GeoJSON features and boundary meshes.
//!
//! Arcs are stored once and referenced by index from polygons; `~i`
//! (a negative index) means arc `i` traversed backwards. Quantized
//! topologies delta-encode every arc and carry a `transform` that maps the
//! integer grid back to coordinates.

use super::RawKey;
use anyhow::{bail, Context, Result};
use geojson::{feature::Id, Feature, FeatureCollection, Geometry, Value};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum GeometryObject {
    GeometryCollection {
        geometries: Vec<Member>,
    },
    Polygon {
        arcs: Vec<Vec<i64>>,
        #[serde(default)]
        id: Option<RawKey>,
    },
    MultiPolygon {
        arcs: Vec<Vec<Vec<i64>>>,
        #[serde(default)]
        id: Option<RawKey>,
    },
    LineString {
        arcs: Vec<i64>,
    },
    MultiLineString {
        arcs: Vec<Vec<i64>>,
    },
    Point {
        coordinates: Vec<f64>,
    },
    MultiPoint {
        coordinates: Vec<Vec<f64>>,
    },
}

/// An object or collection member. `"type": null` is a null geometry that
/// still carries its id.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Member {
    Geometry(GeometryObject),
    Null {
        #[serde(rename = "type")]
        _kind: (),
        #[serde(default)]
        id: Option<RawKey>,
    },
}

#[derive(Debug, Deserialize)]
struct RawTopology {
    #[serde(default)]
    transform: Option<Transform>,
    arcs: Vec<Vec<Vec<f64>>>,
    objects: HashMap<String, Member>,
}

/// A decoded topology: absolute arc coordinates plus the named objects
pub struct Topology {
    arcs: Vec<Vec<(f64, f64)>>,
    objects: HashMap<String, Member>,
}

/// Region polygons and the mesh of higher-level boundaries, ready to bind
pub struct GeometrySet {
    pub regions: FeatureCollection,
    pub mesh: Geometry,
}

impl Topology {
    pub fn parse(bytes: &mut [u8]) -> Result<Self> {
        let raw: RawTopology =
            simd_json::serde::from_slice(bytes).context("geometry payload is not a TopoJSON topology")?;

        let arcs = raw
            .arcs
            .iter()
            .enumerate()
            .map(|(i, arc)| decode_arc(arc, raw.transform).with_context(|| format!("arc {i} is malformed")))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            arcs,
            objects: raw.objects,
        })
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    fn object(&self, name: &str) -> Result<&Member> {
        self.objects
            .get(name)
            .with_context(|| format!("topology has no object named {name:?}"))
    }

    /// Convert the polygons of a named object into a feature collection.
    /// Null geometries become features without geometry; non-areal
    /// geometries are skipped.
    pub fn features(&self, name: &str) -> Result<FeatureCollection> {
        let mut features = Vec::new();
        let mut skipped = 0usize;

        for geometry in flatten(self.object(name)?) {
            let (value, id) = match geometry {
                Member::Geometry(GeometryObject::Polygon { arcs, id }) => {
                    (Some(Value::Polygon(self.polygon(arcs)?)), id)
                }
                Member::Geometry(GeometryObject::MultiPolygon { arcs, id }) => (
                    Some(Value::MultiPolygon(
                        arcs.iter().map(|p| self.polygon(p)).collect::<Result<_>>()?,
                    )),
                    id,
                ),
                Member::Null { id, .. } => (None, id),
                _ => {
                    skipped += 1;
                    continue;
                }
            };

            features.push(Feature {
                bbox: None,
                geometry: value.map(Geometry::new),
                id: id.as_ref().map(|k| Id::String(k.to_key())),
                properties: None,
                foreign_members: None,
            });
        }

        if skipped > 0 {
            tracing::warn!(object = name, skipped, "ignored non-polygon geometries");
        }

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }

    /// Lines along arcs of a named object's polygons, keeping an arc only when
    /// `keep(first, last)` holds for the first and last geometries using it.
    /// `|a, b| a != b` yields the internal boundaries between neighbours.
    pub fn mesh<F>(&self, name: &str, keep: F) -> Result<Geometry>
    where
        F: Fn(usize, usize) -> bool,
    {
        let mut geoms_by_arc: Vec<Vec<usize>> = vec![Vec::new(); self.arcs.len()];

        for (g, geometry) in flatten(self.object(name)?).enumerate() {
            let rings: Box<dyn Iterator<Item = &Vec<i64>> + '_> = match geometry {
                Member::Geometry(GeometryObject::Polygon { arcs, .. }) => Box::new(arcs.iter()),
                Member::Geometry(GeometryObject::MultiPolygon { arcs, .. }) => {
                    Box::new(arcs.iter().flatten())
                }
                _ => continue,
            };
            for ring in rings {
                for &index in ring {
                    let arc = arc_index(index);
                    let owners = geoms_by_arc
                        .get_mut(arc)
                        .with_context(|| format!("{name:?} references missing arc {arc}"))?;
                    // A geometry may touch the same arc twice; count it once.
                    if owners.last() != Some(&g) {
                        owners.push(g);
                    }
                }
            }
        }

        let lines = geoms_by_arc
            .iter()
            .enumerate()
            .filter_map(|(arc, owners)| match (owners.first(), owners.last()) {
                (Some(&a), Some(&b)) if keep(a, b) => Some(arc),
                _ => None,
            })
            .map(|arc| self.arcs[arc].iter().map(|&(x, y)| vec![x, y]).collect())
            .collect();

        Ok(Geometry::new(Value::MultiLineString(lines)))
    }

    /// Decode the region object and the interior mesh of the boundary object
    pub fn geometry_set(&self, regions: &str, boundaries: &str) -> Result<GeometrySet> {
        Ok(GeometrySet {
            regions: self.features(regions)?,
            mesh: self.mesh(boundaries, |a, b| a != b)?,
        })
    }

    fn polygon(&self, rings: &[Vec<i64>]) -> Result<Vec<Vec<Vec<f64>>>> {
        rings.iter().map(|r| self.ring(r)).collect()
    }

    fn ring(&self, indices: &[i64]) -> Result<Vec<Vec<f64>>> {
        let mut points: Vec<(f64, f64)> = Vec::new();

        for &index in indices {
            let arc = self
                .arcs
                .get(arc_index(index))
                .with_context(|| format!("ring references missing arc {}", arc_index(index)))?;
            // Consecutive arcs share their junction point.
            points.pop();
            if index < 0 {
                points.extend(arc.iter().rev());
            } else {
                points.extend(arc.iter());
            }
        }

        if let Some(&first) = points.first() {
            while points.len() < 4 {
                points.push(first);
            }
        }

        Ok(points.into_iter().map(|(x, y)| vec![x, y]).collect())
    }
}

#[inline(always)]
fn arc_index(index: i64) -> usize {
    if index < 0 {
        !index as usize
    } else {
        index as usize
    }
}

/// Member geometries of a collection, or the object itself
fn flatten(object: &Member) -> Box<dyn Iterator<Item = &Member> + '_> {
    match object {
        Member::Geometry(GeometryObject::GeometryCollection { geometries }) => Box::new(geometries.iter()),
        other => Box::new(std::iter::once(other)),
    }
}

fn decode_arc(arc: &[Vec<f64>], transform: Option<Transform>) -> Result<Vec<(f64, f64)>> {
    let mut out = Vec::with_capacity(arc.len());
    let (mut x, mut y) = (0.0, 0.0);

    for position in arc {
        let (px, py) = match position.as_slice() {
            [px, py, ..] => (*px, *py),
            _ => bail!("position has fewer than two coordinates"),
        };
        match transform {
            Some(t) => {
                x += px;
                y += py;
                out.push((x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1]));
            }
            None => out.push((px, py)),
        }
    }

    Ok(out)
}
