use crate::bind::Scene;
use crate::braille::BrailleCanvas;
use crate::map::geometry::draw_line;
use crate::map::projection::Viewport;
use crate::map::spatial::RegionIndex;
use geo::{Contains, LineString, Point};
use rayon::prelude::*;

/// One frame of the map, sized in terminal cells
pub struct MapLayers {
    pub width: usize,
    pub height: usize,
    /// Region under each cell center, row-major
    pub regions: Vec<Option<usize>>,
    /// Subdivision boundaries
    pub mesh: BrailleCanvas,
}

impl MapLayers {
    pub fn region_at(&self, cx: usize, cy: usize) -> Option<usize> {
        if cx >= self.width || cy >= self.height {
            return None;
        }
        self.regions[cy * self.width + cx]
    }
}

/// Owns the bound scene and answers "which region is here" quickly
pub struct MapRenderer {
    scene: Scene,
    index: RegionIndex,
}

impl MapRenderer {
    pub fn new(scene: Scene) -> Self {
        let index = RegionIndex::build(scene.regions.iter().map(|r| r.bbox), &scene.bounds);
        Self { scene, index }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Region containing a data-space point; holes are outside
    pub fn hit_test(&self, x: f64, y: f64) -> Option<usize> {
        let point = Point::new(x, y);
        self.index.candidates(x, y).iter().copied().find(|&idx| {
            let region = &self.scene.regions[idx];
            region.bbox.is_some_and(|bbox| bbox.contains(&point)) && region.shape.contains(&point)
        })
    }

    /// Region under the center of terminal cell (cx, cy)
    pub fn region_at_cell(&self, viewport: &Viewport, cx: usize, cy: usize) -> Option<usize> {
        let p = viewport.unproject(cx as f64 * 2.0 + 1.0, cy as f64 * 4.0 + 2.0);
        self.hit_test(p.x, p.y)
    }

    /// Rasterize fills (row-parallel) and stroke the mesh for a
    /// `width` x `height` character area
    pub fn render(&self, width: usize, height: usize, viewport: &Viewport) -> MapLayers {
        let regions: Vec<Option<usize>> = (0..height)
            .into_par_iter()
            .flat_map_iter(|cy| (0..width).map(move |cx| (cx, cy)))
            .map(|(cx, cy)| self.region_at_cell(viewport, cx, cy))
            .collect();

        let mut mesh = BrailleCanvas::new(width, height);
        for line in &self.scene.mesh {
            draw_linestring(&mut mesh, line, viewport);
        }

        MapLayers {
            width,
            height,
            regions,
            mesh,
        }
    }
}

/// Stroke a projected linestring, skipping off-screen segments
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString<f64>, viewport: &Viewport) {
    if line.0.len() < 2 {
        return;
    }

    let mut prev = None;
    for coord in line.coords() {
        let p = viewport.project(coord.x, coord.y);
        if let Some(q) = prev {
            if viewport.segment_might_be_visible(q, p) {
                draw_line(canvas, q.x as i32, q.y as i32, p.x as i32, p.y as i32);
            }
        }
        prev = Some(p);
    }
}
