use geo::Rect;
use std::collections::HashMap;

/// Cells along the longer side of the indexed area
const CELLS_ACROSS: f64 = 64.0;

/// Uniform grid over region bounding boxes.
/// Each region is inserted into every cell its bbox overlaps, so a point
/// query never misses the region containing it; candidates still need an
/// exact point-in-polygon check.
pub struct RegionIndex {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl RegionIndex {
    /// `bboxes` yields one entry per region; `None` entries are never found
    pub fn build(bboxes: impl Iterator<Item = Option<Rect<f64>>>, extent: &Rect<f64>) -> Self {
        let longest = extent.width().max(extent.height());
        let cell_size = if longest.is_finite() && longest > 0.0 {
            longest / CELLS_ACROSS
        } else {
            1.0
        };

        let mut index = Self {
            cells: HashMap::new(),
            cell_size,
        };

        for (idx, bbox) in bboxes.enumerate() {
            let Some(bbox) = bbox else {
                continue;
            };
            let (x0, y0) = index.to_cell(bbox.min().x, bbox.min().y);
            let (x1, y1) = index.to_cell(bbox.max().x, bbox.max().y);
            for y in y0..=y1 {
                for x in x0..=x1 {
                    index.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }

        index
    }

    #[inline(always)]
    fn to_cell(&self, x: f64, y: f64) -> (i32, i32) {
        ((x / self.cell_size).floor() as i32, (y / self.cell_size).floor() as i32)
    }

    /// Regions whose bbox may contain (x, y)
    pub fn candidates(&self, x: f64, y: f64) -> &[usize] {
        self.cells
            .get(&self.to_cell(x, y))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bb(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Rect<f64> {
        Rect::new((min_x, min_y), (max_x, max_y))
    }

    #[test]
    fn test_point_queries_find_overlapping_boxes() {
        let boxes = [Some(bb(0.0, 0.0, 10.0, 10.0)), Some(bb(50.0, 50.0, 64.0, 64.0))];
        let index = RegionIndex::build(boxes.into_iter(), &bb(0.0, 0.0, 64.0, 64.0));

        assert_eq!(index.candidates(5.0, 5.0), &[0]);
        assert_eq!(index.candidates(60.0, 55.0), &[1]);
        assert!(index.candidates(30.0, 30.0).is_empty());
        assert!(index.candidates(-100.0, 5.0).is_empty());
    }

    #[test]
    fn test_missing_boxes_are_skipped() {
        let boxes = [None, Some(bb(0.0, 0.0, 1.0, 1.0))];
        let index = RegionIndex::build(boxes.into_iter(), &bb(0.0, 0.0, 1.0, 1.0));
        assert_eq!(index.candidates(0.5, 0.5), &[1]);
    }
}
