// THEORY:
// The `island_labeler` is the engine of the spatial grouping step. It turns a
// `BinaryGrid` into a `LabelGrid` where every connected foreground region
// ("island") carries a single label.
//
// Algorithm:
// 1.  **Single raster pass**: pixels are visited row by row, left to right. For a
//     foreground pixel only the *causal* neighbors are read, the ones already
//     visited: up-right, up, up-left and left, in that order. Because every pair
//     of touching pixels is seen from the later of the two, no second merge pass
//     over future pixels is required.
// 2.  **Incremental union-find**: the first labelled neighbor donates its current
//     root. Every further neighbor whose root differs is merged by hanging the
//     pixel's root under the neighbor's root. A pixel with no labelled neighbor
//     opens a fresh set.
// 3.  **Resolution**: a second pass rewrites every label to its root, so all pixels
//     of an island agree on one canonical label.
//
// Border quirk: neighbor coordinates are clamped into the grid instead of being
// treated as background. On the top row, "up" clamps to the pixel itself and
// "up-right" to the not-yet-visited pixel to its right; on the left column "left"
// clamps to the pixel itself and "up-left" to "up"; on the right column "up-right"
// clamps to "up". These lookups read the pixel's own label or a still-zero cell,
// and the labelling depends on them landing exactly there.

use crate::core_modules::disjoint_set::DisjointSet;
use crate::core_modules::error::Result;
use crate::core_modules::grid::{BinaryGrid, LabelGrid};
use log::{debug, trace};

/// Causal neighbor offsets as (row, col), in lookup order.
pub const CAUSAL_OFFSETS: [(isize, isize); 4] = [(-1, 1), (-1, 0), (-1, -1), (0, -1)];

/// A resolved label grid together with the forest that produced it.
#[derive(Debug, Clone)]
pub struct Labeling {
    pub labels: LabelGrid,
    pub sets: DisjointSet,
}

impl Labeling {
    /// Number of distinct islands in the grid.
    pub fn island_count(&self) -> usize {
        self.sets.root_count()
    }
}

/// Clamps `(row + dr, col + dc)` into a `rows` x `cols` grid.
#[inline]
pub fn clamped_neighbor(
    row: usize,
    col: usize,
    (dr, dc): (isize, isize),
    rows: usize,
    cols: usize,
) -> (usize, usize) {
    let r = (row as isize + dr).clamp(0, rows as isize - 1) as usize;
    let c = (col as isize + dc).clamp(0, cols as isize - 1) as usize;
    (r, c)
}

/// Labels every island with an unbounded label store.
pub fn label_islands(binary: &BinaryGrid) -> Result<Labeling> {
    label_with(binary, DisjointSet::new())
}

/// Labels every island, failing with `CapacityExceeded` past `max_labels` labels.
pub fn label_islands_bounded(binary: &BinaryGrid, max_labels: usize) -> Result<Labeling> {
    label_with(binary, DisjointSet::bounded(max_labels))
}

fn label_with(binary: &BinaryGrid, mut sets: DisjointSet) -> Result<Labeling> {
    let rows = binary.rows();
    let cols = binary.cols();
    let mut labels = LabelGrid::filled(rows, cols, 0);

    // --- Pass 1: provisional labels and merges ---
    for row in 0..rows {
        for col in 0..cols {
            if binary.get(row, col) == 0 {
                continue;
            }

            for offset in CAUSAL_OFFSETS {
                let (nr, nc) = clamped_neighbor(row, col, offset, rows, cols);
                let neighbor = labels.get(nr, nc);
                if neighbor == 0 {
                    continue;
                }

                let current = labels.get(row, col);
                if current == 0 {
                    labels.set(row, col, sets.find(neighbor));
                } else if sets.attach(current, neighbor) {
                    trace!("merged label {current} into {neighbor} at ({row}, {col})");
                }
            }

            if labels.get(row, col) == 0 {
                labels.set(row, col, sets.make_set()?);
            }
        }
    }

    // --- Pass 2: resolve to roots ---
    for row in 0..rows {
        for col in 0..cols {
            let label = labels.get(row, col);
            if label != 0 {
                labels.set(row, col, sets.find(label));
            }
        }
    }

    debug!(
        "labelled {}x{} grid: {} labels allocated, {} islands",
        rows,
        cols,
        sets.label_count(),
        sets.root_count()
    );

    Ok(Labeling { labels, sets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::error::SegmentError;

    fn binary(rows: Vec<Vec<u8>>) -> BinaryGrid {
        let scaled = rows
            .into_iter()
            .map(|row| row.into_iter().map(|v| v * 255).collect())
            .collect();
        BinaryGrid::from_rows(scaled).unwrap()
    }

    #[test]
    fn background_stays_zero() {
        let labeling = label_islands(&binary(vec![vec![0, 0], vec![0, 0]])).unwrap();
        assert!(labeling.labels.cells().iter().all(|&l| l == 0));
        assert_eq!(labeling.island_count(), 0);
    }

    #[test]
    fn separate_blobs_get_separate_labels() {
        let labeling = label_islands(&binary(vec![
            vec![1, 1, 0, 0, 1],
            vec![1, 0, 0, 0, 1],
            vec![0, 0, 0, 0, 0],
            vec![0, 0, 1, 0, 0],
        ]))
        .unwrap();
        let l = &labeling.labels;
        assert_eq!(labeling.island_count(), 3);
        assert_eq!(l.get(0, 0), l.get(0, 1));
        assert_eq!(l.get(0, 0), l.get(1, 0));
        assert_eq!(l.get(0, 4), l.get(1, 4));
        assert_ne!(l.get(0, 0), l.get(0, 4));
        assert_ne!(l.get(3, 2), l.get(0, 0));
        assert_ne!(l.get(3, 2), l.get(0, 4));
    }

    #[test]
    fn diagonals_connect_both_ways() {
        // Up-left and up-right lookups join both diagonal directions.
        let labeling = label_islands(&binary(vec![
            vec![1, 0, 0, 0, 1],
            vec![0, 1, 0, 1, 0],
            vec![0, 0, 1, 0, 0],
        ]))
        .unwrap();
        assert_eq!(labeling.island_count(), 1);
        let root = labeling.labels.get(0, 0);
        assert_eq!(labeling.labels.count(|l| l == root), 5);
    }

    #[test]
    fn u_shape_merges_late() {
        // The two arms get different provisional labels and only meet on the
        // bottom row.
        let labeling = label_islands(&binary(vec![
            vec![1, 0, 0, 1],
            vec![1, 0, 0, 1],
            vec![1, 1, 1, 1],
        ]))
        .unwrap();
        assert_eq!(labeling.sets.label_count(), 2);
        assert_eq!(labeling.island_count(), 1);
        let root = labeling.labels.get(0, 0);
        assert!(labeling.labels.cells().iter().all(|&l| l == 0 || l == root));
        // At (2, 2) the pixel first adopts the right arm's label from up-right,
        // then meets the left arm on its left and hangs its root under it.
        assert_eq!(root, 1);
    }

    #[test]
    fn clamped_lookups_land_on_self_or_earlier_pixels() {
        let (rows, cols) = (3, 4);
        // Top-left corner: every offset clamps to the pixel itself or its right neighbor.
        assert_eq!(clamped_neighbor(0, 0, (-1, 1), rows, cols), (0, 1));
        assert_eq!(clamped_neighbor(0, 0, (-1, 0), rows, cols), (0, 0));
        assert_eq!(clamped_neighbor(0, 0, (-1, -1), rows, cols), (0, 0));
        assert_eq!(clamped_neighbor(0, 0, (0, -1), rows, cols), (0, 0));
        // Right edge: up-right clamps to up.
        assert_eq!(clamped_neighbor(2, 3, (-1, 1), rows, cols), (1, 3));
        // Left edge: up-left clamps to up, left clamps to self.
        assert_eq!(clamped_neighbor(1, 0, (-1, -1), rows, cols), (0, 0));
        assert_eq!(clamped_neighbor(1, 0, (0, -1), rows, cols), (1, 0));
    }

    #[test]
    fn border_pixels_label_like_interior_pixels() {
        // A full-width top row and a single right-edge column form one island;
        // a lone pixel on the left edge two rows down is its own island.
        let labeling = label_islands(&binary(vec![
            vec![1, 1, 1],
            vec![0, 0, 1],
            vec![1, 0, 0],
        ]))
        .unwrap();
        assert_eq!(labeling.island_count(), 2);
        // The top row is labelled left to right from a single fresh label.
        assert_eq!(labeling.sets.label_count(), 2);
        assert_eq!(labeling.labels.get(0, 0), 1);
        assert_eq!(labeling.labels.get(1, 2), 1);
        assert_eq!(labeling.labels.get(2, 0), 2);
    }

    #[test]
    fn single_column_grid() {
        let labeling = label_islands(&binary(vec![vec![1], vec![1], vec![0], vec![1]])).unwrap();
        assert_eq!(labeling.island_count(), 2);
        assert_eq!(labeling.labels.cells(), &[1, 1, 0, 2]);
    }

    #[test]
    fn bounded_labeler_reports_capacity() {
        let checker = binary(vec![vec![1, 0, 1, 0, 1], vec![0, 0, 0, 0, 0], vec![1, 0, 1, 0, 1]]);
        assert_eq!(
            label_islands_bounded(&checker, 5).unwrap_err(),
            SegmentError::CapacityExceeded { capacity: 5 }
        );
        assert_eq!(label_islands_bounded(&checker, 6).unwrap().island_count(), 6);
    }

    #[test]
    fn many_tiny_islands_fit_the_dynamic_store() {
        // 2500 isolated pixels, more than a 2048-slot table could hold.
        let size = 100;
        let cells: Vec<u8> = (0..size * size)
            .map(|i| if (i / size) % 2 == 0 && (i % size) % 2 == 0 { 255 } else { 0 })
            .collect();
        let grid = BinaryGrid::new(size, size, cells).unwrap();
        let labeling = label_islands(&grid).unwrap();
        assert_eq!(labeling.island_count(), 2500);
    }
}
