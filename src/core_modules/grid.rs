// THEORY:
// The `Grid` is the "dumb" data container shared by every stage of the pipeline.
// It owns a flat, row-major buffer and knows its own dimensions, nothing more.
// The same container carries four different meanings as data moves forward:
//
// - `PixelGrid`:  the decoded intensities, 0..=255.
// - `BinaryGrid`: the thresholded image, each cell either 0 or 255.
// - `LabelGrid`:  component labels, 0 for background.
//
// A grid is never empty: the public constructors reject zero rows or columns, so
// every later stage can rely on at least one cell being present. Cells are only
// written from inside the crate while a stage builds its own output; once handed
// to the caller a grid is read-only.

use crate::core_modules::error::{Result, SegmentError};

/// Value of a foreground cell in a `BinaryGrid`.
pub const FOREGROUND: u8 = 255;
/// Value of a background cell in a `BinaryGrid`.
pub const BACKGROUND: u8 = 0;

/// A rows x cols raster stored in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

/// Decoded 8-bit grayscale intensities.
pub type PixelGrid = Grid<u8>;
/// Two-level image, `FOREGROUND` or `BACKGROUND` per cell.
pub type BinaryGrid = Grid<u8>;
/// Component labels, `0` for background.
pub type LabelGrid = Grid<u32>;

impl<T: Copy> Grid<T> {
    /// Wraps a row-major buffer. Fails on empty dimensions or a length mismatch.
    pub fn new(rows: usize, cols: usize, cells: Vec<T>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(SegmentError::EmptyImage { rows, cols });
        }
        let expected = rows
            .checked_mul(cols)
            .ok_or(SegmentError::DimensionMismatch {
                expected: usize::MAX,
                actual: cells.len(),
            })?;
        if cells.len() != expected {
            return Err(SegmentError::DimensionMismatch {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { rows, cols, cells })
    }

    /// Builds a grid from nested rows. All rows must share the first row's length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if let Some(ragged) = rows.iter().find(|row| row.len() != width) {
            return Err(SegmentError::DimensionMismatch {
                expected: width,
                actual: ragged.len(),
            });
        }
        let cells = rows.into_iter().flatten().collect();
        Self::new(height, width, cells)
    }

    /// A grid of the given shape with every cell set to `value`.
    pub(crate) fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            cells: vec![value; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of cells (rows * cols).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false for a constructed grid.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Row-major view of all cells.
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.cells[row * self.cols + col]
    }

    #[inline]
    pub(crate) fn set(&mut self, row: usize, col: usize, value: T) {
        self.cells[row * self.cols + col] = value;
    }

    /// Same shape as `other`, regardless of cell type.
    pub fn same_shape<U>(&self, other: &Grid<U>) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }

    /// Applies `f` to every cell, keeping the shape.
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> Grid<U> {
        Grid {
            rows: self.rows,
            cols: self.cols,
            cells: self.cells.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Number of cells for which `predicate` holds.
    pub fn count(&self, predicate: impl Fn(T) -> bool) -> usize {
        self.cells.iter().filter(|&&v| predicate(v)).count()
    }
}

impl Grid<u8> {
    /// Builds a `PixelGrid` from wider integers, rejecting anything outside 0..=255.
    pub fn from_wide<W>(rows: usize, cols: usize, values: &[W]) -> Result<PixelGrid>
    where
        W: Copy + Into<i64>,
    {
        let mut cells = Vec::with_capacity(values.len());
        for (index, &value) in values.iter().enumerate() {
            let wide: i64 = value.into();
            let narrow = u8::try_from(wide).map_err(|_| SegmentError::UnsupportedDepth {
                detail: format!("value {wide} at index {index} is outside 0..=255"),
            })?;
            cells.push(narrow);
        }
        Grid::new(rows, cols, cells)
    }

    /// Number of `FOREGROUND` cells.
    pub fn foreground_count(&self) -> usize {
        self.count(|v| v == FOREGROUND)
    }
}
