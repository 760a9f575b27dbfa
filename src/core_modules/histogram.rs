// THEORY:
// The `Histogram` is the first analytical step of the pipeline. It turns a
// `PixelGrid` into a 256-bin distribution of intensities, where each bin holds
// the fraction of the image's pixels carrying that value. Traversal order does not
// matter; bins are computed as count / total, which agrees with repeatedly adding
// `1 / (rows * cols)` up to floating rounding.

pub mod histogram {
    use crate::core_modules::error::{Result, SegmentError};
    use crate::core_modules::grid::PixelGrid;

    /// Number of intensity levels in an 8-bit image.
    pub const BINS: usize = 256;

    /// Normalized intensity distribution of a single grid.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Histogram {
        /// Fraction of pixels at each intensity, indexed by intensity.
        bins: [f64; BINS],
        /// Number of pixels the histogram was built from.
        total: usize,
    }

    impl Histogram {
        pub fn from_grid(grid: &PixelGrid) -> Result<Self> {
            let total = grid.len();
            if total == 0 {
                return Err(SegmentError::EmptyImage {
                    rows: grid.rows(),
                    cols: grid.cols(),
                });
            }

            let mut counts = [0usize; BINS];
            for &value in grid.cells() {
                counts[value as usize] += 1;
            }

            let scale = 1.0 / total as f64;
            let mut bins = [0.0; BINS];
            for (bin, &count) in bins.iter_mut().zip(counts.iter()) {
                *bin = count as f64 * scale;
            }

            Ok(Self { bins, total })
        }

        /// Fraction of pixels with exactly this intensity.
        #[inline]
        pub fn mass(&self, intensity: u8) -> f64 {
            self.bins[intensity as usize]
        }

        pub fn bins(&self) -> &[f64; BINS] {
            &self.bins
        }

        pub fn total(&self) -> usize {
            self.total
        }

        /// Sum of all bins; 1.0 within rounding for any histogram built from a grid.
        pub fn total_mass(&self) -> f64 {
            self.bins.iter().sum()
        }
    }
}
