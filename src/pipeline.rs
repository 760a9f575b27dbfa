// THEORY:
// The `pipeline` module is the top-level API of the segmentation engine. It runs
// the whole stack on one grid and hands back every intermediate the caller may
// want to show: the binary image, the label grid, the ranked islands and the
// filtered mask.
//
// Data only moves forward:
//   PixelGrid -> Histogram -> BinaryGrid -> LabelGrid -> [Island] -> BinaryGrid
// Each stage validates its own inputs. The configuration is checked once more up
// front so a bad setting fails before any work is done.

use crate::core_modules::error::Result;
use crate::core_modules::grid::{BinaryGrid, LabelGrid, PixelGrid};
use crate::core_modules::island_filter::{filter_islands, validate_island_count};
use crate::core_modules::island_labeler::{Labeling, label_islands, label_islands_bounded};
use crate::core_modules::island_ranker::rank_islands;
use crate::core_modules::threshold::threshold::{adaptive_threshold, validate_area_fraction};
use log::debug;

// Re-export key data structures for the public API.
pub use crate::core_modules::error::SegmentError;
pub use crate::core_modules::island_ranker::Island;

/// Fraction of the brightest pixel mass kept as foreground by default.
pub const DEFAULT_AREA_FRACTION: f64 = 0.04;
/// Number of largest islands kept by default.
pub const DEFAULT_ISLAND_COUNT: usize = 6;

/// Configuration for the segmentation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentConfig {
    /// Fraction of bright-pixel mass to retain as foreground, in (0, 1].
    pub area_fraction: f64,
    /// How many of the largest islands survive the final filter. Must be positive.
    pub island_count: usize,
    /// Upper bound on provisional labels. `None` lets the label store grow freely.
    pub max_labels: Option<usize>,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            area_fraction: DEFAULT_AREA_FRACTION,
            island_count: DEFAULT_ISLAND_COUNT,
            max_labels: None,
        }
    }
}

impl SegmentConfig {
    pub fn validate(&self) -> Result<()> {
        validate_area_fraction(self.area_fraction)?;
        validate_island_count(self.island_count)?;
        Ok(())
    }
}

/// Everything produced while segmenting one grid.
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Pixels strictly above this intensity were foreground.
    pub threshold: u8,
    pub binary: BinaryGrid,
    pub labels: LabelGrid,
    /// All islands, largest first.
    pub islands: Vec<Island>,
    /// `binary` reduced to the retained islands.
    pub filtered: BinaryGrid,
    /// How many islands the filter was asked to keep.
    pub island_count: usize,
}

impl Segmentation {
    pub fn foreground_count(&self) -> usize {
        self.binary.foreground_count()
    }

    pub fn retained_count(&self) -> usize {
        self.filtered.foreground_count()
    }

    /// The islands that made it into `filtered`.
    pub fn retained_islands(&self) -> &[Island] {
        &self.islands[..self.island_count.min(self.islands.len())]
    }
}

/// The main, top-level struct for the segmentation engine.
#[derive(Debug, Clone)]
pub struct SegmentationPipeline {
    config: SegmentConfig,
}

impl SegmentationPipeline {
    pub fn new(config: SegmentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }

    pub fn run(&self, grid: &PixelGrid) -> Result<Segmentation> {
        // Stage 1: Histogram + adaptive threshold
        let binarization = adaptive_threshold(grid, self.config.area_fraction)?;

        // Stage 2: Island labelling
        let Labeling { labels, .. } = match self.config.max_labels {
            Some(max_labels) => label_islands_bounded(&binarization.binary, max_labels)?,
            None => label_islands(&binarization.binary)?,
        };

        // Stage 3: Ranking by area
        let islands = rank_islands(&labels);

        // Stage 4: Keep the largest
        let filtered = filter_islands(&labels, &islands, self.config.island_count)?;

        debug!(
            "segmented {}x{} grid: threshold {}, {} islands, {} of {} foreground pixels retained",
            grid.rows(),
            grid.cols(),
            binarization.threshold,
            islands.len(),
            filtered.foreground_count(),
            binarization.binary.foreground_count()
        );

        Ok(Segmentation {
            threshold: binarization.threshold,
            binary: binarization.binary,
            labels,
            islands,
            filtered,
            island_count: self.config.island_count,
        })
    }
}

/// One-shot segmentation with an unbounded label store.
pub fn segment(grid: &PixelGrid, area_fraction: f64, island_count: usize) -> Result<Segmentation> {
    let config = SegmentConfig {
        area_fraction,
        island_count,
        ..SegmentConfig::default()
    };
    SegmentationPipeline::new(config)?.run(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = SegmentConfig::default();
        assert_eq!(config.area_fraction, 0.04);
        assert_eq!(config.island_count, 6);
        assert_eq!(config.max_labels, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_config_fails_before_running() {
        let bad_fraction = SegmentConfig {
            area_fraction: 1.5,
            ..SegmentConfig::default()
        };
        assert!(matches!(
            SegmentationPipeline::new(bad_fraction),
            Err(SegmentError::InvalidParameter { name: "area_fraction", .. })
        ));

        let bad_count = SegmentConfig {
            island_count: 0,
            ..SegmentConfig::default()
        };
        assert!(matches!(
            SegmentationPipeline::new(bad_count),
            Err(SegmentError::InvalidParameter { name: "island_count", .. })
        ));
    }

    #[test]
    fn bounded_store_surfaces_capacity_error() {
        let grid =
            PixelGrid::from_rows(vec![vec![200, 0, 200], vec![0, 0, 0], vec![200, 0, 200]])
                .unwrap();
        let pipeline = SegmentationPipeline::new(SegmentConfig {
            area_fraction: 1.0,
            island_count: 1,
            max_labels: Some(3),
        })
        .unwrap();
        assert_eq!(
            pipeline.run(&grid).unwrap_err(),
            SegmentError::CapacityExceeded { capacity: 3 }
        );
    }

    #[test]
    fn retained_islands_follow_the_count() {
        let grid = PixelGrid::from_rows(vec![
            vec![90, 90, 0, 90],
            vec![0, 0, 0, 90],
            vec![90, 0, 0, 90],
        ])
        .unwrap();
        let result = segment(&grid, 1.0, 2).unwrap();
        assert_eq!(result.islands.len(), 3);
        assert_eq!(result.retained_islands().len(), 2);
        assert_eq!(result.retained_islands()[0].area, 3);
        assert_eq!(result.retained_islands()[1].area, 2);
        assert_eq!(result.retained_count(), 5);
        assert_eq!(result.foreground_count(), 6);
    }
}
