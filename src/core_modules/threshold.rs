// THEORY:
// The adaptive thresholder decides which pixels are "bright enough" to count as
// foreground without a hard-coded cutoff. It walks the histogram from the top
// (255) downward, accumulating mass, and stops once the accumulated mass reaches
// the requested area fraction `p`. The bin the walk stops on is the threshold,
// and a pixel is foreground only when it is strictly brighter.
//
// Properties worth keeping in mind:
// 1.  **Greedy inverse CDF**: the walk stops only after the mass has crossed `p`,
//     so slightly more than `p` of the image tends to survive.
// 2.  **Zero never survives**: the threshold is never below 0 and the comparison
//     is strict, so intensity-0 pixels are background for every `p`.
// 3.  **Full mass**: `p == 1.0` short-circuits to threshold 0.

pub mod threshold {
    use crate::core_modules::error::{Result, SegmentError};
    use crate::core_modules::grid::{BACKGROUND, BinaryGrid, FOREGROUND, PixelGrid};
    use crate::core_modules::histogram::histogram::Histogram;
    use log::debug;

    /// The output of adaptive binarization.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Binarization {
        /// Pixels strictly above this value are foreground.
        pub threshold: u8,
        pub binary: BinaryGrid,
    }

    /// Checks that `area_fraction` is a finite value in (0, 1].
    pub fn validate_area_fraction(area_fraction: f64) -> Result<()> {
        if area_fraction.is_finite() && area_fraction > 0.0 && area_fraction <= 1.0 {
            Ok(())
        } else {
            Err(SegmentError::invalid(
                "area_fraction",
                area_fraction,
                "expected a value in (0, 1]",
            ))
        }
    }

    /// Finds the threshold that keeps at least `area_fraction` of the histogram mass
    /// above it, scanning from the brightest bin down.
    pub fn threshold_for(histogram: &Histogram, area_fraction: f64) -> Result<u8> {
        validate_area_fraction(area_fraction)?;
        if area_fraction >= 1.0 {
            return Ok(0);
        }

        let mut accumulated = 0.0;
        let mut threshold: u8 = u8::MAX;
        while threshold > 0 && accumulated < area_fraction {
            accumulated += histogram.mass(threshold);
            threshold -= 1;
        }
        Ok(threshold)
    }

    /// Marks every pixel strictly brighter than `threshold` as foreground.
    pub fn binarize(grid: &PixelGrid, threshold: u8) -> BinaryGrid {
        grid.map(|value| if value > threshold { FOREGROUND } else { BACKGROUND })
    }

    /// Histogram, threshold search and binarization in one step.
    pub fn adaptive_threshold(grid: &PixelGrid, area_fraction: f64) -> Result<Binarization> {
        validate_area_fraction(area_fraction)?;
        let histogram = Histogram::from_grid(grid)?;
        let threshold = threshold_for(&histogram, area_fraction)?;
        let binary = binarize(grid, threshold);

        debug!(
            "area fraction {area_fraction} -> threshold {threshold}, {} of {} pixels foreground",
            binary.foreground_count(),
            binary.len()
        );

        Ok(Binarization { threshold, binary })
    }
}

#[cfg(test)]
mod tests {
    use super::threshold::*;
    use crate::core_modules::error::SegmentError;
    use crate::core_modules::grid::{FOREGROUND, PixelGrid};
    use crate::core_modules::histogram::histogram::Histogram;

    fn ramp() -> PixelGrid {
        // 0..=255 once each.
        PixelGrid::new(16, 16, (0..=255u8).collect()).unwrap()
    }

    #[test]
    fn rejects_fraction_outside_unit_interval() {
        let grid = ramp();
        for bad in [0.0, -0.1, 1.0001, f64::NAN, f64::INFINITY] {
            let result = adaptive_threshold(&grid, bad);
            assert!(
                matches!(result, Err(SegmentError::InvalidParameter { name: "area_fraction", .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn stops_once_mass_reaches_target() {
        // Each of the 256 values holds 1/256 of the mass. Asking for 4/256 walks
        // bins 255, 254, 253, 252 and lands on 251.
        let hist = Histogram::from_grid(&ramp()).unwrap();
        let t = threshold_for(&hist, 4.0 / 256.0).unwrap();
        assert_eq!(t, 251);

        let result = adaptive_threshold(&ramp(), 4.0 / 256.0).unwrap();
        assert_eq!(result.binary.foreground_count(), 4);
    }

    #[test]
    fn overshoots_rather_than_undershoots() {
        // Half the image is 200, half is 100. Any fraction up to 0.5 is met by the
        // 200 bin alone; anything above needs the 100 bin too.
        let grid = PixelGrid::from_rows(vec![vec![200, 200], vec![100, 100]]).unwrap();
        assert_eq!(adaptive_threshold(&grid, 0.1).unwrap().threshold, 199);
        assert_eq!(adaptive_threshold(&grid, 0.5).unwrap().threshold, 199);
        assert_eq!(adaptive_threshold(&grid, 0.6).unwrap().threshold, 99);
    }

    #[test]
    fn full_fraction_degenerates_to_zero() {
        let grid = PixelGrid::from_rows(vec![vec![0, 1, 2], vec![128, 0, 255]]).unwrap();
        let result = adaptive_threshold(&grid, 1.0).unwrap();
        assert_eq!(result.threshold, 0);
        // Everything but the two zero pixels.
        assert_eq!(result.binary.foreground_count(), 4);
        assert_eq!(result.binary.get(0, 0), 0);
        assert_eq!(result.binary.get(1, 1), 0);
    }

    #[test]
    fn zero_pixels_are_never_foreground() {
        let grid = PixelGrid::from_rows(vec![vec![0, 0, 0], vec![0, 0, 0]]).unwrap();
        for p in [0.01, 0.5, 0.99, 1.0] {
            let result = adaptive_threshold(&grid, p).unwrap();
            assert_eq!(result.threshold, 0);
            assert_eq!(result.binary.foreground_count(), 0);
        }
    }

    #[test]
    fn binarize_uses_strict_comparison() {
        let grid = PixelGrid::from_rows(vec![vec![9, 10, 11]]).unwrap();
        let binary = binarize(&grid, 10);
        assert_eq!(binary.cells(), &[0, 0, FOREGROUND]);
    }
}
