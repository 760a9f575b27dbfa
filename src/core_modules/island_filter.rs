// THEORY:
// The last stage keeps only the largest islands. Given the ranked list, the first
// `k` labels are retained and every pixel carrying one of them is set to 255 in a
// fresh `BinaryGrid`; everything else is 0. Asking for more islands than exist
// simply keeps them all.

use crate::core_modules::error::{Result, SegmentError};
use crate::core_modules::grid::{BACKGROUND, BinaryGrid, FOREGROUND, LabelGrid};
use crate::core_modules::island_ranker::Island;
use log::debug;
use std::collections::HashSet;

/// Checks that at least one island is requested.
pub fn validate_island_count(island_count: usize) -> Result<()> {
    if island_count == 0 {
        return Err(SegmentError::invalid(
            "island_count",
            island_count,
            "expected a positive number of islands",
        ));
    }
    Ok(())
}

/// Masks `labels` down to the first `island_count` entries of `islands`.
pub fn filter_islands(
    labels: &LabelGrid,
    islands: &[Island],
    island_count: usize,
) -> Result<BinaryGrid> {
    validate_island_count(island_count)?;

    let kept = island_count.min(islands.len());
    let keep: HashSet<u32> = islands[..kept].iter().map(|island| island.label).collect();
    let filtered = labels.map(|label| {
        if label != 0 && keep.contains(&label) {
            FOREGROUND
        } else {
            BACKGROUND
        }
    });

    debug!(
        "kept {kept} of {} islands, {} pixels",
        islands.len(),
        filtered.foreground_count()
    );
    Ok(filtered)
}
