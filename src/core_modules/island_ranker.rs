// THEORY:
// The ranker summarizes a resolved `LabelGrid` as a list of `Island`s, one per
// distinct label, ordered from largest to smallest. Equal areas are ordered by
// ascending label so that the same grid always ranks the same way.

use crate::core_modules::grid::LabelGrid;
use log::debug;
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// One connected region: its canonical label and its pixel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Island {
    pub label: u32,
    pub area: usize,
}

/// Counts pixels per label and sorts by area descending, then label ascending.
pub fn rank_islands(labels: &LabelGrid) -> Vec<Island> {
    let mut areas: BTreeMap<u32, usize> = BTreeMap::new();
    for &label in labels.cells() {
        if label != 0 {
            *areas.entry(label).or_insert(0) += 1;
        }
    }

    let mut islands: Vec<Island> = areas
        .into_iter()
        .map(|(label, area)| Island { label, area })
        .collect();
    islands.sort_by_key(|island| (Reverse(island.area), island.label));

    debug!(
        "ranked {} islands, largest area {}",
        islands.len(),
        islands.first().map_or(0, |island| island.area)
    );
    islands
}
