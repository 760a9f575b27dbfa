// THEORY:
// This file is the main entry point for the `island_vision` library crate.
//
// The public surface is the `pipeline` module (`segment`, `SegmentationPipeline`,
// `SegmentConfig`, `Segmentation`) plus `parallel_pipeline` for batches. The
// individual stages in `core_modules` are public too, so a caller can run any
// one of them on its own: histogram, adaptive threshold, island labelling,
// ranking and filtering.

pub mod core_modules;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::error::{Result, SegmentError};
pub use core_modules::grid::{BinaryGrid, Grid, LabelGrid, PixelGrid};
pub use pipeline::{Island, SegmentConfig, Segmentation, SegmentationPipeline, segment};
