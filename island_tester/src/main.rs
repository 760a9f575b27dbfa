//! Command-line driver for `island_vision`.
//!
//! Decodes each input image as 8-bit grayscale, segments it, and writes the
//! binary and filtered masks next to each other as PNGs:
//!
//! ```bash
//! island_tester images/H_28weeks_01.bmp --area-fraction 0.04 --island-count 6 -o out/
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use island_vision::core_modules::utils::image_helper::image_helper::save_mask;
use island_vision::parallel_pipeline::{ParallelPipeline, default_worker_count};
use island_vision::pipeline::{DEFAULT_AREA_FRACTION, DEFAULT_ISLAND_COUNT};
use island_vision::{PixelGrid, SegmentConfig, Segmentation, SegmentationPipeline};
use log::{error, info};
use std::path::{Path, PathBuf};

const DEFAULT_IMAGE: &str = "images/H_28weeks_01.bmp";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Keep the largest bright islands of a grayscale image",
    long_about = None
)]
struct Cli {
    /// Input images; decoded and converted to 8-bit grayscale.
    #[arg(default_value = DEFAULT_IMAGE)]
    inputs: Vec<PathBuf>,

    /// Fraction of the brightest pixel mass kept as foreground, in (0, 1].
    #[arg(short, long, default_value_t = DEFAULT_AREA_FRACTION)]
    area_fraction: f64,

    /// Number of largest islands to keep.
    #[arg(short = 'k', long, default_value_t = DEFAULT_ISLAND_COUNT)]
    island_count: usize,

    /// Fail instead of growing the label store past this many labels.
    #[arg(long)]
    max_labels: Option<usize>,

    /// Directory for the `<stem>_binary.png` and `<stem>_filtered.png` outputs.
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Worker threads when several inputs are given (defaults to the CPU count).
    #[arg(short, long)]
    workers: Option<usize>,
}

impl Cli {
    fn segment_config(&self) -> SegmentConfig {
        SegmentConfig {
            area_fraction: self.area_fraction,
            island_count: self.island_count,
            max_labels: self.max_labels,
        }
    }
}

fn load_grid(path: &Path) -> Result<PixelGrid> {
    info!("Reading input image {}.", path.display());
    let decoded =
        image::open(path).with_context(|| format!("failed to decode {}", path.display()))?;
    let gray = image::DynamicImage::ImageLuma8(decoded.into_luma8());
    PixelGrid::try_from(&gray).with_context(|| format!("unusable image {}", path.display()))
}

fn write_outputs(input: &Path, output_dir: &Path, segmentation: &Segmentation) -> Result<()> {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let binary_path = output_dir.join(format!("{stem}_binary.png"));
    let filtered_path = output_dir.join(format!("{stem}_filtered.png"));
    save_mask(&binary_path, &segmentation.binary)
        .with_context(|| format!("failed to write {}", binary_path.display()))?;
    save_mask(&filtered_path, &segmentation.filtered)
        .with_context(|| format!("failed to write {}", filtered_path.display()))?;

    info!("Wrote {} and {}.", binary_path.display(), filtered_path.display());
    Ok(())
}

fn report(input: &Path, segmentation: &Segmentation) {
    let retained: Vec<String> = segmentation
        .retained_islands()
        .iter()
        .map(|island| island.area.to_string())
        .collect();
    println!(
        "{}: threshold {}, {} foreground pixels, {} islands, kept areas [{}]",
        input.display(),
        segmentation.threshold,
        segmentation.foreground_count(),
        segmentation.islands.len(),
        retained.join(", ")
    );
}

fn run_single(cli: &Cli, input: &Path) -> Result<()> {
    let pipeline = SegmentationPipeline::new(cli.segment_config())?;
    let grid = load_grid(input)?;

    info!("Converting to binary, labelling and filtering islands.");
    let segmentation = pipeline.run(&grid)?;

    write_outputs(input, &cli.output_dir, &segmentation)?;
    report(input, &segmentation);
    Ok(())
}

async fn run_batch(cli: &Cli) -> Result<()> {
    let workers = cli.workers.unwrap_or_else(default_worker_count);
    let pool = ParallelPipeline::new(cli.segment_config(), workers)?;
    info!("Segmenting {} images on {} workers.", cli.inputs.len(), pool.worker_count());

    // Decoding failures abort the batch before any segmentation starts.
    let grids = cli
        .inputs
        .iter()
        .map(|path| load_grid(path))
        .collect::<Result<Vec<_>>>()?;

    let results = pool.process_batch(grids).await;
    pool.shutdown().await;

    let mut failures = 0;
    for (input, result) in cli.inputs.iter().zip(results) {
        match result {
            Ok(segmentation) => {
                write_outputs(input, &cli.output_dir, &segmentation)?;
                report(input, &segmentation);
            }
            Err(e) => {
                error!("{}: {e}", input.display());
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} images failed", cli.inputs.len());
    }
    Ok(())
}

async fn run(cli: &Cli) -> Result<()> {
    if cli.inputs.len() == 1 {
        run_single(cli, &cli.inputs[0])
    } else {
        run_batch(cli).await
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    run(&cli).await
}
