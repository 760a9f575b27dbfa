// Bridges between the `image` crate and the pipeline's grids. Decoding a file is
// the caller's job; this module only accepts an already decoded 8-bit luma image
// and writes masks back out as grayscale PNGs.

pub mod image_helper {
    use crate::core_modules::error::SegmentError;
    use crate::core_modules::grid::{BinaryGrid, PixelGrid};
    use image::error::{ParameterError, ParameterErrorKind};
    use image::{DynamicImage, GrayImage, ImageEncoder, ImageError};
    use std::io::{BufWriter, Write};
    use std::path::Path;

    impl TryFrom<&DynamicImage> for PixelGrid {
        type Error = SegmentError;

        /// Accepts only single-channel 8-bit images.
        fn try_from(image: &DynamicImage) -> Result<Self, Self::Error> {
            match image {
                DynamicImage::ImageLuma8(buffer) => PixelGrid::new(
                    buffer.height() as usize,
                    buffer.width() as usize,
                    buffer.as_raw().clone(),
                ),
                other => Err(SegmentError::UnsupportedDepth {
                    detail: format!("expected 8-bit single-channel luma, got {:?}", other.color()),
                }),
            }
        }
    }

    fn dimension_error() -> ImageError {
        ImageError::Parameter(ParameterError::from_kind(ParameterErrorKind::DimensionMismatch))
    }

    /// Copies a grid into an `image::GrayImage` (width = cols, height = rows).
    pub fn to_gray_image(grid: &BinaryGrid) -> Result<GrayImage, ImageError> {
        let width = u32::try_from(grid.cols()).map_err(|_| dimension_error())?;
        let height = u32::try_from(grid.rows()).map_err(|_| dimension_error())?;
        GrayImage::from_raw(width, height, grid.cells().to_vec()).ok_or_else(dimension_error)
    }

    /// Writes a mask as an 8-bit grayscale PNG.
    pub fn save_mask(path: impl AsRef<Path>, grid: &BinaryGrid) -> Result<(), ImageError> {
        let image = to_gray_image(grid)?;
        let mut writer = BufWriter::new(std::fs::File::create(path)?);
        let encoder = image::codecs::png::PngEncoder::new(&mut writer);

        encoder.write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::L8,
        )?;

        // BufWriter discards flush errors on drop.
        writer.flush()?;
        Ok(())
    }
}
