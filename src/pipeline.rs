// pipeline.rs - Image processing pipeline

use image::{GenericImageView, ImageEncoder, ImageReader};
use std::io::Cursor;

use crate::logger::Logger;
use crate::settings::{CompressionSettings, OutputFormat};

/// Result of one pipeline run
#[derive(Debug)]
pub struct PipelineOutput {
    pub data: Vec<u8>,
    pub format: OutputFormat,
    pub original_width: u32,
    pub original_height: u32,
    pub width: u32,
    pub height: u32,
}

/// Error types for the pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Transcode(String),
}

/// Read the intrinsic pixel dimensions of an encoded image
pub fn probe_dimensions(data: &[u8]) -> Result<(u32, u32), PipelineError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| PipelineError::Decode(e.to_string()))?
        .into_dimensions()
        .map_err(|e| PipelineError::Decode(e.to_string()))
}

/// Run the full pipeline: decode, optionally resize, re-encode
///
/// Resizing happens in up to two passes: the longest edge is first bounded
/// by the larger of the requested dimensions (proportional downscale only),
/// then, when both dimensions were requested explicitly, the raster is
/// resampled to exactly that size. With `resize` off the requested
/// dimensions are ignored entirely.
pub async fn process(
    data: &[u8],
    settings: &CompressionSettings,
    logger: &Logger,
) -> Result<PipelineOutput, PipelineError> {
    logger.debug(
        "Pipeline started",
        &serde_json::json!({
            "originalSize": data.len(),
            "quality": settings.compression_level,
            "format": settings.output_format.extension(),
            "resize": settings.resize,
        }),
    );

    // Load image
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| PipelineError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| PipelineError::Decode(e.to_string()))?;

    let (orig_width, orig_height) = img.dimensions();

    let mut img = img;

    if settings.resize {
        // First pass: bound the longest edge, keeping the aspect ratio
        let max_dim = settings.width.unwrap_or(0).max(settings.height.unwrap_or(0));
        if max_dim > 0 && (orig_width > max_dim || orig_height > max_dim) {
            img = img.resize(max_dim, max_dim, image::imageops::FilterType::Lanczos3);
        }

        // Second pass: honor an explicit width x height exactly
        if let (Some(width), Some(height)) = (settings.width, settings.height) {
            if img.dimensions() != (width, height) {
                img = img.resize_exact(width, height, image::imageops::FilterType::Lanczos3);
            }
        }
    }

    let (width, height) = img.dimensions();

    logger.debug(
        "Image dimensions",
        &serde_json::json!({
            "original": {"width": orig_width, "height": orig_height},
            "output": {"width": width, "height": height},
        }),
    );

    let data = encode(&img, settings)?;

    Ok(PipelineOutput {
        data,
        format: settings.output_format,
        original_width: orig_width,
        original_height: orig_height,
        width,
        height,
    })
}

/// Encode a raster into the requested format at the requested quality
fn encode(
    img: &image::DynamicImage,
    settings: &CompressionSettings,
) -> Result<Vec<u8>, PipelineError> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);

    match settings.output_format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel, and its quality floor is 1 so that
            // level 0 still produces a decodable file
            let rgb = img.to_rgb8();
            let quality = settings.compression_level.max(1);
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
            encoder
                .write_image(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    image::ExtendedColorType::Rgb8,
                )
                .map_err(|e| PipelineError::Transcode(e.to_string()))?;
        }
        OutputFormat::Png => {
            // PNG is lossless; the level selects encoder effort instead
            let compression = if settings.compression_level <= 50 {
                image::codecs::png::CompressionType::Best
            } else {
                image::codecs::png::CompressionType::Default
            };
            let rgba = img.to_rgba8();
            let encoder = image::codecs::png::PngEncoder::new_with_quality(
                &mut cursor,
                compression,
                image::codecs::png::FilterType::Adaptive,
            );
            encoder
                .write_image(
                    rgba.as_raw(),
                    rgba.width(),
                    rgba.height(),
                    image::ExtendedColorType::Rgba8,
                )
                .map_err(|e| PipelineError::Transcode(e.to_string()))?;
        }
        OutputFormat::Webp => {
            let rgba = img.to_rgba8();
            let encoder = image::codecs::webp::WebPEncoder::new_lossless(&mut cursor);
            encoder
                .write_image(
                    rgba.as_raw(),
                    rgba.width(),
                    rgba.height(),
                    image::ExtendedColorType::Rgba8,
                )
                .map_err(|e| PipelineError::Transcode(e.to_string()))?;
        }
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn test_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_probe_dimensions() {
        let png = test_png(64, 48);
        assert_eq!(probe_dimensions(&png).unwrap(), (64, 48));
    }

    #[test]
    fn test_probe_rejects_garbage() {
        assert!(matches!(
            probe_dimensions(b"definitely not an image"),
            Err(PipelineError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_no_resize_preserves_dimensions() {
        let png = test_png(64, 48);
        let settings = CompressionSettings {
            // width/height must be ignored while resize is off
            width: Some(10),
            height: Some(10),
            ..Default::default()
        };

        let output = process(&png, &settings, &Logger::default()).await.unwrap();
        assert_eq!((output.width, output.height), (64, 48));
        assert_eq!(
            (output.original_width, output.original_height),
            (64, 48)
        );
        assert_eq!(output.format, OutputFormat::Jpeg);
    }

    #[tokio::test]
    async fn test_explicit_resize_hits_exact_dimensions() {
        // 200x100 source downscaled to 100x50, the locked-aspect case
        let png = test_png(200, 100);
        let settings = CompressionSettings {
            resize: true,
            width: Some(100),
            height: Some(50),
            ..Default::default()
        };

        let output = process(&png, &settings, &Logger::default()).await.unwrap();
        assert_eq!((output.width, output.height), (100, 50));
        assert_eq!(probe_dimensions(&output.data).unwrap(), (100, 50));
    }

    #[tokio::test]
    async fn test_single_dimension_bounds_longest_edge() {
        let png = test_png(200, 100);
        let settings = CompressionSettings {
            resize: true,
            width: Some(100),
            height: None,
            maintain_aspect_ratio: false,
            ..Default::default()
        };

        let output = process(&png, &settings, &Logger::default()).await.unwrap();
        assert_eq!((output.width, output.height), (100, 50));
    }

    #[tokio::test]
    async fn test_quality_floor_still_decodes() {
        let png = test_png(32, 32);
        let settings = CompressionSettings {
            compression_level: 0,
            ..Default::default()
        };

        let output = process(&png, &settings, &Logger::default()).await.unwrap();
        assert!(!output.data.is_empty());
        assert_eq!(probe_dimensions(&output.data).unwrap(), (32, 32));
    }

    #[tokio::test]
    async fn test_png_and_webp_outputs_decode() {
        let png = test_png(40, 30);

        for format in [OutputFormat::Png, OutputFormat::Webp] {
            let settings = CompressionSettings {
                output_format: format,
                ..Default::default()
            };
            let output = process(&png, &settings, &Logger::default()).await.unwrap();
            assert_eq!(probe_dimensions(&output.data).unwrap(), (40, 30));
        }
    }

    #[tokio::test]
    async fn test_decode_failure_aborts() {
        let settings = CompressionSettings::default();
        let result = process(b"not an image", &settings, &Logger::default()).await;
        assert!(matches!(result, Err(PipelineError::Decode(_))));
    }
}
