// flow.rs - Upload → configure → results flow controller

use crate::formats::{detect_format, output_filename, sniff_format};
use crate::history::{HistoryStore, StoreError};
use crate::logger::Logger;
use crate::models::{HistoryRecord, ImageInfo};
use crate::pipeline::{self, PipelineError};
use crate::settings::CompressionSettings;

/// The three view states of a compression session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    Upload,
    Configure,
    Results,
}

/// A loaded source image awaiting processing
pub struct SourceImage {
    pub name: String,
    pub bytes: Vec<u8>,
    pub format: String,
    pub width: u32,
    pub height: u32,
}

/// A completed processing result
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub info: ImageInfo,
}

/// Error types for the flow controller
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("A processing run is already in flight")]
    Busy,
    #[error("No source image loaded")]
    NoSource,
    #[error("No completed result to save")]
    NoResult,
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Drives one compression session from upload to results
///
/// Owns the source and result buffers for their display lifetime and
/// releases them when superseded or on reset. At most one processing run is
/// in flight at a time.
pub struct FlowController {
    stage: FlowStage,
    settings: CompressionSettings,
    source: Option<SourceImage>,
    result: Option<CompressedImage>,
    processing: bool,
    logger: Logger,
}

impl FlowController {
    pub fn new(logger: Logger) -> Self {
        FlowController {
            stage: FlowStage::Upload,
            settings: CompressionSettings::default(),
            source: None,
            result: None,
            processing: false,
            logger,
        }
    }

    pub fn stage(&self) -> FlowStage {
        self.stage
    }

    pub fn settings(&self) -> &CompressionSettings {
        &self.settings
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn result(&self) -> Option<&CompressedImage> {
        self.result.as_ref()
    }

    pub fn image_info(&self) -> Option<&ImageInfo> {
        self.result.as_ref().map(|r| &r.info)
    }

    /// Load a dropped file and move to the configure view
    pub fn load(
        &mut self,
        name: &str,
        bytes: Vec<u8>,
        mime: Option<&str>,
    ) -> Result<(), PipelineError> {
        let (width, height) = pipeline::probe_dimensions(&bytes)?;

        let format = sniff_format(&bytes)
            .map(str::to_string)
            .unwrap_or_else(|| detect_format(name, mime));

        // A fresh source supersedes any previous session's buffers
        self.result = None;
        self.source = Some(SourceImage {
            name: name.to_string(),
            bytes,
            format,
            width,
            height,
        });
        self.stage = FlowStage::Configure;
        Ok(())
    }

    /// Replace the whole settings value
    pub fn replace_settings(&mut self, settings: CompressionSettings) {
        self.settings = settings;
    }

    /// Edit the target width, recomputing height under the aspect lock
    pub fn set_width(&mut self, width: u32) -> Result<(), FlowError> {
        let source = self.source.as_ref().ok_or(FlowError::NoSource)?;
        self.settings = self.settings.with_width(width, (source.width, source.height));
        Ok(())
    }

    /// Edit the target height, recomputing width under the aspect lock
    pub fn set_height(&mut self, height: u32) -> Result<(), FlowError> {
        let source = self.source.as_ref().ok_or(FlowError::NoSource)?;
        self.settings = self
            .settings
            .with_height(height, (source.width, source.height));
        Ok(())
    }

    /// Toggle resizing, seeding target dimensions from the source
    pub fn set_resize(&mut self, resize: bool) -> Result<(), FlowError> {
        let source = self.source.as_ref().ok_or(FlowError::NoSource)?;
        self.settings = self
            .settings
            .with_resize(resize, (source.width, source.height));
        Ok(())
    }

    /// Run the pipeline on the loaded source with the current settings
    ///
    /// On failure the session returns to the configure view with no partial
    /// result and no retry.
    pub async fn process(&mut self) -> Result<&ImageInfo, FlowError> {
        if self.processing {
            return Err(FlowError::Busy);
        }
        let source = self.source.as_ref().ok_or(FlowError::NoSource)?;

        self.processing = true;
        let run = pipeline::process(&source.bytes, &self.settings, &self.logger).await;
        self.processing = false;

        let output = match run {
            Ok(output) => output,
            Err(e) => {
                self.stage = FlowStage::Configure;
                self.logger.error(
                    "Processing failed",
                    &serde_json::json!({ "name": source.name, "error": e.to_string() }),
                );
                return Err(e.into());
            }
        };

        let original_size = source.bytes.len() as u64;
        let compressed_size = output.data.len() as u64;
        let compression_ratio = 1.0 - compressed_size as f64 / original_size as f64;

        self.logger.log_compression(
            &source.name,
            original_size,
            compressed_size,
            self.settings.compression_level,
            output.format.extension(),
        );

        let info = ImageInfo {
            original_name: source.name.clone(),
            original_size,
            original_format: source.format.to_ascii_uppercase(),
            original_width: output.original_width,
            original_height: output.original_height,
            compressed_size: Some(compressed_size),
            compressed_width: Some(output.width),
            compressed_height: Some(output.height),
            compression_ratio: Some(compression_ratio),
            settings: Some(self.settings.clone()),
        };

        // Supersede any previous result buffer
        let result = self.result.insert(CompressedImage {
            bytes: output.data,
            info,
        });
        self.stage = FlowStage::Results;

        Ok(&result.info)
    }

    /// Persist the completed result's metadata
    pub async fn save_history(
        &self,
        store: &dyn HistoryStore,
    ) -> Result<HistoryRecord, FlowError> {
        let result = self.result.as_ref().ok_or(FlowError::NoResult)?;
        let record = store.create(result.info.clone()).await?;
        self.logger
            .log_history("save", &format!("{} ({})", result.info.original_name, record.id));
        Ok(record)
    }

    /// Suggested filename for downloading the result
    pub fn download_filename(&self) -> Option<String> {
        let source = self.source.as_ref()?;
        let format = self.result.as_ref()?.info.settings.as_ref()?.output_format;
        Some(output_filename(&source.name, format.extension()))
    }

    /// Discard all buffers and return to the upload view
    pub fn reset(&mut self) {
        self.source = None;
        self.result = None;
        self.settings = CompressionSettings::default();
        self.processing = false;
        self.stage = FlowStage::Upload;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryStore;
    use crate::settings::OutputFormat;
    use image::{DynamicImage, RgbImage};
    use std::io::Cursor;

    fn test_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 3 % 256) as u8, (y * 5 % 256) as u8, 128])
        });
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn loaded_controller(width: u32, height: u32) -> FlowController {
        let mut controller = FlowController::new(Logger::default());
        controller
            .load("photo.png", test_png(width, height), Some("image/png"))
            .unwrap();
        controller
    }

    #[test]
    fn test_load_moves_to_configure() {
        let controller = loaded_controller(64, 48);
        assert_eq!(controller.stage(), FlowStage::Configure);

        let source = controller.source().unwrap();
        assert_eq!((source.width, source.height), (64, 48));
        assert_eq!(source.format, "png");
    }

    #[test]
    fn test_load_rejects_unreadable_input() {
        let mut controller = FlowController::new(Logger::default());
        let result = controller.load("junk.bin", b"not an image".to_vec(), None);
        assert!(result.is_err());
        assert_eq!(controller.stage(), FlowStage::Upload);
    }

    #[test]
    fn test_dimension_edits_recompute_from_source() {
        let mut controller = loaded_controller(200, 100);
        controller.set_resize(true).unwrap();
        controller.set_width(100).unwrap();

        assert_eq!(controller.settings().width, Some(100));
        assert_eq!(controller.settings().height, Some(50));
    }

    #[tokio::test]
    async fn test_process_produces_results() {
        let mut controller = loaded_controller(200, 100);
        controller.set_resize(true).unwrap();
        controller.set_width(100).unwrap();

        let info = controller.process().await.unwrap().clone();
        assert_eq!(controller.stage(), FlowStage::Results);
        assert_eq!(info.original_width, 200);
        assert_eq!(info.compressed_width, Some(100));
        assert_eq!(info.compressed_height, Some(50));
        assert_eq!(info.original_format, "PNG");

        let expected =
            1.0 - info.compressed_size.unwrap() as f64 / info.original_size as f64;
        assert_eq!(info.compression_ratio, Some(expected));

        assert_eq!(
            controller.download_filename().as_deref(),
            Some("photo.jpeg")
        );
    }

    #[tokio::test]
    async fn test_process_without_source_fails() {
        let mut controller = FlowController::new(Logger::default());
        assert!(matches!(
            controller.process().await,
            Err(FlowError::NoSource)
        ));
    }

    #[tokio::test]
    async fn test_single_in_flight_run() {
        let mut controller = loaded_controller(16, 16);
        controller.processing = true;
        assert!(matches!(controller.process().await, Err(FlowError::Busy)));
    }

    #[tokio::test]
    async fn test_failure_returns_to_configure() {
        let mut controller = loaded_controller(16, 16);
        // Corrupt the source after load to force a pipeline failure
        controller.source.as_mut().unwrap().bytes = b"corrupted".to_vec();

        let result = controller.process().await;
        assert!(matches!(result, Err(FlowError::Pipeline(_))));
        assert_eq!(controller.stage(), FlowStage::Configure);
        assert!(controller.result().is_none());
        assert!(!controller.processing);
    }

    #[tokio::test]
    async fn test_save_history_round_trip() {
        let store = MemoryStore::new();
        let mut controller = loaded_controller(32, 32);
        controller.process().await.unwrap();

        let record = controller.save_history(&store).await.unwrap();
        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].image_info, record.image_info);
    }

    #[tokio::test]
    async fn test_save_without_result_fails() {
        let store = MemoryStore::new();
        let controller = loaded_controller(32, 32);
        assert!(matches!(
            controller.save_history(&store).await,
            Err(FlowError::NoResult)
        ));
    }

    #[tokio::test]
    async fn test_reset_releases_buffers() {
        let mut controller = loaded_controller(32, 32);
        controller.replace_settings(CompressionSettings {
            output_format: OutputFormat::Webp,
            ..Default::default()
        });
        controller.process().await.unwrap();

        controller.reset();
        assert_eq!(controller.stage(), FlowStage::Upload);
        assert!(controller.source().is_none());
        assert!(controller.result().is_none());
        assert_eq!(*controller.settings(), CompressionSettings::default());
    }
}
