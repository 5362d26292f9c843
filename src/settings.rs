// settings.rs - Compression settings model

use serde::{Deserialize, Serialize};

/// Output format for a compression run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Webp => "image/webp",
        }
    }
}

/// Settings for one compression run
///
/// Value type with copy-on-write edits: every change produces a new
/// settings value, so the aspect-ratio recomputation stays deterministic.
/// `width`/`height` are only meaningful while `resize` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionSettings {
    #[serde(default = "default_compression_level")]
    pub compression_level: u8, // 0-100, default 80
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default)]
    pub resize: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default = "default_maintain_aspect_ratio")]
    pub maintain_aspect_ratio: bool,
}

fn default_compression_level() -> u8 {
    80
}

fn default_maintain_aspect_ratio() -> bool {
    true
}

impl Default for CompressionSettings {
    fn default() -> Self {
        CompressionSettings {
            compression_level: default_compression_level(),
            output_format: OutputFormat::default(),
            resize: false,
            width: None,
            height: None,
            maintain_aspect_ratio: default_maintain_aspect_ratio(),
        }
    }
}

impl CompressionSettings {
    /// Check range constraints: level 0-100, dimensions positive when present
    pub fn validate(&self) -> Result<(), String> {
        if self.compression_level > 100 {
            return Err(format!(
                "compressionLevel must be between 0 and 100, got {}",
                self.compression_level
            ));
        }

        if self.width == Some(0) {
            return Err("width must be a positive integer".to_string());
        }

        if self.height == Some(0) {
            return Err("height must be a positive integer".to_string());
        }

        Ok(())
    }

    /// Return a new settings value with `width` edited
    ///
    /// With the aspect lock on, `height` is recomputed from the source
    /// image's aspect ratio. `source` is the source (width, height).
    pub fn with_width(&self, width: u32, source: (u32, u32)) -> Self {
        let mut next = self.clone();
        next.width = Some(width);

        if self.maintain_aspect_ratio && source.0 > 0 {
            let derived = (width as f64 * source.1 as f64 / source.0 as f64).round() as u32;
            next.height = Some(derived.max(1));
        }

        next
    }

    /// Return a new settings value with `height` edited
    pub fn with_height(&self, height: u32, source: (u32, u32)) -> Self {
        let mut next = self.clone();
        next.height = Some(height);

        if self.maintain_aspect_ratio && source.1 > 0 {
            let derived = (height as f64 * source.0 as f64 / source.1 as f64).round() as u32;
            next.width = Some(derived.max(1));
        }

        next
    }

    /// Return a new settings value with resizing toggled
    ///
    /// Enabling resize seeds the target dimensions from the source image,
    /// matching the configure view's behavior; disabling clears them.
    pub fn with_resize(&self, resize: bool, source: (u32, u32)) -> Self {
        let mut next = self.clone();
        next.resize = resize;

        if resize {
            if next.width.is_none() && next.height.is_none() {
                next.width = Some(source.0);
                next.height = Some(source.1);
            }
        } else {
            next.width = None;
            next.height = None;
        }

        next
    }
}
