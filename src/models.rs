// models.rs - Shared data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::CompressionSettings;

/// Metadata for one completed compression run
///
/// Built client-side once processing finishes and never mutated after; the
/// wire shape uses camelCase field names inside a snake_case record
/// envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub original_name: String,
    pub original_size: u64,
    pub original_format: String,
    pub original_width: u32,
    pub original_height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<CompressionSettings>,
}

/// A persisted compression history record
///
/// `id` and `created_at` are assigned by the store layer at insert time,
/// never trusted from the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub image_info: ImageInfo,
}

/// Account row referenced by `HistoryRecord::user_id`
///
/// Foreign-key target only; no user CRUD is exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info() -> ImageInfo {
        ImageInfo {
            original_name: "photo.png".to_string(),
            original_size: 5_000_000,
            original_format: "png".to_string(),
            original_width: 2000,
            original_height: 1000,
            compressed_size: Some(1_250_000),
            compressed_width: Some(1000),
            compressed_height: Some(500),
            compression_ratio: Some(0.75),
            settings: Some(CompressionSettings::default()),
        }
    }

    #[test]
    fn test_image_info_wire_names() {
        let json = serde_json::to_value(sample_info()).unwrap();
        assert_eq!(json["originalName"], "photo.png");
        assert_eq!(json["originalSize"], 5_000_000);
        assert_eq!(json["compressedWidth"], 1000);
        assert_eq!(json["compressionRatio"], 0.75);
    }

    #[test]
    fn test_optional_fields_omitted_when_absent() {
        let info = ImageInfo {
            compressed_size: None,
            compressed_width: None,
            compressed_height: None,
            compression_ratio: None,
            settings: None,
            ..sample_info()
        };

        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("compressedSize").is_none());
        assert!(json.get("settings").is_none());

        let back: ImageInfo = serde_json::from_value(json).unwrap();
        assert_eq!(back, info);
    }

    #[test]
    fn test_record_envelope_is_snake_case() {
        let record = HistoryRecord {
            id: "42".to_string(),
            created_at: Utc::now(),
            user_id: None,
            image_info: sample_info(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("created_at").is_some());
        assert!(json.get("user_id").is_none());
        assert_eq!(json["image_info"]["originalName"], "photo.png");
    }

    #[test]
    fn test_missing_required_field_fails() {
        let result: Result<ImageInfo, _> =
            serde_json::from_str(r#"{"originalSize":1,"originalFormat":"png"}"#);
        assert!(result.is_err());
    }
}
