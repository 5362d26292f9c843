// formats.rs - Format and size utilities

use base64::{engine::general_purpose, Engine as _};

/// Format a byte count as a human-readable size
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let sizes = ["B", "KB", "MB", "GB", "TB"];
    let i = ((bytes as f64).ln() / 1024.0_f64.ln()).floor() as usize;
    let i = i.min(sizes.len() - 1);
    let size = bytes as f64 / 1024.0_f64.powi(i as i32);

    format!("{:.1} {}", size, sizes[i])
}

/// Detect an image format name from a MIME type or filename extension
///
/// The MIME type wins when it looks like `image/<format>`; otherwise the
/// filename extension is used, with `jpg` normalized to `jpeg`.
pub fn detect_format(name: &str, mime: Option<&str>) -> String {
    if let Some(mime) = mime {
        let mut parts = mime.splitn(2, '/');
        if let (Some("image"), Some(subtype)) = (parts.next(), parts.next()) {
            if !subtype.is_empty() {
                return subtype.to_ascii_lowercase();
            }
        }
    }

    let extension = name
        .rsplit('.')
        .next()
        .filter(|ext| !ext.is_empty() && *ext != name)
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "jpeg".to_string(),
        Some(ext) => ext.to_string(),
        None => "unknown".to_string(),
    }
}

/// Sniff an image format from magic numbers
pub fn sniff_format(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("png");
    }

    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("jpeg");
    }

    if bytes.len() > 12 && bytes[0..4] == *b"RIFF" && bytes[8..12] == *b"WEBP" {
        return Some("webp");
    }

    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some("gif");
    }

    None
}

/// Build an output filename by swapping the extension for the output format
pub fn output_filename(original: &str, format: &str) -> String {
    let stem = match original.rfind('.') {
        Some(0) | None => original,
        Some(dot) => &original[..dot],
    };
    format!("{}.{}", stem, format)
}

/// Decode a `data:<mime>;base64,<payload>` URL into bytes plus MIME type
pub fn data_url_to_bytes(data_url: &str) -> Result<(Vec<u8>, String), String> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| "Not a data URL".to_string())?;

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| "Malformed data URL".to_string())?;

    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| "Only base64 data URLs are supported".to_string())?;

    let bytes = general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| format!("Invalid base64 payload: {}", e))?;

    Ok((bytes, mime.to_string()))
}
