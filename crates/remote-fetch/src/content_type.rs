//! Content type inference for fetched files.

/// Fallback for unrecognized extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// MIME type for `path`, by its extension (case-insensitive).
pub fn content_type_for(path: &str) -> &'static str {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let Some((_, ext)) = file_name.rsplit_once('.') else {
        return OCTET_STREAM;
    };
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_image_types() {
        assert_eq!(content_type_for("/mnt/pan/20241216/hf.JPG"), "image/jpeg");
        assert_eq!(content_type_for("/mnt/sar/x.tif"), "image/tiff");
        assert_eq!(content_type_for("/mnt/a.webp"), "image/webp");
    }

    #[test]
    fn unknown_or_missing_extension() {
        assert_eq!(content_type_for("/mnt/data.bin"), OCTET_STREAM);
        assert_eq!(content_type_for("/mnt/v1.2/README"), OCTET_STREAM);
    }
}
