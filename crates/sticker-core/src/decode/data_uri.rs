//! `data:` URI handling.
//!
//! The UI passes images around as `data:image/...;base64,` strings (file
//! reader output, canvas exports, history records). These helpers convert
//! between those strings and raw bytes.

use base64::{engine::general_purpose, Engine as _};

use super::DecodeError;

const DATA_IMAGE_PREFIX: &str = "data:image/";
const BASE64_MARKER: &str = ";base64,";

/// Image MIME types accepted in upload data URIs.
const ACCEPTED_SUBTYPES: [&str; 4] = ["png", "jpeg", "jpg", "webp"];

/// Decode the payload of a `data:image/<type>;base64,` URI.
///
/// # Errors
///
/// Returns `DecodeError::InvalidDataUri` if the prefix or base64 marker is
/// missing, or the payload is not valid base64.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, DecodeError> {
    let payload = strip_data_uri_prefix(uri)?;
    general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| DecodeError::InvalidDataUri(format!("base64 decoding failed: {e}")))
}

/// Return the base64 payload of an image data URI, without decoding it.
pub fn strip_data_uri_prefix(uri: &str) -> Result<&str, DecodeError> {
    let rest = uri
        .strip_prefix(DATA_IMAGE_PREFIX)
        .ok_or_else(|| DecodeError::InvalidDataUri("missing data:image/ prefix".to_string()))?;

    let marker = rest
        .find(BASE64_MARKER)
        .ok_or_else(|| DecodeError::InvalidDataUri("missing base64 marker".to_string()))?;

    let subtype = &rest[..marker];
    if !ACCEPTED_SUBTYPES.contains(&subtype) {
        return Err(DecodeError::InvalidDataUri(format!(
            "unsupported image type: {subtype}"
        )));
    }

    Ok(&rest[marker + BASE64_MARKER.len()..])
}

/// Encode PNG bytes as a `data:image/png;base64,` URI.
pub fn png_data_uri(png: &[u8]) -> String {
    format!(
        "{DATA_IMAGE_PREFIX}png{BASE64_MARKER}{}",
        general_purpose::STANDARD.encode(png)
    )
}
