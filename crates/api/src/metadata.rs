//! Conversion between data store metadata and prefixed HTTP headers.

use formation_types::Metadata;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::errors::{FormationError, Result};

/// Header prefix the data store uses for per-object attributes.
pub const METADATA_HEADER_PREFIX: &str = "X-Datastore-";

/// Encode each metadata entry as an `X-Datastore-{key}: {value}` header.
pub fn encode_metadata_headers(metadata: &Metadata) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(metadata.len());
    for (key, value) in metadata {
        let name = HeaderName::from_bytes(format!("{METADATA_HEADER_PREFIX}{key}").as_bytes())
            .map_err(|_| FormationError::invalid_metadata(key))?;
        let value = HeaderValue::from_str(value).map_err(|_| FormationError::invalid_metadata(key))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Collect every `X-Datastore-*` response header into a metadata map.
///
/// Header names arrive lowercased, so keys are returned lowercased. Only the
/// first value of a repeated header is kept and values that are not valid
/// UTF-8 are skipped.
pub fn decode_metadata_headers(headers: &HeaderMap) -> Metadata {
    let prefix = METADATA_HEADER_PREFIX.to_ascii_lowercase();
    let mut metadata = Metadata::new();
    for name in headers.keys() {
        let Some(key) = name.as_str().strip_prefix(prefix.as_str()) else {
            continue;
        };
        if key.is_empty() || metadata.contains_key(key) {
            continue;
        }
        if let Some(value) = headers.get(name).and_then(|value| value.to_str().ok()) {
            metadata.insert(key.to_string(), value.to_string());
        }
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_prefixes_every_key() {
        let mut metadata = Metadata::new();
        metadata.insert("project".into(), "alpha".into());
        metadata.insert("owner".into(), "alice".into());

        let headers = encode_metadata_headers(&metadata).unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("x-datastore-project").unwrap(), "alpha");
        assert_eq!(headers.get("X-Datastore-Owner").unwrap(), "alice");
    }

    #[test]
    fn encode_rejects_keys_that_are_not_header_tokens() {
        let mut metadata = Metadata::new();
        metadata.insert("has space".into(), "v".into());

        let error = encode_metadata_headers(&metadata).unwrap_err();
        assert!(matches!(error, FormationError::InvalidMetadata { key } if key == "has space"));
    }

    #[test]
    fn decode_keeps_prefixed_headers_and_first_values() {
        let mut headers = HeaderMap::new();
        headers.append("X-Datastore-Project", HeaderValue::from_static("alpha"));
        headers.append("X-Datastore-Project", HeaderValue::from_static("beta"));
        headers.insert("x-datastore-stage", HeaderValue::from_static("raw"));
        headers.insert("content-type", HeaderValue::from_static("text/plain"));
        headers.insert("x-datastore-", HeaderValue::from_static("ignored"));

        let metadata = decode_metadata_headers(&headers);
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata.get("project").map(String::as_str), Some("alpha"));
        assert_eq!(metadata.get("stage").map(String::as_str), Some("raw"));
    }

    #[test]
    fn decode_skips_non_utf8_values() {
        let mut headers = HeaderMap::new();
        headers.insert("x-datastore-bin", HeaderValue::from_bytes(&[0xFF, 0xFE]).unwrap());

        assert!(decode_metadata_headers(&headers).is_empty());
    }
}
