//! `X-CF-APP-INSTANCE` header parsing.
//!
//! The header pins a request to a single backend instance. Its value must be
//! `<app_id>:<instance_index>`, both parts non-empty.

use std::str::FromStr;

use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Request header selecting one application instance.
pub const CF_APP_INSTANCE: HeaderName = HeaderName::from_static("x-cf-app-instance");

/// Response header naming the instance that served the request.
pub const CF_INSTANCE_ID: HeaderName = HeaderName::from_static("x-cf-instanceid");

/// A parsed `(app_id, instance_index)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSelector {
    pub app_id: String,
    pub instance_index: String,
}

/// The header was present but does not follow the `<app_id>:<index>` grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstanceHeaderError {
    #[error("incorrect X-CF-APP-INSTANCE header {value:?}: expected 2 segments, found {segments}")]
    SegmentCount { value: String, segments: usize },

    #[error("incorrect X-CF-APP-INSTANCE header {value:?}: empty segment")]
    EmptySegment { value: String },

    #[error("incorrect X-CF-APP-INSTANCE header {value:?}: not visible ASCII")]
    Encoding { value: String },
}

impl InstanceHeaderError {
    /// The raw header value that failed to parse.
    pub fn value(&self) -> &str {
        match self {
            Self::SegmentCount { value, .. } | Self::EmptySegment { value } | Self::Encoding { value } => value,
        }
    }
}

impl InstanceSelector {
    /// Parse a raw header value.
    pub fn parse(value: &str) -> Result<Self, InstanceHeaderError> {
        let segments: Vec<&str> = value.split(':').collect();
        match segments.as_slice() {
            [app_id, index] if !app_id.is_empty() && !index.is_empty() => Ok(Self {
                app_id: (*app_id).to_string(),
                instance_index: (*index).to_string(),
            }),
            [_, _] => Err(InstanceHeaderError::EmptySegment {
                value: value.to_string(),
            }),
            _ => Err(InstanceHeaderError::SegmentCount {
                value: value.to_string(),
                segments: segments.len(),
            }),
        }
    }

    /// Read the selector from request headers.
    ///
    /// An absent header and a header with an empty value both yield `Ok(None)`.
    pub fn from_headers(headers: &HeaderMap) -> Result<Option<Self>, InstanceHeaderError> {
        match headers.get(CF_APP_INSTANCE) {
            None => Ok(None),
            Some(raw) if raw.is_empty() => Ok(None),
            Some(raw) => Self::from_header_value(raw).map(Some),
        }
    }

    fn from_header_value(raw: &HeaderValue) -> Result<Self, InstanceHeaderError> {
        let value = raw.to_str().map_err(|_| InstanceHeaderError::Encoding {
            value: String::from_utf8_lossy(raw.as_bytes()).into_owned(),
        })?;
        Self::parse(value)
    }
}

impl FromStr for InstanceSelector {
    type Err = InstanceHeaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let selector: InstanceSelector = "guid-123:2".parse().unwrap();
        assert_eq!(selector.app_id, "guid-123");
        assert_eq!(selector.instance_index, "2");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for value in ["guid-123", "ABC", "a:b:c", "::"] {
            let err = InstanceSelector::parse(value).unwrap_err();
            assert!(matches!(err, InstanceHeaderError::SegmentCount { .. }), "{value}");
            assert_eq!(err.value(), value);
        }

        for value in [":", "A:", ":B"] {
            let err = InstanceSelector::parse(value).unwrap_err();
            assert!(matches!(err, InstanceHeaderError::EmptySegment { .. }), "{value}");
            assert_eq!(err.value(), value);
        }
    }

    #[test]
    fn test_empty_string_is_malformed_when_parsed_directly() {
        // Header reading treats an empty value as absent; the grammar itself does not.
        assert!(InstanceSelector::parse("").is_err());
    }

    #[test]
    fn test_from_headers_absent_vs_empty() {
        let mut headers = HeaderMap::new();
        assert_eq!(InstanceSelector::from_headers(&headers), Ok(None));

        headers.insert(CF_APP_INSTANCE, HeaderValue::from_static(""));
        assert_eq!(InstanceSelector::from_headers(&headers), Ok(None));

        headers.insert(CF_APP_INSTANCE, HeaderValue::from_static("app:0"));
        assert_eq!(
            InstanceSelector::from_headers(&headers),
            Ok(Some(InstanceSelector {
                app_id: "app".into(),
                instance_index: "0".into(),
            }))
        );
    }

    #[test]
    fn test_from_headers_case_insensitive_name() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(b"X-Cf-App-Instance").unwrap(),
            HeaderValue::from_static("app:1"),
        );
        assert!(InstanceSelector::from_headers(&headers).unwrap().is_some());
    }

    #[test]
    fn test_from_headers_rejects_opaque_bytes() {
        let mut headers = HeaderMap::new();
        headers.insert(CF_APP_INSTANCE, HeaderValue::from_bytes(b"app\xff:1").unwrap());
        let err = InstanceSelector::from_headers(&headers).unwrap_err();
        assert!(matches!(err, InstanceHeaderError::Encoding { .. }));
    }
}
