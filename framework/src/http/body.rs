//! Body collection and parsing for HTTP requests
//!
//! The server buffers the whole body (bounded by `SERVER_MAX_BODY_SIZE`)
//! before dispatch, so handlers only ever see bytes.

use crate::error::FrameworkError;
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use serde::de::DeserializeOwned;

/// Collect the full body from an Incoming stream, refusing more than `limit` bytes
pub async fn collect_body(body: Incoming, limit: usize) -> Result<Bytes, FrameworkError> {
    Limited::new(body, limit)
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                FrameworkError::PayloadTooLarge { limit }
            } else {
                FrameworkError::internal(format!("Failed to read request body: {}", e))
            }
        })
}

/// Parse bytes as form-urlencoded into the target type
pub fn parse_form<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, FrameworkError> {
    serde_urlencoded::from_bytes(bytes)
        .map_err(|e| FrameworkError::validation(format!("Failed to parse form body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Fields {
        task: String,
        complete: String,
    }

    #[test]
    fn parses_urlencoded_fields() {
        let fields: Fields = parse_form(b"task=Buy+milk&complete=false").unwrap();
        assert_eq!(
            fields,
            Fields {
                task: "Buy milk".into(),
                complete: "false".into()
            }
        );
    }

    #[test]
    fn missing_form_field_is_a_validation_error() {
        let err = parse_form::<Fields>(b"task=Buy+milk").unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
