//! Strict JSON decoding
//!
//! Payload types carry `#[serde(deny_unknown_fields)]`; decoding through
//! [`decode_strict`] maps every serde failure (unknown key, wrong type,
//! trailing data) to [`AppError::MalformedInput`].

use crate::errors::{AppError, Result};
use serde::de::DeserializeOwned;

/// Decode a request body into `T`, rejecting anything `T` does not declare.
pub fn decode_strict<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::MalformedInput {
            message: "request body is empty".to_string(),
        });
    }

    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = T::deserialize(&mut de).map_err(malformed)?;
    de.end().map_err(malformed)?;
    Ok(value)
}

fn malformed(err: serde_json::Error) -> AppError {
    AppError::MalformedInput {
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Probe {
        name: String,
        #[serde(default)]
        count: i64,
    }

    #[test]
    fn test_accepts_declared_fields() {
        let probe: Probe = decode_strict(br#"{"name": "x", "count": 2}"#).unwrap();
        assert_eq!(probe.name, "x");
        assert_eq!(probe.count, 2);
    }

    #[test]
    fn test_rejects_unknown_key() {
        let err = decode_strict::<Probe>(br#"{"name": "x", "colour": "red"}"#).unwrap_err();
        match err {
            AppError::MalformedInput { message } => assert!(message.contains("colour"), "{message}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_trailing_data_and_empty_body() {
        assert!(matches!(
            decode_strict::<Probe>(br#"{"name": "x"} {"name": "y"}"#),
            Err(AppError::MalformedInput { .. })
        ));
        assert!(matches!(
            decode_strict::<Probe>(b"  "),
            Err(AppError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_rejects_wrong_type() {
        assert!(matches!(
            decode_strict::<Probe>(br#"{"name": 5}"#),
            Err(AppError::MalformedInput { .. })
        ));
    }
}
