//! `Serializable`: types that can turn themselves into text and back.
//!
//! The interface is deliberately small: a type chooses its own text form by
//! implementing the two methods. Most implementations delegate to
//! [`to_json`] and [`from_json`], which go through `serde_json`.

use serde::{de::DeserializeOwned, Serialize};

/// A value with a string representation it can be rebuilt from.
///
/// # Example
///
/// ```rust
/// use lazykit::serial::{self, SerialError, Serializable};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Serializable for Point {
///     fn to_text(&self) -> Result<String, SerialError> {
///         serial::to_json(self)
///     }
///
///     fn from_text(data: &str) -> Result<Self, SerialError> {
///         serial::from_json(data)
///     }
/// }
///
/// let text = Point { x: 1, y: 2 }.to_text().unwrap();
/// assert_eq!(Point::from_text(&text).unwrap(), Point { x: 1, y: 2 });
/// ```
pub trait Serializable: Sized {
    /// Produces the text form of `self`.
    ///
    /// # Errors
    ///
    /// Returns [`SerialError::Encode`] if the value cannot be represented.
    fn to_text(&self) -> Result<String, SerialError>;

    /// Rebuilds a value from its text form.
    ///
    /// # Errors
    ///
    /// Returns [`SerialError::Decode`] if `data` is malformed or describes an
    /// invalid value.
    fn from_text(data: &str) -> Result<Self, SerialError>;
}

/// Encodes `value` as a compact JSON string.
///
/// # Errors
///
/// Returns [`SerialError::Encode`] if serialization fails.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, SerialError> {
    serde_json::to_string(value).map_err(SerialError::Encode)
}

/// Decodes a value from a JSON string.
///
/// # Errors
///
/// Returns [`SerialError::Decode`] if `data` is not valid JSON for `T`.
pub fn from_json<T: DeserializeOwned>(data: &str) -> Result<T, SerialError> {
    serde_json::from_str(data).map_err(SerialError::Decode)
}

/// The error type for [`Serializable`] conversions.
#[derive(Debug)]
pub enum SerialError {
    /// The value could not be turned into text.
    Encode(serde_json::Error),
    /// The text could not be turned into a value.
    Decode(serde_json::Error),
}

impl core::fmt::Display for SerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode value: {err}"),
            Self::Decode(err) => write!(f, "failed to decode value: {err}"),
        }
    }
}

impl std::error::Error for SerialError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(err) | Self::Decode(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::error::Error;

    #[test]
    fn test_json_helpers_round_trip() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), 1u32);
        map.insert("b".to_string(), 2u32);

        let text = to_json(&map).unwrap();
        assert_eq!(text, r#"{"a":1,"b":2}"#);
        assert_eq!(from_json::<BTreeMap<String, u32>>(&text).unwrap(), map);
    }

    #[test]
    fn test_decode_error_keeps_source() {
        let err = from_json::<u32>("not json").unwrap_err();
        assert!(matches!(err, SerialError::Decode(_)));
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("failed to decode value"));
    }

    #[test]
    fn test_encode_error() {
        // JSON object keys must be strings.
        let mut map = BTreeMap::new();
        map.insert(vec![1u8], 1u8);
        assert!(matches!(to_json(&map), Err(SerialError::Encode(_))));
    }
}
