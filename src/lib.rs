//! # restjson - JSON objects with catch-all extension fields
//!
//! REST APIs routinely grow fields that client models don't know about yet.
//! This crate decodes a JSON object into a typed structure and keeps every
//! key the structure doesn't declare in a designated `HashMap<String, String>`
//! field instead of dropping it.
//!
//! ## Modules
//!
//! - **rest**: the catch-all converter, the field schema descriptors, and the
//!   name reconciliation rules
//! - **reader**: the JSON cursor with non-destructive lookahead
//! - **options**: decode options and the converter hook
//!
//! ## Quick Start
//!
//! ```rust
//! use restjson::{FieldDescriptor, JsonOptions, RestMap, RestModel};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize)]
//! struct Pet {
//!     #[serde(rename = "Name", alias = "name", default)]
//!     name: String,
//!     #[serde(skip)]
//!     extra: RestMap,
//! }
//!
//! impl RestModel for Pet {
//!     fn fields() -> Vec<FieldDescriptor<Self>> {
//!         vec![
//!             FieldDescriptor::field("Name"),
//!             FieldDescriptor::catch_all("Extra", |pet: &mut Self| &mut pet.extra),
//!         ]
//!     }
//! }
//!
//! # fn main() -> Result<(), restjson::Error> {
//! let options = JsonOptions::new().with_rest::<Pet>()?;
//! let pet: Pet = restjson::from_str(r#"{"name": "Rex", "legs": 4}"#, &options)?
//!     .expect("not null");
//!
//! assert_eq!(pet.name, "Rex");
//! assert_eq!(pet.extra["legs"], "4");
//! # Ok(())
//! # }
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{type_name, TypeId};

pub mod error;
pub mod options;
pub mod reader;
pub mod rest;

pub use error::{DecodeError, Error, ErrorKind, Result, SchemaError};
pub use options::{Converter, JsonOptions};
pub use reader::{JsonReader, TokenKind};
pub use rest::{
    partition, FieldDescriptor, FieldType, KnownField, Partition, RestConverter, RestMap,
    RestModel, Visibility,
};

/// Decode the next value from `reader` as `T`.
///
/// A converter registered for `T` in `options` takes over entirely. Otherwise
/// JSON `null` yields `None` and anything else goes to `serde_json`.
pub fn from_reader<T>(reader: &mut JsonReader<'_>, options: &JsonOptions) -> Result<Option<T>>
where
    T: DeserializeOwned + 'static,
{
    if let Some(converter) = options.converter_for(TypeId::of::<T>()) {
        let Some(value) = converter.read_any(reader, options)? else {
            return Ok(None);
        };
        let value = value.downcast::<T>().map_err(|_| Error::Unsupported {
            operation: "converting to a different type",
            type_name: converter.target_name(),
        })?;
        return Ok(Some(*value));
    }

    if reader.peek_kind()? == TokenKind::Null {
        reader.read_null()?;
        return Ok(None);
    }
    let raw = reader.read_raw_value()?;
    let value = serde_json::from_str(raw).map_err(|e| Error::generic(type_name::<T>(), e))?;
    Ok(Some(value))
}

/// Decode a complete JSON document as `T`.
pub fn from_str<T>(json: &str, options: &JsonOptions) -> Result<Option<T>>
where
    T: DeserializeOwned + 'static,
{
    let mut reader = options.reader(json);
    let value = from_reader(&mut reader, options)?;
    reader.finish()?;
    Ok(value)
}

/// Encode `value`, going through its converter when one is registered.
pub fn to_string<T>(value: &T, options: &JsonOptions) -> Result<String>
where
    T: Serialize + 'static,
{
    match options.converter_for(TypeId::of::<T>()) {
        Some(converter) => converter.write_any(value, options),
        None => serde_json::to_string(value).map_err(|e| Error::generic(type_name::<T>(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize, Serialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_generic_path_without_converters() {
        let options = JsonOptions::new();
        let point: Option<Point> = from_str(r#"{"x": 1, "y": 2}"#, &options).unwrap();
        assert_eq!(point, Some(Point { x: 1, y: 2 }));

        let encoded = to_string(&Point { x: 3, y: 4 }, &options).unwrap();
        let encoded: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(encoded, json!({"x": 3, "y": 4}));
    }

    #[test]
    fn test_null_is_absent() {
        let options = JsonOptions::new();
        let point: Option<Point> = from_str(" null ", &options).unwrap();
        assert_eq!(point, None);
    }

    #[test]
    fn test_generic_errors_name_the_type() {
        let options = JsonOptions::new();
        let err = from_str::<Point>(r#"{"x": "one"}"#, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.to_string().contains("Point"));
    }

    #[test]
    fn test_trailing_input_rejected() {
        let options = JsonOptions::new();
        let err = from_str::<Point>(r#"{"x": 1, "y": 2} {}"#, &options).unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::TrailingCharacters { .. })));
    }

    #[test]
    fn test_reader_yields_consecutive_values() {
        let options = JsonOptions::new();
        let mut reader = JsonReader::new(r#"{"x": 1, "y": 2} null {"x": 5, "y": 6}"#);
        let first: Option<Point> = from_reader(&mut reader, &options).unwrap();
        let second: Option<Point> = from_reader(&mut reader, &options).unwrap();
        let third: Option<Point> = from_reader(&mut reader, &options).unwrap();
        assert_eq!(first, Some(Point { x: 1, y: 2 }));
        assert_eq!(second, None);
        assert_eq!(third, Some(Point { x: 5, y: 6 }));
        assert!(reader.finish().is_ok());
    }
}
