//! Decode options and the converter hook that routes a type around the
//! generic `serde_json` path.

use crate::error::{Result, SchemaError};
use crate::reader::{JsonReader, DEFAULT_MAX_DEPTH};
use crate::rest::{RestConverter, RestModel};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A custom decoder for one target type.
///
/// Converters are type-erased so that a single [`JsonOptions`] can carry
/// converters for many types; [`crate::from_reader`] downcasts the result back.
pub trait Converter: Send + Sync + 'static {
    /// Identity of the converter itself, used to exclude it from derived options.
    fn id(&self) -> TypeId;

    /// The type this converter produces.
    fn target(&self) -> TypeId;

    fn target_name(&self) -> &'static str;

    /// Decode the next value from `reader`. `Ok(None)` means JSON `null`.
    fn read_any(
        &self,
        reader: &mut JsonReader<'_>,
        options: &JsonOptions,
    ) -> Result<Option<Box<dyn Any>>>;

    /// Encode `value`, which is guaranteed to be of the [`Converter::target`] type.
    fn write_any(&self, value: &dyn Any, options: &JsonOptions) -> Result<String>;
}

#[derive(Clone)]
pub struct JsonOptions {
    converters: Vec<Arc<dyn Converter>>,
    max_depth: usize,
}

impl JsonOptions {
    pub fn new() -> Self {
        JsonOptions {
            converters: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_converter(mut self, converter: impl Converter) -> Self {
        self.converters.push(Arc::new(converter));
        self
    }

    /// Register catch-all decoding for `T`.
    pub fn with_rest<T: RestModel>(self) -> Result<Self, SchemaError> {
        Ok(self.with_converter(RestConverter::<T>::new()?))
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// A copy of these options with every converter of identity `id` removed.
    pub fn without(&self, id: TypeId) -> Self {
        JsonOptions {
            converters: self
                .converters
                .iter()
                .filter(|c| c.id() != id)
                .cloned()
                .collect(),
            max_depth: self.max_depth,
        }
    }

    /// First registered converter producing `target`.
    pub fn converter_for(&self, target: TypeId) -> Option<&dyn Converter> {
        self.converters
            .iter()
            .find(|c| c.target() == target)
            .map(|c| c.as_ref())
    }

    pub fn converter_count(&self) -> usize {
        self.converters.len()
    }

    pub(crate) fn reader<'a>(&self, input: &'a str) -> JsonReader<'a> {
        JsonReader::new(input).with_max_depth(self.max_depth)
    }
}

impl Default for JsonOptions {
    fn default() -> Self {
        JsonOptions::new()
    }
}

impl fmt::Debug for JsonOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let targets: Vec<&str> = self.converters.iter().map(|c| c.target_name()).collect();
        f.debug_struct("JsonOptions")
            .field("converters", &targets)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct Shouting;

    impl Converter for Shouting {
        fn id(&self) -> TypeId {
            TypeId::of::<Shouting>()
        }

        fn target(&self) -> TypeId {
            TypeId::of::<String>()
        }

        fn target_name(&self) -> &'static str {
            "String"
        }

        fn read_any(
            &self,
            reader: &mut JsonReader<'_>,
            _options: &JsonOptions,
        ) -> Result<Option<Box<dyn Any>>> {
            let raw = reader.read_raw_value()?;
            let s: String =
                serde_json::from_str(raw).map_err(|e| Error::generic("String", e))?;
            Ok(Some(Box::new(s.to_uppercase())))
        }

        fn write_any(&self, value: &dyn Any, _options: &JsonOptions) -> Result<String> {
            let s = value.downcast_ref::<String>().map(String::as_str).unwrap_or_default();
            Ok(format!("\"{}!\"", s))
        }
    }

    #[test]
    fn test_converter_lookup() {
        let options = JsonOptions::new().with_converter(Shouting);
        assert!(options.converter_for(TypeId::of::<String>()).is_some());
        assert!(options.converter_for(TypeId::of::<u32>()).is_none());
    }

    #[test]
    fn test_without_removes_only_matching_converter() {
        let options = JsonOptions::new()
            .with_converter(Shouting)
            .with_converter(Shouting)
            .with_max_depth(7);
        assert_eq!(options.converter_count(), 2);

        let derived = options.without(TypeId::of::<Shouting>());
        assert_eq!(derived.converter_count(), 0);
        assert_eq!(derived.max_depth(), 7);
        // The original is untouched.
        assert_eq!(options.converter_count(), 2);

        let unrelated = options.without(TypeId::of::<u8>());
        assert_eq!(unrelated.converter_count(), 2);
    }

    #[test]
    fn test_dispatch_through_converter() {
        let options = JsonOptions::new().with_converter(Shouting);
        let decoded: Option<String> = crate::from_str("\"hey\"", &options).unwrap();
        assert_eq!(decoded.as_deref(), Some("HEY"));

        let encoded = crate::to_string(&"hey".to_string(), &options).unwrap();
        assert_eq!(encoded, "\"hey!\"");
    }

    #[test]
    fn test_debug_lists_targets() {
        let options = JsonOptions::new().with_converter(Shouting);
        assert!(format!("{:?}", options).contains("String"));
    }
}
