//! Catch-all ("rest property") decoding
//!
//! A target type lists its fields once through [`RestModel`]. Exactly one of
//! them is the catch-all map, which ends up holding every JSON key the other
//! fields don't claim.
//!
//! ## Key matching
//!
//! A key is claimed by a field when it equals the field's declared name, that
//! name with its first character lower-cased, or the field's explicit rename.

pub mod converter;
pub mod names;
pub mod scanner;
pub mod schema;

pub use converter::RestConverter;
pub use names::{is_known_field, lower_first, match_field, KnownField};
pub use scanner::{partition, stringify, Partition};
pub use schema::{
    inspect, resolve, CatchAllField, FieldDescriptor, FieldType, MapSlot, ResolvedSchema,
    RestMap, RestModel, Visibility,
};
