//! Field descriptors for catch-all targets, and the inspector that finds and
//! validates the catch-all field.
//!
//! Types opt in by implementing [`RestModel`], listing their fields once. The
//! inspector's verdict depends on nothing but the type, so [`resolve`] caches
//! it per `TypeId` for the life of the process, failures included.

use super::names::KnownField;
use crate::error::SchemaError;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// The catch-all map: residual JSON keys to their values in string form.
pub type RestMap = HashMap<String, String>;

/// Typed access to a catch-all field.
pub type MapSlot<T> = fn(&mut T) -> &mut RestMap;

/// Declared type of a field, as far as the inspector cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Scalar,
    Object,
    List,
    StringMap,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Scalar => "scalar",
            FieldType::Object => "object",
            FieldType::List => "list",
            FieldType::StringMap => "string-to-string map",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who may assign a field after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Crate,
    Private,
}

/// One field of a [`RestModel`].
pub struct FieldDescriptor<T> {
    name: &'static str,
    rename: Option<&'static str>,
    catch_all: bool,
    field_type: FieldType,
    slot: Option<MapSlot<T>>,
    setter: Visibility,
}

impl<T> FieldDescriptor<T> {
    /// An ordinary field, decoded by `serde`.
    pub fn field(name: &'static str) -> Self {
        FieldDescriptor {
            name,
            rename: None,
            catch_all: false,
            field_type: FieldType::Scalar,
            slot: None,
            setter: Visibility::Public,
        }
    }

    /// The field that collects residual keys.
    pub fn catch_all(name: &'static str, slot: MapSlot<T>) -> Self {
        FieldDescriptor {
            name,
            rename: None,
            catch_all: true,
            field_type: FieldType::StringMap,
            slot: Some(slot),
            setter: Visibility::Public,
        }
    }

    pub fn renamed(mut self, rename: &'static str) -> Self {
        self.rename = Some(rename);
        self
    }

    pub fn typed(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    /// Flag the field as catch-all without supplying an accessor.
    pub fn marked_catch_all(mut self) -> Self {
        self.catch_all = true;
        self
    }

    pub fn setter_visibility(mut self, setter: Visibility) -> Self {
        self.setter = setter;
        self
    }

    /// Drop the accessor, so the field can no longer be assigned.
    pub fn read_only(mut self) -> Self {
        self.slot = None;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_catch_all(&self) -> bool {
        self.catch_all
    }

    fn known_field(&self) -> KnownField {
        let field = KnownField::new(self.name);
        match self.rename {
            Some(rename) => field.with_rename(rename),
            None => field,
        }
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("rename", &self.rename)
            .field("catch_all", &self.catch_all)
            .field("field_type", &self.field_type)
            .field("writable", &self.slot.is_some())
            .field("setter", &self.setter)
            .finish()
    }
}

/// A structure that can be decoded with a catch-all field.
///
/// The `Deserialize` impl handles the known fields and must accept the same
/// key names the descriptors declare (see [`super::names`]). The catch-all
/// field is typically `#[serde(skip)]`.
pub trait RestModel: DeserializeOwned + 'static {
    fn fields() -> Vec<FieldDescriptor<Self>>;
}

/// Handle to a validated catch-all field.
pub struct CatchAllField<T> {
    name: &'static str,
    slot: MapSlot<T>,
}

impl<T> CatchAllField<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get_mut<'t>(&self, target: &'t mut T) -> &'t mut RestMap {
        (self.slot)(target)
    }

    /// Replace the field's contents with an empty map.
    pub fn reset(&self, target: &mut T) {
        *(self.slot)(target) = RestMap::new();
    }
}

/// Everything the decoder needs to know about `T`.
pub struct ResolvedSchema<T> {
    type_name: &'static str,
    fields: Vec<KnownField>,
    catch_all: CatchAllField<T>,
}

impl<T> ResolvedSchema<T> {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Every declared field, the catch-all included.
    pub fn fields(&self) -> &[KnownField] {
        &self.fields
    }

    pub fn catch_all(&self) -> &CatchAllField<T> {
        &self.catch_all
    }
}

impl<T> fmt::Debug for CatchAllField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatchAllField").field("name", &self.name).finish()
    }
}

impl<T> fmt::Debug for ResolvedSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedSchema")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .field("catch_all", &self.catch_all)
            .finish()
    }
}

/// Locate and validate the catch-all field of `T`, without caching.
pub fn inspect<T: RestModel>() -> Result<ResolvedSchema<T>, SchemaError> {
    let type_name = type_name::<T>();
    let descriptors = T::fields();

    let mut flagged = descriptors.iter().filter(|d| d.catch_all);
    let Some(candidate) = flagged.next() else {
        return Err(SchemaError::MissingCatchAllField { type_name });
    };
    if flagged.next().is_some() {
        return Err(SchemaError::AmbiguousCatchAllField {
            type_name,
            fields: descriptors
                .iter()
                .filter(|d| d.catch_all)
                .map(|d| d.name)
                .collect(),
        });
    }

    if candidate.field_type != FieldType::StringMap {
        return Err(SchemaError::InvalidCatchAllType {
            type_name,
            field: candidate.name,
            found: candidate.field_type.as_str(),
        });
    }

    let slot = match (candidate.slot, candidate.setter) {
        (Some(slot), Visibility::Public) => slot,
        _ => {
            return Err(SchemaError::CatchAllNotWritable {
                type_name,
                field: candidate.name,
            })
        }
    };

    Ok(ResolvedSchema {
        type_name,
        fields: descriptors.iter().map(FieldDescriptor::known_field).collect(),
        catch_all: CatchAllField {
            name: candidate.name,
            slot,
        },
    })
}

type Resolution<T> = Result<Arc<ResolvedSchema<T>>, SchemaError>;

// Values are `Resolution<T>` for the `T` whose `TypeId` is the key.
static SCHEMAS: Lazy<RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Cached [`inspect`].
pub fn resolve<T: RestModel>() -> Resolution<T> {
    let key = TypeId::of::<T>();

    {
        let schemas = SCHEMAS.read().unwrap_or_else(PoisonError::into_inner);
        let cached = schemas
            .get(&key)
            .and_then(|entry| entry.downcast_ref::<Resolution<T>>());
        if let Some(cached) = cached {
            return cached.clone();
        }
    }

    let resolution: Resolution<T> = inspect::<T>().map(Arc::new);
    match &resolution {
        Ok(schema) => debug!(
            type_name = schema.type_name(),
            catch_all = schema.catch_all().name(),
            fields = schema.fields().len(),
            "resolved catch-all schema"
        ),
        Err(err) => debug!(error = %err, "catch-all schema rejected"),
    }

    let mut schemas = SCHEMAS.write().unwrap_or_else(PoisonError::into_inner);
    let entry = schemas
        .entry(key)
        .or_insert_with(|| Arc::new(resolution) as Arc<dyn Any + Send + Sync>);
    entry
        .downcast_ref::<Resolution<T>>()
        .cloned()
        .unwrap_or_else(|| inspect::<T>().map(Arc::new))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    struct Valid {
        #[serde(default)]
        id: u64,
        #[serde(skip)]
        rest: RestMap,
    }

    impl RestModel for Valid {
        fn fields() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::field("Id").renamed("id"),
                FieldDescriptor::catch_all("Rest", |v: &mut Self| &mut v.rest),
            ]
        }
    }

    #[derive(Debug, Deserialize)]
    struct NoCatchAll {}

    impl RestModel for NoCatchAll {
        fn fields() -> Vec<FieldDescriptor<Self>> {
            vec![FieldDescriptor::field("Id")]
        }
    }

    #[derive(Debug, Deserialize)]
    struct TwoCatchAlls {
        #[serde(skip)]
        a: RestMap,
        #[serde(skip)]
        b: RestMap,
    }

    impl RestModel for TwoCatchAlls {
        fn fields() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::catch_all("A", |t: &mut Self| &mut t.a),
                FieldDescriptor::catch_all("B", |t: &mut Self| &mut t.b),
            ]
        }
    }

    #[derive(Debug, Deserialize)]
    struct ListCatchAll {
        #[serde(skip)]
        #[allow(dead_code)]
        extra: Vec<String>,
    }

    impl RestModel for ListCatchAll {
        fn fields() -> Vec<FieldDescriptor<Self>> {
            vec![FieldDescriptor::field("Extra")
                .typed(FieldType::List)
                .marked_catch_all()]
        }
    }

    #[derive(Debug, Deserialize)]
    struct PrivateSetter {
        #[serde(skip)]
        extra: RestMap,
    }

    impl RestModel for PrivateSetter {
        fn fields() -> Vec<FieldDescriptor<Self>> {
            vec![FieldDescriptor::catch_all("Extra", |t: &mut Self| &mut t.extra)
                .setter_visibility(Visibility::Private)]
        }
    }

    #[derive(Debug, Deserialize)]
    struct ReadOnly {
        #[serde(skip)]
        #[allow(dead_code)]
        extra: RestMap,
    }

    impl RestModel for ReadOnly {
        fn fields() -> Vec<FieldDescriptor<Self>> {
            vec![FieldDescriptor::catch_all("Extra", |t: &mut Self| &mut t.extra).read_only()]
        }
    }

    #[test]
    fn test_inspect_valid() {
        let schema = inspect::<Valid>().unwrap();
        assert_eq!(schema.catch_all().name(), "Rest");
        assert_eq!(schema.fields().len(), 2);
        assert_eq!(schema.fields()[0].rename(), Some("id"));

        let mut value = Valid::default();
        schema.catch_all().get_mut(&mut value).insert("k".into(), "v".into());
        assert_eq!(value.rest.len(), 1);
        schema.catch_all().reset(&mut value);
        assert!(value.rest.is_empty());
    }

    #[test]
    fn test_missing_catch_all() {
        assert_eq!(
            inspect::<NoCatchAll>().unwrap_err(),
            SchemaError::MissingCatchAllField {
                type_name: type_name::<NoCatchAll>()
            }
        );
    }

    #[test]
    fn test_ambiguous_catch_all() {
        match inspect::<TwoCatchAlls>().unwrap_err() {
            SchemaError::AmbiguousCatchAllField { fields, .. } => {
                assert_eq!(fields, vec!["A", "B"]);
            }
            other => panic!("Expected AmbiguousCatchAllField, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_catch_all_type() {
        match inspect::<ListCatchAll>().unwrap_err() {
            SchemaError::InvalidCatchAllType { field, found, .. } => {
                assert_eq!(field, "Extra");
                assert_eq!(found, "list");
            }
            other => panic!("Expected InvalidCatchAllType, got {other:?}"),
        }
    }

    #[test]
    fn test_unwritable_catch_all() {
        assert!(matches!(
            inspect::<PrivateSetter>(),
            Err(SchemaError::CatchAllNotWritable { field: "Extra", .. })
        ));
        assert!(matches!(
            inspect::<ReadOnly>(),
            Err(SchemaError::CatchAllNotWritable { field: "Extra", .. })
        ));
    }

    #[test]
    fn test_resolve_caches_per_type() {
        let first = resolve::<Valid>().unwrap();
        let second = resolve::<Valid>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // Failures are cached too and stay failures.
        assert!(resolve::<NoCatchAll>().is_err());
        assert!(resolve::<NoCatchAll>().is_err());
    }
}
