//! Name reconciliation between raw JSON keys and declared fields.
//!
//! A key belongs to a field when it equals, ordinally and case-sensitively:
//! the declared name, the declared name with its first character lower-cased,
//! or the field's explicit rename. These rules must agree with the names the
//! target's `Deserialize` impl accepts, or a key ends up either in both the
//! typed field and the catch-all map, or in neither.

/// A declared field as seen by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownField {
    name: String,
    lower_first: String,
    rename: Option<String>,
}

impl KnownField {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        KnownField {
            lower_first: lower_first(&name),
            name,
            rename: None,
        }
    }

    pub fn with_rename(mut self, rename: impl Into<String>) -> Self {
        self.rename = Some(rename.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&self) -> Option<&str> {
        self.rename.as_deref()
    }

    pub fn matches(&self, json_key: &str) -> bool {
        json_key == self.name
            || json_key == self.lower_first
            || self.rename.as_deref() == Some(json_key)
    }
}

/// Lower-case only the first character: `UserName` becomes `userName`,
/// `URL` becomes `uRL`. Deliberately not a full camelCase conversion.
pub fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The field `json_key` resolves to, if any.
pub fn match_field<'f>(json_key: &str, fields: &'f [KnownField]) -> Option<&'f KnownField> {
    fields.iter().find(|field| field.matches(json_key))
}

pub fn is_known_field(json_key: &str, fields: &[KnownField]) -> bool {
    fields.iter().any(|field| field.matches(json_key))
}
