//! The residual scan: walk an object's keys on a live cursor, skip the ones
//! that belong to declared fields, and capture the rest as strings.

use super::names::{match_field, KnownField};
use super::schema::RestMap;
use crate::error::Result;
use crate::options::JsonOptions;
use crate::reader::{JsonReader, TokenKind};
use serde_json::{Map, Value};
use tracing::trace;

/// Where the values of declared fields go during a scan.
pub enum KnownValues<'m> {
    /// Already handled elsewhere; skip them.
    Skip,
    /// Decode them untyped, keyed by the declared field name.
    Collect(&'m mut Map<String, Value>),
}

/// Scan the object at the cursor, routing residual keys into `rest`.
///
/// The cursor must sit on the object's opening brace and is left just past
/// its closing brace. A repeated residual key keeps its last value.
pub fn scan_object(
    reader: &mut JsonReader<'_>,
    fields: &[KnownField],
    options: &JsonOptions,
    rest: &mut RestMap,
    mut known: KnownValues<'_>,
) -> Result<()> {
    let mut scan = reader.begin_object()?;

    while let Some(key) = reader.next_key(&mut scan)? {
        if let Some(field) = match_field(&key, fields) {
            match &mut known {
                KnownValues::Skip => {
                    reader.skip_value()?;
                }
                KnownValues::Collect(map) => {
                    let value = read_untyped(reader, options)?;
                    map.insert(field.name().to_string(), value);
                }
            }
            continue;
        }

        let value = read_untyped(reader, options)?;
        trace!(key = %key, "captured residual key");
        rest.insert(key, stringify(value));
    }

    Ok(())
}

fn read_untyped(reader: &mut JsonReader<'_>, options: &JsonOptions) -> Result<Value> {
    let value: Option<Value> = crate::from_reader(reader, options)?;
    Ok(value.unwrap_or(Value::Null))
}

/// String form of a residual value: strings keep their content, everything
/// else becomes its compact JSON text.
pub fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// An object split into declared fields and residual keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub known: Map<String, Value>,
    pub rest: RestMap,
}

/// Split a JSON object by a runtime field list, without a target type.
///
/// `null` yields `None`; any other non-object fails with `ExpectedObject`.
pub fn partition(
    json: &str,
    fields: &[KnownField],
    options: &JsonOptions,
) -> Result<Option<Partition>> {
    let mut reader = options.reader(json);
    if reader.peek_kind()? == TokenKind::Null {
        reader.read_null()?;
        reader.finish()?;
        return Ok(None);
    }

    let mut part = Partition::default();
    scan_object(
        &mut reader,
        fields,
        options,
        &mut part.rest,
        KnownValues::Collect(&mut part.known),
    )?;
    reader.finish()?;
    Ok(Some(part))
}
