//! Two-pass decoding of objects with a catch-all field.
//!
//! Pass 1 snapshots the object's raw text through a cloned cursor and hands it
//! to `serde_json`, which fills in the declared fields. Pass 2 walks the same
//! object on the original cursor and captures whatever the declared fields
//! don't claim. The input is read once; only the lookahead clone scans ahead.

use super::scanner::{scan_object, KnownValues};
use super::schema::{resolve, ResolvedSchema, RestModel};
use crate::error::{DecodeError, Error, Result, SchemaError};
use crate::options::{Converter, JsonOptions};
use crate::reader::{JsonReader, TokenKind};
use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;

pub struct RestConverter<T> {
    schema: Arc<ResolvedSchema<T>>,
    _target: PhantomData<fn() -> T>,
}

impl<T: RestModel> RestConverter<T> {
    /// Resolve the schema of `T`; fails before any input is seen.
    pub fn new() -> Result<Self, SchemaError> {
        Ok(RestConverter {
            schema: resolve::<T>()?,
            _target: PhantomData,
        })
    }

    pub fn schema(&self) -> &ResolvedSchema<T> {
        &self.schema
    }

    /// Decode the value at the cursor. `Ok(None)` for JSON `null`.
    pub fn read(&self, reader: &mut JsonReader<'_>, options: &JsonOptions) -> Result<Option<T>> {
        match reader.peek_kind()? {
            TokenKind::Null => {
                reader.read_null()?;
                return Ok(None);
            }
            TokenKind::Object => {}
            found => {
                return Err(DecodeError::ExpectedObject {
                    found,
                    offset: reader.offset(),
                }
                .into())
            }
        }

        // Without this converter, the inner decode can't dispatch back into it.
        let inner = options.without(self.id());

        let snapshot = reader.peek_raw_value()?;
        trace!(type_name = self.schema.type_name(), len = snapshot.len(), "decoding known fields");
        let mut target: T = crate::from_str(snapshot, &inner)?.ok_or(DecodeError::ExpectedObject {
            found: TokenKind::Null,
            offset: reader.offset(),
        })?;

        let catch_all = self.schema.catch_all();
        catch_all.reset(&mut target);
        scan_object(
            reader,
            self.schema.fields(),
            &inner,
            catch_all.get_mut(&mut target),
            KnownValues::Skip,
        )?;

        Ok(Some(target))
    }
}

impl<T: RestModel> Converter for RestConverter<T> {
    fn id(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    fn target(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn target_name(&self) -> &'static str {
        self.schema.type_name()
    }

    fn read_any(
        &self,
        reader: &mut JsonReader<'_>,
        options: &JsonOptions,
    ) -> Result<Option<Box<dyn Any>>> {
        Ok(self.read(reader, options)?.map(|value| Box::new(value) as Box<dyn Any>))
    }

    fn write_any(&self, _value: &dyn Any, _options: &JsonOptions) -> Result<String> {
        Err(Error::Unsupported {
            operation: "encoding",
            type_name: self.schema.type_name(),
        })
    }
}
