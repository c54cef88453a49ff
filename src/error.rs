//! Error taxonomy for schema inspection, decoding, and unsupported operations.

use crate::reader::TokenKind;
use thiserror::Error;

/// Problems with a target type's field descriptors.
///
/// These depend only on the type, so they are raised once and cached along
/// with successful resolutions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("{type_name} declares no catch-all field")]
    MissingCatchAllField { type_name: &'static str },

    #[error("{type_name} declares more than one catch-all field ({})", join_fields(.fields))]
    AmbiguousCatchAllField {
        type_name: &'static str,
        fields: Vec<&'static str>,
    },

    #[error("catch-all field {type_name}.{field} must be a string-to-string map, found {found}")]
    InvalidCatchAllType {
        type_name: &'static str,
        field: &'static str,
        found: &'static str,
    },

    #[error("catch-all field {type_name}.{field} requires a public setter")]
    CatchAllNotWritable {
        type_name: &'static str,
        field: &'static str,
    },
}

/// Problems with the JSON input itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("expected an object or null at offset {offset}, found {found}")]
    ExpectedObject { found: TokenKind, offset: usize },

    #[error("object ends early at offset {offset}{}", key_suffix(.key))]
    TruncatedObject { offset: usize, key: Option<String> },

    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEnd { offset: usize },

    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("trailing characters at offset {offset}")]
    TrailingCharacters { offset: usize },

    #[error("nesting deeper than {limit} levels")]
    DepthLimitExceeded { limit: usize },
}

fn join_fields(fields: &[&str]) -> String {
    fields.join(", ")
}

fn key_suffix(key: &Option<String>) -> String {
    match key {
        Some(key) => format!(" (after key {key:?})"),
        None => String::new(),
    }
}

/// Coarse classification of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Schema,
    Decode,
    UnsupportedOperation,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The generic decoder rejected the snapshot or a residual value.
    #[error("failed to decode {type_name}: {source}")]
    Generic {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{operation} is not supported for {type_name}")]
    Unsupported {
        operation: &'static str,
        type_name: &'static str,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Schema(_) => ErrorKind::Schema,
            Error::Decode(_) | Error::Generic { .. } => ErrorKind::Decode,
            Error::Unsupported { .. } => ErrorKind::UnsupportedOperation,
        }
    }

    pub(crate) fn generic(type_name: &'static str, source: serde_json::Error) -> Self {
        Error::Generic { type_name, source }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_message_lists_fields() {
        let err = SchemaError::AmbiguousCatchAllField {
            type_name: "Widget",
            fields: vec!["Extra", "More"],
        };
        assert_eq!(
            err.to_string(),
            "Widget declares more than one catch-all field (Extra, More)"
        );
    }

    #[test]
    fn test_truncated_message_names_key() {
        let err = DecodeError::TruncatedObject {
            offset: 12,
            key: Some("name".to_string()),
        };
        assert!(err.to_string().contains("\"name\""));

        let err = DecodeError::TruncatedObject { offset: 1, key: None };
        assert_eq!(err.to_string(), "object ends early at offset 1");
    }

    #[test]
    fn test_error_kinds() {
        let schema: Error = SchemaError::MissingCatchAllField { type_name: "T" }.into();
        assert_eq!(schema.kind(), ErrorKind::Schema);

        let decode: Error = DecodeError::UnexpectedEnd { offset: 0 }.into();
        assert_eq!(decode.kind(), ErrorKind::Decode);

        let unsupported = Error::Unsupported {
            operation: "encode",
            type_name: "T",
        };
        assert_eq!(unsupported.kind(), ErrorKind::UnsupportedOperation);
    }
}
