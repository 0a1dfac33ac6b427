use std::fmt;
use thiserror::Error;

/// Semantic failure kind, independent of the concrete variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Field missing or unreadable on the owner type.
    Descriptor,
    /// A field could not be reconciled with its declared type during merge.
    Merge,
    /// An unsupported value was met while producing a record.
    Serialize,
    /// Mapper configuration could not be loaded.
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Descriptor => write!(f, "descriptor"),
            Self::Merge => write!(f, "merge"),
            Self::Serialize => write!(f, "serialize"),
            Self::Config => write!(f, "config"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    #[error("Field '{field}' not found on '{type_name}'")]
    FieldNotFound {
        type_name: &'static str,
        field: String,
    },

    #[error("Unsupported merge type '{type_name}' for field '{field}'")]
    UnsupportedMergeType {
        field: String,
        type_name: &'static str,
    },

    #[error("Unable to instantiate '{type_name}' for field '{field}': {reason}")]
    Instantiate {
        field: String,
        type_name: &'static str,
        reason: String,
    },

    #[error("Unable to parse temporal value '{input}' for field '{field}': {reason}")]
    TemporalParse {
        field: String,
        input: String,
        reason: String,
    },

    #[error("Unable to prepare value for field '{field}' which holds no '{type_name}' instance")]
    MissingPrototype {
        field: String,
        type_name: &'static str,
    },

    #[error("Unable to prepare '{type_name}' for field '{field}': {reason}")]
    Prepare {
        field: String,
        type_name: &'static str,
        reason: String,
    },

    #[error("Cannot coerce {found} to {expected} for field '{field}'")]
    Coercion {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Cannot assign {found} to field '{field}' of type '{type_name}'")]
    Assign {
        field: String,
        type_name: &'static str,
        found: &'static str,
    },

    #[error("Field '{field}' expects a record, got {found}")]
    NotARecord { field: String, found: &'static str },

    #[error("Unsupported serialize type '{type_name}' for field '{path}'")]
    UnsupportedSerializeType { path: String, type_name: String },

    #[error("Config error: {0}")]
    Config(String),
}

impl MapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FieldNotFound { .. } => ErrorKind::Descriptor,
            Self::UnsupportedMergeType { .. }
            | Self::Instantiate { .. }
            | Self::TemporalParse { .. }
            | Self::MissingPrototype { .. }
            | Self::Prepare { .. }
            | Self::Coercion { .. }
            | Self::Assign { .. }
            | Self::NotARecord { .. } => ErrorKind::Merge,
            Self::UnsupportedSerializeType { .. } => ErrorKind::Serialize,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Field (or dotted path) the error is attached to, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::FieldNotFound { field, .. }
            | Self::UnsupportedMergeType { field, .. }
            | Self::Instantiate { field, .. }
            | Self::TemporalParse { field, .. }
            | Self::MissingPrototype { field, .. }
            | Self::Prepare { field, .. }
            | Self::Coercion { field, .. }
            | Self::Assign { field, .. }
            | Self::NotARecord { field, .. } => Some(field),
            Self::UnsupportedSerializeType { path, .. } => Some(path),
            Self::Config(_) => None,
        }
    }

    /// Prefixes the field with `parent`, the path of the object it belongs to.
    pub fn within(mut self, parent: &str) -> Self {
        match &mut self {
            Self::FieldNotFound { field, .. }
            | Self::UnsupportedMergeType { field, .. }
            | Self::Instantiate { field, .. }
            | Self::TemporalParse { field, .. }
            | Self::MissingPrototype { field, .. }
            | Self::Prepare { field, .. }
            | Self::Coercion { field, .. }
            | Self::Assign { field, .. }
            | Self::NotARecord { field, .. }
            | Self::UnsupportedSerializeType { path: field, .. } => {
                *field = format!("{}.{}", parent, field);
            }
            Self::Config(_) => {}
        }
        self
    }
}

pub type Result<T> = std::result::Result<T, MapError>;

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::Config(err.to_string())
    }
}
