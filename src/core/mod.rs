pub mod error;
pub mod types;
pub mod value;

pub use error::{ErrorKind, MapError, Result};
pub use types::{FieldDescriptor, ScalarKind, SemanticType, TypeDescriptor, TypeRef};
pub use value::{Record, Value};
