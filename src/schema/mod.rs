pub mod registry;
pub mod types;

pub use registry::{SchemaRegistry, BUILTIN};
pub use types::{positional_columns, RecordSchema};
