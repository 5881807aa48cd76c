//! Record model and field schema.

mod schema;
mod value;

pub use schema::{FieldSchema, FieldType};
pub use value::{canonical_text, render_value, Record, UNKNOWN};
