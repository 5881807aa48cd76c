//! Dataset loading and source metadata.

mod loader;
mod source;

pub use loader::{DatasetLoader, LoadedDataset};
pub use source::SourceMetadata;
