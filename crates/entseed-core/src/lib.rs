pub mod config;
pub mod error;
pub mod generate;
pub mod graph;
pub mod output;
pub mod schema;
pub mod summary;

// Re-export key types for convenience
pub use error::{EntseedError, Result};
pub use graph::ParsedSchema;
pub use schema::types::{Entities, EntityDescriptor, FieldDescriptor};
pub use summary::Summary;
