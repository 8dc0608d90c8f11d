//! # Error Types
//!
//! Defines `EntseedError`, the unified error enum for every failure mode in
//! the entseed pipeline. Every variant names the entity, column or edge it
//! concerns. All of them are fatal: a run that hits one is aborted and nothing
//! is retried.

use thiserror::Error;

/// All errors that can occur in entseed operations.
#[derive(Error, Debug)]
pub enum EntseedError {
    #[error("Failed to parse schema JSON: {source}")]
    SchemaParse {
        #[source]
        source: serde_json::Error,
    },

    #[error("{owner}.{field} references unknown entity '{target}'")]
    UnknownEntity {
        owner: String,
        field: String,
        target: String,
    },

    #[error("Circular dependency detected involving entities: {entities}\n  The schema must admit a topological ordering.")]
    CircularDependency { entities: String },

    #[error("{entity}.{column} is a non-nullable reference to {entity} and no {entity} row exists yet to point it at")]
    SelfReference { entity: String, column: String },

    #[error("{entity}.{column} is a wildcard polymorphic reference but no entity in the schema has an id column")]
    NoIdentityEntity { entity: String, column: String },

    #[error("Unsupported derived field {derived} on {entity}.{field}\n  Derived fields are only supported on fields named <base>_id / <base>ID with a derived <base>_type / <base>Type")]
    DerivedField {
        entity: String,
        field: String,
        derived: String,
    },

    #[error("No {entity} row at index {row_index} (needed by {needed_by})")]
    MissingRow {
        entity: String,
        row_index: usize,
        needed_by: String,
    },

    #[error("Row {row_index} of table {table} has no column '{column}' needed by {entity}")]
    MissingColumn {
        entity: String,
        table: String,
        column: String,
        row_index: usize,
    },

    #[error("Entity {entity} has no fixed rows to pick from (needed by {needed_by})")]
    MissingFixedRows { entity: String, needed_by: String },

    #[error("No schema information for entity '{entity}'")]
    MissingEntity { entity: String },

    #[error("Unsupported field {entity}.{field}: {message}")]
    UnsupportedType {
        entity: String,
        field: String,
        message: String,
    },

    #[error("Value generation failed for column '{column}': {message}")]
    ValueGeneration { column: String, message: String },

    #[error("Unknown edge '{edge}'. Run `entseed edges` to list the edges in the schema")]
    UnknownEdge { edge: String },

    #[error("Stored configuration for edge '{edge}' does not match the schema: {message}")]
    EdgeConfigMismatch { edge: String, message: String },

    #[error("Expected exactly one assoc_edge_config row for edge '{edge}', found {found}")]
    EdgeConfigNotFound { edge: String, found: usize },

    #[error("Database connection failed: {message}\n  Connection string: {connection_hint}\n  Cause: {source}")]
    Connection {
        message: String,
        connection_hint: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("COPY into {table} failed: {message}\n  SQL: {statement}\n  DB error: {source}")]
    CopyFailed {
        table: String,
        message: String,
        statement: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Query failed: {message}\n  SQL: {statement}\n  DB error: {source}")]
    Query {
        message: String,
        statement: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Output error: {message}: {source}")]
    Output {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

pub type Result<T> = std::result::Result<T, EntseedError>;
