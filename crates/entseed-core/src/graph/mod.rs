//! # Dependency Graph
//!
//! Turns entity descriptors into everything the generators need: the
//! parent → child dependency DAG and its insertion order, the typed
//! dependency list of each entity, and the association edge catalogue.

pub mod cycle;
pub mod dag;
pub mod edges;
pub mod parsed;
pub mod topo;
pub mod visualize;

pub use parsed::{EntityInfo, ParsedSchema};
