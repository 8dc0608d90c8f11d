//! # Schema Model
//!
//! Entity descriptors as produced by the external schema reader, plus the
//! naming rules that turn entity and field names into tables, columns and
//! edge names.

pub mod load;
pub mod naming;
pub mod types;
