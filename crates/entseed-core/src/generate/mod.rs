pub mod chance;
pub mod edges;
pub mod engine;
pub mod fanout;
pub mod oracle;
pub mod pool;
pub mod value;

pub use chance::Chance;
pub use edges::{generate_edges, AssocEdgeConfig, EdgeBatch, EdgeRow};
pub use engine::{Commonality, RowGenerator};
pub use oracle::{FakeOracle, ValueOracle, ValueRequest};
pub use pool::{Row, RowPool};
pub use value::Value;
