pub mod edges;
pub mod generate;
pub mod graph;
