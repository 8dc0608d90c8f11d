use petgraph::algo::toposort;

use crate::error::{EntseedError, Result};
use crate::graph::cycle::find_cycles;
use crate::graph::dag::DependencyGraph;

/// Result of topological sorting: entity names in the order their rows
/// must be generated and inserted (dependencies first).
#[derive(Debug, Clone, Default)]
pub struct InsertionOrder {
    pub entities: Vec<String>,
}

impl InsertionOrder {
    pub fn position(&self, entity: &str) -> Option<usize> {
        self.entities.iter().position(|e| e == entity)
    }
}

/// Compute the topological order of the dependency graph.
///
/// Edges point parent → child, so petgraph's order already lists parents
/// first. A cycle is a configuration error; the error names every entity
/// taking part in one.
pub fn topological_sort(graph: &DependencyGraph) -> Result<InsertionOrder> {
    match toposort(&graph.graph, None) {
        Ok(sorted) => Ok(InsertionOrder {
            entities: sorted
                .iter()
                .map(|&idx| graph.entity_name(idx).to_string())
                .collect(),
        }),
        Err(cycle) => {
            let cycles = find_cycles(graph);
            let entities = if cycles.is_empty() {
                graph.entity_name(cycle.node_id()).to_string()
            } else {
                cycles
                    .iter()
                    .map(|c| c.join(" <-> "))
                    .collect::<Vec<_>>()
                    .join("; ")
            };
            Err(EntseedError::CircularDependency { entities })
        }
    }
}
