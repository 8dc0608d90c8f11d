use petgraph::algo::tarjan_scc;

use crate::graph::dag::DependencyGraph;

/// Find every dependency cycle in the graph.
///
/// Uses Tarjan's algorithm to find strongly connected components; each
/// component with more than one entity is a cycle. Self references never
/// appear here because they are kept out of the graph.
pub fn find_cycles(graph: &DependencyGraph) -> Vec<Vec<String>> {
    tarjan_scc(&graph.graph)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|scc| {
            let mut names: Vec<String> = scc
                .iter()
                .map(|&idx| graph.entity_name(idx).to_string())
                .collect();
            names.sort();
            names
        })
        .collect()
}
