use crate::graph::dag::DependencyGraph;
use crate::graph::topo::InsertionOrder;
use petgraph::visit::EdgeRef;

/// Output format for graph visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Mermaid,
    Dot,
    /// Plain numbered insertion order.
    Order,
}

/// Render the dependency graph.
pub fn visualize(graph: &DependencyGraph, order: &InsertionOrder, format: GraphFormat) -> String {
    match format {
        GraphFormat::Mermaid => generate_mermaid(graph),
        GraphFormat::Dot => generate_dot(graph),
        GraphFormat::Order => generate_order(order),
    }
}

fn generate_mermaid(graph: &DependencyGraph) -> String {
    let mut output = String::from("graph TD\n");

    for node in graph.graph.node_indices() {
        let name = graph.entity_name(node);
        output.push_str(&format!("    {}[{}]\n", name, name));
    }

    output.push('\n');

    for edge in graph.graph.edge_references() {
        let from = graph.entity_name(edge.source());
        let to = graph.entity_name(edge.target());
        let label = edge_label(&edge.weight().column, edge.weight().polymorphic);
        output.push_str(&format!("    {} -->|{}| {}\n", from, label, to));
    }

    for self_ref in &graph.self_references {
        output.push_str(&format!(
            "    {} -.->|{} (self)| {}\n",
            self_ref.entity, self_ref.column, self_ref.entity
        ));
    }

    output
}

fn generate_dot(graph: &DependencyGraph) -> String {
    let mut output = String::from("digraph dependencies {\n");
    output.push_str("    rankdir=TB;\n");
    output.push_str("    node [shape=box, style=rounded];\n\n");

    for node in graph.graph.node_indices() {
        output.push_str(&format!("    \"{}\";\n", graph.entity_name(node)));
    }

    for edge in graph.graph.edge_references() {
        let from = graph.entity_name(edge.source());
        let to = graph.entity_name(edge.target());
        let label = edge_label(&edge.weight().column, edge.weight().polymorphic);
        output.push_str(&format!(
            "    \"{}\" -> \"{}\" [label=\"{}\"];\n",
            from, to, label
        ));
    }

    for self_ref in &graph.self_references {
        output.push_str(&format!(
            "    \"{}\" -> \"{}\" [label=\"{} (self)\", style=dashed, color=red];\n",
            self_ref.entity, self_ref.entity, self_ref.column
        ));
    }

    output.push_str("}\n");
    output
}

fn generate_order(order: &InsertionOrder) -> String {
    order
        .entities
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{:>3}. {}\n", i + 1, name))
        .collect()
}

fn edge_label(column: &str, polymorphic: bool) -> String {
    if polymorphic {
        format!("{} (polymorphic)", column)
    } else {
        column.to_string()
    }
}
