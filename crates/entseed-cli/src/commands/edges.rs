use anyhow::{Context, Result};
use comfy_table::{Cell, Table as ComfyTable};

use entseed_core::graph::edges::EdgeCatalogue;
use entseed_core::schema::load::read_schema;
use entseed_core::ParsedSchema;

use crate::args::EdgesArgs;

pub fn run(args: &EdgesArgs) -> Result<()> {
    let entities = read_schema(&args.schema)
        .with_context(|| format!("Failed to load schema from {}", args.schema.display()))?;
    let schema = ParsedSchema::build(entities, None)?;

    if schema.edges.is_empty() {
        println!("No association edges in {}", args.schema.display());
        return Ok(());
    }

    println!("{}", catalogue_table(&schema.edges));
    Ok(())
}

fn catalogue_table(edges: &EdgeCatalogue) -> ComfyTable {
    let mut t = ComfyTable::new();
    t.set_header(vec!["Edge", "id1", "id2", "Symmetric", "Inverse"]);
    for edge in edges.values() {
        t.add_row(vec![
            Cell::new(&edge.edge_name),
            Cell::new(&edge.id1_type),
            Cell::new(&edge.id2_type),
            Cell::new(if edge.symmetric { "yes" } else { "" }),
            Cell::new(edge.inverse_edge.as_deref().unwrap_or("")),
        ]);
    }
    t
}
