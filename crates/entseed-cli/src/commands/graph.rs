use anyhow::{Context, Result};

use entseed_core::graph::visualize::{self, GraphFormat as VizFormat};
use entseed_core::schema::load::read_schema;
use entseed_core::ParsedSchema;

use crate::args::GraphArgs;

pub fn run(args: &GraphArgs) -> Result<()> {
    let entities = read_schema(&args.schema)
        .with_context(|| format!("Failed to load schema from {}", args.schema.display()))?;
    let schema = ParsedSchema::build(entities, None)?;

    let format = match args.format {
        crate::args::GraphFormat::Mermaid => VizFormat::Mermaid,
        crate::args::GraphFormat::Dot => VizFormat::Dot,
        crate::args::GraphFormat::Order => VizFormat::Order,
    };

    let output = visualize::visualize(&schema.graph, &schema.order, format);
    println!("{}", output);

    Ok(())
}
