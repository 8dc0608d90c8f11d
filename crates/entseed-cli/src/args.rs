use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "entseed",
    about = "Fill an ent schema's tables with dependency-ordered fake rows",
    version,
    after_help = "Examples:\n  entseed generate --schema schema.json --rows 1000 --db postgres://localhost/app\n  entseed generate --schema schema.json --restrict Contact --dry-run --keep-files\n  entseed generate --schema schema.json --edge-name UserToFriendsEdge\n  entseed graph --schema schema.json --format mermaid\n  entseed edges --schema schema.json"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate rows (or edges), write CSV files and load them
    Generate(GenerateArgs),

    /// Visualize the entity dependency graph
    Graph(GraphArgs),

    /// List the association edges declared in the schema
    Edges(EdgesArgs),
}

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Path to the schema JSON written by the schema reader
    #[arg(long)]
    pub schema: PathBuf,

    /// PostgreSQL connection URL.
    /// Falls back to DATABASE_URL env var or .env file
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Rows per entity, or edges in edge mode
    #[arg(long)]
    pub rows: Option<usize>,

    /// Only these entities generate rows; their parents are created on demand
    #[arg(long, value_delimiter = ',')]
    pub restrict: Vec<String>,

    /// Generate rows for this association edge instead of entities
    #[arg(long)]
    pub edge_name: Option<String>,

    /// Random seed for deterministic generation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory the CSV files are written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Keep the CSV files after the run
    #[arg(long)]
    pub keep_files: bool,

    /// Write the CSV files but do not load them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Parser, Debug)]
pub struct GraphArgs {
    /// Path to the schema JSON
    #[arg(long)]
    pub schema: PathBuf,

    /// Output format for the dependency graph
    #[arg(long, default_value = "mermaid")]
    pub format: GraphFormat,
}

#[derive(Parser, Debug)]
pub struct EdgesArgs {
    /// Path to the schema JSON
    #[arg(long)]
    pub schema: PathBuf,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum GraphFormat {
    Mermaid,
    Dot,
    /// Numbered insertion order
    Order,
}

impl GenerateArgs {
    /// Entity allow-list, `None` when every entity generates.
    pub fn restrict_list(&self) -> Option<Vec<String>> {
        let list: Vec<String> = self
            .restrict
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        (!list.is_empty()).then_some(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate_flags() {
        let cli = Cli::parse_from([
            "entseed",
            "generate",
            "--schema",
            "schema.json",
            "--rows",
            "50",
            "--restrict",
            "Contact, User",
            "--seed",
            "7",
            "--dry-run",
        ]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.rows, Some(50));
        assert_eq!(args.seed, Some(7));
        assert!(args.dry_run);
        assert!(!args.keep_files);
        assert_eq!(
            args.restrict_list(),
            Some(vec!["Contact".to_string(), "User".to_string()])
        );
    }

    #[test]
    fn test_empty_restrict_means_everything() {
        let cli = Cli::parse_from(["entseed", "generate", "--schema", "s.json"]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.restrict_list(), None);
        assert!(args.edge_name.is_none());
    }

    #[test]
    fn test_graph_format() {
        let cli = Cli::parse_from(["entseed", "graph", "--schema", "s.json", "--format", "order"]);
        assert!(matches!(
            cli.command,
            Command::Graph(GraphArgs { format: GraphFormat::Order, .. })
        ));
    }
}
