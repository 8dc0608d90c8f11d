use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use comfy_table::Table as ComfyTable;
use indicatif::{ProgressBar, ProgressStyle};

use entseed_core::config::{self, EntseedConfig, DEFAULT_OUTPUT_DIR, DEFAULT_ROWS};
use entseed_core::generate::{generate_edges, Chance, FakeOracle, RowGenerator, RowPool};
use entseed_core::output::{copy, csv, TableFile};
use entseed_core::schema::load::read_schema;
use entseed_core::ParsedSchema;

use crate::args::GenerateArgs;

pub async fn run(args: &GenerateArgs) -> Result<()> {
    // Load optional entseed.toml config
    let config = config::read_config(Path::new("."))?;
    let settings = Settings::resolve(args, config.as_ref());

    // Phase 1: Parse schema and build the dependency graph
    let pb = spinner("1/4", "Reading schema...");
    let entities = read_schema(&args.schema)
        .with_context(|| format!("Failed to load schema from {}", args.schema.display()))?;
    let schema = ParsedSchema::build(entities, settings.restrict.as_deref())?;
    pb.finish_with_message(format!(
        "Reading schema... ✓ {} entities, {} dependencies, {} edges",
        schema.graph.entity_count(),
        schema.graph.edge_count(),
        schema.edges.len()
    ));

    // Phase 2: Generate rows
    let mut oracle = FakeOracle::new();
    let mut chance = Chance::seeded(settings.seed);
    let mut pool = RowPool::new();
    let mut generator = RowGenerator::new(&schema, &mut oracle, &mut chance);

    let pb2 = spinner("2/4", "Generating rows...");
    let edge_batch = match &args.edge_name {
        Some(edge_name) => {
            let db_url = settings.require_db()?;
            pb2.set_message(format!("Loading config for {}...", edge_name));
            let db = copy::connect(db_url).await?;
            let edge_config = copy::load_edge_config(&db, edge_name).await?;
            db.close().await;

            pb2.set_message(format!("Generating {} edges...", edge_name));
            let batch = generate_edges(&mut generator, edge_name, &edge_config, settings.rows, &mut pool)?;
            pb2.finish_with_message(format!(
                "Generating edges... ✓ {} rows into {}",
                batch.rows.len(),
                batch.table_name
            ));
            Some(batch)
        }
        None => {
            generator.generate_all(
                settings.rows,
                &mut pool,
                Some(&|entity, done, total| {
                    pb2.set_message(format!("Generating rows... {} ({}/{})", entity, done, total));
                }),
            )?;
            pb2.finish_with_message(format!("Generating rows... ✓ ({} rows)", pool.total()));
            None
        }
    };
    let summary = generator.into_summary();

    // Phase 3: Write CSV files
    let pb3 = spinner("3/4", "Writing CSV files...");
    let files = csv::write_all(&settings.output_dir, &schema, &pool, edge_batch.as_ref())?;
    pb3.finish_with_message(format!(
        "Writing CSV files... ✓ {} files in {}",
        files.len(),
        settings.output_dir.display()
    ));

    // Phase 4: Load into the database
    let pb4 = spinner("4/4", "Loading...");
    if args.dry_run {
        pb4.finish_with_message("Loading... skipped (--dry-run)");
    } else {
        load_or_cleanup(&settings, &files, &pb4).await?;
    }

    print!("{}", summary);
    println!();
    println!("{}", counts_table(&files));

    cleanup(&settings)
}

async fn load(settings: &Settings, files: &[TableFile], pb: &ProgressBar) -> Result<()> {
    let db_url = settings.require_db()?;
    pb.set_message(format!("Loading into {}...", copy::sanitize_url(db_url)));
    let db = copy::connect(db_url).await?;
    let loaded = copy::load_files(&db, files).await;
    db.close().await;
    pb.finish_with_message(format!("Loading... ✓ {} rows", loaded?));
    Ok(())
}

/// Load the files; on failure remove them (unless kept) before reporting
/// the load error.
async fn load_or_cleanup(settings: &Settings, files: &[TableFile], pb: &ProgressBar) -> Result<()> {
    let loaded = load(settings, files, pb).await;
    if loaded.is_err() {
        pb.abandon_with_message("Loading... failed");
        if let Err(err) = cleanup(settings) {
            tracing::warn!("{:#}", err);
        }
    }
    loaded
}

/// Remove the CSV directory unless the files are to be kept.
fn cleanup(settings: &Settings) -> Result<()> {
    if settings.keep_files {
        eprintln!("CSV files kept in {}", settings.output_dir.display());
        return Ok(());
    }
    csv::remove_output(&settings.output_dir)
        .with_context(|| format!("Failed to remove {}", settings.output_dir.display()))
}

/// Run settings after merging CLI flags over entseed.toml over defaults.
#[derive(Debug)]
struct Settings {
    db_url: Option<String>,
    rows: usize,
    seed: u64,
    restrict: Option<Vec<String>>,
    output_dir: PathBuf,
    keep_files: bool,
}

impl Settings {
    fn resolve(args: &GenerateArgs, config: Option<&EntseedConfig>) -> Self {
        let generate = config.map(|c| &c.generate);

        let seed = args
            .seed
            .or_else(|| generate.and_then(|g| g.seed))
            .unwrap_or_else(time_seed);
        let output_dir = args
            .output_dir
            .clone()
            .or_else(|| config.and_then(|c| c.output_dir()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        Self {
            db_url: args
                .db
                .clone()
                .or_else(|| config.and_then(|c| c.database.url.clone())),
            rows: args
                .rows
                .or_else(|| generate.and_then(|g| g.rows))
                .unwrap_or(DEFAULT_ROWS),
            seed,
            restrict: args
                .restrict_list()
                .or_else(|| generate.and_then(|g| g.restrict.clone())),
            output_dir,
            keep_files: args.keep_files || generate.and_then(|g| g.keep_files).unwrap_or(false),
        }
    }

    fn require_db(&self) -> Result<&str> {
        match self.db_url.as_deref() {
            Some(url) => Ok(url),
            None => bail!(
                "No database URL. Pass --db, set DATABASE_URL, or add [database] url to {}",
                config::CONFIG_FILE_NAME
            ),
        }
    }
}

fn time_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn spinner(prefix: &'static str, message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} [{prefix}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix(prefix);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn counts_table(files: &[TableFile]) -> ComfyTable {
    let mut table = ComfyTable::new();
    table.set_header(vec!["Table", "Rows"]);
    for file in files {
        table.add_row(vec![file.table_name.clone(), file.rows.to_string()]);
    }
    let total: usize = files.iter().map(|f| f.rows).sum();
    table.add_row(vec!["total".to_string(), total.to_string()]);
    table
}
