use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{EntseedError, Result};
use crate::generate::edges::EdgeBatch;
use crate::generate::pool::{Row, RowPool};
use crate::graph::ParsedSchema;

/// A CSV file written for one physical table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFile {
    pub table_name: String,
    pub columns: Vec<String>,
    pub path: PathBuf,
    pub rows: usize,
}

/// Write one table as CSV with a header line.
///
/// Cells follow `columns`, so every line has the same shape even when a row
/// lacks a column. NULL and missing values are empty cells.
pub fn write_table_csv<W: Write>(
    writer: &mut W,
    table_name: &str,
    columns: &[String],
    rows: &[Row],
) -> Result<()> {
    let header = columns
        .iter()
        .map(|c| csv_escape(c))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(writer, "{}", header).map_err(|e| EntseedError::Output {
        message: format!("writing CSV header for {}", table_name),
        source: e,
    })?;

    for row in rows {
        let values: Vec<String> = columns
            .iter()
            .map(|col| {
                row.get(col)
                    .map(|v| csv_escape(&v.to_csv_string()))
                    .unwrap_or_default()
            })
            .collect();

        writeln!(writer, "{}", values.join(",")).map_err(|e| EntseedError::Output {
            message: format!("writing CSV row for {}", table_name),
            source: e,
        })?;
    }

    Ok(())
}

/// Write a file per non-empty table into `dir`: entity tables in insertion
/// order, then the edge table when there is one.
pub fn write_all(
    dir: &Path,
    schema: &ParsedSchema,
    pool: &RowPool,
    edges: Option<&EdgeBatch>,
) -> Result<Vec<TableFile>> {
    std::fs::create_dir_all(dir).map_err(|e| EntseedError::Output {
        message: format!("creating output directory {}", dir.display()),
        source: e,
    })?;

    let mut files = Vec::new();
    for entity in &schema.order.entities {
        let rows = pool.rows(entity);
        if rows.is_empty() {
            continue;
        }
        let info = schema.info(entity)?;
        files.push(write_file(dir, &info.table_name, &info.columns, rows)?);
    }

    if let Some(batch) = edges {
        if !batch.rows.is_empty() {
            files.push(write_file(
                dir,
                &batch.table_name,
                &batch.columns(),
                &batch.to_rows(),
            )?);
        }
    }

    Ok(files)
}

/// Remove the directory the CSV files were written to.
pub fn remove_output(dir: &Path) -> Result<()> {
    std::fs::remove_dir_all(dir).map_err(|e| EntseedError::Output {
        message: format!("removing output directory {}", dir.display()),
        source: e,
    })
}

fn write_file(dir: &Path, table_name: &str, columns: &[String], rows: &[Row]) -> Result<TableFile> {
    let path = dir.join(format!("{}.csv", table_name));
    let file = File::create(&path).map_err(|e| EntseedError::Output {
        message: format!("creating {}", path.display()),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);
    write_table_csv(&mut writer, table_name, columns, rows)?;
    writer.flush().map_err(|e| EntseedError::Output {
        message: format!("flushing {}", path.display()),
        source: e,
    })?;

    debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(TableFile {
        table_name: table_name.to_string(),
        columns: columns.to_vec(),
        path,
        rows: rows.len(),
    })
}

/// Escape a string for CSV: quote if it contains comma, quote, or newline.
fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
