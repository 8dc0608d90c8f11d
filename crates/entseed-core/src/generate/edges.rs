//! # Edge Row Generator
//!
//! Edge mode fills one association edge table. A pool of `id2` rows is
//! created up front; each fan-out batch then gets one fresh `id1` row that
//! points at the first `batch` rows of that pool. Symmetric edges also get
//! the mirrored row, and edges with an inverse get the mirrored row under
//! the inverse edge type.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{EntseedError, Result};
use crate::generate::engine::RowGenerator;
use crate::generate::fanout::fan_out_batches;
use crate::generate::pool::{Row, RowPool};
use crate::generate::value::Value;
use crate::graph::edges::EdgeInfo;
use crate::graph::ParsedSchema;

/// Columns of every association edge table, in storage order.
pub const EDGE_COLUMNS: [&str; 7] = ["id1", "id1_type", "edge_type", "id2", "id2_type", "time", "data"];

/// One row of the `assoc_edge_config` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssocEdgeConfig {
    pub edge_name: String,
    pub edge_type: Uuid,
    pub edge_table: String,
    pub symmetric_edge: bool,
    pub inverse_edge_type: Option<Uuid>,
}

/// Check the stored configuration against the edge as the schema declares it.
pub fn validate_edge_config(edge: &EdgeInfo, config: &AssocEdgeConfig) -> Result<()> {
    let mismatch = |message: String| EntseedError::EdgeConfigMismatch {
        edge: edge.edge_name.clone(),
        message,
    };

    if config.edge_name != edge.edge_name {
        return Err(mismatch(format!(
            "configuration is for edge '{}'",
            config.edge_name
        )));
    }
    if config.symmetric_edge != edge.symmetric {
        return Err(mismatch(format!(
            "stored symmetric_edge is {} but the schema says {}",
            config.symmetric_edge, edge.symmetric
        )));
    }
    match (&config.inverse_edge_type, &edge.inverse_edge) {
        (Some(_), None) => {
            return Err(mismatch(
                "an inverse edge type is stored but the schema declares no inverse edge"
                    .to_string(),
            ))
        }
        (None, Some(inverse)) => {
            return Err(mismatch(format!(
                "the schema declares inverse edge {} but no inverse edge type is stored",
                inverse
            )))
        }
        _ => {}
    }
    Ok(())
}

/// One association edge between two rows.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRow {
    pub id1: Value,
    pub id1_type: String,
    pub edge_type: Uuid,
    pub id2: Value,
    pub id2_type: String,
    pub time: DateTime<Utc>,
    pub data: Option<String>,
}

impl EdgeRow {
    /// The row in [`EDGE_COLUMNS`] order.
    pub fn to_row(&self) -> Row {
        let mut row = Row::with_capacity(EDGE_COLUMNS.len());
        row.insert("id1".into(), self.id1.clone());
        row.insert("id1_type".into(), Value::String(Cow::Owned(self.id1_type.clone())));
        row.insert("edge_type".into(), Value::Uuid(self.edge_type));
        row.insert("id2".into(), self.id2.clone());
        row.insert("id2_type".into(), Value::String(Cow::Owned(self.id2_type.clone())));
        row.insert("time".into(), Value::TimestampTz(self.time));
        row.insert(
            "data".into(),
            self.data
                .clone()
                .map(|d| Value::String(Cow::Owned(d)))
                .unwrap_or(Value::Null),
        );
        row
    }

    fn mirrored(&self, edge_type: Uuid) -> Self {
        Self {
            id1: self.id2.clone(),
            id1_type: self.id2_type.clone(),
            edge_type,
            id2: self.id1.clone(),
            id2_type: self.id1_type.clone(),
            time: self.time,
            data: self.data.clone(),
        }
    }
}

/// All edge rows of one run, bound for a single edge table.
#[derive(Debug, Clone)]
pub struct EdgeBatch {
    pub table_name: String,
    pub rows: Vec<EdgeRow>,
}

impl EdgeBatch {
    pub fn columns(&self) -> Vec<String> {
        EDGE_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    pub fn to_rows(&self) -> Vec<Row> {
        self.rows.iter().map(EdgeRow::to_row).collect()
    }
}

/// Generate at least `total` edges of `edge_name`.
///
/// Node rows created along the way land in `pool`. Every edge row carries
/// the same timestamp, taken once at the start.
pub fn generate_edges(
    generator: &mut RowGenerator<'_>,
    edge_name: &str,
    config: &AssocEdgeConfig,
    total: usize,
    pool: &mut RowPool,
) -> Result<EdgeBatch> {
    let schema = generator.schema();
    let edge = schema
        .edges
        .get(edge_name)
        .ok_or_else(|| EntseedError::UnknownEdge {
            edge: edge_name.to_string(),
        })?;
    validate_edge_config(edge, config)?;

    for node in [&edge.id1_type, &edge.id2_type] {
        if schema.entity(node)?.has_fixed_rows() {
            return Err(EntseedError::Config {
                message: format!(
                    "edge '{}' connects {}, which has fixed rows; edge endpoints must be generated",
                    edge_name, node
                ),
            });
        }
    }

    let id1_type = edge.id1_type.clone();
    let id2_type = edge.id2_type.clone();
    let time = Utc::now();

    let targets = generator.generate_with(&edge.id2_type, total.div_ceil(2), pool, false)?;
    debug!(
        "{}: {} {} rows to point edges at",
        edge_name,
        targets.len(),
        edge.id2_type
    );

    let mut sources = RowPool::new();
    let mut rows = Vec::new();
    for (index, batch) in fan_out_batches(total).into_iter().enumerate() {
        let source = generator
            .generate_with(&edge.id1_type, 1, &mut sources, false)?
            .into_iter()
            .next()
            .ok_or_else(|| EntseedError::MissingRow {
                entity: edge.id1_type.clone(),
                row_index: index,
                needed_by: edge_name.to_string(),
            })?;
        let id1 = id_of(&source, &edge.id1_type, index, edge_name, schema)?;

        for (position, target) in targets.iter().take(batch).enumerate() {
            let id2 = id_of(target, &edge.id2_type, position, edge_name, schema)?;
            let row = EdgeRow {
                id1: id1.clone(),
                id1_type: id1_type.clone(),
                edge_type: config.edge_type,
                id2,
                id2_type: id2_type.clone(),
                time,
                data: None,
            };
            let symmetric = config.symmetric_edge.then(|| row.mirrored(config.edge_type));
            let inverse = config.inverse_edge_type.map(|t| row.mirrored(t));
            rows.push(row);
            rows.extend(symmetric);
            rows.extend(inverse);
        }
        if targets.len() < batch {
            return Err(EntseedError::MissingRow {
                entity: edge.id2_type.clone(),
                row_index: targets.len(),
                needed_by: edge_name.to_string(),
            });
        }

        let mut line = batch.to_string();
        if config.symmetric_edge {
            line.push_str(" symmetric");
        }
        if config.inverse_edge_type.is_some() {
            line.push_str(" inverse");
        }
        line.push_str(&format!(
            " edges created from id1 {} with edge_type: {}",
            id1.to_csv_string(),
            config.edge_type
        ));
        generator.summary_mut().push(line);
    }

    pool.absorb(sources);
    info!(
        "Generated {} rows for edge {} into {}",
        rows.len(),
        edge_name,
        config.edge_table
    );

    Ok(EdgeBatch {
        table_name: config.edge_table.clone(),
        rows,
    })
}

fn id_of(
    row: &Row,
    entity: &str,
    row_index: usize,
    edge_name: &str,
    schema: &ParsedSchema,
) -> Result<Value> {
    row.get("id").cloned().ok_or_else(|| EntseedError::MissingColumn {
        entity: edge_name.to_string(),
        table: schema
            .info(entity)
            .map(|i| i.table_name.clone())
            .unwrap_or_else(|_| entity.to_string()),
        column: "id".to_string(),
        row_index,
    })
}
