//! # Row Generator
//!
//! Produces rows for entities in dependency order. Every dependency of a row
//! is satisfied by an already pooled parent row or by a parent generated on
//! the spot, so no row ever points at nothing.
//!
//! Three policies decide how rows share parents:
//!
//! - no dependencies: `count` rows, each built from the value oracle alone
//! - a unique dependency: row `i` takes parent row `i`, one parent per row
//! - otherwise halving fan-out: batch `k` of [`fan_out_batches`] shares
//!   parent row `k`, so the first parents collect most of the children

use std::borrow::Cow;
use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{EntseedError, Result};
use crate::generate::chance::Chance;
use crate::generate::fanout::fan_out_batches;
use crate::generate::oracle::{ValueOracle, ValueRequest};
use crate::generate::pool::{Row, RowPool};
use crate::generate::value::Value;
use crate::graph::dag::{Dependency, DependencyTarget};
use crate::graph::ParsedSchema;
use crate::schema::naming::column_name;
use crate::summary::Summary;

/// Column values a set of rows has in common, plus the entity picked for
/// each polymorphic field.
#[derive(Debug, Default, Clone)]
pub struct Commonality {
    pub values: Row,
    /// Field name → entity chosen for it.
    pub types: IndexMap<String, String>,
}

impl Commonality {
    /// Rendering used in summary lines: `{ user_id: '...' }`.
    pub fn describe(&self) -> String {
        if self.values.is_empty() {
            return "{}".to_string();
        }
        let parts: Vec<String> = self
            .values
            .iter()
            .map(|(column, value)| format!("{}: {}", column, value))
            .collect();
        format!("{{ {} }}", parts.join(", "))
    }

    /// Entities picked for polymorphic fields, comma separated.
    pub fn polymorphic_types(&self) -> Option<String> {
        if self.types.is_empty() {
            None
        } else {
            Some(self.types.values().cloned().collect::<Vec<_>>().join(", "))
        }
    }
}

/// Progress hook: entity, rows generated so far, rows planned.
pub type ProgressCallback<'p> = &'p dyn Fn(&str, usize, usize);

/// Dependency-aware row generator over one parsed schema.
pub struct RowGenerator<'a> {
    schema: &'a ParsedSchema,
    oracle: &'a mut dyn ValueOracle,
    chance: &'a mut Chance,
    summary: Summary,
    /// Entities with a generation call on the stack.
    in_flight: Vec<String>,
    /// Next parent slot per `(entity, column)` unique dependency. Shared by
    /// every call for that entity, on-demand ones included, so no parent is
    /// handed out twice.
    unique_slots: HashMap<(String, String), usize>,
}

impl<'a> RowGenerator<'a> {
    pub fn new(
        schema: &'a ParsedSchema,
        oracle: &'a mut dyn ValueOracle,
        chance: &'a mut Chance,
    ) -> Self {
        Self {
            schema,
            oracle,
            chance,
            summary: Summary::new(),
            in_flight: Vec::new(),
            unique_slots: HashMap::new(),
        }
    }

    pub fn schema(&self) -> &'a ParsedSchema {
        self.schema
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub(crate) fn summary_mut(&mut self) -> &mut Summary {
        &mut self.summary
    }

    pub fn into_summary(self) -> Summary {
        self.summary
    }

    /// Row mode: generate `count` rows for every entity flagged for
    /// generation, in insertion order, into `pool`.
    pub fn generate_all(
        &mut self,
        count: usize,
        pool: &mut RowPool,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<()> {
        let schema = self.schema;
        let planned: Vec<&str> = schema
            .order
            .entities
            .iter()
            .filter(|e| schema.infos.get(e.as_str()).is_some_and(|i| i.generate))
            .map(|e| e.as_str())
            .collect();

        for (done, entity) in planned.iter().enumerate() {
            self.generate(entity, count, pool)?;
            if let Some(cb) = progress {
                cb(entity, done + 1, planned.len());
            }
        }
        Ok(())
    }

    /// Generate at least `count` rows of `entity`, record a summary line for
    /// each batch, and fold the rows into `pool`. Returns the new rows.
    pub fn generate(&mut self, entity: &str, count: usize, pool: &mut RowPool) -> Result<Vec<Row>> {
        self.generate_with(entity, count, pool, true)
    }

    pub(crate) fn generate_with(
        &mut self,
        entity: &str,
        count: usize,
        pool: &mut RowPool,
        report: bool,
    ) -> Result<Vec<Row>> {
        let schema = self.schema;
        let descriptor = schema.entity(entity)?;
        if descriptor.has_fixed_rows() {
            debug!("{} has fixed rows; nothing to generate", entity);
            return Ok(Vec::new());
        }

        self.in_flight.push(entity.to_string());
        let result = self.generate_rows(entity, count, pool, report);
        self.in_flight.pop();

        let rows = result?;
        pool.merge(entity, rows.clone());
        Ok(rows)
    }

    fn generate_rows(
        &mut self,
        entity: &str,
        count: usize,
        pool: &mut RowPool,
        report: bool,
    ) -> Result<Vec<Row>> {
        let schema = self.schema;
        let table = &schema.info(entity)?.table_name;
        let deps = schema.dependencies(entity);

        if deps.is_empty() {
            let common = Commonality::default();
            let rows = (0..count)
                .map(|_| self.build_row(entity, &common))
                .collect::<Result<Vec<_>>>()?;
            if report {
                self.summary
                    .push(format!("{} rows created in table {}", count, table));
            }
            debug!("{}: {} rows without dependencies", entity, count);
            return Ok(rows);
        }

        if deps.iter().any(|d| d.unique) {
            let mut rows = Vec::with_capacity(count);
            for index in 0..count {
                let common = self.resolve_dependencies(entity, deps, index, pool)?;
                rows.push(self.build_row(entity, &common)?);
            }
            if report {
                self.summary
                    .push(format!("{} rows created in table {}", count, table));
            }
            debug!("{}: {} rows, one parent each", entity, count);
            return Ok(rows);
        }

        let mut rows = Vec::new();
        for (index, batch) in fan_out_batches(count).into_iter().enumerate() {
            let common = self.resolve_dependencies(entity, deps, index, pool)?;
            for _ in 0..batch {
                rows.push(self.build_row(entity, &common)?);
            }
            if report {
                let mut line = format!(
                    "{} rows created in table {} with commonality: {}",
                    batch,
                    table,
                    common.describe()
                );
                if let Some(types) = common.polymorphic_types() {
                    line.push_str(&format!(" of polymorphic type {}", types));
                }
                self.summary.push(line);
            }
        }
        debug!("{}: {} rows in fan-out batches", entity, rows.len());
        Ok(rows)
    }

    /// Resolve every dependency of `entity` against parent row `index`.
    /// Unique dependencies take the next unclaimed slot instead.
    fn resolve_dependencies(
        &mut self,
        entity: &str,
        deps: &[Dependency],
        index: usize,
        pool: &mut RowPool,
    ) -> Result<Commonality> {
        let schema = self.schema;
        let mut common = Commonality::default();
        for dep in deps {
            let index = if dep.unique {
                self.claim_unique_slot(entity, &dep.column)
            } else {
                index
            };
            let target = match &dep.target {
                DependencyTarget::Entity(name) => {
                    if self.blocked(name, index, pool) {
                        None
                    } else {
                        Some(name.clone())
                    }
                }
                DependencyTarget::OneOf(names) => {
                    let names: Vec<&str> = names.iter().map(|n| n.as_str()).collect();
                    self.pick_target(&names, index, pool)
                }
                DependencyTarget::Any => {
                    let names = schema.identity_entities();
                    self.pick_target(&names, index, pool)
                }
            };

            let Some(target) = target else {
                if dep.nullable {
                    debug!(
                        "{}.{}: no parent available at index {}; leaving NULL",
                        entity, dep.column, index
                    );
                    common.values.insert(dep.column.clone(), Value::Null);
                    continue;
                }
                return Err(EntseedError::SelfReference {
                    entity: entity.to_string(),
                    column: dep.column.clone(),
                });
            };

            let value = self.parent_value(&target, index, &dep.inverse_column, entity, pool)?;
            common.values.insert(dep.column.clone(), value);
            if !matches!(dep.target, DependencyTarget::Entity(_)) {
                common.types.insert(dep.field.clone(), target);
            }
        }
        Ok(common)
    }

    fn claim_unique_slot(&mut self, entity: &str, column: &str) -> usize {
        let next = self
            .unique_slots
            .entry((entity.to_string(), column.to_string()))
            .or_default();
        let slot = *next;
        *next += 1;
        slot
    }

    /// True when `target` cannot provide a row at `index` without recursing
    /// into a generation call that is already running.
    fn blocked(&self, target: &str, index: usize, pool: &RowPool) -> bool {
        let fixed = self
            .schema
            .entities
            .get(target)
            .is_some_and(|e| e.has_fixed_rows());
        !fixed && pool.get(target, index).is_none() && self.in_flight.iter().any(|e| e == target)
    }

    fn pick_target(&mut self, names: &[&str], index: usize, pool: &RowPool) -> Option<String> {
        let open: Vec<&str> = names
            .iter()
            .copied()
            .filter(|n| !self.blocked(n, index, pool))
            .collect();
        self.chance.pick(&open).map(|n| n.to_string())
    }

    /// Value of `column` in parent row `index` of `target`: a pooled row,
    /// a fixed row, or a row generated right now.
    fn parent_value(
        &mut self,
        target: &str,
        index: usize,
        column: &str,
        needed_by: &str,
        pool: &mut RowPool,
    ) -> Result<Value> {
        let schema = self.schema;
        let descriptor = schema.entity(target)?;
        let table = || schema.info(target).map(|i| i.table_name.clone());

        if let Some(fixed) = &descriptor.db_rows {
            if fixed.is_empty() {
                return Err(EntseedError::MissingFixedRows {
                    entity: target.to_string(),
                    needed_by: needed_by.to_string(),
                });
            }
            let row_index = index % fixed.len();
            return fixed[row_index]
                .iter()
                .find(|(key, _)| column_name(key) == column)
                .map(|(_, value)| Value::from_json(value))
                .ok_or_else(|| EntseedError::MissingColumn {
                    entity: needed_by.to_string(),
                    table: table().unwrap_or_else(|_| target.to_string()),
                    column: column.to_string(),
                    row_index,
                });
        }

        let (row, row_index) = match pool.get(target, index) {
            Some(row) => (row.clone(), index),
            None => {
                debug!(
                    "{} needs {} row {}; generating one on demand",
                    needed_by, target, index
                );
                let mut fresh = self.generate_with(target, 1, pool, false)?;
                if fresh.is_empty() {
                    return Err(EntseedError::MissingRow {
                        entity: target.to_string(),
                        row_index: index,
                        needed_by: needed_by.to_string(),
                    });
                }
                (fresh.swap_remove(0), 0)
            }
        };

        row.get(column)
            .cloned()
            .ok_or_else(|| EntseedError::MissingColumn {
                entity: needed_by.to_string(),
                table: table().unwrap_or_else(|_| target.to_string()),
                column: column.to_string(),
                row_index,
            })
    }

    /// Assemble one row: resolved dependency values first, the oracle for
    /// every other field, and the picked entity in derived type columns.
    fn build_row(&mut self, entity: &str, common: &Commonality) -> Result<Row> {
        let schema = self.schema;
        let descriptor = schema.entity(entity)?;
        let mut row = Row::with_capacity(schema.info(entity)?.columns.len());

        for field in &descriptor.fields {
            let column = field.column();
            let value = match common.values.get(&column) {
                Some(value) => value.clone(),
                None => {
                    let request = ValueRequest {
                        entity,
                        field,
                        column: &column,
                        lookup: Some(&schema.entities),
                    };
                    self.oracle.value(&request, &mut *self.chance)?
                }
            };
            row.insert(column, value);

            for derived in &field.derived_fields {
                let value = common
                    .types
                    .get(&field.name)
                    .map(|t| Value::String(Cow::Owned(t.clone())))
                    .unwrap_or(Value::Null);
                row.insert(derived.column(), value);
            }
        }
        Ok(row)
    }
}
