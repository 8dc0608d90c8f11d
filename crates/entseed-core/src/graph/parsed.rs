use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{EntseedError, Result};
use crate::graph::dag::{Dependency, DependencyGraph, DependencyTarget};
use crate::graph::edges::{build_catalogue, EdgeCatalogue};
use crate::graph::topo::{topological_sort, InsertionOrder};
use crate::schema::naming::{derived_type_name, table_name};
use crate::schema::types::{Entities, EntityDescriptor};

/// Per-entity facts derived from its descriptor.
#[derive(Debug, Clone)]
pub struct EntityInfo {
    pub name: String,
    pub table_name: String,
    /// Every storage column, derived columns included, in field order.
    pub columns: Vec<String>,
    /// Whether rows for this entity are generated in row mode. Entities
    /// outside the allow-list or with fixed rows are only ever read or
    /// pulled in as dependencies.
    pub generate: bool,
}

impl EntityInfo {
    /// True when the entity exposes an `id` column that can be referenced.
    pub fn has_identity(&self) -> bool {
        self.columns.iter().any(|c| c == "id")
    }
}

/// The schema after graph building: the single input of both generators.
pub struct ParsedSchema {
    pub entities: Entities,
    pub infos: IndexMap<String, EntityInfo>,
    pub graph: DependencyGraph,
    pub deps: HashMap<String, Vec<Dependency>>,
    pub edges: EdgeCatalogue,
    pub order: InsertionOrder,
}

impl ParsedSchema {
    /// Build the graph, dependency lists, edge catalogue and insertion order.
    ///
    /// `restrict` is the optional allow-list of entities that actively
    /// generate rows. Every configuration problem (unknown references,
    /// cycles, bad derived fields, wildcard references with nothing to point
    /// at) is reported here, before any row is generated.
    pub fn build(entities: Entities, restrict: Option<&[String]>) -> Result<Self> {
        if let Some(allowed) = restrict {
            for name in allowed {
                if !entities.contains_key(name) {
                    warn!("Restricted entity '{}' is not in the schema; ignoring", name);
                }
            }
        }

        let mut infos = IndexMap::with_capacity(entities.len());
        for (name, entity) in &entities {
            validate_derived_fields(entity)?;

            let mut columns = Vec::new();
            for field in &entity.fields {
                columns.push(field.column());
                columns.extend(field.derived_fields.iter().map(|d| d.column()));
            }

            let allowed = restrict.is_none_or(|list| list.iter().any(|r| r == name));
            infos.insert(
                name.clone(),
                EntityInfo {
                    name: name.clone(),
                    table_name: table_name(name),
                    columns,
                    generate: allowed && !entity.has_fixed_rows(),
                },
            );
        }

        let (graph, deps) = DependencyGraph::from_entities(&entities)?;

        let has_identity_entity = infos.values().any(|i| i.has_identity());
        for (entity, list) in &deps {
            for dep in list {
                if dep.target == DependencyTarget::Any && !has_identity_entity {
                    return Err(EntseedError::NoIdentityEntity {
                        entity: entity.clone(),
                        column: dep.column.clone(),
                    });
                }
            }
        }

        let order = topological_sort(&graph)?;
        let edges = build_catalogue(&entities)?;

        debug!(
            "Parsed schema: {} entities, {} dependency edges, {} association edges",
            graph.entity_count(),
            graph.edge_count(),
            edges.len()
        );

        Ok(Self {
            entities,
            infos,
            graph,
            deps,
            edges,
            order,
        })
    }

    pub fn info(&self, entity: &str) -> Result<&EntityInfo> {
        self.infos.get(entity).ok_or_else(|| EntseedError::MissingEntity {
            entity: entity.to_string(),
        })
    }

    pub fn entity(&self, entity: &str) -> Result<&EntityDescriptor> {
        self.entities
            .get(entity)
            .ok_or_else(|| EntseedError::MissingEntity {
                entity: entity.to_string(),
            })
    }

    pub fn dependencies(&self, entity: &str) -> &[Dependency] {
        self.deps.get(entity).map(|d| d.as_slice()).unwrap_or(&[])
    }

    /// Entities a wildcard polymorphic reference may point at, in schema order.
    pub fn identity_entities(&self) -> Vec<&str> {
        self.infos
            .values()
            .filter(|i| i.has_identity())
            .map(|i| i.name.as_str())
            .collect()
    }
}

/// A derived field is only understood as the `<base>_type` / `<base>Type`
/// companion of a `<base>_id` / `<base>ID` field.
fn validate_derived_fields(entity: &EntityDescriptor) -> Result<()> {
    for field in &entity.fields {
        if field.derived_fields.is_empty() {
            continue;
        }
        let expected = derived_type_name(&field.name);
        for derived in &field.derived_fields {
            if expected.as_deref() != Some(derived.name.as_str()) {
                return Err(EntseedError::DerivedField {
                    entity: entity.name.clone(),
                    field: field.name.clone(),
                    derived: derived.name.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::*;

    fn entities(list: Vec<EntityDescriptor>) -> Entities {
        list.into_iter().map(|e| (e.name.clone(), e)).collect()
    }

    fn address(derived: &str) -> EntityDescriptor {
        EntityDescriptor::new("Address")
            .with_field(FieldDescriptor::new("ID", DbType::Uuid))
            .with_field(
                FieldDescriptor::new("OwnerID", DbType::Uuid)
                    .polymorphic(PolymorphicRef::any())
                    .derived(FieldDescriptor::new(derived, DbType::String)),
            )
    }

    #[test]
    fn test_columns_include_derived_fields() {
        let parsed = ParsedSchema::build(entities(vec![address("OwnerType")]), None).unwrap();
        let info = parsed.info("Address").unwrap();
        assert_eq!(info.columns, vec!["id", "owner_id", "owner_type"]);
        assert_eq!(info.table_name, "addresses");
        assert!(info.generate);
    }

    #[test]
    fn test_bad_derived_field_name_is_error() {
        let err = ParsedSchema::build(entities(vec![address("OwnerKind")]), None)
            .err()
            .unwrap();
        assert!(matches!(err, EntseedError::DerivedField { .. }));
    }

    #[test]
    fn test_wildcard_without_identity_entity_is_error() {
        let schema = entities(vec![EntityDescriptor::new("Tag").with_field(
            FieldDescriptor::new("targetID", DbType::Uuid).polymorphic(PolymorphicRef::any()),
        )]);
        let err = ParsedSchema::build(schema, None).err().unwrap();
        assert!(matches!(err, EntseedError::NoIdentityEntity { .. }));
    }

    #[test]
    fn test_restrict_and_fixed_rows_disable_generation() {
        let mut row = serde_json::Map::new();
        row.insert("outcome".into(), serde_json::json!("FAILED"));
        let schema = entities(vec![
            EntityDescriptor::new("User").with_field(FieldDescriptor::new("ID", DbType::Uuid)),
            EntityDescriptor::new("Contact").with_field(FieldDescriptor::new("ID", DbType::Uuid)),
            EntityDescriptor::new("RequestOutcome")
                .with_field(FieldDescriptor::new("outcome", DbType::String))
                .with_db_rows(vec![row]),
        ]);
        let restrict = vec!["Contact".to_string(), "RequestOutcome".to_string()];
        let parsed = ParsedSchema::build(schema, Some(&restrict)).unwrap();

        assert!(!parsed.info("User").unwrap().generate);
        assert!(parsed.info("Contact").unwrap().generate);
        assert!(!parsed.info("RequestOutcome").unwrap().generate);
        assert_eq!(parsed.identity_entities(), vec!["User", "Contact"]);
    }
}
