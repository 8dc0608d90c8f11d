use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use tracing::warn;

use crate::error::{EntseedError, Result};
use crate::schema::naming::pascal_case;
use crate::schema::types::{DbType, Entities, PolymorphicMode};

/// A directed graph of entity dependencies.
/// Edges point from the referenced entity to the dependent one (parent → child),
/// so a topological walk visits parents first.
pub struct DependencyGraph {
    pub graph: DiGraph<String, DependencyEdgeInfo>,
    pub node_indices: HashMap<String, NodeIndex>,
    /// References from an entity to itself. Kept out of `graph` so the
    /// graph stays acyclic; the row generator resolves them against rows
    /// that already exist.
    pub self_references: Vec<SelfReference>,
}

/// Information about a graph edge (a foreign key or polymorphic reference).
#[derive(Debug, Clone)]
pub struct DependencyEdgeInfo {
    /// Column on the dependent entity.
    pub column: String,
    /// Whether the edge comes from a fixed-type-set polymorphic field.
    pub polymorphic: bool,
}

/// An entity that references itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfReference {
    pub entity: String,
    pub column: String,
}

/// What a dependency points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyTarget {
    /// Plain foreign key.
    Entity(String),
    /// Polymorphic field restricted to a set of entities.
    OneOf(Vec<String>),
    /// Wildcard polymorphic field: any entity with an id column.
    Any,
}

/// One resolvable dependency of an entity: a column whose value must be
/// copied from a row of the target entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub target: DependencyTarget,
    /// Field name on the owning entity (used for derived fields).
    pub field: String,
    /// Column on the owning entity.
    pub column: String,
    /// Column read from the target row.
    pub inverse_column: String,
    pub unique: bool,
    pub nullable: bool,
}

impl DependencyGraph {
    /// Build the dependency graph and per-entity dependency lists.
    ///
    /// Every UUID foreign key becomes a [`Dependency`]; every foreign key of
    /// any type becomes a graph edge. Polymorphic fields with a type list add
    /// one edge per listed type; wildcard polymorphic fields add no edges and
    /// are resolved at generation time.
    pub fn from_entities(
        entities: &Entities,
    ) -> Result<(Self, HashMap<String, Vec<Dependency>>)> {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();
        let mut self_references = Vec::new();
        let mut deps: HashMap<String, Vec<Dependency>> = HashMap::new();

        for name in entities.keys() {
            let idx = graph.add_node(name.clone());
            node_indices.insert(name.clone(), idx);
        }

        for (name, entity) in entities {
            for field in &entity.fields {
                let column = field.column();

                if let Some(fk) = &field.foreign_key {
                    let target_idx = node_indices.get(&fk.schema).copied().ok_or_else(|| {
                        EntseedError::UnknownEntity {
                            owner: name.clone(),
                            field: field.name.clone(),
                            target: fk.schema.clone(),
                        }
                    })?;
                    if &fk.schema == name {
                        warn!(
                            "{}.{} references its own entity; left out of the dependency graph",
                            name, column
                        );
                        self_references.push(SelfReference {
                            entity: name.clone(),
                            column: column.clone(),
                        });
                    } else {
                        graph.add_edge(
                            target_idx,
                            node_indices[name],
                            DependencyEdgeInfo {
                                column: column.clone(),
                                polymorphic: false,
                            },
                        );
                    }

                    if field.field_type.db_type == DbType::Uuid {
                        deps.entry(name.clone()).or_default().push(Dependency {
                            target: DependencyTarget::Entity(fk.schema.clone()),
                            field: field.name.clone(),
                            column: column.clone(),
                            inverse_column: crate::schema::naming::column_name(&fk.column),
                            unique: field.unique,
                            nullable: field.nullable,
                        });
                    }
                }

                let mode = field.polymorphic.as_ref().and_then(|p| p.mode());
                let target = match mode {
                    None => continue,
                    Some(PolymorphicMode::Any) => DependencyTarget::Any,
                    Some(PolymorphicMode::OneOf(types)) => {
                        let mut schemas = Vec::with_capacity(types.len());
                        for typ in &types {
                            let schema = pascal_case(typ);
                            let target_idx =
                                node_indices.get(&schema).copied().ok_or_else(|| {
                                    EntseedError::UnknownEntity {
                                        owner: name.clone(),
                                        field: field.name.clone(),
                                        target: schema.clone(),
                                    }
                                })?;
                            if &schema == name {
                                self_references.push(SelfReference {
                                    entity: name.clone(),
                                    column: column.clone(),
                                });
                            } else {
                                graph.add_edge(
                                    target_idx,
                                    node_indices[name],
                                    DependencyEdgeInfo {
                                        column: column.clone(),
                                        polymorphic: true,
                                    },
                                );
                            }
                            schemas.push(schema);
                        }
                        DependencyTarget::OneOf(schemas)
                    }
                };

                deps.entry(name.clone()).or_default().push(Dependency {
                    target,
                    field: field.name.clone(),
                    column,
                    inverse_column: "id".to_string(),
                    unique: field.unique,
                    nullable: field.nullable,
                });
            }
        }

        Ok((
            Self {
                graph,
                node_indices,
                self_references,
            },
            deps,
        ))
    }

    /// Get the entity name for a node index.
    pub fn entity_name(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    /// Get node index for an entity name.
    pub fn node_index(&self, entity: &str) -> Option<NodeIndex> {
        self.node_indices.get(entity).copied()
    }

    /// Get the number of entities.
    pub fn entity_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of dependency edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::*;

    fn id() -> FieldDescriptor {
        FieldDescriptor::new("ID", DbType::Uuid)
    }

    fn entities(list: Vec<EntityDescriptor>) -> Entities {
        list.into_iter().map(|e| (e.name.clone(), e)).collect()
    }

    #[test]
    fn test_foreign_key_builds_edge_and_dependency() {
        let schema = entities(vec![
            EntityDescriptor::new("User").with_field(id()),
            EntityDescriptor::new("Contact")
                .with_field(id())
                .with_field(FieldDescriptor::new("userID", DbType::Uuid).references("User", "ID")),
        ]);
        let (graph, deps) = DependencyGraph::from_entities(&schema).unwrap();

        assert_eq!(graph.entity_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        let contact = &deps["Contact"];
        assert_eq!(contact.len(), 1);
        assert_eq!(contact[0].target, DependencyTarget::Entity("User".into()));
        assert_eq!(contact[0].column, "user_id");
        assert_eq!(contact[0].inverse_column, "id");
        assert!(!contact[0].unique);
        assert!(!deps.contains_key("User"));

        let weight: &DependencyEdgeInfo = graph.graph.edge_weights().next().unwrap();
        assert_eq!(weight.column, "user_id");
        assert!(!weight.polymorphic);
    }

    #[test]
    fn test_non_uuid_foreign_key_is_edge_only() {
        let schema = entities(vec![
            EntityDescriptor::new("RequestOutcome")
                .with_field(FieldDescriptor::new("outcome", DbType::String)),
            EntityDescriptor::new("Request").with_field(id()).with_field(
                FieldDescriptor::new("outcome", DbType::Enum).references("RequestOutcome", "outcome"),
            ),
        ]);
        let (graph, deps) = DependencyGraph::from_entities(&schema).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert!(deps.is_empty());
    }

    #[test]
    fn test_polymorphic_type_set() {
        let schema = entities(vec![
            EntityDescriptor::new("User").with_field(id()),
            EntityDescriptor::new("Contact").with_field(id()),
            EntityDescriptor::new("Address").with_field(id()).with_field(
                FieldDescriptor::new("OwnerID", DbType::Uuid)
                    .polymorphic(PolymorphicRef::one_of(&["user", "contact"])),
            ),
        ]);
        let (graph, deps) = DependencyGraph::from_entities(&schema).unwrap();
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(
            deps["Address"][0].target,
            DependencyTarget::OneOf(vec!["User".into(), "Contact".into()])
        );
    }

    #[test]
    fn test_wildcard_polymorphic_adds_no_edges() {
        let schema = entities(vec![
            EntityDescriptor::new("User").with_field(id()),
            EntityDescriptor::new("Address").with_field(id()).with_field(
                FieldDescriptor::new("OwnerID", DbType::Uuid).polymorphic(PolymorphicRef::any()),
            ),
        ]);
        let (graph, deps) = DependencyGraph::from_entities(&schema).unwrap();
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(deps["Address"][0].target, DependencyTarget::Any);
        assert_eq!(deps["Address"][0].inverse_column, "id");
    }

    #[test]
    fn test_self_reference_is_recorded_not_added() {
        let schema = entities(vec![EntityDescriptor::new("User").with_field(id()).with_field(
            FieldDescriptor::new("invitedByID", DbType::Uuid)
                .references("User", "ID")
                .nullable(),
        )]);
        let (graph, deps) = DependencyGraph::from_entities(&schema).unwrap();
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(
            graph.self_references,
            vec![SelfReference {
                entity: "User".into(),
                column: "invited_by_id".into()
            }]
        );
        assert!(deps["User"][0].nullable);
    }

    #[test]
    fn test_unknown_target_is_error() {
        let schema = entities(vec![EntityDescriptor::new("Contact")
            .with_field(FieldDescriptor::new("userID", DbType::Uuid).references("User", "ID"))]);
        let err = DependencyGraph::from_entities(&schema).err().unwrap();
        assert!(matches!(err, EntseedError::UnknownEntity { ref target, .. } if target == "User"));
    }
}
