use indexmap::IndexMap;

use crate::error::{EntseedError, Result};
use crate::schema::naming::edge_name;
use crate::schema::types::{AssocEdgeDescriptor, Entities};

/// A directed association edge between two entity types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeInfo {
    pub edge_name: String,
    pub id1_type: String,
    pub id2_type: String,
    pub symmetric: bool,
    /// Name of the edge running the other way, if one is declared.
    pub inverse_edge: Option<String>,
}

/// Every association edge in the schema keyed by its public name.
/// Inverse edges are registered as edges of their own.
pub type EdgeCatalogue = IndexMap<String, EdgeInfo>;

/// Collect the association edges declared on every entity, directly or
/// inside edge groups.
pub fn build_catalogue(entities: &Entities) -> Result<EdgeCatalogue> {
    let mut catalogue = EdgeCatalogue::new();

    for (source, entity) in entities {
        let grouped = entity
            .assoc_edge_groups
            .iter()
            .flat_map(|group| group.assoc_edges.iter());
        for edge in entity.assoc_edges.iter().chain(grouped) {
            if !entities.contains_key(&edge.schema_name) {
                return Err(EntseedError::UnknownEntity {
                    owner: source.clone(),
                    field: edge.name.clone(),
                    target: edge.schema_name.clone(),
                });
            }
            register_edge(&mut catalogue, source, edge);
        }
    }

    Ok(catalogue)
}

fn register_edge(catalogue: &mut EdgeCatalogue, source: &str, edge: &AssocEdgeDescriptor) {
    let name = edge_name(source, &edge.name);

    let inverse_name = edge.inverse_edge.as_ref().map(|inverse| {
        // The inverse edge lives on the other end, so that end is its source.
        let inverse_name = edge_name(&edge.schema_name, &inverse.name);
        catalogue.insert(
            inverse_name.clone(),
            EdgeInfo {
                edge_name: inverse_name.clone(),
                id1_type: edge.schema_name.clone(),
                id2_type: source.to_string(),
                symmetric: false,
                inverse_edge: Some(name.clone()),
            },
        );
        inverse_name
    });

    catalogue.insert(
        name.clone(),
        EdgeInfo {
            edge_name: name,
            id1_type: source.to_string(),
            id2_type: edge.schema_name.clone(),
            symmetric: edge.symmetric,
            inverse_edge: inverse_name,
        },
    );
}
