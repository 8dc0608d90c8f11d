use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::naming;

/// Every entity in a schema, keyed by entity name, in document order.
pub type Entities = IndexMap<String, EntityDescriptor>;

/// One entity (ent) as emitted by the schema reader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDescriptor {
    /// Entity name. Filled in from the map key when the schema is loaded.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    /// Pre-seeded rows. Entities with fixed rows are never generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_rows: Option<Vec<serde_json::Map<String, serde_json::Value>>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assoc_edges: Vec<AssocEdgeDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assoc_edge_groups: Vec<AssocEdgeGroup>,
}

impl EntityDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_db_rows(mut self, rows: Vec<serde_json::Map<String, serde_json::Value>>) -> Self {
        self.db_rows = Some(rows);
        self
    }

    pub fn with_edge(mut self, edge: AssocEdgeDescriptor) -> Self {
        self.assoc_edges.push(edge);
        self
    }

    /// True when the entity ships with its own rows (enum tables and the like).
    pub fn has_fixed_rows(&self) -> bool {
        self.db_rows.is_some()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A single field of an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    /// Explicit storage column; defaults to the snake-cased name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polymorphic: Option<PolymorphicRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub derived_fields: Vec<FieldDescriptor>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, db_type: DbType) -> Self {
        Self {
            name: name.into(),
            storage_key: None,
            field_type: FieldType {
                db_type,
                values: None,
            },
            nullable: false,
            unique: false,
            foreign_key: None,
            polymorphic: None,
            derived_fields: Vec::new(),
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn references(mut self, schema: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKeyRef {
            schema: schema.into(),
            column: column.into(),
        });
        self
    }

    pub fn polymorphic(mut self, polymorphic: PolymorphicRef) -> Self {
        self.polymorphic = Some(polymorphic);
        self
    }

    pub fn enum_values(mut self, values: &[&str]) -> Self {
        self.field_type.values = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn derived(mut self, field: FieldDescriptor) -> Self {
        self.derived_fields.push(field);
        self
    }

    /// Storage column for this field.
    pub fn column(&self) -> String {
        match &self.storage_key {
            Some(key) => key.clone(),
            None => naming::column_name(&self.name),
        }
    }
}

/// Type information of a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldType {
    pub db_type: DbType,
    /// Allowed values for enum types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

/// Storage type tag of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbType {
    #[serde(rename = "UUID")]
    Uuid,
    String,
    Int,
    BigInt,
    Float,
    Boolean,
    Date,
    Time,
    Timetz,
    Timestamp,
    Timestamptz,
    Enum,
    StringEnum,
    #[serde(rename = "JSON")]
    Json,
    #[serde(rename = "JSONB")]
    Jsonb,
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DbType::Uuid => "UUID",
            DbType::String => "String",
            DbType::Int => "Int",
            DbType::BigInt => "BigInt",
            DbType::Float => "Float",
            DbType::Boolean => "Boolean",
            DbType::Date => "Date",
            DbType::Time => "Time",
            DbType::Timetz => "Timetz",
            DbType::Timestamp => "Timestamp",
            DbType::Timestamptz => "Timestamptz",
            DbType::Enum => "Enum",
            DbType::StringEnum => "StringEnum",
            DbType::Json => "JSON",
            DbType::Jsonb => "JSONB",
        };
        f.write_str(name)
    }
}

/// A foreign key: `schema` is the target entity, `column` its field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub schema: String,
    pub column: String,
}

/// Polymorphic reference as emitted by the schema reader.
///
/// `true` and `{}` both mean "any entity"; `{ "types": [...] }` restricts the
/// target to the listed node types; `false` means not polymorphic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolymorphicRef {
    Flag(bool),
    Types {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        types: Option<Vec<String>>,
    },
}

/// Resolved meaning of a [`PolymorphicRef`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolymorphicMode {
    /// Any entity that has an identity column.
    Any,
    /// One of the listed node types.
    OneOf(Vec<String>),
}

impl PolymorphicRef {
    pub fn any() -> Self {
        PolymorphicRef::Flag(true)
    }

    pub fn one_of(types: &[&str]) -> Self {
        PolymorphicRef::Types {
            types: Some(types.iter().map(|t| t.to_string()).collect()),
        }
    }

    pub fn mode(&self) -> Option<PolymorphicMode> {
        match self {
            PolymorphicRef::Flag(false) => None,
            PolymorphicRef::Flag(true) => Some(PolymorphicMode::Any),
            PolymorphicRef::Types { types: Some(types) } if !types.is_empty() => {
                Some(PolymorphicMode::OneOf(types.clone()))
            }
            PolymorphicRef::Types { .. } => Some(PolymorphicMode::Any),
        }
    }
}

/// An association edge declared on an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssocEdgeDescriptor {
    pub name: String,
    /// Entity at the other end of the edge.
    pub schema_name: String,
    #[serde(default)]
    pub symmetric: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse_edge: Option<InverseEdgeDescriptor>,
}

impl AssocEdgeDescriptor {
    pub fn new(name: impl Into<String>, schema_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema_name: schema_name.into(),
            symmetric: false,
            inverse_edge: None,
        }
    }

    pub fn symmetric(mut self) -> Self {
        self.symmetric = true;
        self
    }

    pub fn inverse(mut self, name: impl Into<String>) -> Self {
        self.inverse_edge = Some(InverseEdgeDescriptor { name: name.into() });
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InverseEdgeDescriptor {
    pub name: String,
}

/// A named group of association edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssocEdgeGroup {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub assoc_edges: Vec<AssocEdgeDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_field() {
        let json = r#"{
            "name": "creatorID",
            "type": { "dbType": "UUID" },
            "foreignKey": { "schema": "User", "column": "ID" }
        }"#;
        let field: FieldDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(field.field_type.db_type, DbType::Uuid);
        assert_eq!(field.column(), "creator_id");
        assert_eq!(
            field.foreign_key,
            Some(ForeignKeyRef {
                schema: "User".to_string(),
                column: "ID".to_string()
            })
        );
        assert!(!field.nullable);
    }

    #[test]
    fn test_storage_key_wins() {
        let mut field = FieldDescriptor::new("FirstName", DbType::String);
        assert_eq!(field.column(), "first_name");
        field.storage_key = Some("given_name".to_string());
        assert_eq!(field.column(), "given_name");
    }

    #[test]
    fn test_polymorphic_modes() {
        let flag: PolymorphicRef = serde_json::from_str("true").unwrap();
        assert_eq!(flag.mode(), Some(PolymorphicMode::Any));

        let off: PolymorphicRef = serde_json::from_str("false").unwrap();
        assert_eq!(off.mode(), None);

        let empty: PolymorphicRef = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.mode(), Some(PolymorphicMode::Any));

        let typed: PolymorphicRef =
            serde_json::from_str(r#"{ "types": ["user", "contact"] }"#).unwrap();
        assert_eq!(
            typed.mode(),
            Some(PolymorphicMode::OneOf(vec![
                "user".to_string(),
                "contact".to_string()
            ]))
        );
    }

    #[test]
    fn test_deserialize_entity_with_edges() {
        let json = r#"{
            "fields": [{ "name": "FirstName", "type": { "dbType": "String" } }],
            "assocEdges": [
                { "name": "friends", "schemaName": "User", "symmetric": true },
                { "name": "followers", "schemaName": "User", "inverseEdge": { "name": "followees" } }
            ],
            "assocEdgeGroups": [
                { "name": "rsvps", "assocEdges": [{ "name": "invited", "schemaName": "Event" }] }
            ]
        }"#;
        let entity: EntityDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(entity.assoc_edges.len(), 2);
        assert!(entity.assoc_edges[0].symmetric);
        assert_eq!(
            entity.assoc_edges[1].inverse_edge.as_ref().unwrap().name,
            "followees"
        );
        assert_eq!(entity.assoc_edge_groups[0].assoc_edges.len(), 1);
        assert!(!entity.has_fixed_rows());
    }
}
