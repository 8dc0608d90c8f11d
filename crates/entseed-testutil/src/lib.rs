use entseed_core::schema::types::*;

/// Entity with the columns every ent carries: id, created_at, updated_at.
pub fn base_entity(name: &str) -> EntityDescriptor {
    EntityDescriptor::new(name)
        .with_field(FieldDescriptor::new("ID", DbType::Uuid))
        .with_field(FieldDescriptor::new("createdAt", DbType::Timestamp))
        .with_field(FieldDescriptor::new("updatedAt", DbType::Timestamp))
}

/// Collect descriptors into a schema, keyed by name in the given order.
pub fn entities(list: Vec<EntityDescriptor>) -> Entities {
    list.into_iter().map(|e| (e.name.clone(), e)).collect()
}

fn named(name: &str) -> EntityDescriptor {
    base_entity(name)
        .with_field(FieldDescriptor::new("FirstName", DbType::String))
        .with_field(FieldDescriptor::new("LastName", DbType::String))
}

fn address(owner: FieldDescriptor) -> EntityDescriptor {
    base_entity("Address")
        .with_field(FieldDescriptor::new("Street", DbType::String))
        .with_field(FieldDescriptor::new("City", DbType::String))
        .with_field(FieldDescriptor::new("State", DbType::String))
        .with_field(FieldDescriptor::new("ZipCode", DbType::String))
        .with_field(FieldDescriptor::new("Apartment", DbType::String).nullable())
        .with_field(owner.derived(FieldDescriptor::new("OwnerType", DbType::String)))
}

fn contact(unique: bool) -> EntityDescriptor {
    let mut user_id = FieldDescriptor::new("userID", DbType::Uuid).references("User", "ID");
    if unique {
        user_id = user_id.unique();
    }
    named("Contact").with_field(user_id)
}

/// A single User entity with no dependencies.
pub fn simple() -> Entities {
    entities(vec![named("User")])
}

/// Profile ← User ← Event ← EventAddress, chained by plain foreign keys.
pub fn foreign_key() -> Entities {
    entities(vec![
        base_entity("Profile").with_field(FieldDescriptor::new("Name", DbType::String)),
        named("User").with_field(
            FieldDescriptor::new("DefaultProfile", DbType::Uuid).references("Profile", "ID"),
        ),
        base_entity("Event")
            .with_field(FieldDescriptor::new("name", DbType::String))
            .with_field(FieldDescriptor::new("creatorID", DbType::Uuid).references("User", "ID"))
            .with_field(FieldDescriptor::new("start_time", DbType::Timestamp))
            .with_field(FieldDescriptor::new("end_time", DbType::Timestamp).nullable()),
        base_entity("EventAddress")
            .with_field(FieldDescriptor::new("Street", DbType::String))
            .with_field(FieldDescriptor::new("City", DbType::String))
            .with_field(FieldDescriptor::new("Apartment", DbType::String).nullable())
            .with_field(FieldDescriptor::new("OwnerID", DbType::Uuid).references("Event", "ID")),
    ])
}

/// Contact with a unique reference to User: one contact per user.
pub fn unique_field() -> Entities {
    entities(vec![named("User"), contact(true)])
}

/// Contact with a plain reference to User.
pub fn non_unique_field() -> Entities {
    entities(vec![named("User"), contact(false)])
}

/// Address owned by any entity with an id.
pub fn polymorphic_star() -> Entities {
    entities(vec![
        named("User"),
        address(FieldDescriptor::new("OwnerID", DbType::Uuid).polymorphic(PolymorphicRef::any())),
    ])
}

/// Address owned by a user or a contact.
pub fn polymorphic_types() -> Entities {
    entities(vec![
        named("User"),
        contact(false),
        address(
            FieldDescriptor::new("OwnerID", DbType::Uuid)
                .polymorphic(PolymorphicRef::one_of(&["user", "contact"])),
        ),
    ])
}

/// Like [`polymorphic_types`], with one address per owner row.
pub fn polymorphic_types_unique() -> Entities {
    entities(vec![
        named("User"),
        contact(false),
        address(
            FieldDescriptor::new("OwnerID", DbType::Uuid)
                .unique()
                .polymorphic(PolymorphicRef::one_of(&["user", "contact"])),
        ),
    ])
}

/// Profile ← User (one profile per user) ← Contact (many per user). Users
/// also carry a symmetric `friends` edge.
pub fn unique_chain() -> Entities {
    entities(vec![
        base_entity("Profile").with_field(FieldDescriptor::new("Name", DbType::String)),
        named("User")
            .with_field(
                FieldDescriptor::new("profileID", DbType::Uuid)
                    .unique()
                    .references("Profile", "ID"),
            )
            .with_edge(AssocEdgeDescriptor::new("friends", "User").symmetric()),
        contact(false),
    ])
}

pub const USER_STATUSES: [&str; 4] = ["UNVERIFIED", "VERIFIED", "DEACTIVATED", "DISABLED"];

/// User with an inline enum column.
pub fn with_enum_type() -> Entities {
    entities(vec![named("User").with_field(
        FieldDescriptor::new("status", DbType::Enum).enum_values(&USER_STATUSES),
    )])
}

pub const REQUEST_OUTCOMES: [&str; 3] = ["CANCELLED", "COMPLETED", "FAILED"];

/// Enum table with fixed rows, referenced by a generated Request.
pub fn enum_with_dbrows() -> Entities {
    let rows = REQUEST_OUTCOMES
        .iter()
        .map(|outcome| {
            let mut row = serde_json::Map::new();
            row.insert("outcome".into(), serde_json::json!(outcome));
            row
        })
        .collect();
    entities(vec![
        EntityDescriptor::new("RequestOutcome")
            .with_field(FieldDescriptor::new("outcome", DbType::String))
            .with_db_rows(rows),
        base_entity("Request").with_field(
            FieldDescriptor::new("outcome", DbType::Enum).references("RequestOutcome", "outcome"),
        ),
    ])
}

/// User with symmetric `friends` and `followers`/`followees`; Event with
/// `hosts` and its inverse `userToHostedEvents`.
pub fn edges() -> Entities {
    entities(vec![
        named("User")
            .with_edge(AssocEdgeDescriptor::new("friends", "User").symmetric())
            .with_edge(AssocEdgeDescriptor::new("followers", "User").inverse("followees")),
        base_entity("Event")
            .with_field(FieldDescriptor::new("name", DbType::String))
            .with_field(FieldDescriptor::new("creatorID", DbType::Uuid).references("User", "ID"))
            .with_field(FieldDescriptor::new("start_time", DbType::Timestamp))
            .with_field(FieldDescriptor::new("end_time", DbType::Timestamp).nullable())
            .with_edge(AssocEdgeDescriptor::new("hosts", "User").inverse("userToHostedEvents")),
    ])
}

/// The `foreign_key` schema as the external schema reader writes it.
pub const FOREIGN_KEY_JSON: &str = r#"{
  "Profile": {
    "fields": [
      { "name": "ID", "type": { "dbType": "UUID" } },
      { "name": "Name", "type": { "dbType": "String" } }
    ]
  },
  "User": {
    "fields": [
      { "name": "ID", "type": { "dbType": "UUID" } },
      { "name": "FirstName", "type": { "dbType": "String" } },
      { "name": "DefaultProfile", "type": { "dbType": "UUID" },
        "foreignKey": { "schema": "Profile", "column": "ID" } }
    ],
    "assocEdges": [
      { "name": "friends", "schemaName": "User", "symmetric": true }
    ]
  },
  "Event": {
    "fields": [
      { "name": "ID", "type": { "dbType": "UUID" } },
      { "name": "creatorID", "type": { "dbType": "UUID" },
        "foreignKey": { "schema": "User", "column": "ID" } },
      { "name": "start_time", "type": { "dbType": "Timestamp" } }
    ]
  }
}"#;
