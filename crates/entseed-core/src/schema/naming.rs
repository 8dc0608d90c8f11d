use heck::{ToSnakeCase, ToUpperCamelCase};

/// Storage column for a field name: `creatorID` → `creator_id`.
pub fn column_name(name: &str) -> String {
    name.to_snake_case().to_lowercase()
}

/// Physical table for an entity: `EventAddress` → `event_addresses`.
pub fn table_name(entity: &str) -> String {
    pluralizer::pluralize(&entity.to_snake_case(), 2, false)
}

/// `user` → `User`, `hosted_events` → `HostedEvents`.
pub fn pascal_case(name: &str) -> String {
    name.to_upper_camel_case()
}

/// Public name of an association edge declared on `source`.
///
/// The name is `<Source>To<Edge>Edge`, unless the edge name itself already
/// starts with `<Source>To`, in which case the prefix is not repeated.
pub fn edge_name(source: &str, edge: &str) -> String {
    let prefix = format!("{}To", pascal_case(source));
    let local = pascal_case(edge);
    let suffix = format!("{}Edge", local);
    if local.starts_with(&prefix) {
        suffix
    } else {
        prefix + &suffix
    }
}

/// Name a derived type field must have for the id field `field`:
/// `owner_id` → `owner_type`, `OwnerID` → `OwnerType`.
pub fn derived_type_name(field: &str) -> Option<String> {
    if let Some(base) = field.strip_suffix("_id") {
        return Some(format!("{}_type", base));
    }
    field.strip_suffix("ID").map(|base| format!("{}Type", base))
}
