//! # Value Oracle
//!
//! Produces one random value for a field. The row generator only relies on
//! the [`ValueOracle`] contract; [`FakeOracle`] is the default implementation.
//!
//! Resolution order for a single value:
//!
//! 1. Nullable fields are NULL half of the time.
//! 2. String columns whose name matches a known pattern (phone, email,
//!    password, first/last name) get a dedicated generator.
//! 3. Otherwise the storage type decides.

use std::borrow::Cow;
use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::Rng;
use regex::Regex;
use sha2::{Digest, Sha256};
use uuid::Builder;

use crate::error::{EntseedError, Result};
use crate::generate::chance::Chance;
use crate::generate::value::Value;
use crate::schema::naming::table_name;
use crate::schema::types::{DbType, Entities, FieldDescriptor};

/// Everything the oracle may look at to produce a value.
pub struct ValueRequest<'a> {
    /// Entity owning the field.
    pub entity: &'a str,
    pub field: &'a FieldDescriptor,
    /// Storage column of the field.
    pub column: &'a str,
    /// All entities, needed for enums backed by a fixed-row entity.
    pub lookup: Option<&'a Entities>,
}

/// Source of field values for generated rows.
pub trait ValueOracle {
    fn value(&mut self, request: &ValueRequest<'_>, chance: &mut Chance) -> Result<Value>;
}

/// Column-name driven generators that take priority over the type default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Override {
    Phone,
    Email,
    Password,
    FirstName,
    LastName,
}

struct CompiledOverride {
    pattern: Regex,
    kind: Override,
}

/// Patterns are tried in order; the first match wins.
const OVERRIDE_RULES: &[(&str, Override)] = &[
    (r"^phone(_number)?|_phone$|_phone_number$", Override::Phone),
    (r"^email(_address)|_email$", Override::Email),
    (r"^password", Override::Password),
    (r"^first_?(name)?", Override::FirstName),
    (r"^last_?(name)?", Override::LastName),
];

static COMPILED_OVERRIDES: LazyLock<Vec<CompiledOverride>> = LazyLock::new(|| {
    OVERRIDE_RULES
        .iter()
        .map(|(pattern, kind)| CompiledOverride {
            pattern: Regex::new(pattern).unwrap(),
            kind: *kind,
        })
        .collect()
});

/// E.164 number in the North American Numbering Plan.
static US_E164: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+1[2-9]\d{2}[2-9]\d{6}$").unwrap());

const EMAIL_DOMAIN: &str = "email.com";

/// Default oracle backed by `fake`, `uuid` and `chrono`.
pub struct FakeOracle {
    /// Instant all temporal values are derived from, captured once per run.
    now: DateTime<Utc>,
}

impl FakeOracle {
    pub fn new() -> Self {
        Self { now: Utc::now() }
    }

    /// Oracle pinned to a fixed instant.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    fn by_type(&self, request: &ValueRequest<'_>, chance: &mut Chance) -> Result<Value> {
        let field = request.field;
        let value = match field.field_type.db_type {
            DbType::Uuid => Value::Uuid(Builder::from_random_bytes(chance.rng().random()).into_uuid()),
            DbType::Boolean => Value::Bool(chance.coin_flip()),
            DbType::Date => Value::Date(self.now.date_naive()),
            DbType::Time => Value::Time(self.now.time()),
            DbType::Timetz => Value::TimeTz(self.now.time()),
            DbType::Timestamp => Value::Timestamp(self.now.naive_utc()),
            DbType::Timestamptz => Value::TimestampTz(self.now),
            DbType::String => Value::String(Cow::Owned(random_token(chance))),
            DbType::Int | DbType::BigInt => Value::Int(chance.rng().random_range(0..100_000_000)),
            DbType::Float => Value::Float(chance.rng().random::<f64>() * 100_000_000.0),
            DbType::Json | DbType::Jsonb => Value::Json(serde_json::json!({})),
            DbType::Enum | DbType::StringEnum => return enum_value(request, chance),
        };
        Ok(value)
    }
}

impl Default for FakeOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueOracle for FakeOracle {
    fn value(&mut self, request: &ValueRequest<'_>, chance: &mut Chance) -> Result<Value> {
        if request.field.nullable && chance.coin_flip() {
            return Ok(Value::Null);
        }

        if request.field.field_type.db_type == DbType::String {
            if let Some(kind) = match_override(request.column) {
                return override_value(kind, request.column, chance);
            }
        }

        self.by_type(request, chance)
    }
}

fn match_override(column: &str) -> Option<Override> {
    COMPILED_OVERRIDES
        .iter()
        .find(|rule| rule.pattern.is_match(column))
        .map(|rule| rule.kind)
}

/// Phone numbers must be valid E.164 `+1` numbers; a bad one is fatal and
/// never retried.
fn checked_phone(column: &str, phone: String) -> Result<Value> {
    if !US_E164.is_match(&phone) {
        return Err(EntseedError::ValueGeneration {
            column: column.to_string(),
            message: format!("invalid phone number {}", phone),
        });
    }
    Ok(Value::String(Cow::Owned(phone)))
}

fn override_value(kind: Override, column: &str, chance: &mut Chance) -> Result<Value> {
    let value = match kind {
        Override::Phone => checked_phone(column, random_phone_number(chance))?,
        Override::Email => Value::String(Cow::Owned(format!(
            "test+{}@{}",
            random_token(chance),
            EMAIL_DOMAIN
        ))),
        Override::Password => Value::String(Cow::Owned(hash_password(
            &random_token(chance),
            chance,
        ))),
        Override::FirstName => Value::String(Cow::Owned(FirstName().fake_with_rng(chance.rng()))),
        Override::LastName => Value::String(Cow::Owned(LastName().fake_with_rng(chance.rng()))),
    };
    Ok(value)
}

fn enum_value(request: &ValueRequest<'_>, chance: &mut Chance) -> Result<Value> {
    let field = request.field;
    if let Some(values) = &field.field_type.values {
        if let Some(v) = chance.pick(values) {
            return Ok(Value::String(Cow::Owned(v.clone())));
        }
    }

    let Some(fk) = &field.foreign_key else {
        return Err(EntseedError::UnsupportedType {
            entity: request.entity.to_string(),
            field: field.name.clone(),
            message: "enum without values or a foreign key".to_string(),
        });
    };

    let lookup = request.lookup.ok_or_else(|| EntseedError::UnsupportedType {
        entity: request.entity.to_string(),
        field: field.name.clone(),
        message: "enum with a foreign key needs the schema to look up values".to_string(),
    })?;
    let target = lookup
        .get(&fk.schema)
        .ok_or_else(|| EntseedError::MissingEntity {
            entity: fk.schema.clone(),
        })?;
    let rows = target.db_rows.as_deref().unwrap_or_default();
    let row = chance
        .pick(rows)
        .ok_or_else(|| EntseedError::MissingFixedRows {
            entity: fk.schema.clone(),
            needed_by: format!("{}.{}", request.entity, field.name),
        })?;
    row.get(&fk.column)
        .map(Value::from_json)
        .ok_or_else(|| EntseedError::MissingColumn {
            entity: request.entity.to_string(),
            table: table_name(&fk.schema),
            column: fk.column.clone(),
            row_index: 0,
        })
}

/// Opaque lowercase hex token.
fn random_token(chance: &mut Chance) -> String {
    format!("{:x}", chance.rng().random::<u64>())
}

/// `+1NXXNXXXXXX` where N is 2-9.
fn random_phone_number(chance: &mut Chance) -> String {
    let rng = chance.rng();
    let area: u32 = rng.random_range(200..1000);
    let exchange: u32 = rng.random_range(200..1000);
    let line: u32 = rng.random_range(0..10_000);
    format!("+1{:03}{:03}{:04}", area, exchange, line)
}

/// Salted SHA-256 digest: `$sha256$<salt>$<digest>`, both base64.
fn hash_password(password: &str, chance: &mut Chance) -> String {
    let salt: [u8; 16] = chance.rng().random();
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();
    format!(
        "$sha256${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(digest)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::EntityDescriptor;

    fn value_for(field: &FieldDescriptor, column: &str) -> Result<Value> {
        let mut oracle = FakeOracle::new();
        let mut chance = Chance::seeded(42);
        oracle.value(
            &ValueRequest {
                entity: "User",
                field,
                column,
                lookup: None,
            },
            &mut chance,
        )
    }

    fn string_for(column: &str) -> String {
        let field = FieldDescriptor::new(column, DbType::String);
        value_for(&field, column)
            .unwrap()
            .as_string()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_invalid_phone_number_is_fatal() {
        let err = checked_phone("phone_number", "+1055512345".to_string()).unwrap_err();
        match err {
            EntseedError::ValueGeneration { column, message } => {
                assert_eq!(column, "phone_number");
                assert!(message.contains("+1055512345"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let ok = checked_phone("phone_number", "+14155552671".to_string()).unwrap();
        assert_eq!(ok.as_string(), Some("+14155552671"));
    }

    #[test]
    fn test_plain_string() {
        let s = string_for("foo");
        assert!(!s.is_empty());
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_email_override() {
        let s = string_for("email_address");
        assert!(s.starts_with("test+"));
        assert!(s.ends_with("@email.com"));
        assert!(string_for("work_email").ends_with("@email.com"));
    }

    #[test]
    fn test_phone_override_is_e164() {
        for column in ["phone_number", "phone", "work_phone", "home_phone_number"] {
            let s = string_for(column);
            assert!(s.starts_with("+1"), "{column}: {s}");
            assert_eq!(s.len(), 12, "{column}: {s}");
        }
    }

    #[test]
    fn test_password_override_is_hashed() {
        let s = string_for("password");
        assert!(s.starts_with("$sha256$"));
        assert_eq!(s.split('$').count(), 4);
    }

    #[test]
    fn test_name_overrides_are_capitalized() {
        for column in ["first_name", "last_name"] {
            let s = string_for(column);
            assert!(s.chars().next().unwrap().is_uppercase(), "{column}: {s}");
        }
    }

    #[test]
    fn test_overrides_only_apply_to_strings() {
        let field = FieldDescriptor::new("phone", DbType::Int);
        assert!(matches!(value_for(&field, "phone").unwrap(), Value::Int(_)));
    }

    #[test]
    fn test_numeric_types() {
        let int = FieldDescriptor::new("count", DbType::Int);
        match value_for(&int, "count").unwrap() {
            Value::Int(i) => assert!((0..100_000_000).contains(&i)),
            other => panic!("expected Int, got {other:?}"),
        }
        let float = FieldDescriptor::new("score", DbType::Float);
        match value_for(&float, "score").unwrap() {
            Value::Float(f) => assert!(f.fract() != 0.0),
            other => panic!("expected Float, got {other:?}"),
        }
    }

    #[test]
    fn test_uuid_and_temporal_types() {
        let id = FieldDescriptor::new("ID", DbType::Uuid);
        assert!(value_for(&id, "id").unwrap().as_uuid().is_some());

        let date = FieldDescriptor::new("date", DbType::Date);
        let rendered = value_for(&date, "date").unwrap().to_csv_string();
        assert_eq!(rendered.len(), 10);
        assert_eq!(&rendered[4..5], "-");

        let ts = FieldDescriptor::new("created_at", DbType::Timestamptz);
        assert!(matches!(
            value_for(&ts, "created_at").unwrap(),
            Value::TimestampTz(_)
        ));
    }

    #[test]
    fn test_nullable_is_sometimes_null() {
        let field = FieldDescriptor::new("apartment", DbType::String).nullable();
        let mut oracle = FakeOracle::new();
        let mut chance = Chance::seeded(3);
        let request = ValueRequest {
            entity: "Address",
            field: &field,
            column: "apartment",
            lookup: None,
        };
        let nulls = (0..100)
            .filter(|_| oracle.value(&request, &mut chance).unwrap().is_null())
            .count();
        assert!(nulls > 20 && nulls < 80, "expected about half NULL, got {nulls}");
    }

    #[test]
    fn test_enum_values() {
        let days = ["Monday", "Tuesday", "Wednesday"];
        let field = FieldDescriptor::new("day", DbType::Enum).enum_values(&days);
        let v = value_for(&field, "day").unwrap();
        assert!(days.contains(&v.as_string().unwrap()));
    }

    #[test]
    fn test_enum_backed_by_fixed_rows() {
        let mut row = serde_json::Map::new();
        row.insert("outcome".into(), serde_json::json!("COMPLETED"));
        let outcome = EntityDescriptor::new("RequestOutcome")
            .with_field(FieldDescriptor::new("outcome", DbType::String))
            .with_db_rows(vec![row]);
        let lookup: Entities = [(outcome.name.clone(), outcome)].into_iter().collect();

        let field = FieldDescriptor::new("outcome", DbType::Enum).references("RequestOutcome", "outcome");
        let mut oracle = FakeOracle::new();
        let mut chance = Chance::seeded(1);
        let request = ValueRequest {
            entity: "Request",
            field: &field,
            column: "outcome",
            lookup: Some(&lookup),
        };
        let v = oracle.value(&request, &mut chance).unwrap();
        assert_eq!(v.as_string(), Some("COMPLETED"));

        let without_lookup = ValueRequest {
            lookup: None,
            ..request
        };
        assert!(oracle.value(&without_lookup, &mut chance).is_err());
    }

    #[test]
    fn test_enum_backed_by_entity_without_rows_fails() {
        let plain = EntityDescriptor::new("Status").with_field(FieldDescriptor::new("name", DbType::String));
        let lookup: Entities = [(plain.name.clone(), plain)].into_iter().collect();
        let field = FieldDescriptor::new("status", DbType::Enum).references("Status", "name");
        let mut chance = Chance::seeded(1);
        let err = FakeOracle::new()
            .value(
                &ValueRequest {
                    entity: "Request",
                    field: &field,
                    column: "status",
                    lookup: Some(&lookup),
                },
                &mut chance,
            )
            .unwrap_err();
        assert!(matches!(err, EntseedError::MissingFixedRows { .. }));
    }
}
