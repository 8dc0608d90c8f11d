use indexmap::IndexMap;

use crate::generate::value::Value;

/// A generated row: storage column → value, in column order.
pub type Row = IndexMap<String, Value>;

/// Rows generated so far in a run, per entity, in generation order.
///
/// Rows are never changed once pooled; the pool only grows. Dependents look
/// rows up by position, so the order matters.
#[derive(Debug, Default, Clone)]
pub struct RowPool {
    rows: IndexMap<String, Vec<Row>>,
}

impl RowPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row of `entity` at `index`, if one exists.
    pub fn get(&self, entity: &str, index: usize) -> Option<&Row> {
        self.rows.get(entity).and_then(|rows| rows.get(index))
    }

    pub fn rows(&self, entity: &str) -> &[Row] {
        self.rows.get(entity).map(|r| r.as_slice()).unwrap_or(&[])
    }

    pub fn len(&self, entity: &str) -> usize {
        self.rows.get(entity).map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.values().all(|r| r.is_empty())
    }

    /// Total number of pooled rows across all entities.
    pub fn total(&self) -> usize {
        self.rows.values().map(|r| r.len()).sum()
    }

    /// Fold freshly generated rows into the pool.
    ///
    /// When the pool holds fewer rows for the entity than were just
    /// generated, the new rows become the base and the existing rows follow
    /// them; otherwise the new rows are appended.
    pub fn merge(&mut self, entity: &str, mut rows: Vec<Row>) {
        let existing = self.rows.entry(entity.to_string()).or_default();
        if existing.len() < rows.len() {
            rows.append(existing);
            *existing = rows;
        } else {
            existing.append(&mut rows);
        }
    }

    /// Move every row of `other` into this pool, after the rows already here.
    pub fn absorb(&mut self, other: RowPool) {
        for (entity, mut rows) in other.rows {
            self.rows.entry(entity).or_default().append(&mut rows);
        }
    }

    /// Entities with at least one row, in first-generated order.
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(n: i64) -> Row {
        let mut row = Row::new();
        row.insert("n".to_string(), Value::Int(n));
        row
    }

    fn values(pool: &RowPool, entity: &str) -> Vec<Value> {
        pool.rows(entity).iter().map(|r| r["n"].clone()).collect()
    }

    #[test]
    fn test_merge_appends_when_pool_is_larger() {
        let mut pool = RowPool::new();
        pool.merge("User", vec![row(1), row(2)]);
        pool.merge("User", vec![row(3)]);
        assert_eq!(values(&pool, "User"), vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn test_merge_puts_new_rows_first_when_they_outnumber_pool() {
        let mut pool = RowPool::new();
        pool.merge("User", vec![row(1)]);
        pool.merge("User", vec![row(2), row(3)]);
        assert_eq!(values(&pool, "User"), vec![Value::Int(2), Value::Int(3), Value::Int(1)]);
        assert_eq!(pool.len("User"), 3);
    }

    #[test]
    fn test_absorb_and_lookup() {
        let mut pool = RowPool::new();
        pool.merge("User", vec![row(1)]);
        let mut other = RowPool::new();
        other.merge("User", vec![row(2)]);
        other.merge("Event", vec![row(9)]);
        pool.absorb(other);

        assert_eq!(pool.len("User"), 2);
        assert_eq!(pool.get("Event", 0).unwrap()["n"], Value::Int(9));
        assert!(pool.get("Event", 1).is_none());
        assert_eq!(pool.total(), 3);
        assert_eq!(pool.entities().collect::<Vec<_>>(), vec!["User", "Event"]);
    }
}
