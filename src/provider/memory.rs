use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{DataProvider, Filter, ProviderError, Row, Scope, Table, filter_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

/// One recorded call against the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCall {
    pub op: Operation,
    pub table: Table,
    pub scope: Scope,
}

#[derive(Default)]
struct MemoryState {
    tables: HashMap<Table, Vec<Row>>,
    next_id: HashMap<Table, i64>,
    calls: Vec<ProviderCall>,
    failing: HashSet<(Operation, Table)>,
}

/// In-process provider used by `DATA_BACKEND=memory` and the test suite.
/// Enforces the same column catalogue, generated keys and unique keys as the
/// Postgres schema; row-level policy is not modelled.
#[derive(Default)]
pub struct MemoryProvider {
    state: Mutex<MemoryState>,
}

fn row_matches(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|f| {
        let actual = row.get(f.column).and_then(filter_text);
        match filter_text(&f.value) {
            Some(wanted) => actual.as_deref() == Some(wanted.as_str()),
            None => actual.is_none(),
        }
    })
}

fn same_key(a: &Row, b: &Row, columns: &[&str]) -> bool {
    columns.iter().all(|c| {
        let left = a.get(*c).and_then(filter_text);
        left.is_some() && left == b.get(*c).and_then(filter_text)
    })
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert a row directly, bypassing call recording.
    pub fn seed(&self, table: Table, row: Row) -> Result<Row, ProviderError> {
        let mut state = self.lock();
        Self::insert_row(&mut state, table, row)
    }

    pub fn rows(&self, table: Table) -> Vec<Row> {
        self.lock().tables.get(&table).cloned().unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Count recorded calls of one kind against one table.
    pub fn count(&self, op: Operation, table: Table) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.op == op && c.table == table)
            .count()
    }

    /// Make every subsequent `op` against `table` fail with a database error.
    pub fn fail_on(&self, op: Operation, table: Table) {
        self.lock().failing.insert((op, table));
    }

    fn record(
        state: &mut MemoryState,
        op: Operation,
        table: Table,
        scope: &Scope,
    ) -> Result<(), ProviderError> {
        state.calls.push(ProviderCall {
            op,
            table,
            scope: scope.clone(),
        });
        if state.failing.contains(&(op, table)) {
            return Err(ProviderError::Database(format!(
                "injected failure on {op:?} {table}"
            )));
        }
        Ok(())
    }

    fn insert_row(state: &mut MemoryState, table: Table, row: Row) -> Result<Row, ProviderError> {
        table.check_columns(row.keys().map(String::as_str))?;

        let mut full = Row::new();
        for column in table.columns() {
            full.insert((*column).to_string(), Value::Null);
        }
        full.extend(row);

        let key = table.primary_key();
        if table.generates_key() && full.get(key).is_none_or(Value::is_null) {
            let next = state.next_id.entry(table).or_insert(0);
            *next += 1;
            full.insert(key.to_string(), Value::from(*next));
        }
        if let Some(ts) = table.timestamp_column() {
            if full.get(ts).is_none_or(Value::is_null) {
                full.insert(ts.to_string(), Value::from(chrono::Utc::now().to_rfc3339()));
            }
        }

        let rows = state.tables.entry(table).or_default();
        if rows.iter().any(|existing| same_key(existing, &full, &[key])) {
            return Err(ProviderError::Conflict(format!("duplicate {key} in {table}")));
        }
        for columns in table.unique_keys() {
            if rows.iter().any(|existing| same_key(existing, &full, columns)) {
                return Err(ProviderError::Conflict(format!(
                    "duplicate key ({}) in {table}",
                    columns.join(", ")
                )));
            }
        }
        rows.push(full.clone());
        Ok(full)
    }
}

#[async_trait]
impl DataProvider for MemoryProvider {
    async fn select(
        &self,
        scope: &Scope,
        table: Table,
        filters: &[Filter],
    ) -> Result<Vec<Row>, ProviderError> {
        let mut state = self.lock();
        Self::record(&mut state, Operation::Select, table, scope)?;
        table.check_columns(filters.iter().map(|f| f.column))?;
        Ok(state
            .tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| row_matches(r, filters)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, scope: &Scope, table: Table, row: Row) -> Result<Row, ProviderError> {
        let mut state = self.lock();
        Self::record(&mut state, Operation::Insert, table, scope)?;
        Self::insert_row(&mut state, table, row)
    }

    async fn update(
        &self,
        scope: &Scope,
        table: Table,
        filters: &[Filter],
        changes: Row,
    ) -> Result<Vec<Row>, ProviderError> {
        let mut state = self.lock();
        Self::record(&mut state, Operation::Update, table, scope)?;
        if changes.is_empty() {
            return Err(ProviderError::EmptyChanges);
        }
        table.check_columns(changes.keys().map(String::as_str))?;
        table.check_columns(filters.iter().map(|f| f.column))?;

        let mut updated = Vec::new();
        if let Some(rows) = state.tables.get_mut(&table) {
            for row in rows.iter_mut().filter(|r| row_matches(r, filters)) {
                for (k, v) in &changes {
                    row.insert(k.clone(), v.clone());
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(
        &self,
        scope: &Scope,
        table: Table,
        filters: &[Filter],
    ) -> Result<u64, ProviderError> {
        let mut state = self.lock();
        Self::record(&mut state, Operation::Delete, table, scope)?;
        table.check_columns(filters.iter().map(|f| f.column))?;

        let Some(rows) = state.tables.get_mut(&table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !row_matches(r, filters));
        Ok((before - rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_fills_columns() {
        let provider = MemoryProvider::new();
        let scope = Scope::Service;
        let first = provider
            .insert(&scope, Table::Announcements, row(json!({"title": "a"})))
            .await
            .unwrap();
        let second = provider
            .insert(&scope, Table::Announcements, row(json!({"title": "b"})))
            .await
            .unwrap();
        assert_eq!(first["id"], json!(1));
        assert_eq!(second["id"], json!(2));
        assert_eq!(first["description"], Value::Null);
        assert!(first["created_at"].is_string());
    }

    #[tokio::test]
    async fn unique_key_conflicts() {
        let provider = MemoryProvider::new();
        let scope = Scope::Service;
        let attendance = json!({"user_id": "u1", "event_id": 3});
        provider
            .insert(&scope, Table::Attendance, row(attendance.clone()))
            .await
            .unwrap();
        let err = provider
            .insert(&scope, Table::Attendance, row(attendance))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Conflict(_)));
        assert_eq!(provider.rows(Table::Attendance).len(), 1);
    }

    #[tokio::test]
    async fn filters_compare_as_text() {
        let provider = MemoryProvider::new();
        provider
            .seed(Table::Events, row(json!({"name": "Gala"})))
            .unwrap();
        let found = provider
            .select(&Scope::Service, Table::Events, &[Filter::eq("id", "1")])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        let missing = provider
            .select(&Scope::Service, Table::Events, &[Filter::eq("id", 2)])
            .await
            .unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn injected_failures_are_still_recorded() {
        let provider = MemoryProvider::new();
        provider.fail_on(Operation::Insert, Table::Rsvps);
        let result = provider
            .insert(&Scope::Service, Table::Rsvps, row(json!({"event_id": 1})))
            .await;
        assert!(matches!(result, Err(ProviderError::Database(_))));
        assert_eq!(provider.count(Operation::Insert, Table::Rsvps), 1);
        assert!(provider.rows(Table::Rsvps).is_empty());
    }
}
