use async_trait::async_trait;
use serde_json::{Value, json};
use sqlx::{PgPool, Postgres, Transaction};

use crate::config::is_identifier;

use super::{
    CallerClaims, DataProvider, Filter, ProviderError, Row, Scope, Table, filter_text, into_row,
};

/// Postgres-backed provider. Caller-scoped calls run inside a transaction
/// that publishes the caller's claims through `request.jwt.claims` and
/// assumes the configured database role, so table policies see the caller.
#[derive(Clone)]
pub struct PgProvider {
    pool: PgPool,
    caller_role: String,
}

impl PgProvider {
    pub fn new(pool: PgPool, caller_role: &str) -> Result<Self, ProviderError> {
        if !is_identifier(caller_role) {
            return Err(ProviderError::Database(format!(
                "Invalid caller role name '{caller_role}'"
            )));
        }
        Ok(Self {
            pool,
            caller_role: caller_role.to_string(),
        })
    }

    fn claims_json(&self, claims: &CallerClaims) -> String {
        json!({
            "sub": claims.sub,
            "email": claims.email,
            "role": self.caller_role,
        })
        .to_string()
    }

    async fn begin(&self, scope: &Scope) -> Result<Transaction<'_, Postgres>, ProviderError> {
        let mut tx = self.pool.begin().await?;
        if let Scope::Caller(claims) = scope {
            sqlx::query("SELECT set_config('request.jwt.claims', $1, true)")
                .bind(self.claims_json(claims))
                .execute(&mut *tx)
                .await?;
            // Role name is validated in `new`; SET cannot take bind parameters.
            sqlx::query(&format!("SET LOCAL ROLE {}", self.caller_role))
                .execute(&mut *tx)
                .await?;
        }
        Ok(tx)
    }
}

/// Build `t.col::text = $n AND ...` starting at parameter `first`.
fn where_clause(
    table: Table,
    filters: &[Filter],
    first: usize,
) -> Result<(String, Vec<String>), ProviderError> {
    table.check_columns(filters.iter().map(|f| f.column))?;
    if filters.is_empty() {
        return Ok(("TRUE".to_string(), Vec::new()));
    }
    let mut clauses = Vec::with_capacity(filters.len());
    let mut params = Vec::new();
    for filter in filters {
        match filter_text(&filter.value) {
            Some(text) => {
                params.push(text);
                clauses.push(format!(
                    "t.{}::text = ${}",
                    filter.column,
                    first + params.len() - 1
                ));
            }
            None => clauses.push(format!("t.{} IS NULL", filter.column)),
        }
    }
    Ok((clauses.join(" AND "), params))
}

#[async_trait]
impl DataProvider for PgProvider {
    async fn select(
        &self,
        scope: &Scope,
        table: Table,
        filters: &[Filter],
    ) -> Result<Vec<Row>, ProviderError> {
        let (where_sql, params) = where_clause(table, filters, 1)?;
        let sql = format!(
            "SELECT to_jsonb(t) FROM {table} AS t WHERE {where_sql} ORDER BY t.{}",
            table.primary_key()
        );

        let mut tx = self.begin(scope).await?;
        let mut query = sqlx::query_scalar::<_, Value>(&sql);
        for p in &params {
            query = query.bind(p);
        }
        let values = query.fetch_all(&mut *tx).await?;
        tx.commit().await?;

        values.into_iter().map(into_row).collect()
    }

    async fn insert(&self, scope: &Scope, table: Table, row: Row) -> Result<Row, ProviderError> {
        table.check_columns(row.keys().map(String::as_str))?;

        let sql = if row.is_empty() {
            format!("INSERT INTO {table} AS t DEFAULT VALUES RETURNING to_jsonb(t)")
        } else {
            let cols = row.keys().cloned().collect::<Vec<_>>().join(", ");
            format!(
                "INSERT INTO {table} AS t ({cols}) \
                 SELECT {cols} FROM jsonb_populate_record(NULL::{table}, $1) \
                 RETURNING to_jsonb(t)"
            )
        };

        let mut tx = self.begin(scope).await?;
        let mut query = sqlx::query_scalar::<_, Value>(&sql);
        if !row.is_empty() {
            query = query.bind(Value::Object(row));
        }
        let value = query.fetch_one(&mut *tx).await?;
        tx.commit().await?;

        into_row(value)
    }

    async fn update(
        &self,
        scope: &Scope,
        table: Table,
        filters: &[Filter],
        changes: Row,
    ) -> Result<Vec<Row>, ProviderError> {
        if changes.is_empty() {
            return Err(ProviderError::EmptyChanges);
        }
        table.check_columns(changes.keys().map(String::as_str))?;

        let assignments = changes
            .keys()
            .map(|c| format!("{c} = p.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let (where_sql, params) = where_clause(table, filters, 2)?;
        let sql = format!(
            "UPDATE {table} AS t SET {assignments} \
             FROM jsonb_populate_record(NULL::{table}, $1) AS p \
             WHERE {where_sql} RETURNING to_jsonb(t)"
        );

        let mut tx = self.begin(scope).await?;
        let mut query = sqlx::query_scalar::<_, Value>(&sql).bind(Value::Object(changes));
        for p in &params {
            query = query.bind(p);
        }
        let values = query.fetch_all(&mut *tx).await?;
        tx.commit().await?;

        values.into_iter().map(into_row).collect()
    }

    async fn delete(
        &self,
        scope: &Scope,
        table: Table,
        filters: &[Filter],
    ) -> Result<u64, ProviderError> {
        let (where_sql, params) = where_clause(table, filters, 1)?;
        let sql = format!("DELETE FROM {table} AS t WHERE {where_sql}");

        let mut tx = self.begin(scope).await?;
        let mut query = sqlx::query(&sql);
        for p in &params {
            query = query.bind(p);
        }
        let result = query.execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }
}

impl From<sqlx::Error> for ProviderError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ProviderError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ProviderError::Conflict(db.message().to_string())
            }
            other => ProviderError::Database(other.to_string()),
        }
    }
}
