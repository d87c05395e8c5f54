//! Uniform list / get / add / edit / delete over one provider table.
//!
//! Each resource module supplies its record type and turns request payloads
//! into rows; this module owns the shared contract:
//! - `edit` with no effective fields fails `InvalidArgument` before any call;
//! - `edit` or `delete` matching nothing fails `NotFound`.

use std::marker::PhantomData;

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::provider::{DataProvider, Filter, Row, Scope, Table};

/// A table whose rows decode into `Record`.
pub trait Resource {
    const TABLE: Table;
    type Record: DeserializeOwned;
}

pub fn decode<T: DeserializeOwned>(row: Row) -> Result<T, AppError> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

pub struct Crud<'a, R: Resource> {
    provider: &'a dyn DataProvider,
    scope: Scope,
    _resource: PhantomData<R>,
}

impl<'a, R: Resource> Crud<'a, R> {
    pub fn new(provider: &'a dyn DataProvider, scope: Scope) -> Self {
        Self {
            provider,
            scope,
            _resource: PhantomData,
        }
    }

    fn by_id(id: impl Into<Value>) -> [Filter; 1] {
        [Filter::eq(R::TABLE.primary_key(), id)]
    }

    pub async fn list(&self) -> Result<Vec<R::Record>, AppError> {
        self.find(&[]).await
    }

    pub async fn find(&self, filters: &[Filter]) -> Result<Vec<R::Record>, AppError> {
        self.provider
            .select(&self.scope, R::TABLE, filters)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub async fn get_by_id(&self, id: impl Into<Value>) -> Result<R::Record, AppError> {
        let rows = self
            .provider
            .select(&self.scope, R::TABLE, &Self::by_id(id))
            .await?;
        rows.into_iter().next().map(decode).ok_or(AppError::NotFound)?
    }

    pub async fn add(&self, row: Row) -> Result<R::Record, AppError> {
        let created = self.provider.insert(&self.scope, R::TABLE, row).await?;
        decode(created)
    }

    pub async fn edit(&self, id: impl Into<Value>, changes: Row) -> Result<R::Record, AppError> {
        if changes.is_empty() {
            return Err(AppError::InvalidArgument("No fields to update".to_string()));
        }
        let updated = self
            .provider
            .update(&self.scope, R::TABLE, &Self::by_id(id), changes)
            .await?;
        updated.into_iter().next().map(decode).ok_or(AppError::NotFound)?
    }

    pub async fn delete(&self, id: impl Into<Value>) -> Result<(), AppError> {
        let removed = self
            .provider
            .delete(&self.scope, R::TABLE, &Self::by_id(id))
            .await?;
        if removed == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

/// Builder for edit payloads: only present, non-empty fields are kept.
#[derive(Debug, Default)]
pub struct ChangeSet(Row);

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a text field when present and not blank.
    pub fn text(mut self, column: &str, value: Option<&str>) -> Self {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.0.insert(column.to_string(), Value::from(v));
        }
        self
    }

    /// Keep any serialisable field when present.
    pub fn value<T: Serialize>(mut self, column: &str, value: Option<&T>) -> Self {
        if let Some(v) = value.and_then(|v| serde_json::to_value(v).ok()) {
            if !v.is_null() {
                self.0.insert(column.to_string(), v);
            }
        }
        self
    }

    /// Set a column to an explicit value, including null.
    pub fn force(mut self, column: &str, value: Value) -> Self {
        self.0.insert(column.to_string(), value);
        self
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Finish the edit; an empty set is rejected.
    pub fn finish(self) -> Result<Row, AppError> {
        if self.0.is_empty() {
            return Err(AppError::InvalidArgument("No fields to update".to_string()));
        }
        Ok(self.0)
    }

    /// Finish a creation row; empty is allowed.
    pub fn into_row(self) -> Row {
        self.0
    }
}

/// Deserialize a numeric id given either as a JSON number or a numeric string.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Num(i64),
        Text(String),
    }

    match IdRepr::deserialize(deserializer)? {
        IdRepr::Num(n) => Ok(n),
        IdRepr::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format_args!("invalid id '{s}'"))),
    }
}

/// Collect validation messages into one `InvalidArgument`.
pub fn check(errors: Vec<Option<String>>) -> Result<(), AppError> {
    let messages: Vec<String> = errors.into_iter().flatten().collect();
    if messages.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidArgument(messages.join("; ")))
    }
}
