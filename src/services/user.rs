use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::provider::{DataProvider, Scope, Table};
use crate::services::crud::{ChangeSet, Crud, Resource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub profile_photo_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

pub struct Users;

impl Resource for Users {
    const TABLE: Table = Table::Users;
    type Record = User;
}

fn crud(provider: &dyn DataProvider) -> Crud<'_, Users> {
    Crud::new(provider, Scope::Service)
}

pub async fn find(provider: &dyn DataProvider, id: Uuid) -> Result<Option<User>, AppError> {
    match crud(provider).get_by_id(id.to_string()).await {
        Ok(user) => Ok(Some(user)),
        Err(AppError::NotFound) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Create the user on first sign-in, refresh email and name afterwards.
pub async fn upsert(
    provider: &dyn DataProvider,
    id: Uuid,
    email: Option<&str>,
    full_name: Option<&str>,
) -> Result<User, AppError> {
    let changes = ChangeSet::new()
        .text("email", email)
        .text("full_name", full_name);

    if find(provider, id).await?.is_none() {
        let row = changes.value("id", Some(&id)).into_row();
        log::info!("Registering user {id} on first sign-in");
        return crud(provider).add(row).await;
    }
    if changes.is_empty() {
        return crud(provider).get_by_id(id.to_string()).await;
    }
    crud(provider).edit(id.to_string(), changes.finish()?).await
}

/// Point the user's profile at a new photo, or clear it with `None`.
pub async fn set_photo_url(
    provider: &dyn DataProvider,
    id: Uuid,
    url: Option<&str>,
) -> Result<User, AppError> {
    let value = url.map_or(Value::Null, Value::from);
    let changes = ChangeSet::new().force("profile_photo_url", value).finish()?;
    crud(provider).edit(id.to_string(), changes).await
}
