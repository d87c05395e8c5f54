use rand::Rng;

use crate::auth::principal::Principal;
use crate::errors::AppError;
use crate::provider::DataProvider;
use crate::services::user::{self, User};
use crate::storage::ObjectStore;

/// File extension for an accepted image content type.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    match mime.to_ascii_lowercase().as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Random object name so browsers never serve a stale cached avatar.
fn object_path(owner: &Principal, ext: &str) -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 8] = rng.random();
    format!("avatars/{}/{}.{ext}", owner.id, hex::encode(bytes))
}

async fn remove_previous(store: &dyn ObjectStore, previous: Option<&str>) {
    let Some(path) = previous.and_then(|url| store.path_from_url(url)) else {
        return;
    };
    if let Err(e) = store.remove(&path).await {
        log::warn!("Could not remove previous profile photo {path}: {e}");
    }
}

pub async fn upload(
    provider: &dyn DataProvider,
    store: &dyn ObjectStore,
    principal: &Principal,
    content_type: &str,
    bytes: &[u8],
    max_bytes: usize,
) -> Result<User, AppError> {
    let ext = extension_for(content_type).ok_or_else(|| {
        AppError::InvalidArgument("Profile photos must be PNG, JPEG or WebP".to_string())
    })?;
    if bytes.is_empty() {
        return Err(AppError::InvalidArgument("Empty upload".to_string()));
    }
    if bytes.len() > max_bytes {
        return Err(AppError::InvalidArgument(format!(
            "Profile photos must be at most {max_bytes} bytes"
        )));
    }

    let current = user::find(provider, principal.id)
        .await?
        .ok_or(AppError::NotFound)?;

    let path = object_path(principal, ext);
    store.put(&path, bytes).await?;
    let url = store.public_url(&path);

    let updated = match user::set_photo_url(provider, principal.id, Some(&url)).await {
        Ok(u) => u,
        Err(e) => {
            remove_previous(store, Some(&url)).await;
            return Err(e);
        }
    };
    remove_previous(store, current.profile_photo_url.as_deref()).await;

    log::info!("User {} uploaded profile photo {path}", principal.id);
    Ok(updated)
}

pub async fn remove(
    provider: &dyn DataProvider,
    store: &dyn ObjectStore,
    principal: &Principal,
) -> Result<User, AppError> {
    let current = user::find(provider, principal.id)
        .await?
        .ok_or(AppError::NotFound)?;
    let updated = user::set_photo_url(provider, principal.id, None).await?;
    remove_previous(store, current.profile_photo_url.as_deref()).await;
    Ok(updated)
}
