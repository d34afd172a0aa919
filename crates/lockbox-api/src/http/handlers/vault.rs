//! Vault item endpoint handlers for the REST API.
//!
//! Items are always scoped to the authenticated owner. Passwords leave the
//! server only through `POST /items/{id}/reveal`; every other response masks them.

use axum::Json;
use axum::extract::{Path, Query, State};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use lockbox_types::vault::{
    CreateVaultItemRequest, UpdateVaultItemRequest, VaultItemId, VaultItemView,
};

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthenticatedOwner;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

/// Body of `POST /items`.
#[derive(Debug, Deserialize)]
pub struct CreateItemBody {
    #[serde(flatten)]
    pub item: CreateVaultItemRequest,
    pub master_password: SecretString,
}

/// Body of `PUT /items/{id}`. `master_password` is only needed with `password`.
#[derive(Debug, Deserialize)]
pub struct UpdateItemBody {
    #[serde(flatten)]
    pub changes: UpdateVaultItemRequest,
    #[serde(default)]
    pub master_password: Option<SecretString>,
}

/// Query of `GET /items`.
#[derive(Debug, Default, Deserialize)]
pub struct ListItemsQuery {
    /// Case-insensitive search over title, username and url.
    #[serde(default)]
    pub q: Option<String>,
}

/// Body carrying only the master password.
#[derive(Debug, Deserialize)]
pub struct MasterPasswordBody {
    pub master_password: SecretString,
}

#[derive(Debug, Serialize)]
pub struct RevealedPassword {
    pub id: VaultItemId,
    pub password: String,
}

fn parse_item_id(raw: &str) -> Result<VaultItemId, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("'{raw}' is not a valid item id")))
}

fn item_link(id: &VaultItemId) -> String {
    format!("/api/v1/items/{id}")
}

/// GET /api/v1/items - List the owner's items, newest first, optionally
/// filtered by `?q=`.
pub async fn list_items(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    Query(query): Query<ListItemsQuery>,
) -> Result<Json<ApiResponse<Vec<VaultItemView>>>, AppError> {
    let clock = RequestClock::start();

    let items = state
        .vault_service
        .list_items(&owner.id, query.q.as_deref())
        .await?;
    let views: Vec<VaultItemView> = items.iter().map(VaultItemView::from).collect();

    Ok(Json(clock.respond(views).with_link("self", "/api/v1/items")))
}

/// POST /api/v1/items - Create an item. Without `password`, one is generated.
pub async fn create_item(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    Json(body): Json<CreateItemBody>,
) -> Result<Json<ApiResponse<VaultItemView>>, AppError> {
    let clock = RequestClock::start();

    let item = state
        .vault_service
        .create_item(&owner.id, body.item, body.master_password)
        .await?;

    let link = item_link(&item.id);
    Ok(Json(
        clock
            .respond(VaultItemView::from(&item))
            .with_link("self", &link)
            .with_link("reveal", &format!("{link}/reveal")),
    ))
}

/// GET /api/v1/items/{id} - Get one item, password masked.
pub async fn get_item(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<VaultItemView>>, AppError> {
    let clock = RequestClock::start();
    let id = parse_item_id(&id)?;

    let item = state.vault_service.get_item(&owner.id, &id).await?;

    let link = item_link(&item.id);
    Ok(Json(
        clock
            .respond(VaultItemView::from(&item))
            .with_link("self", &link)
            .with_link("reveal", &format!("{link}/reveal")),
    ))
}

/// PUT /api/v1/items/{id} - Update fields; a new password is re-encrypted.
pub async fn update_item(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    Path(id): Path<String>,
    Json(body): Json<UpdateItemBody>,
) -> Result<Json<ApiResponse<VaultItemView>>, AppError> {
    let clock = RequestClock::start();
    let id = parse_item_id(&id)?;

    if body.changes.is_empty() {
        return Err(AppError::Validation("no fields to update".to_string()));
    }

    let item = state
        .vault_service
        .update_item(&owner.id, &id, body.changes, body.master_password)
        .await?;

    Ok(Json(
        clock
            .respond(VaultItemView::from(&item))
            .with_link("self", &item_link(&item.id)),
    ))
}

/// DELETE /api/v1/items/{id} - Permanently delete an item.
pub async fn delete_item(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let clock = RequestClock::start();
    let id = parse_item_id(&id)?;

    state.vault_service.delete_item(&owner.id, &id).await?;

    Ok(Json(
        clock.respond(serde_json::json!({"deleted": true, "id": id})),
    ))
}

/// POST /api/v1/items/{id}/reveal - Decrypt an item's password.
///
/// The response is marked `no-store` by the router; nothing is cached server-side.
pub async fn reveal_password(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    Path(id): Path<String>,
    Json(body): Json<MasterPasswordBody>,
) -> Result<Json<ApiResponse<RevealedPassword>>, AppError> {
    let clock = RequestClock::start();
    let id = parse_item_id(&id)?;

    let password = state
        .vault_service
        .reveal_password(&owner.id, &id, body.master_password)
        .await?;

    Ok(Json(clock.respond(RevealedPassword {
        id,
        password: password.expose_secret().to_string(),
    })))
}
