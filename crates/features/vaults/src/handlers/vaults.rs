use crate::Vaults;
use crate::error::VaultErrorExt;
use crate::models::*;
use crate::ownership::not_found_message;
use crate::validate;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use dfort_derive::api_handler;
use dfort_domain::audit::ResourceKind;
use dfort_domain::constants::VAULTS_TAG;
use dfort_domain::records::VaultRecord;
use dfort_identity::Authenticated;
use dfort_identity::models::MessageResponse;
use dfort_kernel::safe_nanoid;
use dfort_kernel::server::{ApiError, ApiJson, ApiResult, ApiState};
use tracing::{instrument, warn};

#[api_handler(
    get,
    path = "/vaults",
    responses(
        (status = OK, description = "The caller's vaults, newest first", body = VaultListResponse),
        (status = UNAUTHORIZED, description = "Missing or rejected token"),
    ),
    security(("bearer" = [])),
    tag = VAULTS_TAG,
)]
pub(crate) async fn list_vaults(
    State(state): State<ApiState>,
    Authenticated(user): Authenticated,
) -> ApiResult<Json<VaultListResponse>> {
    let vaults = state.try_get_slice::<Vaults>()?;
    let list = vaults
        .database
        .vaults_for_user(&user.user_id)
        .into_iter()
        .map(|(vault, counts)| VaultView::new(vault, Some(counts)))
        .collect();

    Ok(Json(VaultListResponse { success: true, vaults: list }))
}

#[api_handler(
    post,
    path = "/vaults",
    request_body = CreateVaultRequest,
    responses(
        (status = CREATED, description = "Vault created", body = VaultResponse),
        (status = BAD_REQUEST, description = "Name, description or style out of bounds"),
        (status = UNAUTHORIZED, description = "Missing or rejected token"),
    ),
    security(("bearer" = [])),
    tag = VAULTS_TAG,
)]
#[instrument(skip_all, fields(user = %user.user_id))]
pub(crate) async fn create_vault(
    State(state): State<ApiState>,
    Authenticated(user): Authenticated,
    ApiJson(req): ApiJson<CreateVaultRequest>,
) -> ApiResult<(StatusCode, Json<VaultResponse>)> {
    let vaults = state.try_get_slice::<Vaults>()?;

    let now = Utc::now();
    let vault = VaultRecord {
        id: safe_nanoid!(),
        user_id: user.user_id,
        name: validate::vault_name(&req.name)?,
        description: validate::description(req.description)?,
        icon: validate::style(req.icon, "icon")?,
        color: validate::style(req.color, "color")?,
        created_at: now,
        updated_at: now,
    };
    vaults.database.insert_vault(vault.clone()).context("create vault")?;

    let vault = VaultView::new(vault, None);
    Ok((StatusCode::CREATED, Json(VaultResponse { success: true, vault })))
}

#[api_handler(
    get,
    path = "/vaults/{id}",
    params(("id" = String, Path, description = "Vault id")),
    responses(
        (status = OK, description = "One vault with its counts", body = VaultResponse),
        (status = NOT_FOUND, description = "Vault not found."),
    ),
    security(("bearer" = [])),
    tag = VAULTS_TAG,
)]
pub(crate) async fn get_vault(
    State(state): State<ApiState>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
) -> ApiResult<Json<VaultResponse>> {
    let vaults = state.try_get_slice::<Vaults>()?;
    let handle =
        vaults.boundary.ownership().assert_owns(&id, ResourceKind::Vault, &user.user_id).await?;

    let vault = vaults
        .database
        .find_vault(&handle.id)
        .ok_or_else(|| ApiError::not_found(not_found_message(ResourceKind::Vault)))?;
    let counts = vaults.database.vault_counts(&handle.id);

    Ok(Json(VaultResponse { success: true, vault: VaultView::new(vault, Some(counts)) }))
}

#[api_handler(
    put,
    path = "/vaults/{id}",
    params(("id" = String, Path, description = "Vault id")),
    request_body = UpdateVaultRequest,
    responses(
        (status = OK, description = "Vault updated", body = VaultResponse),
        (status = BAD_REQUEST, description = "Field out of bounds"),
        (status = NOT_FOUND, description = "Vault not found."),
    ),
    security(("bearer" = [])),
    tag = VAULTS_TAG,
)]
#[instrument(skip_all, fields(user = %user.user_id, vault = %id))]
pub(crate) async fn update_vault(
    State(state): State<ApiState>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateVaultRequest>,
) -> ApiResult<Json<VaultResponse>> {
    let vaults = state.try_get_slice::<Vaults>()?;
    let handle =
        vaults.boundary.ownership().assert_owns(&id, ResourceKind::Vault, &user.user_id).await?;

    let name = req.name.as_deref().map(validate::vault_name).transpose()?;
    let description = validate::description(req.description)?;
    let icon = validate::style(req.icon, "icon")?;
    let color = validate::style(req.color, "color")?;

    let vault = vaults
        .database
        .update_vault(&handle.id, |vault| {
            if let Some(name) = name {
                vault.name = name;
            }
            if description.is_some() {
                vault.description = description;
            }
            if icon.is_some() {
                vault.icon = icon;
            }
            if color.is_some() {
                vault.color = color;
            }
            vault.updated_at = Utc::now();
        })
        .ok_or_else(|| ApiError::not_found(not_found_message(ResourceKind::Vault)))?;

    Ok(Json(VaultResponse { success: true, vault: VaultView::new(vault, None) }))
}

#[api_handler(
    delete,
    path = "/vaults/{id}",
    params(("id" = String, Path, description = "Vault id")),
    responses(
        (status = OK, description = "Vault and everything in it deleted", body = MessageResponse),
        (status = NOT_FOUND, description = "Vault not found."),
    ),
    security(("bearer" = [])),
    tag = VAULTS_TAG,
)]
#[instrument(skip_all, fields(user = %user.user_id, vault = %id))]
pub(crate) async fn delete_vault(
    State(state): State<ApiState>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let vaults = state.try_get_slice::<Vaults>()?;
    let handle =
        vaults.boundary.ownership().assert_owns(&id, ResourceKind::Vault, &user.user_id).await?;

    let removed = vaults
        .database
        .remove_vault(&handle.id)
        .ok_or_else(|| ApiError::not_found(not_found_message(ResourceKind::Vault)))?;

    // Blobs live in a namespace named after the vault; dropping it removes them all at once.
    if let Err(err) = vaults.storage.remove_namespace(&removed.vault.id).await {
        warn!(error = %err, blobs = removed.blob_keys.len(), "Vault blobs left behind");
    }

    Ok(Json(MessageResponse { success: true, message: "Vault deleted.".to_owned() }))
}
