use super::guarded;
use crate::Vaults;
use crate::boundary::Target;
use crate::models::*;
use crate::ownership::{insert_failed, not_found_message};
use crate::validate;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use dfort_derive::api_handler;
use dfort_domain::audit::{AuditAction, ResourceKind, ResourceRef};
use dfort_domain::constants::CREDENTIALS_TAG;
use dfort_domain::records::CredentialRecord;
use dfort_identity::Authenticated;
use dfort_identity::models::MessageResponse;
use dfort_kernel::safe_nanoid;
use dfort_kernel::server::{ApiError, ApiJson, ApiResult, ApiState, RequesterContext};

fn credential_not_found() -> ApiError {
    ApiError::not_found(not_found_message(ResourceKind::Credential))
}

#[api_handler(
    get,
    path = "/credentials/vault/{vault_id}",
    params(("vault_id" = String, Path, description = "Vault id")),
    responses(
        (
            status = OK,
            description = "Sealed credentials in the vault, newest first",
            body = CredentialListResponse
        ),
        (status = NOT_FOUND, description = "Vault not found."),
    ),
    security(("bearer" = [])),
    tag = CREDENTIALS_TAG,
)]
pub(crate) async fn list_credentials(
    State(state): State<ApiState>,
    Authenticated(user): Authenticated,
    requester: RequesterContext,
    Path(vault_id): Path<String>,
) -> ApiResult<Json<CredentialListResponse>> {
    let vaults = state.try_get_slice::<Vaults>()?;
    let database = &vaults.database;
    let audited = ResourceRef::existing(ResourceKind::Vault, vault_id.as_str());
    let call = guarded(&user, &requester, AuditAction::CredentialList, audited);

    vaults
        .boundary
        .run(call, Target::vault(&vault_id), move |handle| async move {
            let credentials = database
                .credentials_in_vault(&handle.vault_id)
                .into_iter()
                .map(CredentialView::from)
                .collect();
            Ok(Json(CredentialListResponse { success: true, credentials }))
        })
        .await
}

#[api_handler(
    post,
    path = "/credentials",
    request_body = CreateCredentialRequest,
    responses(
        (status = CREATED, description = "Sealed credential stored", body = CredentialResponse),
        (status = BAD_REQUEST, description = "Malformed body or missing integrity metadata"),
        (status = NOT_FOUND, description = "Vault not found."),
    ),
    security(("bearer" = [])),
    tag = CREDENTIALS_TAG,
)]
pub(crate) async fn create_credential(
    State(state): State<ApiState>,
    Authenticated(user): Authenticated,
    requester: RequesterContext,
    payload: Result<ApiJson<CreateCredentialRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<CredentialResponse>)> {
    let vaults = state.try_get_slice::<Vaults>()?;
    let database = &vaults.database;
    let audited = ResourceRef::pending(ResourceKind::Credential);
    let call = guarded(&user, &requester, AuditAction::CredentialCreate, audited);

    let req = match payload {
        Ok(ApiJson(req)) => req,
        Err(err) => return Err(vaults.boundary.refuse(call, err)),
    };
    let vault_id = req.vault_id.clone();

    vaults
        .boundary
        .run(call, Target::vault(&vault_id), move |handle| async move {
            let label = validate::label(&req.label)?;
            let url = validate::url(req.url.clone())?;
            let cipher = validate::sealed_fields(req)?;

            let now = Utc::now();
            let credential = CredentialRecord {
                id: safe_nanoid!(),
                vault_id: handle.vault_id,
                label,
                url,
                cipher,
                created_at: now,
                updated_at: now,
            };
            database
                .insert_credential(credential.clone())
                .map_err(|err| insert_failed(err, "create credential"))?;

            let body = CredentialResponse { success: true, credential: credential.into() };
            Ok::<_, ApiError>((StatusCode::CREATED, Json(body)))
        })
        .await
}

#[api_handler(
    put,
    path = "/credentials/{id}",
    params(("id" = String, Path, description = "Credential id")),
    request_body = UpdateCredentialRequest,
    responses(
        (status = OK, description = "Credential updated", body = CredentialResponse),
        (status = BAD_REQUEST, description = "Malformed body or incomplete reseal"),
        (status = NOT_FOUND, description = "Credential not found."),
    ),
    security(("bearer" = [])),
    tag = CREDENTIALS_TAG,
)]
pub(crate) async fn update_credential(
    State(state): State<ApiState>,
    Authenticated(user): Authenticated,
    requester: RequesterContext,
    Path(id): Path<String>,
    payload: Result<ApiJson<UpdateCredentialRequest>, ApiError>,
) -> ApiResult<Json<CredentialResponse>> {
    let vaults = state.try_get_slice::<Vaults>()?;
    let database = &vaults.database;
    let audited = ResourceRef::existing(ResourceKind::Credential, id.as_str());
    let call = guarded(&user, &requester, AuditAction::CredentialUpdate, audited);

    let req = match payload {
        Ok(ApiJson(req)) => req,
        Err(err) => return Err(vaults.boundary.refuse(call, err)),
    };

    vaults
        .boundary
        .run(call, Target::credential(&id), move |handle| async move {
            let patch = validate::credential_patch(req)?;

            let credential = database
                .update_credential(&handle.id, |credential| {
                    if let Some(label) = patch.label {
                        credential.label = label;
                    }
                    if let Some(url) = patch.url {
                        credential.url = url;
                    }
                    // iv, tag and ciphertext are swapped as one unit.
                    if let Some(cipher) = patch.cipher {
                        credential.cipher = cipher;
                    }
                    credential.updated_at = Utc::now();
                })
                .ok_or_else(credential_not_found)?;

            let credential = CredentialView::from(credential);
            Ok::<_, ApiError>(Json(CredentialResponse { success: true, credential }))
        })
        .await
}

#[api_handler(
    delete,
    path = "/credentials/{id}",
    params(("id" = String, Path, description = "Credential id")),
    responses(
        (status = OK, description = "Credential deleted", body = MessageResponse),
        (status = NOT_FOUND, description = "Credential not found."),
    ),
    security(("bearer" = [])),
    tag = CREDENTIALS_TAG,
)]
pub(crate) async fn delete_credential(
    State(state): State<ApiState>,
    Authenticated(user): Authenticated,
    requester: RequesterContext,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let vaults = state.try_get_slice::<Vaults>()?;
    let database = &vaults.database;
    let audited = ResourceRef::existing(ResourceKind::Credential, id.as_str());
    let call = guarded(&user, &requester, AuditAction::CredentialDelete, audited);

    vaults
        .boundary
        .run(call, Target::credential(&id), move |handle| async move {
            database.remove_credential(&handle.id).ok_or_else(credential_not_found)?;
            let message = "Credential deleted.".to_owned();
            Ok::<_, ApiError>(Json(MessageResponse { success: true, message }))
        })
        .await
}
