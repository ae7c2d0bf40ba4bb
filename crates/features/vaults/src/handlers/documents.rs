use super::guarded;
use crate::Vaults;
use crate::boundary::Target;
use crate::error::{VaultError, VaultErrorExt};
use crate::models::*;
use crate::ownership::{insert_failed, not_found_message};
use crate::validate;
use axum::Json;
use axum::body::Body;
use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{Multipart, Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use dfort_derive::api_handler;
use dfort_domain::audit::{AuditAction, ResourceKind, ResourceRef};
use dfort_domain::constants::{DOCUMENTS_TAG, HEADER_AUTH_TAG, HEADER_IV};
use dfort_domain::records::DocumentRecord;
use dfort_identity::Authenticated;
use dfort_identity::models::MessageResponse;
use dfort_kernel::safe_nanoid;
use dfort_kernel::server::{ApiError, ApiResult, ApiState, RequesterContext};
use dfort_storage::StorageError;
use std::fmt::Write as _;
use tracing::warn;

const MISSING_FIELDS: &str = "Missing required fields: vaultId, iv, authTag, file.";
const FILE_MISSING: &str = "File not found on server.";
const OCTET_STREAM: &str = "application/octet-stream";
const DEFAULT_FILE_NAME: &str = "document";
const MAX_FILE_NAME: usize = 255;

fn document_not_found() -> ApiError {
    ApiError::not_found(not_found_message(ResourceKind::Document))
}

fn too_large(limit: usize) -> ApiError {
    ApiError::validation(format!("File exceeds the maximum upload size of {limit} bytes."))
}

fn multipart_error(err: &MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(limit)
    } else {
        ApiError::Validation {
            message: MISSING_FIELDS.into(),
            context: Some(err.body_text().into()),
        }
    }
}

// --- Multipart form ---

#[derive(Debug)]
struct UploadedFile {
    name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct UploadForm {
    vault_id: Option<String>,
    iv: Option<String>,
    auth_tag: Option<String>,
    file: Option<UploadedFile>,
}

#[derive(Debug)]
struct Upload {
    vault_id: String,
    iv: String,
    auth_tag: String,
    file: UploadedFile,
}

impl UploadForm {
    async fn read(mut multipart: Multipart, limit: usize) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) =
            multipart.next_field().await.map_err(|e| multipart_error(&e, limit))?
        {
            let name = field.name().unwrap_or_default().to_owned();
            match name.as_str() {
                "file" => form.file = Some(read_file(field, limit).await?),
                "vaultId" | "iv" | "authTag" => {
                    let value = field.text().await.map_err(|e| multipart_error(&e, limit))?;
                    let value = Some(value.trim().to_owned()).filter(|v| !v.is_empty());
                    match name.as_str() {
                        "vaultId" => form.vault_id = value,
                        "iv" => form.iv = value,
                        _ => form.auth_tag = value,
                    }
                },
                _ => {},
            }
        }

        Ok(form)
    }

    fn complete(self) -> Result<Upload, ApiError> {
        let (Some(vault_id), Some(iv), Some(auth_tag), Some(file)) =
            (self.vault_id, self.iv, self.auth_tag, self.file)
        else {
            return Err(ApiError::validation(MISSING_FIELDS));
        };
        validate::integrity_field(&iv, "iv")?;
        validate::integrity_field(&auth_tag, "authTag")?;

        Ok(Upload { vault_id, iv, auth_tag, file })
    }
}

/// Buffers the file part, refusing it as soon as it outgrows `limit`.
async fn read_file(mut field: Field<'_>, limit: usize) -> Result<UploadedFile, ApiError> {
    let name = sanitize_file_name(field.file_name().unwrap_or_default());
    let mime_type = field
        .content_type()
        .filter(|value| HeaderValue::from_str(value).is_ok())
        .unwrap_or(OCTET_STREAM)
        .to_owned();

    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(&e, limit))? {
        if bytes.len() + chunk.len() > limit {
            return Err(too_large(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(UploadedFile { name, mime_type, bytes })
}

/// Keeps the last path segment, drops control characters and bounds the length.
pub(crate) fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let clean: String =
        base.chars().filter(|c| !c.is_control()).take(MAX_FILE_NAME).collect::<String>();
    let clean = clean.trim();

    if clean.is_empty() || clean == "." || clean == ".." {
        DEFAULT_FILE_NAME.to_owned()
    } else {
        clean.to_owned()
    }
}

/// `attachment` disposition with an ASCII fallback name and the exact UTF-8 name (RFC 6266).
pub(crate) fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' { c } else { '_' })
        .collect();

    let mut encoded = String::with_capacity(file_name.len());
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

fn header(value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value).map_err(|e| ApiError::Internal {
        message: e.to_string().into(),
        context: Some("download headers".into()),
    })
}

// --- Handlers ---

#[api_handler(
    get,
    path = "/documents/vault/{vault_id}",
    params(("vault_id" = String, Path, description = "Vault id")),
    responses(
        (
            status = OK,
            description = "Document metadata in the vault, newest first",
            body = DocumentListResponse
        ),
        (status = NOT_FOUND, description = "Vault not found."),
    ),
    security(("bearer" = [])),
    tag = DOCUMENTS_TAG,
)]
pub(crate) async fn list_documents(
    State(state): State<ApiState>,
    Authenticated(user): Authenticated,
    requester: RequesterContext,
    Path(vault_id): Path<String>,
) -> ApiResult<Json<DocumentListResponse>> {
    let vaults = state.try_get_slice::<Vaults>()?;
    let database = &vaults.database;
    let audited = ResourceRef::existing(ResourceKind::Vault, vault_id.as_str());
    let call = guarded(&user, &requester, AuditAction::DocumentList, audited);

    vaults
        .boundary
        .run(call, Target::vault(&vault_id), move |handle| async move {
            let documents = database
                .documents_in_vault(&handle.vault_id)
                .into_iter()
                .map(DocumentSummary::from)
                .collect();
            Ok(Json(DocumentListResponse { success: true, documents }))
        })
        .await
}

#[api_handler(
    post,
    path = "/documents/upload",
    request_body(content = UploadDocumentForm, content_type = "multipart/form-data"),
    responses(
        (status = CREATED, description = "Encrypted file stored", body = DocumentResponse),
        (status = BAD_REQUEST, description = "Missing fields or file too large"),
        (status = NOT_FOUND, description = "Vault not found."),
    ),
    security(("bearer" = [])),
    tag = DOCUMENTS_TAG,
)]
pub(crate) async fn upload_document(
    State(state): State<ApiState>,
    Authenticated(user): Authenticated,
    requester: RequesterContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<DocumentResponse>)> {
    let vaults = state.try_get_slice::<Vaults>()?;
    let (database, storage) = (&vaults.database, &vaults.storage);
    let audited = ResourceRef::pending(ResourceKind::Document);
    let call = guarded(&user, &requester, AuditAction::DocumentUpload, audited);

    let form = match multipart {
        Ok(multipart) => UploadForm::read(multipart, vaults.upload_limit).await,
        Err(rejection) => Err(ApiError::Validation {
            message: MISSING_FIELDS.into(),
            context: Some(rejection.body_text().into()),
        }),
    };
    let Upload { vault_id, iv, auth_tag, file } = match form.and_then(UploadForm::complete) {
        Ok(upload) => upload,
        Err(err) => return Err(vaults.boundary.refuse(call, err)),
    };

    vaults
        .boundary
        .run(call, Target::vault(&vault_id), move |handle| async move {
            let blob_key = safe_nanoid!();
            let namespace = storage.namespace(&handle.vault_id).context("document upload")?;
            namespace.write(&blob_key, &file.bytes).await.context("document upload")?;

            let document = DocumentRecord {
                id: safe_nanoid!(),
                vault_id: handle.vault_id,
                file_name: file.name,
                mime_type: file.mime_type,
                size_bytes: file.bytes.len() as u64,
                blob_key,
                iv,
                auth_tag,
                created_at: Utc::now(),
            };

            // The vault may have been deleted while the blob was being written.
            if let Err(err) = database.insert_document(document.clone()) {
                if let Err(cleanup) = namespace.delete(&document.blob_key).await {
                    warn!(error = %cleanup, "Orphaned document blob");
                }
                return Err(insert_failed(err, "document upload").into());
            }

            let body = DocumentResponse { success: true, document: document.into() };
            Ok::<_, ApiError>((StatusCode::CREATED, Json(body)))
        })
        .await
}

#[api_handler(
    get,
    path = "/documents/{id}/download",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (
            status = OK,
            description = "Raw ciphertext; iv and tag in X-IV and X-AuthTag",
            content_type = "application/octet-stream"
        ),
        (status = NOT_FOUND, description = "Document not found."),
    ),
    security(("bearer" = [])),
    tag = DOCUMENTS_TAG,
)]
pub(crate) async fn download_document(
    State(state): State<ApiState>,
    Authenticated(user): Authenticated,
    requester: RequesterContext,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let vaults = state.try_get_slice::<Vaults>()?;
    let (database, storage) = (&vaults.database, &vaults.storage);
    let audited = ResourceRef::existing(ResourceKind::Document, id.as_str());
    let call = guarded(&user, &requester, AuditAction::DocumentDownload, audited);

    vaults
        .boundary
        .run(call, Target::document(&id), move |handle| async move {
            let document = database.find_document(&handle.id).ok_or_else(document_not_found)?;

            let namespace = storage.namespace(&document.vault_id).context("document download")?;
            let bytes = match namespace.read(&document.blob_key).await {
                Ok(bytes) => bytes,
                Err(StorageError::BlobNotFound { .. }) => {
                    warn!(document = %document.id, "Document blob missing");
                    return Err(ApiError::not_found(FILE_MISSING));
                },
                Err(err) => return Err(VaultError::from(err).into()),
            };

            let headers = [
                (CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM)),
                (CONTENT_LENGTH, HeaderValue::from(bytes.len())),
                (CONTENT_DISPOSITION, header(&content_disposition(&document.file_name))?),
                (HeaderName::from_static(HEADER_IV), header(&document.iv)?),
                (HeaderName::from_static(HEADER_AUTH_TAG), header(&document.auth_tag)?),
            ];
            Ok::<_, ApiError>((headers, Body::from(bytes)).into_response())
        })
        .await
}

#[api_handler(
    delete,
    path = "/documents/{id}",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = OK, description = "Metadata and blob deleted", body = MessageResponse),
        (status = NOT_FOUND, description = "Document not found."),
    ),
    security(("bearer" = [])),
    tag = DOCUMENTS_TAG,
)]
pub(crate) async fn delete_document(
    State(state): State<ApiState>,
    Authenticated(user): Authenticated,
    requester: RequesterContext,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let vaults = state.try_get_slice::<Vaults>()?;
    let (database, storage) = (&vaults.database, &vaults.storage);
    let audited = ResourceRef::existing(ResourceKind::Document, id.as_str());
    let call = guarded(&user, &requester, AuditAction::DocumentDelete, audited);

    vaults
        .boundary
        .run(call, Target::document(&id), move |handle| async move {
            let document = database.remove_document(&handle.id).ok_or_else(document_not_found)?;

            // Metadata goes first: a leftover blob is unreachable, a leftover record is not.
            let removed = match storage.namespace(&document.vault_id) {
                Ok(namespace) => namespace.delete(&document.blob_key).await,
                Err(err) => Err(err),
            };
            match removed {
                Ok(()) | Err(StorageError::BlobNotFound { .. }) => {},
                Err(err) => {
                    warn!(document = %document.id, error = %err, "Document blob left behind");
                },
            }

            let message = "Document deleted.".to_owned();
            Ok::<_, ApiError>(Json(MessageResponse { success: true, message }))
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_lose_paths_and_control_characters() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\a\\tax.pdf"), "tax.pdf");
        assert_eq!(sanitize_file_name("evil\r\nname.txt"), "evilname.txt");
        assert_eq!(sanitize_file_name(""), "document");
        assert_eq!(sanitize_file_name(".."), "document");
        assert_eq!(sanitize_file_name(&"a".repeat(400)).len(), MAX_FILE_NAME);
    }

    #[test]
    fn disposition_carries_ascii_fallback_and_utf8_name() {
        assert_eq!(
            content_disposition("report 2024.pdf"),
            "attachment; filename=\"report 2024.pdf\"; filename*=UTF-8''report%202024.pdf"
        );
        assert_eq!(
            content_disposition("résumé\".txt"),
            "attachment; filename=\"r_sum__.txt\"; filename*=UTF-8''r%C3%A9sum%C3%A9%22.txt"
        );
        assert!(HeaderValue::from_str(&content_disposition("日本.txt")).is_ok());
    }
}
