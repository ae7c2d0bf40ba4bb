//! Shape checks for client input. Ciphertext is opaque here: only presence and size are checked.

use crate::error::VaultError;
use crate::models::{CreateCredentialRequest, UpdateCredentialRequest};
use dfort_domain::records::CipherFields;

pub(crate) const MAX_VAULT_NAME: usize = 100;
pub(crate) const MAX_DESCRIPTION: usize = 500;
pub(crate) const MAX_LABEL: usize = 200;
const MAX_URL: usize = 2048;
const MAX_STYLE: usize = 64;
/// Bound for hex iv/tag strings; real values are 24 and 32 characters.
const MAX_INTEGRITY_FIELD: usize = 256;

fn char_len(value: &str) -> usize {
    value.chars().count()
}

pub(crate) fn vault_name(name: &str) -> Result<String, VaultError> {
    let name = name.trim();
    if name.is_empty() || char_len(name) > MAX_VAULT_NAME {
        return Err(VaultError::validation(format!(
            "Vault name must be between 1 and {MAX_VAULT_NAME} characters."
        )));
    }
    Ok(name.to_owned())
}

pub(crate) fn description(value: Option<String>) -> Result<Option<String>, VaultError> {
    match value {
        Some(text) if char_len(&text) > MAX_DESCRIPTION => Err(VaultError::validation(format!(
            "Description must be at most {MAX_DESCRIPTION} characters."
        ))),
        other => Ok(other),
    }
}

/// Icon and color are free-form display hints.
pub(crate) fn style(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<String>, VaultError> {
    match value {
        Some(text) if char_len(&text) > MAX_STYLE => Err(VaultError::validation(format!(
            "{field} must be at most {MAX_STYLE} characters."
        ))),
        other => Ok(other),
    }
}

pub(crate) fn label(label: &str) -> Result<String, VaultError> {
    let label = label.trim();
    if label.is_empty() || char_len(label) > MAX_LABEL {
        return Err(VaultError::validation(format!(
            "Label must be between 1 and {MAX_LABEL} characters."
        )));
    }
    Ok(label.to_owned())
}

/// `scheme://rest` with an alphabetic scheme and no whitespace.
pub(crate) fn url(value: Option<String>) -> Result<Option<String>, VaultError> {
    let Some(url) = value else { return Ok(None) };

    let valid = url.len() <= MAX_URL
        && !url.chars().any(char::is_whitespace)
        && url.split_once("://").is_some_and(|(scheme, rest)| {
            !rest.is_empty()
                && scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                && scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c))
        });

    if valid { Ok(Some(url)) } else { Err(VaultError::validation("Invalid URL.")) }
}

/// Non-empty printable ASCII, so the value can travel back in a response header.
pub(crate) fn integrity_field(value: &str, field: &'static str) -> Result<(), VaultError> {
    if value.is_empty()
        || value.len() > MAX_INTEGRITY_FIELD
        || !value.bytes().all(|b| b.is_ascii_graphic())
    {
        return Err(VaultError::validation(format!("A valid {field} is required.")));
    }
    Ok(())
}

pub(crate) fn sealed_fields(req: CreateCredentialRequest) -> Result<CipherFields, VaultError> {
    integrity_field(&req.iv, "iv")?;
    integrity_field(&req.auth_tag, "authTag")?;

    Ok(CipherFields {
        encrypted_username: req.encrypted_username,
        encrypted_password: req.encrypted_password,
        encrypted_notes: req.encrypted_notes,
        iv: req.iv,
        auth_tag: req.auth_tag,
    })
}

/// A checked partial update, ready to apply.
#[derive(Debug, Default)]
pub(crate) struct CredentialPatch {
    pub label: Option<String>,
    pub url: Option<Option<String>>,
    pub cipher: Option<CipherFields>,
}

const RESEAL_REQUIRED: &str =
    "Changing encrypted fields requires encryptedUsername, encryptedPassword, iv and authTag.";

pub(crate) fn credential_patch(
    req: UpdateCredentialRequest,
) -> Result<CredentialPatch, VaultError> {
    let label = req.label.as_deref().map(label).transpose()?;
    let url = match req.url {
        Some(value) => Some(url(value)?),
        None => None,
    };

    let touches_cipher = req.encrypted_username.is_some()
        || req.encrypted_password.is_some()
        || req.encrypted_notes.is_some()
        || req.iv.is_some()
        || req.auth_tag.is_some();

    let cipher = if touches_cipher {
        let (Some(encrypted_username), Some(encrypted_password), Some(iv), Some(auth_tag)) =
            (req.encrypted_username, req.encrypted_password, req.iv, req.auth_tag)
        else {
            return Err(VaultError::validation(RESEAL_REQUIRED));
        };
        integrity_field(&iv, "iv")?;
        integrity_field(&auth_tag, "authTag")?;

        Some(CipherFields {
            encrypted_username,
            encrypted_password,
            encrypted_notes: req.encrypted_notes,
            iv,
            auth_tag,
        })
    } else {
        None
    };

    Ok(CredentialPatch { label, url, cipher })
}
