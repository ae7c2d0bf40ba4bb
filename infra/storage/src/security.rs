use crate::error::StorageError;
use std::path::{Component, Path, PathBuf};

const MAX_NAME_LEN: usize = 128;

/// Names become single path segments: ASCII letters, digits, `_` and `-` only.
pub(crate) fn validate_name(name: &str, what: &'static str) -> Result<(), StorageError> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(StorageError::InvalidName {
            message: format!("{what} must be 1..={MAX_NAME_LEN} characters").into(),
            context: None,
        });
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(StorageError::InvalidName {
            message: name.to_owned().into(),
            context: Some(format!("{what} contains illegal characters").into()),
        });
    }

    Ok(())
}

/// Joins a relative path to the root, rejecting anything that is not plain segments.
pub(crate) fn resolve_path(root: &Path, path: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
    let path = path.as_ref();
    let mut relative = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Normal(segment) => relative.push(segment),
            Component::CurDir => {},
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(StorageError::PathTraversalAttempt {
                    message: path.display().to_string().into(),
                    context: Some("Only plain relative segments are allowed".into()),
                });
            },
        }
    }

    let joined = root.join(relative);
    match joined.canonicalize() {
        Ok(canonical) => validate_canonical(root, canonical),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => validate_ancestors(root, &joined),
        Err(e) => Err(StorageError::Io { source: e, context: None }),
    }
}

/// `<namespace>/<b0b1>/<b2b3>/<blob>`; names shorter than four characters are not sharded.
pub(crate) fn resolve_sharded(
    root: &Path,
    namespace: &str,
    blob: &str,
) -> Result<PathBuf, StorageError> {
    validate_name(blob, "blob name")?;

    let mut relative = PathBuf::from(namespace);
    if let (Some(first), Some(second)) = (blob.get(0..2), blob.get(2..4)) {
        relative.push(first);
        relative.push(second);
    }
    relative.push(blob);

    resolve_path(root, relative)
}

fn validate_canonical(root: &Path, canonical: PathBuf) -> Result<PathBuf, StorageError> {
    if canonical.starts_with(root) {
        Ok(canonical)
    } else {
        Err(StorageError::PathTraversalAttempt {
            message: canonical.display().to_string().into(),
            context: Some("Resolved path leaves the sandbox".into()),
        })
    }
}

/// Validates a path that does not exist yet through its nearest existing ancestor, which
/// catches a symlinked namespace or shard directory pointing outside the root.
fn validate_ancestors(root: &Path, joined: &Path) -> Result<PathBuf, StorageError> {
    let mut current = joined.parent();

    while let Some(path) = current {
        if path == root {
            return Ok(joined.to_path_buf());
        }

        if path.exists() {
            return match path.canonicalize() {
                Ok(canonical) if canonical.starts_with(root) => Ok(joined.to_path_buf()),
                Ok(canonical) => Err(StorageError::PathTraversalAttempt {
                    message: canonical.display().to_string().into(),
                    context: Some("Existing parent directory is a symlink outside sandbox".into()),
                }),
                Err(e) => Err(StorageError::Io {
                    source: e,
                    context: Some("Failed to verify parent directory".into()),
                }),
            };
        }

        current = path.parent();
    }

    Err(StorageError::PathTraversalAttempt {
        message: joined.display().to_string().into(),
        context: Some("No valid parent directory found within sandbox".into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_single_safe_segments() {
        assert!(validate_name("AbC_12-x", "blob").is_ok());
        assert!(validate_name("", "blob").is_err());
        assert!(validate_name("a/b", "blob").is_err());
        assert!(validate_name("..", "blob").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1), "blob").is_err());
    }

    #[test]
    fn traversal_segments_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        assert!(matches!(
            resolve_path(root, "a/../../etc"),
            Err(StorageError::PathTraversalAttempt { .. })
        ));
        assert!(resolve_path(root, "/etc/passwd").is_err());
    }

    #[test]
    fn short_names_skip_sharding() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        let short = resolve_sharded(&root, "ns", "abc").unwrap();
        assert_eq!(short, root.join("ns").join("abc"));

        let long = resolve_sharded(&root, "ns", "abcdef").unwrap();
        assert_eq!(long, root.join("ns").join("ab").join("cd").join("abcdef"));
    }
}
