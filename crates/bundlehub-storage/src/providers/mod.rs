//! Storage provider implementations.

pub mod local;
pub mod memory;

/// Validate an object key before it touches a backend.
///
/// Keys are relative, slash-separated, and must not contain traversal
/// segments or control characters.
pub(crate) fn validate_key(key: &str) -> Result<(), bundlehub_core::traits::storage::StorageError> {
    use bundlehub_core::traits::storage::StorageError;

    if key.is_empty() {
        return Err(StorageError::InvalidKey("empty key".to_string()));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(format!(
            "key must be relative and slash-separated: {key}"
        )));
    }
    if key.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..") {
        return Err(StorageError::InvalidKey(format!(
            "key contains traversal segments: {key}"
        )));
    }
    if key.chars().any(char::is_control) {
        return Err(StorageError::InvalidKey(
            "key contains control characters".to_string(),
        ));
    }
    Ok(())
}
