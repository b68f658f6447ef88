use std::fmt;

use super::error::StorageError;

const MAX_KEY_LEN: usize = 512;

/// An opaque, validated object key.
///
/// Keys may contain `/`-separated segments but never empty, `.` or `..`
/// segments, so every backend can map them onto a path safely.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BlobKey(String);

impl BlobKey {
    pub fn parse(key: impl Into<String>) -> Result<Self, StorageError> {
        let key = key.into();

        if key.is_empty() {
            return Err(StorageError::InvalidKey("key cannot be empty".into()));
        }
        if key.len() > MAX_KEY_LEN {
            return Err(StorageError::InvalidKey(format!(
                "key exceeds {MAX_KEY_LEN} bytes"
            )));
        }
        if key.chars().any(|c| c.is_control()) {
            return Err(StorageError::InvalidKey(
                "control characters are not allowed".into(),
            ));
        }
        if key.contains('\\') {
            return Err(StorageError::InvalidKey("backslashes are not allowed".into()));
        }
        if key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(StorageError::InvalidKey(format!(
                "'{key}' contains an empty or relative segment"
            )));
        }

        Ok(Self(key))
    }

    /// Propose a fresh key for an upload: a UUIDv7 prefix keeps keys unique
    /// and roughly time ordered, the suffix keeps them human readable.
    pub fn generate(original_name: &str) -> Self {
        let suffix: String = original_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .take(128)
            .collect();
        let suffix = suffix.trim_start_matches('.');

        if suffix.is_empty() {
            Self(uuid::Uuid::now_v7().to_string())
        } else {
            Self(format!("{}_{}", uuid::Uuid::now_v7(), suffix))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobKey({})", self.0)
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
