use async_trait::async_trait;
use crate::storage::{StoredObject, ObjectMetadata};

/// Backing store for server-side (de)compression results.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    async fn put(
        &self,
        key: &str,
        data: &[u8],
        meta: &ObjectMetadata,
    ) -> anyhow::Result<()>;

    async fn get(
        &self,
        key: &str,
    ) -> anyhow::Result<Option<StoredObject>>;
}

/// Object names: `[A-Za-z0-9._-]`, not starting with a dot.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 255
        && !key.starts_with('.')
        && key.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_rules() {
        assert!(is_valid_key("report.txt.huff"));
        assert!(is_valid_key("a-b_c.1"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key(".hidden"));
        assert!(!is_valid_key("../etc/passwd"));
        assert!(!is_valid_key("dir/file"));
        assert!(!is_valid_key("name with space"));
    }
}
