//! Idempotency keys

use super::MergeAction;
use sha2::{Digest, Sha256};

/// Deterministic identity of a logical request
///
/// Derived from repository, source branch, target branch and title. The
/// description is deliberately left out: editing the body of a request does
/// not make it a different pull request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Derive the key for an action
    pub fn derive(action: &MergeAction) -> Self {
        let mut hasher = Sha256::new();
        for field in [
            action.repository().owner(),
            action.repository().name(),
            action.source_branch(),
            action.target_branch(),
            action.title(),
        ] {
            // Length prefix keeps ("ab", "c") and ("a", "bc") apart
            hasher.update((field.len() as u64).to_be_bytes());
            hasher.update(field.as_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for logs
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Repository;

    fn action(repo: &str, head: &str, base: &str, title: &str, body: Option<&str>) -> MergeAction {
        MergeAction::new(Repository::parse(repo).unwrap(), head, base, title, body).unwrap()
    }

    #[test]
    fn test_same_fields_same_key() {
        let a = action("acme/widgets", "feature-x", "main", "Add widget", None);
        let b = action("acme/widgets", "feature-x", "main", "Add widget", None);
        assert_eq!(IdempotencyKey::derive(&a), IdempotencyKey::derive(&b));
    }

    #[test]
    fn test_description_does_not_change_key() {
        let a = action("acme/widgets", "feature-x", "main", "Add widget", None);
        let b = action("acme/widgets", "feature-x", "main", "Add widget", Some("body"));
        assert_eq!(IdempotencyKey::derive(&a), IdempotencyKey::derive(&b));
    }

    #[test]
    fn test_each_field_changes_key() {
        let base = IdempotencyKey::derive(&action("acme/widgets", "feature-x", "main", "Add widget", None));
        for other in [
            action("acme/gadgets", "feature-x", "main", "Add widget", None),
            action("acme/widgets", "feature-y", "main", "Add widget", None),
            action("acme/widgets", "feature-x", "develop", "Add widget", None),
            action("acme/widgets", "feature-x", "main", "Add gadget", None),
        ] {
            assert_ne!(base, IdempotencyKey::derive(&other));
        }
    }

    #[test]
    fn test_field_boundaries_are_unambiguous() {
        let a = action("acme/widgets", "ab", "c", "t", None);
        let b = action("acme/widgets", "a", "bc", "t", None);
        assert_ne!(IdempotencyKey::derive(&a), IdempotencyKey::derive(&b));
    }

    #[test]
    fn test_key_is_hex_sha256() {
        let key = IdempotencyKey::derive(&action("acme/widgets", "feature-x", "main", "Add widget", None));
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key.short().len(), 12);
    }
}
