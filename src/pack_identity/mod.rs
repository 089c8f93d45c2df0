use uuid::Uuid;

/// Prefix joined with the content hash to form the UUID name.
pub const PACK_ID_PREFIX: &str = "bitterharvest-pack-";

/// Derives the stable identity of a pack from its content hash.
///
/// The identity is a version 5 UUID in the DNS namespace, named
/// `bitterharvest-pack-<hash>`. The same hash always yields the same UUID, so
/// rebuilding an unchanged archive keeps the `resource-pack-id` clients have
/// already cached.
pub fn derive_identity(content_hash: &str) -> Uuid {
    let name = format!("{PACK_ID_PREFIX}{content_hash}");
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, name.as_bytes())
}

/// Canonical hyphenated form of [`derive_identity`].
pub fn derive_identity_string(content_hash: &str) -> String {
    derive_identity(content_hash).hyphenated().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_hash_yields_same_identity() {
        let first = derive_identity_string("abc123");
        let second = derive_identity_string("abc123");
        assert_eq!(first, second);
        assert_eq!(first.len(), 36);
        assert_eq!(first.matches('-').count(), 4);
    }

    #[test]
    fn matches_known_vectors() {
        assert_eq!(
            derive_identity_string("abc123"),
            "3a2eef37-a344-5be0-902b-94d04a1208c9"
        );
        assert_eq!(
            derive_identity_string("da39a3ee5e6b4b0d3255bfef95601890afd80709"),
            "47f17812-b775-5ddb-9db2-1ad70335e197"
        );
    }

    #[test]
    fn identity_is_version_five() {
        assert_eq!(derive_identity("abc123").get_version_num(), 5);
    }

    #[test]
    fn distinct_hashes_yield_distinct_identities() {
        let hashes: Vec<String> = (0..256).map(|i| format!("{:040x}", i)).collect();
        let mut ids: Vec<String> = hashes.iter().map(|h| derive_identity_string(h)).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), hashes.len());
    }
}
