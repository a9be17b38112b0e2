use sha2::{Digest, Sha256};

/// Hashes a JSON value's canonical serialization.
///
/// `serde_json::Value`'s object variant is a `BTreeMap` unless the
/// `preserve_order` feature is enabled (it isn't, here), so `to_vec` already
/// emits object keys in sorted order. Two values that are `==` under
/// `serde_json::Value`'s equality always hash identically.
#[must_use]
pub fn canonical_json_hash(value: &serde_json::Value) -> String {
    let bytes = serde_json::to_vec(value).expect("Value serialization is infallible");
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}
