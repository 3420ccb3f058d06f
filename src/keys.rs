//! Hash Key Derivation
//!
//! Catalog rows are addressed by composite, human-meaningful identifiers
//! (e.g. `category/subcategory/slug`). Storing and matching those as strings
//! would force prefix/LIKE scans, so the catalog build pipeline derives a
//! compact 64-bit key from each identifier and the read path looks rows up by
//! key through a plain equality index. The human-readable columns stay on the
//! row; the key is an access path, not a replacement.

use sha2::{Digest, Sha256};

/// Derives the fixed-width lookup key for a composite identifier.
///
/// The parts are concatenated without a delimiter, hashed with SHA-256, and
/// the first 8 digest bytes are interpreted as a big-endian signed 64-bit
/// integer.
///
/// Deterministic: the same parts always produce the same key. There is no
/// collision detection — distinct part tuples that concatenate to the same
/// string (`["ab", "c"]` vs `["a", "bc"]`) produce the same key, and two
/// different strings may collide in the truncated digest. Both are accepted
/// risks; uniqueness is the build pipeline's problem, not the read path's.
pub fn derive_key<S: AsRef<str>>(parts: &[S]) -> i64 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_ref().as_bytes());
    }
    let digest = hasher.finalize();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(prefix)
}
