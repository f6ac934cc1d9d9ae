//! Constant-time comparison for signature checks.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Compare two byte strings without leaking content or length through timing.
///
/// Both sides are reduced to SHA-256 digests first, so the final
/// `ct_eq` always runs over 32 bytes.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let ha = Sha256::digest(a);
    let hb = Sha256::digest(b);
    ha.ct_eq(&hb).into()
}

/// ASCII case-insensitive variant, for hex digests that may arrive upper-cased.
pub fn constant_time_eq_ignore_case(a: &str, b: &str) -> bool {
    constant_time_eq(
        a.to_ascii_lowercase().as_bytes(),
        b.to_ascii_lowercase().as_bytes(),
    )
}
