//! Request and notification signing.
//!
//! The gateway signs a parameter set by sorting it by key, rendering it as a
//! query string, URL-decoding that string again, appending the shared key and
//! taking the lowercase hex MD5 digest. The `sign` field itself never takes
//! part. Outbound requests and inbound notifications use the same routine, so
//! any deviation here breaks both directions at once.

use std::collections::BTreeMap;

use md5::{Digest, Md5};
use serde_json::Value;

use crate::constants::SIGN_FIELD;
use crate::security::constant_time_eq_ignore_case;

/// Parameter set keyed by gateway field name, kept in key order.
pub type Params = BTreeMap<String, Value>;

/// Build a parameter set from string pairs, e.g. a decoded notification form.
pub fn params_from_pairs<I, K, V>(pairs: I) -> Params
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), Value::String(v.into())))
        .collect()
}

/// Render the string that gets hashed, without the key appended.
pub fn canonical_string(params: &Params) -> String {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params.iter().filter(|(k, _)| k.as_str() != SIGN_FIELD) {
        flatten(key, value, &mut pairs);
    }

    let encoded = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    match urlencoding::decode(&encoded) {
        Ok(decoded) => decoded.into_owned(),
        // Unreachable for encoder output; fall back to the raw pairs.
        Err(_) => pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&"),
    }
}

/// Expand one value into `key=value` pairs. Nulls vanish, booleans become
/// `1`/`0`, containers nest as `key[sub]`.
fn flatten(key: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push((key.to_string(), if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => out.push((key.to_string(), n.to_string())),
        Value::String(s) => out.push((key.to_string(), s.clone())),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten(&format!("{key}[{i}]"), item, out);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                flatten(&format!("{key}[{sub}]"), item, out);
            }
        }
    }
}

/// Compute the lowercase hex signature of `params` under `key`.
pub fn create_signature(params: &Params, key: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(canonical_string(params).as_bytes());
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compute the signature and store it under `sign`.
pub fn sign_params(params: &mut Params, key: &str) {
    let sign = create_signature(params, key);
    params.insert(SIGN_FIELD.to_string(), Value::String(sign));
}

/// Check `signature` against the one recomputed from `params`.
/// Hex case is ignored.
pub fn verify_signature(params: &Params, key: &str, signature: &str) -> bool {
    let expected = create_signature(params, key);
    constant_time_eq_ignore_case(&expected, signature)
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().fold(String::new(), |mut s, b| {
            use std::fmt::Write;
            let _ = write!(s, "{b:02x}");
            s
        })
    }
}
