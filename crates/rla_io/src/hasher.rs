//! crates/rla_io/src/hasher.rs
//!
//! SHA-256 digests for provenance and output identity.
//!
//! - `sha256_hex` hashes **raw bytes** (input report files).
//! - `sha256_canonical` hashes a serializable value through canonical JSON
//!   (sorted object keys, compact), so equal values hash equally regardless of
//!   field declaration order.
//! - Hex digests are **lowercase**.

#![forbid(unsafe_code)]

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::canonical_json::to_canonical_json_bytes;
use crate::IoError;

/// Encode bytes as **lowercase** hex without external deps.
fn to_lower_hex(bytes: &[u8]) -> String {
    const LUT: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(LUT[(b >> 4) as usize] as char);
        out.push(LUT[(b & 0x0F) as usize] as char);
    }
    out
}

/// SHA-256 over raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    to_lower_hex(&hasher.finalize())
}

/// SHA-256 over the **canonical JSON bytes** of any serializable value.
pub fn sha256_canonical<T: Serialize>(value: &T) -> Result<String, IoError> {
    let v = serde_json::to_value(value)?;
    Ok(sha256_hex(&to_canonical_json_bytes(&v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hex_encoding_is_lowercase() {
        let h = sha256_hex(b"abc");
        assert_eq!(h, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }

    #[test]
    fn canonical_hashing_ignores_field_order() {
        #[derive(Serialize)]
        struct T {
            b: u32,
            a: u32,
        }
        let h1 = sha256_canonical(&T { b: 2, a: 1 }).unwrap();
        let h2 = sha256_canonical(&json!({"a": 1, "b": 2})).unwrap();
        assert_eq!(h1, h2);
    }
}
