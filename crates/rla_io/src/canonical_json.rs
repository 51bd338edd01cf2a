//! Canonical JSON for verification summaries.
//!
//! Objects are emitted with keys in byte order, arrays keep their order,
//! output is compact with no trailing newline. Identical summaries
//! therefore hash identically regardless of how the map was built.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde_json::Value;

/// Canonical bytes for `v`.
pub fn to_canonical_json_bytes(v: &Value) -> Vec<u8> {
    let mut out = Vec::with_capacity(512);
    emit(v, &mut out);
    out
}

/// Replace `path` with the canonical bytes of `v`.
///
/// The bytes go to a sibling temp file which is synced and renamed over the
/// target; readers never observe a half-written summary. Missing parent
/// directories are created.
pub fn write_canonical_file(path: &Path, v: &Value) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&to_canonical_json_bytes(v))?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn emit(v: &Value, out: &mut Vec<u8>) {
    match v {
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                emit(item, out);
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            out.push(b'{');
            for (i, (k, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                emit_scalar(&Value::String(k.clone()), out);
                out.push(b':');
                emit(val, out);
            }
            out.push(b'}');
        }
        scalar => emit_scalar(scalar, out),
    }
}

// serde_json's compact form is already canonical for scalars (escaping included).
fn emit_scalar(v: &Value, out: &mut Vec<u8>) {
    out.extend_from_slice(v.to_string().as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_sorted_at_every_depth() {
        let v = json!({
            "files": [ {"status": "verified", "path": "a.csv"}, 3 ],
            "engine": { "version": "0.1.0", "name": "rla-verify" }
        });
        let s = String::from_utf8(to_canonical_json_bytes(&v)).unwrap();
        assert_eq!(
            s,
            r#"{"engine":{"name":"rla-verify","version":"0.1.0"},"files":[{"path":"a.csv","status":"verified"},3]}"#
        );
    }

    #[test]
    fn contest_names_are_escaped() {
        let v = json!({"name": "Mayor \"City\"\n"});
        let s = String::from_utf8(to_canonical_json_bytes(&v)).unwrap();
        assert_eq!(s, r#"{"name":"Mayor \"City\"\n"}"#);
    }

    #[test]
    fn write_replaces_target_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("summary.json");
        write_canonical_file(&path, &json!({"b": 1})).unwrap();
        write_canonical_file(&path, &json!({"b": 2, "a": 1})).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"a":1,"b":2}"#);
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }
}
