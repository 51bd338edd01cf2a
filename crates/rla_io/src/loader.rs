//! Loader: read a local report file (or params JSON) into memory.
//!
//! The whole file is read before parsing starts; the digest is taken over the
//! raw bytes so it identifies exactly what was verified. No network I/O.

#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

use rla_core::VerifyParams;
use tracing::{debug, info};

use crate::parser::parse_lines;
use crate::report::Report;
use crate::{try_sha256_hex, IoError, IoResult};

/// A parsed report plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedReport {
    pub source: PathBuf,
    /// Lowercase SHA-256 of the file's raw bytes.
    pub sha256: String,
    pub report: Report,
}

/// Read and parse a report file.
pub fn load_report(path: &Path) -> IoResult<LoadedReport> {
    let bytes = fs::read(path).map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    let sha256 = try_sha256_hex(&bytes)?;
    let text = String::from_utf8(bytes)
        .map_err(|e| IoError::Utf8(format!("{}: {e}", path.display())))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let report = parse_lines(text.lines());
    info!(
        path = %path.display(),
        contests = report.contests.len(),
        sampled_ballots = report.sampled_ballots.len(),
        "report loaded"
    );

    Ok(LoadedReport {
        source: path.to_path_buf(),
        sha256,
        report,
    })
}

/// Read `VerifyParams` from JSON; absent fields keep their defaults.
pub fn load_params(path: &Path) -> IoResult<VerifyParams> {
    let text = fs::read_to_string(path)
        .map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    let params: VerifyParams = serde_json::from_str(&text).map_err(|e| IoError::Json {
        pointer: "/".to_string(),
        msg: format!("{}: {e}", path.display()),
    })?;
    debug!(?params, "params loaded");
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rla_core::PhantomPolicy;
    use std::io::Write;

    #[test]
    fn loads_report_and_digest() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "\u{feff}Election Name,Demo\r\nCONTESTS\r\nContest Name\r\nMayor\r\n").unwrap();
        let loaded = load_report(f.path()).unwrap();
        assert_eq!(loaded.report.election_info.get("Election Name").map(String::as_str), Some("Demo"));
        assert_eq!(loaded.report.contests.records[0].get("Contest Name"), Some("Mayor"));
        assert_eq!(loaded.sha256.len(), 64);
    }

    #[test]
    fn missing_file_is_path_error() {
        let err = load_report(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, IoError::Path(_)));
    }

    #[test]
    fn non_utf8_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(&[0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(load_report(f.path()), Err(IoError::Utf8(_))));
    }

    #[test]
    fn params_json_overrides_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"p_value_tolerance": 0.01, "phantom_policy": {{"mode": "worst_case"}}}}"#).unwrap();
        let p = load_params(f.path()).unwrap();
        assert_eq!(p.p_value_tolerance, 0.01);
        assert_eq!(p.phantom_policy, PhantomPolicy::WorstCase);
        assert_eq!(p.ticket_epsilon, 1e-10);
    }
}
