// crates/rla_cli/src/args.rs
//
// Offline CLI argument surface: report paths, verification knobs, output.
//
// Rules:
// - Report paths are local files; any scheme (http://, file://) is rejected.
// - `--seed N` turns on seeded phantom simulation; `--phantom worst-case`
//   cannot be combined with a seed.
// - `--params` JSON is applied first; flags override it.

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, ValueEnum};
use rla_core::{PhantomPolicy, VerifyParams};

/// Parsed CLI arguments.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "rla-verify",
    version,
    disable_help_subcommand = true,
    about = "Independently recompute margins and attained risk for risk-limiting audit reports"
)]
pub struct Args {
    /// Audit report files (sectioned CSV export). Each is verified on its own.
    pub reports: Vec<PathBuf>,

    /// Seed for phantom simulation. Accepts decimal u64 or 0x-hex (≤16 hex digits).
    #[arg(long, value_parser = parse_seed)]
    pub seed: Option<u64>,

    /// How unaudited sampled ballots are charged.
    #[arg(long, value_enum)]
    pub phantom: Option<PhantomMode>,

    /// Verification parameters JSON (missing fields keep their defaults).
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Absolute tolerance when comparing recomputed and reported p-values.
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Summary format on stdout.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Also write the canonical JSON summary to this file (atomic replace).
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Exit 1 when a file fails to verify or a reported p-value disagrees.
    #[arg(long)]
    pub strict: bool,

    /// Raise log verbosity on stderr (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Silence all logging.
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PhantomMode {
    WorstCase,
    Simulate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

/// Errors surfaced by argument validation.
/// Keep messages short/stable (handy for scripts/tests).
#[derive(Debug)]
pub enum CliError {
    BadCombo(&'static str),
    Missing(&'static str),
    NonLocalPath(String),
    BadTolerance(f64),
    Params(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CliError::*;
        match self {
            BadCombo(s) => write!(f, "invalid flag combination: {s}"),
            Missing(s) => write!(f, "missing required flag: {s}"),
            NonLocalPath(p) => write!(f, "path must be a local file (no scheme): {p}"),
            BadTolerance(t) => write!(f, "tolerance must be a finite, non-negative number: {t}"),
            Params(m) => write!(f, "params: {m}"),
        }
    }
}
impl std::error::Error for CliError {}

/// Seed parser: decimal u64 or 0x-hex (1..=16 nybbles).
pub fn parse_seed(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty seed".into());
    }
    if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if rest.is_empty() || rest.len() > 16 || !rest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err("hex seed must be 1..16 hex digits".into());
        }
        u64::from_str_radix(rest, 16).map_err(|_| "hex seed out of range".into())
    } else {
        s.parse::<u64>().map_err(|_| "decimal seed must be a valid u64".into())
    }
}

#[inline]
fn has_scheme(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.contains("://") || lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("file:")
}

fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    if let Some(s) = p.to_str() {
        if has_scheme(s) {
            return Err(CliError::NonLocalPath(s.to_string()));
        }
    }
    Ok(())
}

/// Scheme checks over every path-like argument.
pub fn validate(args: &Args) -> Result<(), CliError> {
    args.reports
        .iter()
        .map(PathBuf::as_path)
        .chain(args.params.as_deref())
        .chain(args.out.as_deref())
        .try_for_each(ensure_local_path)
}

/// Effective parameters: defaults ← params file ← flags.
pub fn resolve_params(args: &Args) -> Result<VerifyParams, CliError> {
    let mut params = match &args.params {
        Some(p) => rla_io::loader::load_params(p).map_err(|e| CliError::Params(e.to_string()))?,
        None => VerifyParams::default(),
    };

    match (args.phantom, args.seed) {
        (Some(PhantomMode::WorstCase), Some(_)) => {
            return Err(CliError::BadCombo("--seed with --phantom worst-case"));
        }
        (Some(PhantomMode::WorstCase), None) => params.phantom_policy = PhantomPolicy::WorstCase,
        (Some(PhantomMode::Simulate), Some(seed)) | (None, Some(seed)) => params = params.with_seed(seed),
        (Some(PhantomMode::Simulate), None) => {
            if !matches!(params.phantom_policy, PhantomPolicy::Simulate { .. }) {
                return Err(CliError::Missing("--seed (required by --phantom simulate)"));
            }
        }
        (None, None) => {}
    }

    if let Some(t) = args.tolerance {
        if !t.is_finite() || t < 0.0 {
            return Err(CliError::BadTolerance(t));
        }
        params.p_value_tolerance = t;
    }
    Ok(params)
}

/// Entry point used by main.rs. Clap itself exits on malformed flags.
pub fn parse_and_validate() -> Result<Args, CliError> {
    let args = Args::parse();
    validate(&args)?;
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("rla-verify").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn seeds_accept_decimal_and_hex() {
        assert_eq!(parse_seed("42"), Ok(42));
        assert_eq!(parse_seed("0xff"), Ok(255));
        assert!(parse_seed("0x").is_err());
        assert!(parse_seed("0x11112222333344445").is_err());
        assert!(parse_seed("-1").is_err());
    }

    #[test]
    fn seed_implies_simulation() {
        let p = resolve_params(&parse(&["a.csv", "--seed", "9"])).unwrap();
        assert_eq!(p.phantom_policy, PhantomPolicy::Simulate { seed: 9 });
    }

    #[test]
    fn worst_case_conflicts_with_seed() {
        let args = parse(&["--phantom", "worst-case", "--seed", "1"]);
        assert!(matches!(resolve_params(&args), Err(CliError::BadCombo(_))));
    }

    #[test]
    fn simulate_needs_a_seed_somewhere() {
        let args = parse(&["--phantom", "simulate"]);
        assert!(matches!(resolve_params(&args), Err(CliError::Missing(_))));

        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"phantom_policy": {{"mode": "simulate", "seed": 5}}}}"#).unwrap();
        let path = f.path().to_str().unwrap().to_string();
        let args = parse(&["--phantom", "simulate", "--params", &path]);
        assert_eq!(resolve_params(&args).unwrap().phantom_policy, PhantomPolicy::Simulate { seed: 5 });
    }

    #[test]
    fn tolerance_flag_overrides_and_is_checked() {
        let p = resolve_params(&parse(&["--tolerance", "0.01"])).unwrap();
        assert_eq!(p.p_value_tolerance, 0.01);
        assert!(matches!(
            resolve_params(&parse(&["--tolerance=-1"])),
            Err(CliError::BadTolerance(_))
        ));
    }

    #[test]
    fn schemes_are_rejected() {
        let args = parse(&["https://example.org/report.csv"]);
        assert!(matches!(validate(&args), Err(CliError::NonLocalPath(_))));
        assert!(validate(&parse(&["report.csv", "--out", "out/summary.json"])).is_ok());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Args::try_parse_from(["rla-verify", "-v", "--quiet"]).is_err());
    }
}
