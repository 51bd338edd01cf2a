// crates/rla_cli/src/main.rs
//
// Wires up: exit codes, logging, CLI parsing, per-file verification,
// rendering (text or canonical JSON) and the optional --out artifact.
// Files are verified independently; one bad report never stops the rest.

#![forbid(unsafe_code)]

mod args;

mod exitcodes {
    pub const OK: u8 = 0;
    /// --strict only: a file failed or a reported p-value disagreed.
    pub const VERIFY_FAILED: u8 = 1;
    pub const USAGE: u8 = 2;
    pub const IO: u8 = 4;
}

use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::CommandFactory;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use args::{parse_and_validate as parse_cli, resolve_params, Args, Format};
use rla_io::canonical_json;
use rla_pipeline::{verify_path, PipelineError, Verification};
use rla_report::{build_model, render_json, render_json_bytes, render_text, ReportError, RunModel};

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    Usage(String),
    Render(ReportError),
    Write(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Usage(m) => write!(f, "{m}"),
            MainError::Render(e) => write!(f, "render: {e}"),
            MainError::Write(m) => write!(f, "write: {m}"),
        }
    }
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("rla-verify: error: {e}");
            return ExitCode::from(exitcodes::USAGE);
        }
    };
    init_logging(args.verbose, args.quiet);

    if args.reports.is_empty() {
        println!("{}", Args::command().render_usage());
        return ExitCode::from(exitcodes::OK);
    }

    match run(&args) {
        Ok(rc) => ExitCode::from(rc),
        Err(e) => {
            eprintln!("rla-verify: error: {e}");
            ExitCode::from(map_error(&e))
        }
    }
}

fn map_error(e: &MainError) -> u8 {
    match e {
        MainError::Usage(_) => exitcodes::USAGE,
        MainError::Render(_) | MainError::Write(_) => exitcodes::IO,
    }
}

/// stderr subscriber. `RUST_LOG` wins unless -v/--quiet say otherwise.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "off",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter = if quiet || verbose > 0 {
        EnvFilter::new(level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    // A subscriber may already be installed (tests); keep going either way.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(args: &Args) -> Result<u8, MainError> {
    let params = resolve_params(args).map_err(|e| MainError::Usage(e.to_string()))?;
    debug!(?params, "effective parameters");

    let outcomes: Vec<(PathBuf, Result<Verification, PipelineError>)> = args
        .reports
        .iter()
        .map(|path| {
            let outcome = verify_path(path, &params);
            if let Err(e) = &outcome {
                error!(path = %path.display(), error = %e, "could not verify report");
            }
            (path.clone(), outcome)
        })
        .collect();

    let model = build_model(&outcomes, &params);
    emit(args, &model)?;

    let failed = outcomes.iter().filter(|(_, r)| r.is_err()).count();
    let mismatched = outcomes
        .iter()
        .filter(|(_, r)| r.as_ref().map(Verification::has_mismatch).unwrap_or(false))
        .count();
    info!(files = outcomes.len(), failed, mismatched, "run complete");

    if args.strict && (failed > 0 || mismatched > 0) {
        Ok(exitcodes::VERIFY_FAILED)
    } else {
        Ok(exitcodes::OK)
    }
}

fn emit(args: &Args, model: &RunModel) -> Result<(), MainError> {
    let mut stdout = std::io::stdout().lock();
    let written = match args.format {
        Format::Text => stdout.write_all(render_text(model).as_bytes()),
        Format::Json => {
            let bytes = render_json_bytes(model).map_err(MainError::Render)?;
            stdout.write_all(&bytes).and_then(|_| stdout.write_all(b"\n"))
        }
    };
    written
        .and_then(|_| stdout.flush())
        .map_err(|e| MainError::Write(format!("stdout: {e}")))?;

    if let Some(out) = &args.out {
        let value = render_json(model).map_err(MainError::Render)?;
        canonical_json::write_canonical_file(out, &value)
            .map_err(|e| MainError::Write(format!("{}: {e}", out.display())))?;
        info!(path = %out.display(), "wrote summary");
    }
    Ok(())
}
