//! `mixwise`: reads a blend request as JSON and prints the optimized blend.

mod logger;

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use mixwise_blend::{MixRequest, MixResponse, Settings, optimize};

#[derive(Debug, Parser)]
#[command(name = "mixwise", version)]
#[command(about = "Find batch mixing ratios that center regulated parameters within their limits")]
struct Args {
    /// Request JSON file; reads stdin when omitted or `-`
    input: Option<PathBuf>,

    /// TOML file with solver settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the solver iteration limit
    #[arg(long)]
    max_iters: Option<usize>,

    /// Override the objective change tolerance
    #[arg(long)]
    ftol: Option<f64>,

    /// Pretty-print the response
    #[arg(short, long)]
    pretty: bool,

    /// Increase log detail; repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Exit status for a malformed request.
const INVALID_INPUT: u8 = 2;

fn main() -> ExitCode {
    let args = Args::parse();
    logger::init(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            let invalid = err
                .downcast_ref::<mixwise_blend::Error>()
                .is_some_and(mixwise_blend::Error::is_invalid_input)
                || err.downcast_ref::<serde_json::Error>().is_some();
            if invalid {
                ExitCode::from(INVALID_INPUT)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let settings = settings(args)?;
    let request = read_request(args.input.as_deref())?;
    tracing::info!(
        batches = request.batches.len(),
        limits = request.limits.len(),
        tolerance = request.tolerance,
        "read request"
    );

    let solution = optimize(&request, &settings)?;
    let response = MixResponse::from(&solution);

    let json = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{json}");
    Ok(())
}

fn settings(args: &Args) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(max_iters) = args.max_iters {
        settings.max_iters = max_iters;
    }
    if let Some(ftol) = args.ftol {
        settings.ftol = ftol;
    }
    Ok(settings)
}

fn read_request(input: Option<&std::path::Path>) -> Result<MixRequest> {
    let text = match input {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            text
        }
    };

    let request = serde_json::from_str(&text)?;
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let args = Args::parse_from([
            "mixwise",
            "request.json",
            "--max-iters",
            "50",
            "--ftol",
            "1e-6",
            "--pretty",
            "-vv",
        ]);

        assert_eq!(args.input, Some(PathBuf::from("request.json")));
        assert_eq!(args.verbose, 2);
        assert!(args.pretty);

        let settings = settings(&args).unwrap();
        assert_eq!(settings.max_iters, 50);
        assert_eq!(settings.ftol, 1e-6);
    }

    #[test]
    fn defaults_read_stdin_with_default_settings() {
        let args = Args::parse_from(["mixwise"]);

        assert!(args.input.is_none());
        assert_eq!(settings(&args).unwrap(), Settings::default());
    }
}
