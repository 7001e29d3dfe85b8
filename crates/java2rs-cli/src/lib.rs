//! java2rs CLI - command line front-end for the Java to Rust translator
//!
//! Argument parsing and command execution live here so they can be driven
//! from tests; `main.rs` only wires up logging and the process exit code.

use std::{fs, io::Write, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use java2rs_core::{FileDriver, TranspileConfig, TransformationSummary};
use tracing::debug;

/// Output format of the run report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Command line definition of the `java2rs` binary
pub fn build_command() -> Command {
    Command::new("java2rs")
        .version(java2rs_core::VERSION)
        .about("Translate Java sources into Rust modules")
        .arg(
            Arg::new("input")
                .value_name("INPUT")
                .help("Java files or directories to translate")
                .required(true)
                .num_args(1..)
                .index(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory (default ./out; a single file prints to stdout)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("JSON translation configuration"),
        )
        .arg(
            Arg::new("report")
                .long("report")
                .value_name("FORMAT")
                .value_parser(["text", "json"])
                .default_value("text")
                .help("Format of the run summary"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
}

/// Load the configuration named by `--config`, or the defaults
pub fn load_config(matches: &ArgMatches) -> Result<TranspileConfig> {
    match matches.get_one::<String>("config") {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
            Ok(TranspileConfig::from_json(&text)?)
        }
        None => Ok(TranspileConfig::default()),
    }
}

fn report_format(matches: &ArgMatches) -> ReportFormat {
    match matches.get_one::<String>("report").map(String::as_str) {
        Some("json") => ReportFormat::Json,
        _ => ReportFormat::Text,
    }
}

fn write_report(out: &mut dyn Write, summary: &TransformationSummary, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(summary)?)?;
        }
        ReportFormat::Text => {
            writeln!(
                out,
                "Converted {} of {} file(s), {} failed",
                summary.files_converted, summary.files_processed, summary.files_failed
            )?;
            for error in &summary.errors {
                writeln!(out, "  {error}")?;
            }
        }
    }
    Ok(())
}

/// Execute parsed arguments; returns the process exit code
pub fn run(matches: &ArgMatches, out: &mut dyn Write) -> Result<i32> {
    let inputs: Vec<PathBuf> = matches
        .get_many::<String>("input")
        .map(|values| values.map(PathBuf::from).collect())
        .unwrap_or_default();
    if inputs.is_empty() {
        bail!("no input given");
    }
    let driver = FileDriver::new().config(load_config(matches)?);
    let format = report_format(matches);

    let output = matches.get_one::<String>("output");
    if output.is_none() && inputs.len() == 1 && inputs[0].is_file() {
        debug!("translating {} to stdout", inputs[0].display());
        let outcomes = driver.transpile_paths(&inputs)?;
        let mut failed = false;
        for outcome in &outcomes {
            match format {
                ReportFormat::Text => write!(out, "{}", outcome.text)?,
                ReportFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(outcome)?)?,
            }
            failed |= !outcome.is_success();
        }
        return Ok(if failed { 1 } else { 0 });
    }

    let output_dir = PathBuf::from(output.map(String::as_str).unwrap_or("./out"));
    let summary = driver.transform_paths(&inputs, &output_dir)?;
    write_report(out, &summary, format)?;
    Ok(if summary.success() { 0 } else { 1 })
}

/// Parse `args` (program name first) and run them
pub fn run_with_args<I, T>(args: I, out: &mut dyn Write) -> Result<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = build_command().try_get_matches_from(args)?;
    run(&matches, out)
}
