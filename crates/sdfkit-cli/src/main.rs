use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use env_logger::{Builder, Env};
use glob::glob;
use log::info;
use sdfkit_core::{
    DEFAULT_PING_LIMIT, DecodeError, DecodeOptions, ErrorPolicy, LogObserver, PingSummary,
    Report, SourceError, SyncMode, decode_sdf_file_with_observer, summarize_document,
};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("SDFKIT_BUILD_COMMIT"),
    ", ",
    env!("SDFKIT_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "sdfkit")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Decoder for SDF side-scan sonar recordings.",
    long_about = None,
    after_help = "Examples:\n  sdfkit summary survey.sdf\n  sdfkit summary survey.sdf --json --pretty\n  sdfkit summary 'data/*.sdf' --lenient -o report.json"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv field trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode an SDF file and print a per-ping summary.
    Summary {
        /// Path to a .sdf file (glob patterns must match exactly one file)
        input: PathBuf,

        /// Number of pings to summarise
        #[arg(short = 'n', long, default_value_t = DEFAULT_PING_LIMIT)]
        limit: usize,

        /// Print the JSON report instead of the text summary
        #[arg(long)]
        json: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Also write the JSON report to this path
        #[arg(short = 'o', long)]
        report: Option<PathBuf>,

        /// Skip pings with unknown or unsupported page versions
        #[arg(long)]
        lenient: bool,

        /// How to recover when the stream is not at a ping marker
        #[arg(long, value_enum, default_value_t = SyncArg::SkipWord)]
        sync: SyncArg,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SyncArg {
    /// Drop the mismatching 4-byte word and try the next one
    SkipWord,
    /// Search byte by byte for the next marker
    Scan,
    /// Fail on the first mismatch
    Strict,
}

impl From<SyncArg> for SyncMode {
    fn from(value: SyncArg) -> Self {
        match value {
            SyncArg::SkipWord => SyncMode::SkipWord,
            SyncArg::Scan => SyncMode::Scan,
            SyncArg::Strict => SyncMode::Strict,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Summary {
            input,
            limit,
            json,
            pretty,
            report,
            lenient,
            sync,
            quiet,
        } => {
            init_logging(cli.verbose, quiet);
            let policy = if lenient {
                ErrorPolicy::Lenient
            } else {
                ErrorPolicy::Strict
            };
            let options = DecodeOptions::new(policy).with_sync(sync.into());
            cmd_summary(input, limit, json, pretty, report, options, quiet)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    Builder::from_env(Env::default().default_filter_or(level))
        .format_target(false)
        .format_timestamp(None)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

impl From<SourceError> for CliError {
    fn from(err: SourceError) -> Self {
        let hint = match &err {
            SourceError::Decode(DecodeError::InvalidPageVersion { .. }) => {
                Some("use --lenient to skip pings with unknown page versions".to_string())
            }
            SourceError::Decode(DecodeError::MissingMarker { .. }) => {
                Some("use --sync scan to search for the next ping marker".to_string())
            }
            SourceError::Decode(DecodeError::UnexpectedEndOfStream { .. }) => {
                Some("the file may be truncated or not an SDF recording".to_string())
            }
            _ => None,
        };
        CliError::new(format!("SDF decoding failed: {err}"), hint)
    }
}

fn cmd_summary(
    input: PathBuf,
    limit: usize,
    json: bool,
    pretty: bool,
    report: Option<PathBuf>,
    options: DecodeOptions,
    quiet: bool,
) -> Result<(), CliError> {
    if pretty && !json && report.is_none() {
        return Err(CliError::new(
            "--pretty only applies to JSON output",
            Some("add --json or -o/--report".to_string()),
        ));
    }

    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;
    if let Some(report_path) = report.as_ref() {
        ensure_distinct_output(&resolved_input, report_path)?;
    }

    let meta = fs::metadata(&resolved_input)
        .with_context(|| format!("Failed to read input file: {}", resolved_input.display()))?;
    if !meta.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .sdf file".to_string()),
        ));
    }

    let document = decode_sdf_file_with_observer(&resolved_input, options, LogObserver)?;
    info!(
        "decoded {} pings ({} skipped) from {}",
        document.len(),
        document.skipped.len(),
        resolved_input.display()
    );
    let rep = summarize_document(
        &resolved_input.display().to_string(),
        meta.len(),
        &document,
        limit,
    );

    if let Some(report_path) = report.as_ref() {
        let json = serialize_report(&rep, pretty)?;
        if let Some(parent) = report_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory: {}", parent.display())
                })?;
            }
        }
        fs::write(report_path, json)
            .with_context(|| format!("Failed to write report: {}", report_path.display()))?;
        if !quiet {
            eprintln!("OK: report written -> {}", report_path.display());
        }
    }

    if json {
        println!("{}", serialize_report(&rep, pretty)?);
    } else if !quiet {
        print!("{}", render_text(&rep));
    }
    Ok(())
}

fn serialize_report(rep: &Report, pretty: bool) -> Result<String, CliError> {
    if pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn render_text(rep: &Report) -> String {
    let mut out = format!("Successfully read {} pings\n", rep.ping_count);
    if rep.skipped_count > 0 {
        out.push_str(&format!(
            "Skipped {} pings with unusable page versions\n",
            rep.skipped_count
        ));
    }
    out.push('\n');
    for (i, ping) in rep.pings.iter().enumerate() {
        out.push_str(&format!("--- Ping {} ---\n", i + 1));
        render_ping(&mut out, ping);
        out.push('\n');
    }
    out
}

fn render_ping(out: &mut String, ping: &PingSummary) {
    out.push_str(&format!("Page Version: {}\n", ping.page_version));
    out.push_str(&format!("Number of Bytes: {}\n", ping.number_bytes));
    out.push_str(&format!("Ping Number: {}\n", ping.ping_number));
    out.push_str(&format!("Number of Samples: {}\n", ping.num_samples));
    out.push_str(&format!("Range: {} meters\n", ping.range));
    out.push_str(&format!("Speed of Sound: {} cm/s\n", ping.speed_sound));
    out.push_str("Transmit Waveform:\n");
    out.push_str(&format!(
        "  Low Frequency: {} (Enabled: {})\n",
        ping.tx_waveform.lf_waveform, ping.tx_waveform.lf_enabled
    ));
    out.push_str(&format!(
        "  High Frequency: {} (Enabled: {})\n",
        ping.tx_waveform.hf_waveform, ping.tx_waveform.hf_enabled
    ));
    match &ping.timestamp {
        Some(ts) => out.push_str(&format!("Time: {ts}\n")),
        None => out.push_str("Time: invalid\n"),
    }
    out.push_str("Channels:\n");
    for channel in &ping.channels {
        out.push_str(&format!(
            "  - {}: {} samples\n",
            channel.label, channel.samples
        ));
        out.push_str(&format!("    First 5 samples: {:?}\n", channel.first));
        out.push_str(&format!("    Last 5 samples: {:?}\n", channel.last));
    }
    if let Some(records) = ping.extension_records {
        out.push_str(&format!("Extension records: {records}\n"));
    }
}

fn ensure_distinct_output(input: &Path, report_path: &Path) -> Result<(), CliError> {
    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    let parent = match report_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let Ok(report_dir) = fs::canonicalize(parent) else {
        return Ok(());
    };
    let file_name = report_path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid report path: {}", report_path.display()))?;
    if report_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!(
                "report path must differ from input: {}",
                report_path.display()
            ),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .sdf file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "sdf" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .sdf file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .sdf".to_string()),
        ));
    }
    if matches.len() > 1 {
        let mut message = format!(
            "multiple files match pattern '{}' ({} matches)",
            pattern,
            matches.len()
        );
        let listed: Vec<_> = matches
            .iter()
            .take(3)
            .map(|p| p.display().to_string())
            .collect();
        message.push_str("; matches: ");
        message.push_str(&listed.join(", "));
        if matches.len() > 3 {
            message.push_str(", ...");
        }
        return Err(CliError::new(
            message,
            Some("pass a single SDF file, or run once per file".to_string()),
        ));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
