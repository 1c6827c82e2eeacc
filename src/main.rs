//! Purpose: `worksheet` CLI entry point.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Command results go to stdout; diagnostics and notices go to stderr.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{
    Args, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod manifest;

use worksheet::api::{Error, ErrorKind, to_exit_code};
use worksheet::notice::{Notice, notice_json};

const LOG_ENV: &str = "WORKSHEET_LOG";

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Internal)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Try `worksheet --help`."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let root = cli.root.unwrap_or_else(|| PathBuf::from("."));
    let color_mode = cli.color;

    command_dispatch::dispatch_command(cli.command, root, color_mode)
        .map_err(|err| (err, color_mode))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "worksheet",
    version,
    about = "Sync worksheet JSON into HTML pages, validate, render, and grade worksheets",
    long_about = None,
    after_help = r#"EXAMPLES
  $ worksheet sync                                   # default worksheet-1 pairs
  $ worksheet sync --pair dev-tools/ws-2.json:worksheet-2.html
  $ worksheet sync --manifest sync.json --check      # fail if any page is stale
  $ worksheet check dev-tools/worksheet-1-qa-export.json
  $ worksheet grade dev-tools/worksheet-1-qa-export.json --answer 1=A --answer 2=C

ENVIRONMENT
  WORKSHEET_LOG   log filter for stderr diagnostics (default: warn)"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Base directory for relative paths (default: current directory)",
        value_hint = ValueHint::DirPath
    )]
    root: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Re-embed source JSON into host HTML pages",
        long_about = r#"Replace the JSON literal assigned after the marker in each host page
with the current contents of its source JSON file.

Pairs come from --manifest and --pair; with neither, the default
worksheet-1 pairs are used. Pairs whose files are missing are skipped."#
    )]
    Sync(SyncArgs),
    #[command(about = "Load and validate a worksheet JSON export")]
    Check {
        #[arg(help = "Worksheet JSON file", value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
    #[command(about = "Print the question markup for a worksheet")]
    Render {
        #[arg(help = "Worksheet JSON file", value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
    #[command(about = "Grade answers against a worksheet")]
    Grade {
        #[arg(help = "Worksheet JSON file", value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(
            long = "answer",
            value_name = "ID=KEY",
            help = "Answer for one question, e.g. 3=B (repeatable)"
        )]
        answers: Vec<String>,
    },
    #[command(about = "Generate shell completions")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
    #[command(about = "Print version info")]
    Version,
}

#[derive(Args)]
struct SyncArgs {
    #[arg(
        long,
        help = "JSON manifest listing {source, host} pairs",
        value_hint = ValueHint::FilePath
    )]
    manifest: Option<PathBuf>,
    #[arg(
        long = "pair",
        value_name = "SOURCE:HOST",
        help = "Source JSON and host page to sync (repeatable)"
    )]
    pairs: Vec<String>,
    #[arg(long, help = "Text preceding the embedded literal (default: `const worksheetJSONData = `)")]
    marker: Option<String>,
    #[arg(long, help = "Ignore braces inside JSON strings when finding the literal's end")]
    string_aware: bool,
    #[arg(long, help = "Report what would change without writing")]
    dry_run: bool,
    #[arg(long, help = "Like --dry-run, but exit non-zero when any page is stale")]
    check: bool,
    #[arg(long, help = "Stop at the first failing pair")]
    fail_fast: bool,
}

fn emit_version_output() {
    if io::stdout().is_terminal() {
        println!("worksheet {}", env!("CARGO_PKG_VERSION"));
    } else {
        emit_json(json!({
            "name": "worksheet",
            "version": env!("CARGO_PKG_VERSION"),
        }));
    }
}

fn emit_json(value: Value) {
    let encoded = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    };
    let json = encoded.unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\x1b[1;{code}m{label}\x1b[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn notice_time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn emit_notice(notice: Notice, color_mode: ColorMode) {
    let notice = notice.with_time(notice_time_now().unwrap_or_default());
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        let label = colorize_label("notice:", color_mode.use_color(is_tty), AnsiColor::Yellow);
        eprintln!("{label} {}", notice.message);
        return;
    }

    let value = notice_json(&notice);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"notice\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::MarkerNotFound => "marker not found".to_string(),
        ErrorKind::UnbalancedBraces => "unbalanced braces".to_string(),
        ErrorKind::SourceRead => "failed to read source".to_string(),
        ErrorKind::SourceParse => "failed to parse source".to_string(),
        ErrorKind::HostRead => "failed to read host document".to_string(),
        ErrorKind::HostWrite => "failed to write host document".to_string(),
        ErrorKind::Schema => "invalid worksheet".to_string(),
        ErrorKind::Store => "answer store error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_object(err: &Error) -> Map<String, Value> {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(offset) = err.offset() {
        inner.insert("offset".to_string(), json!(offset));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }
    inner
}

fn error_json(err: &Error) -> Value {
    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(error_object(err)));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }
    if let Some(offset) = err.offset() {
        lines.push(format!(
            "{} {offset}",
            colorize_label("offset:", use_color, AnsiColor::Yellow)
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
