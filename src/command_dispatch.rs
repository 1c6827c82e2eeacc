//! Purpose: Hold top-level CLI command dispatch for `worksheet`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Sync results are reported in input order, one entry per pair.
//! Invariants: A batch with failed pairs exits with the first failure's exit code.

use super::*;

use std::path::Path;

use worksheet::api::{
    DEFAULT_MARKER, ErrorPolicy, MemoryStore, PairStatus, ScanMode, Session, SyncOptions,
    SyncPair, SyncReport, load_worksheet, render_worksheet, sync_files,
};

use crate::manifest::{PairArgError, default_pairs, load_manifest, parse_pair_arg};

/// Exit code for `sync --check` when some page is stale but nothing failed.
const STALE_EXIT_CODE: i32 = 1;

pub(super) fn dispatch_command(
    command: Command,
    root: PathBuf,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "worksheet", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_version_output();
            Ok(RunOutcome::ok())
        }
        Command::Sync(args) => run_sync(args, &root, color_mode),
        Command::Check { file } => {
            let path = root.join(file);
            let worksheet = load_worksheet(&path)?;
            let option_count: usize = worksheet
                .questions
                .iter()
                .map(|question| question.options.len())
                .sum();
            emit_json(json!({
                "path": path.display().to_string(),
                "worksheet": worksheet.id,
                "title": worksheet.title,
                "questions": worksheet.questions.len(),
                "options": option_count,
                "valid": true,
            }));
            Ok(RunOutcome::ok())
        }
        Command::Render { file } => {
            let worksheet = load_worksheet(&root.join(file))?;
            println!("{}", render_worksheet(&worksheet));
            Ok(RunOutcome::ok())
        }
        Command::Grade { file, answers } => {
            let answers = answers
                .iter()
                .map(|arg| parse_answer_arg(arg))
                .collect::<Result<Vec<_>, _>>()?;
            let worksheet = load_worksheet(&root.join(file))?;

            let mut store = MemoryStore::new();
            let mut session = Session::new(&worksheet, &mut store);
            let mut results = Vec::new();
            for (question_id, key) in &answers {
                let submission = session.submit(*question_id, key)?;
                results.push(serde_json::to_value(&submission).map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to encode submission")
                        .with_source(err)
                })?);
            }
            let (correct, submitted) = session.score();
            emit_json(json!({
                "worksheet": worksheet.id,
                "results": results,
                "correct": correct,
                "submitted": submitted,
                "total": worksheet.questions.len(),
            }));
            Ok(RunOutcome::ok())
        }
    }
}

fn run_sync(args: SyncArgs, root: &Path, color_mode: ColorMode) -> Result<RunOutcome, Error> {
    let mut marker = args.marker;
    let mut pairs = Vec::new();
    if let Some(path) = &args.manifest {
        let manifest = load_manifest(&root.join(path))?;
        pairs.extend(manifest.sync_pairs());
        if marker.is_none() {
            marker = manifest.marker;
        }
    }
    for arg in &args.pairs {
        pairs.push(parse_pair_arg(arg).map_err(|err| pair_arg_error(arg, err))?);
    }
    if pairs.is_empty() {
        pairs = default_pairs();
    }

    let options = SyncOptions {
        marker: marker.unwrap_or_else(|| DEFAULT_MARKER.to_string()),
        scan_mode: if args.string_aware {
            ScanMode::StringAware
        } else {
            ScanMode::Naive
        },
        dry_run: args.dry_run || args.check,
        errors: if args.fail_fast {
            ErrorPolicy::Stop
        } else {
            ErrorPolicy::Skip
        },
    };

    let report = sync_files(&pairs, root, &options)?;
    for outcome in &report.outcomes {
        if outcome.status == PairStatus::Skipped {
            emit_notice(skip_notice(&outcome.pair), color_mode);
        }
    }
    emit_json(sync_report_json(&report));

    if let Some(err) = report.first_error() {
        return Ok(RunOutcome::with_code(to_exit_code(err.kind())));
    }
    if args.check && report.stale() > 0 {
        return Ok(RunOutcome::with_code(STALE_EXIT_CODE));
    }
    Ok(RunOutcome::ok())
}

fn skip_notice(pair: &SyncPair) -> Notice {
    Notice::new(
        "skip",
        "sync",
        format!("skipping {} - files not found", pair.host.display()),
    )
    .with_detail("source", pair.source.display().to_string())
    .with_detail("host", pair.host.display().to_string())
}

fn sync_report_json(report: &SyncReport) -> Value {
    let results = report
        .outcomes
        .iter()
        .map(|outcome| {
            let mut entry = Map::new();
            entry.insert(
                "source".to_string(),
                json!(outcome.pair.source.display().to_string()),
            );
            entry.insert(
                "host".to_string(),
                json!(outcome.pair.host.display().to_string()),
            );
            entry.insert("status".to_string(), json!(outcome.status.label()));
            if let Some(err) = &outcome.error {
                entry.insert("error".to_string(), Value::Object(error_object(err)));
            }
            Value::Object(entry)
        })
        .collect::<Vec<_>>();

    json!({
        "results": results,
        "synced": report.succeeded(),
        "updated": report.updated(),
        "stale": report.stale(),
        "skipped": report.skipped(),
        "failed": report.failed(),
        "total": report.total(),
    })
}

fn pair_arg_error(arg: &str, err: PairArgError) -> Error {
    let message = match err {
        PairArgError::MissingSeparator => format!("--pair `{arg}` is missing a `:` separator"),
        PairArgError::EmptySide => format!("--pair `{arg}` has an empty source or host"),
    };
    Error::new(ErrorKind::Usage)
        .with_message(message)
        .with_hint("Use --pair <source.json>:<host.html>.")
}

fn parse_answer_arg(arg: &str) -> Result<(u64, String), Error> {
    let usage = || {
        Error::new(ErrorKind::Usage)
            .with_message(format!("invalid --answer `{arg}`"))
            .with_hint("Use --answer <question-id>=<option-key>, e.g. --answer 3=B.")
    };
    let (id, key) = arg.split_once('=').ok_or_else(usage)?;
    let id = id.trim().parse::<u64>().map_err(|_| usage())?;
    let key = key.trim();
    if key.is_empty() {
        return Err(usage());
    }
    Ok((id, key.to_string()))
}
