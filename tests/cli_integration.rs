// CLI integration tests for sync, check, render, and grade flows.
use std::fs;
use std::path::Path;
use std::process::Command;

use serde_json::Value;

const MARKER: &str = "const worksheetJSONData = ";

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_worksheet");
    let mut command = Command::new(exe);
    command.env_remove("WORKSHEET_LOG");
    command
}

fn parse_json(value: &[u8]) -> Value {
    serde_json::from_str(std::str::from_utf8(value).expect("utf8")).expect("valid json")
}

fn worksheet_json(correct: &str) -> String {
    format!(
        r#"{{
  "worksheet": {{
    "id": "worksheet-1",
    "title": "LOGO! maintenance",
    "questions": [
      {{
        "id": 1,
        "question": "What does the I1 input read?",
        "options": [{{"key": "A", "text": "A sensor"}}, {{"key": "B", "text": "A lamp"}}],
        "correctAnswer": "{correct}",
        "correctAnswerText": "{correct}) answer",
        "explanation": "Inputs read sensors."
      }},
      {{
        "id": 2,
        "question": "Which block delays a signal?",
        "options": [{{"key": "A", "text": "AND"}}, {{"key": "B", "text": "On-delay"}}],
        "correctAnswer": "B",
        "correctAnswerText": "B) On-delay"
      }}
    ]
  }}
}}"#
    )
}

fn host_page(embedded: &str) -> String {
    format!("<html>\n<script>\n{MARKER}{embedded};\nrender();\n</script>\n</html>\n")
}

fn write_fixture(root: &Path) {
    fs::create_dir_all(root.join("dev-tools")).expect("dev-tools");
    fs::write(
        root.join("dev-tools/worksheet-1-qa-export.json"),
        worksheet_json("A"),
    )
    .expect("export");
    fs::write(root.join("worksheet-1.html"), host_page("{\"stale\": {}}")).expect("page");
}

fn embedded_value(page: &str) -> Value {
    let start = page.find(MARKER).expect("marker") + MARKER.len();
    let end = page.find(";\nrender();").expect("terminator");
    serde_json::from_str(&page[start..end]).expect("embedded json")
}

#[test]
fn sync_defaults_update_present_pages_and_skip_missing() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    write_fixture(root);

    let output = cmd()
        .args(["--root", root.to_str().unwrap(), "sync"])
        .output()
        .expect("sync");
    assert!(output.status.success());

    let report = parse_json(&output.stdout);
    assert_eq!(report["total"], 2);
    assert_eq!(report["updated"], 1);
    assert_eq!(report["skipped"], 1);
    assert_eq!(report["failed"], 0);
    assert_eq!(report["results"][0]["host"], "worksheet-1.html");
    assert_eq!(report["results"][0]["status"], "updated");
    assert_eq!(report["results"][1]["status"], "skipped");

    let notice = parse_json(output.stderr.split(|b| *b == b'\n').next().expect("line"));
    assert_eq!(notice["notice"]["kind"], "skip");
    assert_eq!(notice["notice"]["details"]["host"], "worksheet-1-json.html");

    let page = fs::read_to_string(root.join("worksheet-1.html")).expect("page");
    let source: Value = serde_json::from_str(&worksheet_json("A")).expect("source");
    assert_eq!(embedded_value(&page), source);
    assert!(page.starts_with("<html>\n<script>\n"));
    assert!(page.ends_with(";\nrender();\n</script>\n</html>\n"));
}

#[test]
fn sync_reports_partial_failure_with_exit_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    write_fixture(root);
    fs::write(root.join("plain.html"), "<html></html>\n").expect("plain");

    let output = cmd()
        .args([
            "--root",
            root.to_str().unwrap(),
            "sync",
            "--pair",
            "dev-tools/worksheet-1-qa-export.json:plain.html",
            "--pair",
            "dev-tools/worksheet-1-qa-export.json:worksheet-1.html",
        ])
        .output()
        .expect("sync");
    assert_eq!(output.status.code().unwrap(), 4);

    let report = parse_json(&output.stdout);
    assert_eq!(report["synced"], 1);
    assert_eq!(report["failed"], 1);
    assert_eq!(report["results"][0]["error"]["kind"], "MarkerNotFound");
    assert_eq!(
        fs::read_to_string(root.join("plain.html")).expect("plain"),
        "<html></html>\n"
    );
    let page = fs::read_to_string(root.join("worksheet-1.html")).expect("page");
    assert_eq!(embedded_value(&page)["worksheet"]["id"], "worksheet-1");
}

#[test]
fn sync_report_has_stable_keys() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    write_fixture(root);

    let output = cmd()
        .args(["--root", root.to_str().unwrap(), "sync"])
        .output()
        .expect("sync");
    assert!(output.status.success());

    let report = parse_json(&output.stdout);
    let mut keys = report
        .as_object()
        .expect("object")
        .keys()
        .map(String::as_str)
        .collect::<Vec<_>>();
    keys.sort_unstable();
    assert_eq!(
        keys,
        ["failed", "results", "skipped", "stale", "synced", "total", "updated"]
    );
    assert_eq!(report["synced"], 1);
}

#[test]
fn sync_fail_fast_reports_pairs_up_to_failure() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    write_fixture(root);
    fs::write(root.join("plain.html"), "<html></html>\n").expect("plain");
    fs::write(root.join("later.html"), host_page("{}")).expect("later");

    let output = cmd()
        .args([
            "--root",
            root.to_str().unwrap(),
            "sync",
            "--fail-fast",
            "--pair",
            "dev-tools/worksheet-1-qa-export.json:worksheet-1.html",
            "--pair",
            "dev-tools/worksheet-1-qa-export.json:plain.html",
            "--pair",
            "dev-tools/worksheet-1-qa-export.json:later.html",
        ])
        .output()
        .expect("sync");
    assert_eq!(output.status.code().unwrap(), 4);

    let report = parse_json(&output.stdout);
    assert_eq!(report["total"], 2);
    assert_eq!(report["results"][0]["status"], "updated");
    assert_eq!(report["results"][1]["status"], "failed");
    assert_eq!(report["results"][1]["error"]["kind"], "MarkerNotFound");
    assert_eq!(
        fs::read_to_string(root.join("later.html")).expect("later"),
        host_page("{}")
    );
}

#[test]
fn sync_check_detects_stale_pages_without_writing() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    write_fixture(root);
    let before = fs::read_to_string(root.join("worksheet-1.html")).expect("page");

    let check = cmd()
        .args(["--root", root.to_str().unwrap(), "sync", "--check"])
        .output()
        .expect("check");
    assert_eq!(check.status.code().unwrap(), 1);
    assert_eq!(parse_json(&check.stdout)["stale"], 1);
    assert_eq!(
        fs::read_to_string(root.join("worksheet-1.html")).expect("page"),
        before
    );

    let sync = cmd()
        .args(["--root", root.to_str().unwrap(), "sync"])
        .output()
        .expect("sync");
    assert!(sync.status.success());

    let recheck = cmd()
        .args(["--root", root.to_str().unwrap(), "sync", "--check"])
        .output()
        .expect("recheck");
    assert!(recheck.status.success());
    assert_eq!(parse_json(&recheck.stdout)["results"][0]["status"], "unchanged");
}

#[test]
fn sync_manifest_supplies_pairs_and_marker() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    fs::write(root.join("data.json"), r#"{"b": 1, "a": 2}"#).expect("data");
    fs::write(root.join("page.js"), "var DATA = {};\nboot(DATA);\n").expect("page");
    fs::write(
        root.join("sync.json"),
        r#"{"marker": "var DATA = ", "pairs": [{"source": "data.json", "host": "page.js"}]}"#,
    )
    .expect("manifest");

    let output = cmd()
        .args([
            "--root",
            root.to_str().unwrap(),
            "sync",
            "--manifest",
            "sync.json",
        ])
        .output()
        .expect("sync");
    assert!(output.status.success());
    assert_eq!(
        fs::read_to_string(root.join("page.js")).expect("page"),
        "var DATA = {\n  \"b\": 1,\n  \"a\": 2\n};\nboot(DATA);\n"
    );
}

#[test]
fn malformed_pair_is_usage_error() {
    let output = cmd()
        .args(["sync", "--pair", "only-one-path.json"])
        .output()
        .expect("sync");
    assert_eq!(output.status.code().unwrap(), 2);
    let err = parse_json(&output.stderr);
    assert_eq!(err["error"]["kind"], "Usage");
}

#[test]
fn check_reports_summary_and_schema_errors() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    write_fixture(root);

    let ok = cmd()
        .args([
            "--root",
            root.to_str().unwrap(),
            "check",
            "dev-tools/worksheet-1-qa-export.json",
        ])
        .output()
        .expect("check");
    assert!(ok.status.success());
    let summary = parse_json(&ok.stdout);
    assert_eq!(summary["worksheet"], "worksheet-1");
    assert_eq!(summary["questions"], 2);
    assert_eq!(summary["options"], 4);

    fs::write(root.join("bad.json"), worksheet_json("Z")).expect("bad");
    let bad = cmd()
        .args(["--root", root.to_str().unwrap(), "check", "bad.json"])
        .output()
        .expect("check bad");
    assert_eq!(bad.status.code().unwrap(), 10);
    let err = parse_json(&bad.stderr);
    assert_eq!(err["error"]["kind"], "Schema");
}

#[test]
fn render_prints_question_markup() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    write_fixture(root);

    let output = cmd()
        .args([
            "--root",
            root.to_str().unwrap(),
            "render",
            "dev-tools/worksheet-1-qa-export.json",
        ])
        .output()
        .expect("render");
    assert!(output.status.success());
    let html = String::from_utf8(output.stdout).expect("utf8");
    assert!(html.contains("<h4>Question 1: What does the I1 input read?</h4>"));
    assert!(html.contains("name=\"question-2\" value=\"B\""));
}

#[test]
fn grade_scores_answers() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    write_fixture(root);

    let output = cmd()
        .args([
            "--root",
            root.to_str().unwrap(),
            "grade",
            "dev-tools/worksheet-1-qa-export.json",
            "--answer",
            "1=A",
            "--answer",
            "2=A",
        ])
        .output()
        .expect("grade");
    assert!(output.status.success());
    let report = parse_json(&output.stdout);
    assert_eq!(report["correct"], 1);
    assert_eq!(report["submitted"], 2);
    assert_eq!(report["total"], 2);
    assert_eq!(report["results"][0]["correct"], true);
    assert_eq!(report["results"][1]["correct_answer"], "B");

    let missing = cmd()
        .args([
            "--root",
            root.to_str().unwrap(),
            "grade",
            "dev-tools/worksheet-1-qa-export.json",
            "--answer",
            "9=A",
        ])
        .output()
        .expect("grade missing");
    assert_eq!(missing.status.code().unwrap(), 3);
}
