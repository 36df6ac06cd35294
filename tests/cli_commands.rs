use assert_cmd::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;

const STORE: &str = "tests/fixtures/store.yaml";
const CONFIG: &str = "tests/fixtures/refgate.yaml";

fn refgate(config: &Path) -> Command {
    let bin = assert_cmd::cargo::cargo_bin!("refgate");
    let mut cmd = Command::new(bin);
    cmd.env_remove("REFGATE_AUTH_OVERRIDE_JSON")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config);
    cmd
}

/// Runs with builtin defaults only.
fn defaults() -> (tempfile::TempDir, Command) {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing: PathBuf = dir.path().join("absent.yaml");
    let cmd = refgate(&missing);
    (dir, cmd)
}

fn json_stdout(cmd: &mut Command) -> Value {
    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    serde_json::from_str(&stdout).expect("valid json")
}

fn text_stdout(cmd: &mut Command) -> String {
    let assert = cmd.assert().success();
    String::from_utf8(assert.get_output().stdout.clone())
        .expect("utf8 output")
        .trim()
        .to_string()
}

#[test]
fn origin_hierarchy_lists_ancestors() {
    let (_dir, mut cmd) = defaults();
    let value = json_stdout(cmd.args(["-o", "json", "origin", "hierarchy", "@a.b.c"]));
    assert_eq!(value, serde_json::json!(["@a.b.c", "@a.b", "@a", ""]));
}

#[test]
fn origin_containment_and_validation() {
    let (_dir, mut cmd) = defaults();
    assert_eq!(
        text_stdout(cmd.args(["origin", "contains", "default", "@x.y"])),
        "true"
    );

    let (_dir, mut cmd) = defaults();
    assert_eq!(
        text_stdout(cmd.args(["origin", "contains", "@x", "@xy"])),
        "false"
    );

    let (_dir, mut cmd) = defaults();
    cmd.args(["origin", "parts", "@Bad"]).assert().failure();
}

#[test]
fn query_parse_prints_canonical_form() {
    let (_dir, mut cmd) = defaults();
    let value = json_stdout(cmd.args(["-o", "json", "query", "parse", " c|a&b "]));
    assert_eq!(value["canonical"].as_str(), Some("a:b|c"));
    assert_eq!(value["tags"], serde_json::json!(["a", "b", "c"]));
    assert_eq!(value["query"]["or_terms"][0]["tag"].as_str(), Some("c"));
}

#[test]
fn query_compile_builds_predicate() {
    let (_dir, mut cmd) = defaults();
    assert_eq!(
        text_stdout(cmd.args(["query", "compile", "a:b|c"])),
        "Or(HasAllTags([a, b]), HasTag(c))"
    );

    let (_dir, mut cmd) = defaults();
    assert_eq!(
        text_stdout(cmd.args(["query", "compile", "", "--empty-matches-none"])),
        "False"
    );
}

#[test]
fn query_match_evaluates_record() {
    let (_dir, mut cmd) = defaults();
    let value = json_stdout(cmd.args([
        "-o",
        "json",
        "query",
        "match",
        "science:!_secret",
        "--tags",
        "science,news",
    ]));
    assert_eq!(value["matches"], Value::Bool(true));
    assert!(value.get("captured").is_none());

    let (_dir, mut cmd) = defaults();
    assert_eq!(
        text_stdout(cmd.args(["query", "match", "science:!_secret", "--tags", "science,_secret"])),
        "false"
    );

    let (_dir, mut cmd) = defaults();
    assert_eq!(
        text_stdout(cmd.args(["query", "match", "science", "--tags", "science", "--origin", "@remote"])),
        "true"
    );

    let (_dir, mut cmd) = defaults();
    assert_eq!(text_stdout(cmd.args(["query", "match", "@*"])), "true");
}

#[test]
fn query_length_follows_overrides() {
    let (_dir, mut cmd) = defaults();
    cmd.args(["--set", "max_query_len=4", "query", "parse", "abcde"])
        .assert()
        .failure();

    let (_dir, mut cmd) = defaults();
    cmd.args(["query", "parse", "(nope"]).assert().failure();
}

#[test]
fn auth_check_prints_decision_table() {
    let (_dir, mut cmd) = defaults();
    let value = json_stdout(cmd.args([
        "-o",
        "json",
        "auth",
        "--fixture",
        STORE,
        "--user",
        "user/alice",
        "check",
    ]));
    let rows = value.as_array().expect("rows");
    let row = |subject: &str| {
        rows.iter()
            .find(|row| row["subject"].as_str() == Some(subject))
            .unwrap_or_else(|| panic!("missing row {subject}"))
    };
    assert_eq!(row("https://team.example/notes")["read"], Value::Bool(false));
    assert_eq!(row("https://team.example/notes")["write"], Value::Bool(true));
    assert_eq!(row("https://other.example")["read"], Value::Bool(false));
    assert_eq!(row("https://alice.example/diary")["write"], Value::Bool(true));
    assert_eq!(row("https://alice.example/frozen")["write"], Value::Bool(false));
    assert_eq!(row("https://news.example")["read"], Value::Bool(true));
    assert_eq!(row("https://mirror.example")["read"], Value::Bool(true));
    assert_eq!(row("+plugin/feed")["write"], Value::Bool(false));
    assert_eq!(row("_team")["write"], Value::Bool(false));
}

#[test]
fn anonymous_caller_sees_public_and_remote_only() {
    let (_dir, mut cmd) = defaults();
    assert_eq!(
        text_stdout(cmd.args(["auth", "--fixture", STORE, "read-ref", "https://other.example"])),
        "deny"
    );

    let (_dir, mut cmd) = defaults();
    assert_eq!(
        text_stdout(cmd.args([
            "auth",
            "--fixture",
            STORE,
            "read-ref",
            "https://mirror.example",
            "--origin",
            "@mirror",
        ])),
        "allow"
    );

    let (_dir, mut cmd) = defaults();
    assert_eq!(
        text_stdout(cmd.args(["auth", "read-spec"])),
        "HasTag(public)"
    );
}

#[test]
fn write_ref_checks_new_tags() {
    let base = [
        "auth",
        "--fixture",
        STORE,
        "--user",
        "user/alice",
        "--role",
        "USER",
        "write-ref",
        "https://alice.example/diary",
        "--tags",
    ];

    let (_dir, mut cmd) = defaults();
    assert_eq!(
        text_stdout(cmd.args(base).arg("user/alice,science,_reading")),
        "allow"
    );

    let (_dir, mut cmd) = defaults();
    assert_eq!(
        text_stdout(cmd.args(base).arg("user/alice,science,_secret")),
        "deny"
    );
}

#[test]
fn moderators_unlock_and_see_everything() {
    let (_dir, mut cmd) = defaults();
    assert_eq!(
        text_stdout(cmd.args([
            "auth",
            "--fixture",
            STORE,
            "--user",
            "user/mo",
            "--role",
            "role_mod",
            "write-ref",
            "https://alice.example/frozen",
        ])),
        "allow"
    );

    let (_dir, mut cmd) = defaults();
    let value = json_stdout(cmd.args([
        "-o", "json", "auth", "--role", "MOD", "filter", "_secret", "public",
    ]));
    assert_eq!(value["visible"], serde_json::json!(["_secret", "public"]));
    assert_eq!(value["hidden"], Value::Null);
}

#[test]
fn user_edits_cannot_grant_foreign_tags() {
    let (_dir, mut cmd) = defaults();
    assert_eq!(
        text_stdout(cmd.args([
            "auth",
            "--fixture",
            STORE,
            "--user",
            "user/alice",
            "write-user",
            "user/alice",
            "--read-access",
            "_reading,_other",
        ])),
        "deny"
    );
}

#[test]
fn config_file_sets_local_origin() {
    let mut cmd = refgate(Path::new(CONFIG));
    let value = json_stdout(cmd.args(["-o", "json", "config", "show"]));
    assert_eq!(value["local_origin"].as_str(), Some("@home"));
    assert_eq!(value["max_query_len"].as_u64(), Some(64));
    assert_eq!(
        value["provenance"]["local_origin"]["source"].as_str(),
        Some("file")
    );
    assert_eq!(
        value["provenance"]["max_search_len"]["source"].as_str(),
        Some("builtin")
    );

    // Records from "" are replicas once the node serves @home.
    let mut cmd = refgate(Path::new(CONFIG));
    assert_eq!(
        text_stdout(cmd.args(["auth", "--fixture", STORE, "read-ref", "https://other.example"])),
        "allow"
    );
}

#[test]
fn cli_overrides_beat_config_file() {
    let mut cmd = refgate(Path::new(CONFIG));
    let value = json_stdout(cmd.args([
        "-o",
        "json",
        "--set",
        "local_origin=@elsewhere",
        "config",
        "get",
        "local_origin",
    ]));
    assert_eq!(value.as_str(), Some("@elsewhere"));

    let mut cmd = refgate(Path::new(CONFIG));
    cmd.args(["--set", "role_hierarchy=ADMIN > ADMIN", "info"])
        .assert()
        .failure();
}

#[test]
fn config_validate_reports_bad_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bad = dir.path().join("bad.yaml");
    std::fs::write(&bad, "role_hierarchy:\n  - USER > ROOT\n").expect("write config");

    let (_dir, mut cmd) = defaults();
    cmd.args(["config", "validate"]).arg(&bad).assert().failure();

    let (_dir, mut cmd) = defaults();
    assert!(text_stdout(cmd.args(["config", "validate", CONFIG])).contains("is valid"));
}

#[test]
fn info_reports_version_and_hierarchy() {
    let (_dir, mut cmd) = defaults();
    let value = json_stdout(cmd.args(["-o", "json", "info"]));
    assert_eq!(value["version"].as_str(), Some(env!("CARGO_PKG_VERSION")));
    assert_eq!(value["config_present"], Value::Bool(false));
    let admin = value["implied_roles"]
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry[0].as_str() == Some("ADMIN"))
        .expect("admin entry");
    assert!(admin[1]
        .as_array()
        .unwrap()
        .iter()
        .any(|role| role.as_str() == Some("USER")));
}
