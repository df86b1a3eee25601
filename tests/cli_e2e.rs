//! Tests that drive the `mov-pkg` binary: output formats, the JSON contract
//! and exit codes.

mod support;

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

use support::workspace::{scenario, GoWorkspace, API_GO_DB, MODELS, STORE, USE_GO_DB};

fn mov_pkg(workspace: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mov-pkg"))
        .arg("--workspace")
        .arg(workspace)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run mov-pkg")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn json_output_and_files_written() {
    let ws = scenario();
    let output = mov_pkg(ws.path(), &["-f", STORE, "-t", MODELS, "-s", "DB", "--format", "json", "./..."]);
    assert_eq!(output.status.code(), Some(0));

    let json = stdout_json(&output);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["schema_version"], "1");
    assert_eq!(json["alias"], "models");
    assert_eq!(json["symbols"][0]["name"], "Foo");
    assert_eq!(json["symbols"][0]["new_name"], "FooDB");
    assert_eq!(json["files"].as_array().unwrap().len(), 2);
    assert_eq!(json["files"][0]["file"], "api/api.go");

    assert_eq!(ws.read("store/use.go"), USE_GO_DB);
    assert_eq!(ws.read("api/api.go"), API_GO_DB);
}

#[test]
fn diff_format_prints_only_the_diff() {
    let ws = scenario();
    let output = mov_pkg(ws.path(), &["-f", STORE, "-t", MODELS, "-d", "--format", "diff", "./..."]);
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("--- a/api/api.go\n+++ b/api/api.go\n"));
    assert!(stdout.contains("+func Get() models.Foo {"));
    assert!(stdout.contains("--- a/store/use.go"));
    assert_eq!(ws.read("store/use.go"), "package store\n\nfunc NewFoo() *Foo {\n\treturn &Foo{}\n}\n");
}

#[test]
fn text_format_is_the_default() {
    let ws = scenario();
    let output = mov_pkg(ws.path(), &["-f", STORE, "-t", MODELS, "-d", "./..."]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("Dry run: would relocate 1 symbol(s)"));
    assert!(stdout.contains("store/use.go: 2 replacement(s), import added"));
}

#[test]
fn names_filter_warns_about_unknown_names() {
    let ws = scenario();
    let output = mov_pkg(
        ws.path(),
        &["-f", STORE, "-t", MODELS, "-n", "Foo,Nope", "-d", "--format", "json", "./..."],
    );
    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    let codes: Vec<_> = json["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["code"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(codes, vec!["NAME_NOT_FOUND"]);
}

// ============================================================================
// Exit Codes
// ============================================================================

#[test]
fn invalid_arguments_exit_2() {
    let ws = scenario();
    let output = mov_pkg(ws.path(), &["-f", STORE, "-t", STORE]);
    assert_eq!(output.status.code(), Some(2));
    let json = stdout_json(&output);
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"]["code"], 2);
}

#[test]
fn syntax_error_exits_3() {
    let ws = scenario();
    ws.write("broken/broken.go", "package broken\n\nfunc (\n");
    let output = mov_pkg(ws.path(), &["-f", STORE, "-t", MODELS, "./..."]);
    assert_eq!(output.status.code(), Some(3));
    let json = stdout_json(&output);
    assert_eq!(json["error"]["details"]["file"], "broken/broken.go");
}

#[test]
fn catalog_conflict_exits_3() {
    let ws = GoWorkspace::new("example.com/app");
    ws.write("store/models.go", "//go:build !windows\n\npackage store\n\ntype Foo struct{}\n");
    ws.write("store/models_windows.go", "package store\n\ntype Foo struct{ ID int }\n");
    let output = mov_pkg(ws.path(), &["-f", STORE, "-t", MODELS, "-l", "/models", "./..."]);
    assert_eq!(output.status.code(), Some(3));
    let json = stdout_json(&output);
    assert_eq!(json["error"]["details"]["name"], "Foo");
}

#[test]
fn alias_conflict_exits_4() {
    let ws = scenario();
    ws.write(
        "report/clash.go",
        "package report\n\nimport \"example.com/app/store\"\n\nvar models = 1\n\nvar _ store.Foo\n",
    );
    let output = mov_pkg(ws.path(), &["-f", STORE, "-t", MODELS, "./..."]);
    assert_eq!(output.status.code(), Some(4));
    let json = stdout_json(&output);
    assert_eq!(json["error"]["details"]["alias"], "models");
}
