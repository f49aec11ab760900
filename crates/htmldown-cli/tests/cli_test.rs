//! Integration tests for the htmldown CLI.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_htmldown"))
}

#[test]
fn test_basic_stdin() {
    cli()
        .write_stdin("<h1>Title</h1><p>Content</p>")
        .assert()
        .success()
        .stdout("Title\n=====\n\nContent\n");
}

#[test]
fn test_file_input() {
    let temp_dir = TempDir::new().unwrap();
    let input_path = temp_dir.path().join("input.html");
    fs::write(&input_path, "<p>Test content</p>").unwrap();

    cli()
        .arg("--file")
        .arg(input_path.to_str().unwrap())
        .assert()
        .success()
        .stdout("Test content\n");
}

#[test]
fn test_atx_headings() {
    cli()
        .arg("--atx-headings")
        .write_stdin("<h1>H1</h1><h2>H2</h2>")
        .assert()
        .success()
        .stdout("# H1\n\n## H2\n");
}

#[test]
fn test_fenced_code_blocks() {
    cli()
        .arg("--fenced")
        .write_stdin("<pre><code>code</code></pre>")
        .assert()
        .success()
        .stdout("```\ncode\n```\n");
}

#[test]
fn test_indented_code_blocks_by_default() {
    cli()
        .write_stdin("<pre><code>code</code></pre>")
        .assert()
        .success()
        .stdout("    code\n");
}

#[test]
fn test_br_option() {
    cli()
        .arg("--br")
        .arg("\\")
        .write_stdin("Line 1<br>Line 2")
        .assert()
        .success()
        .stdout("Line 1\\\nLine 2\n");
}

#[test]
fn test_bullet_option() {
    cli()
        .arg("--bullet")
        .arg("-")
        .write_stdin("<ul><li>Item</li></ul>")
        .assert()
        .success()
        .stdout("-   Item\n");
}

#[test]
fn test_multi_char_bullet_is_rejected() {
    cli()
        .arg("--bullet")
        .arg("ab")
        .write_stdin("<ul><li>Item</li></ul>")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_unknown_flag_exits_with_one() {
    cli()
        .arg("--no-such-flag")
        .write_stdin("<p>Test</p>")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_nonexistent_file_exits_with_one() {
    cli()
        .arg("--file")
        .arg("/nonexistent/input.html")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn test_empty_input() {
    cli().write_stdin("").assert().success().stdout("");
}

#[test]
fn test_malformed_html_still_converts() {
    cli()
        .write_stdin("<p>Unclosed paragraph<p>Another")
        .assert()
        .success()
        .stdout("Unclosed paragraph\n\nAnother\n");
}

#[test]
fn test_help_flag() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--atx-headings"));
}

#[test]
fn test_version_flag() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_combined_options() {
    cli()
        .arg("--atx-headings")
        .arg("--fenced")
        .arg("--bullet")
        .arg("+")
        .write_stdin("<h1>Title</h1><ul><li>Item</li></ul><pre><code>code</code></pre>")
        .assert()
        .success()
        .stdout(predicate::str::contains("# Title"))
        .stdout(predicate::str::contains("+   Item"))
        .stdout(predicate::str::contains("```\ncode\n```"));
}
