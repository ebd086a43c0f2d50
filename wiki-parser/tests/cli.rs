use std::io::Write;
use std::process::{Command, Stdio};

use serde_json::Value;

fn parse_stdout(stdout: &[u8]) -> Value {
    serde_json::from_slice(stdout).expect("cli prints JSON")
}

#[test]
fn cli_reads_file_path() {
    let output = Command::new(env!("CARGO_BIN_EXE_wiki_parser"))
        .arg("tests/fixtures/html/nested-sections.html")
        .arg("--include-lists")
        .output()
        .expect("run CLI");

    assert!(
        output.status.success(),
        "cli exited with {}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );

    let expected: Value =
        serde_json::from_str(include_str!("fixtures/expected/nested-sections.json")).unwrap();
    assert_eq!(parse_stdout(&output.stdout), expected);
}

#[test]
fn cli_reads_stdin_when_no_args() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_wiki_parser"))
        .arg("--include-tables")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn CLI");

    let html = include_str!("fixtures/html/tables-and-infoboxes.html");
    child
        .stdin
        .take()
        .expect("stdin open")
        .write_all(html.as_bytes())
        .expect("write stdin");

    let output = child.wait_with_output().expect("read CLI output");
    assert!(
        output.status.success(),
        "cli exited with {}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );

    let expected: Value =
        serde_json::from_str(include_str!("fixtures/expected/tables-and-infoboxes.json")).unwrap();
    assert_eq!(parse_stdout(&output.stdout), expected);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("plain infobox layout is not supported"));
}
