use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use fastdump::{run_extraction, OutputFormat, OutputTarget, PipelineControls, ShardLimits};
use flate2::write::GzEncoder;
use flate2::Compression;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiki_parser::ExtractConfig;

fn article(id: u64, name: &str, paragraph: &str) -> String {
    json!({
        "identifier": id,
        "url": format!("https://en.wikipedia.org/wiki/{name}"),
        "name": name,
        "article_body": {
            "html": format!(
                "<html><body><section><p>{paragraph}</p>\
                 <table><caption>Facts</caption><tr><th>Key</th><td>Value</td></tr></table>\
                 </section></body></html>"
            )
        }
    })
    .to_string()
}

/// Writes a dump with a tar-style prefix, a junk line and one undecodable record.
fn write_dump(dir: &Path) -> PathBuf {
    let lines = [
        format!("dump.ndjson\0\0\0000644\0{}", article(10, "Alpha", "First article.")),
        "not a record".to_string(),
        article(11, "Beta", "Second article."),
        json!({"identifier": 12, "url": "https://en.wikipedia.org/wiki/Broken"}).to_string(),
        article(13, "Gamma", "Third article."),
        article(14, "Delta", "Fourth article."),
    ];
    let path = dir.join("enwiki-NS0-ENTERPRISE-HTML.json.tar.gz");
    let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
    for line in lines {
        encoder.write_all(line.as_bytes()).unwrap();
        encoder.write_all(b"\n").unwrap();
    }
    encoder.finish().unwrap();
    path
}

fn controls(dir: &Path, input: PathBuf) -> PipelineControls {
    PipelineControls {
        input,
        output: OutputTarget::Directory(dir.join("out")),
        format: OutputFormat::Json,
        extract: ExtractConfig {
            include_tables: true,
            ..ExtractConfig::default()
        },
        dev_limit: None,
        workers: 3,
        limits: ShardLimits {
            max_shard_bytes: 1,
            max_files_per_directory: 2,
        },
        stats_path: dir.join("stats.csv"),
    }
}

fn read_shards(root: &Path) -> Vec<Value> {
    let mut paths = Vec::new();
    for directory in fs::read_dir(root).unwrap() {
        for file in fs::read_dir(directory.unwrap().path()).unwrap() {
            paths.push(file.unwrap().path());
        }
    }
    paths.sort();
    paths
        .iter()
        .flat_map(|path| {
            fs::read_to_string(path)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect::<Vec<Value>>()
        })
        .collect()
}

#[test]
fn extracts_sharded_json_in_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_dump(dir.path());
    let summary = run_extraction(&controls(dir.path(), input)).unwrap();

    assert_eq!(summary.articles, 4);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped_lines, 1);

    let records = read_shards(&dir.path().join("out"));
    let titles: Vec<&str> = records
        .iter()
        .map(|record| record["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Alpha", "Beta", "Gamma", "Delta"]);
    assert_eq!(records[0]["id"], "10");
    assert_eq!(records[0]["body"], "Alpha\n\nFirst article.");
    assert_eq!(
        records[0]["tables"][0],
        json!({
            "title": "Facts",
            "data": [[{"type": "header", "value": "Key"}, {"type": "cell", "value": "Value"}]],
            "type": "table",
            "description": "",
            "section_title": "",
            "section_text": "First article."
        })
    );

    // one record per shard, two shards per directory
    assert!(dir.path().join("out/0000/wiki_0001.jsonl").exists());
    assert!(dir.path().join("out/0001/wiki_0001.jsonl").exists());

    let stats: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("stats.csv")).unwrap()).unwrap();
    assert_eq!(stats["articles"], 4);
    assert_eq!(stats["failed"], 1);
    assert_eq!(stats["skipped_lines"], 1);
    assert!(stats["overall (s)"].is_number());
    assert!(stats["latency_mean (s)"].is_number());
}

#[test]
fn dev_limit_stops_early() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_dump(dir.path());
    let mut controls = controls(dir.path(), input);
    controls.dev_limit = Some(2);
    let summary = run_extraction(&controls).unwrap();

    assert_eq!(summary.articles, 2);
    assert_eq!(summary.failed, 0);
    let titles: Vec<Value> = read_shards(&dir.path().join("out"))
        .into_iter()
        .map(|record| record["title"].clone())
        .collect();
    assert_eq!(titles, vec![json!("Alpha"), json!("Beta")]);
}

#[test]
fn binary_streams_text_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_dump(dir.path());
    let stats = dir.path().join("run-stats.json");
    let output = Command::new(env!("CARGO_BIN_EXE_fastdump-extract"))
        .arg(&input)
        .args(["--stdout", "--html", "--processes", "2", "--stats"])
        .arg(&stats)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run fastdump-extract");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).unwrap();
    let docs: Vec<&str> = stdout.lines().filter(|line| line.starts_with("<doc")).collect();
    assert_eq!(
        docs,
        vec![
            "<doc id=\"10\" url=\"https://en.wikipedia.org/wiki/Alpha\" title=Alpha>",
            "<doc id=\"11\" url=\"https://en.wikipedia.org/wiki/Beta\" title=Beta>",
            "<doc id=\"13\" url=\"https://en.wikipedia.org/wiki/Gamma\" title=Gamma>",
            "<doc id=\"14\" url=\"https://en.wikipedia.org/wiki/Delta\" title=Delta>",
        ]
    );
    assert!(stats.exists());
    assert!(!dir.path().join("out").exists());
}
