//! Fetching the newest Enterprise HTML dump for a wiki.

use reqwest::blocking::Client;
use scraper::{Html, Selector};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

/// Listing of Enterprise HTML dump runs.
pub const RUNS_URL: &str = "https://dumps.wikimedia.org/other/enterprise_html/runs/";

/// Namespaces published as Enterprise HTML dumps.
pub const NAMESPACES: [u32; 3] = [0, 6, 10];

const DUMP_SUFFIX: &str = "ENTERPRISE-HTML.json.tar.gz";
const BLOCK_SIZE: usize = 8192;
const REPORT_EVERY_BLOCKS: u64 = 10_000;

/// What to download and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Wiki language code, e.g. `en`.
    pub lang: String,
    /// Dump namespace; one of [`NAMESPACES`].
    pub namespace: u32,
    /// Directory receiving the dump.
    pub output_dir: PathBuf,
    /// Runs listing to consult.
    pub runs_url: String,
}

/// Failures while locating or fetching a dump.
#[derive(Debug)]
pub enum DownloadError {
    /// Transport-level failure.
    Http(reqwest::Error),
    /// The server answered with a non-success status.
    Status {
        /// Requested URL.
        url: String,
        /// Returned status code.
        status: u16,
    },
    /// The runs listing had no links.
    EmptyIndex,
    /// The namespace has no Enterprise dump.
    UnsupportedNamespace(u32),
    /// A dump URL could not be built.
    Url(url::ParseError),
    /// Local filesystem failure.
    Io(io::Error),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(err) => write!(f, "request failed: {err}"),
            Self::Status { url, status } => write!(f, "{url} answered with status {status}"),
            Self::EmptyIndex => f.write_str("unable to find the latest dump run"),
            Self::UnsupportedNamespace(ns) => {
                write!(f, "namespace {ns} is not dumped (expected one of 0, 6, 10)")
            }
            Self::Url(err) => write!(f, "invalid dump url: {err}"),
            Self::Io(err) => write!(f, "failed to store dump: {err}"),
        }
    }
}

impl std::error::Error for DownloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::Url(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Status { .. } | Self::EmptyIndex | Self::UnsupportedNamespace(_) => None,
        }
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err)
    }
}

impl From<io::Error> for DownloadError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<url::ParseError> for DownloadError {
    fn from(err: url::ParseError) -> Self {
        Self::Url(err)
    }
}

/// Picks the run named by the last link of a runs listing.
pub fn latest_run(index_html: &str) -> Option<String> {
    let document = Html::parse_document(index_html);
    let selector = Selector::parse("a").ok()?;
    let text: String = document.select(&selector).last()?.text().collect();
    let run = text.trim();
    let run = run.strip_suffix('/').unwrap_or(run);
    (!run.is_empty()).then(|| run.to_string())
}

/// File name of a dump for one wiki, namespace and run.
pub fn dump_file_name(lang: &str, namespace: u32, run: &str) -> String {
    format!("{lang}wiki-NS{namespace}-{run}-{DUMP_SUFFIX}")
}

/// URL of a dump file below the runs listing.
pub fn dump_url(runs_url: &str, run: &str, file_name: &str) -> Result<Url, DownloadError> {
    let base = Url::parse(runs_url)?;
    let base = if base.path().ends_with('/') {
        base
    } else {
        Url::parse(&format!("{runs_url}/"))?
    };
    Ok(base.join(&format!("{run}/{file_name}"))?)
}

/// Downloads the newest dump matching `request` and returns its local path.
pub fn download_latest(client: &Client, request: &DownloadRequest) -> Result<PathBuf, DownloadError> {
    if !NAMESPACES.contains(&request.namespace) {
        return Err(DownloadError::UnsupportedNamespace(request.namespace));
    }

    let index = get(client, &request.runs_url)?.text()?;
    let run = latest_run(&index).ok_or(DownloadError::EmptyIndex)?;
    let file_name = dump_file_name(&request.lang, request.namespace, &run);
    let url = dump_url(&request.runs_url, &run, &file_name)?;

    fs::create_dir_all(&request.output_dir)?;
    let target = request.output_dir.join(&file_name);
    info!(url = %url, path = %target.display(), "downloading dump");

    let response = get(client, url.as_str())?;
    let total = response.content_length();
    copy_with_progress(response, &target, total)?;
    info!(path = %target.display(), "download complete");
    Ok(target)
}

fn get(client: &Client, url: &str) -> Result<reqwest::blocking::Response, DownloadError> {
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

fn copy_with_progress<R: Read>(mut source: R, target: &Path, total: Option<u64>) -> io::Result<u64> {
    let mut out = BufWriter::new(File::create(target)?);
    let mut block = vec![0u8; BLOCK_SIZE];
    let mut blocks = 0u64;
    let mut written = 0u64;
    loop {
        let read = match source.read(&mut block) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        out.write_all(&block[..read])?;
        written += read as u64;
        blocks += 1;
        if blocks % REPORT_EVERY_BLOCKS == 0 {
            report_progress(written, total);
        }
    }
    out.flush()?;
    Ok(written)
}

fn report_progress(written: u64, total: Option<u64>) {
    let gib = |bytes: u64| bytes as f64 / (1024.0 * 1024.0 * 1024.0);
    match total {
        Some(total) if total > 0 => info!(
            "downloaded {:.2}/{:.2} GiB ({:.1}%)",
            gib(written),
            gib(total),
            written as f64 * 100.0 / total as f64
        ),
        _ => info!("downloaded {:.2} GiB", gib(written)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const INDEX: &str = r#"<html><head><title>Index of /other/enterprise_html/runs/</title></head>
<body><h1>Index of /other/enterprise_html/runs/</h1><hr><pre><a href="../">../</a>
<a href="20240101/">20240101/</a>                                          02-Jan-2024 10:00    -
<a href="20240120/">20240120/</a>                                          21-Jan-2024 10:00    -
</pre><hr></body></html>"#;

    #[test]
    fn picks_last_run_link() {
        assert_eq!(latest_run(INDEX), Some("20240120".to_string()));
        assert_eq!(latest_run("<html><body><p>nothing</p></body></html>"), None);
    }

    #[test]
    fn builds_dump_location() {
        let name = dump_file_name("fr", 0, "20240120");
        assert_eq!(name, "frwiki-NS0-20240120-ENTERPRISE-HTML.json.tar.gz");
        assert_eq!(
            dump_url(RUNS_URL, "20240120", &name).unwrap().as_str(),
            "https://dumps.wikimedia.org/other/enterprise_html/runs/20240120/frwiki-NS0-20240120-ENTERPRISE-HTML.json.tar.gz"
        );
        assert_eq!(
            dump_url("https://mirror.test/runs", "1", "f").unwrap().as_str(),
            "https://mirror.test/runs/1/f"
        );
    }

    #[test]
    fn rejects_unknown_namespace() {
        let request = DownloadRequest {
            lang: "en".into(),
            namespace: 4,
            output_dir: PathBuf::from("unused"),
            runs_url: RUNS_URL.into(),
        };
        let err = download_latest(&Client::new(), &request).unwrap_err();
        assert!(matches!(err, DownloadError::UnsupportedNamespace(4)));
    }

    #[test]
    fn copies_stream_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("dump.json.tar.gz");
        let payload = vec![7u8; BLOCK_SIZE * 3 + 5];
        let written = copy_with_progress(&payload[..], &target, Some(payload.len() as u64)).unwrap();
        assert_eq!(written, payload.len() as u64);
        assert_eq!(fs::read(&target).unwrap(), payload);
    }
}
