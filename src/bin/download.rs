use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use fastdump::download::{download_latest, DownloadRequest, RUNS_URL};
use fastdump::init_tracing;
use reqwest::blocking::Client;

#[derive(Parser, Debug)]
#[command(
    name = "fastdump-download",
    version,
    about = "Download the latest Wikimedia Enterprise HTML dump of a wiki"
)]
struct DownloadCli {
    /// Directory receiving the dump
    #[arg(env = "FASTDUMP_DOWNLOAD_DIR")]
    output: PathBuf,

    /// Wiki language code (e.g. en, fr)
    #[arg(long, short = 'l', env = "FASTDUMP_LANG")]
    lang: String,

    /// Namespace to download: 0, 6 or 10
    #[arg(long, env = "FASTDUMP_NAMESPACE", default_value_t = 0)]
    namespace: u32,

    /// Runs listing to consult
    #[arg(long, env = "FASTDUMP_RUNS_URL", default_value = RUNS_URL)]
    runs_url: String,

    /// Seconds to wait for the server before giving up
    #[arg(long, env = "FASTDUMP_CONNECT_TIMEOUT_SECS", default_value_t = 30)]
    connect_timeout_secs: u64,
}

fn main() -> Result<()> {
    let cli = DownloadCli::parse();
    init_tracing();

    let client = Client::builder()
        .connect_timeout(Duration::from_secs(cli.connect_timeout_secs.max(1)))
        .timeout(None)
        .build()
        .context("failed to build HTTP client")?;
    let request = DownloadRequest {
        lang: cli.lang,
        namespace: cli.namespace,
        output_dir: cli.output,
        runs_url: cli.runs_url,
    };
    let path = download_latest(&client, &request).context("dump download failed")?;
    println!("{}", path.display());
    Ok(())
}
