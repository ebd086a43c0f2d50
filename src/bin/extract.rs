use anyhow::Result;
use clap::Parser;
use fastdump::{init_tracing, run_extraction, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let controls = cli.build_controls();
    let summary = run_extraction(&controls)?;
    if summary.failed > 0 {
        tracing::warn!(
            failed = summary.failed,
            "some documents could not be extracted; see the errors above"
        );
    }
    Ok(())
}
