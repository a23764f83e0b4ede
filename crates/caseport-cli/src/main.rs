//! Caseport
//!
//! Converts Jira issue exports in an input directory into test case import files.

use anyhow::Result;
use caseport_cli::Args;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(&args.log_level)
        .with_target(false)
        .init();

    caseport_cli::run(&args).await?;
    Ok(())
}
