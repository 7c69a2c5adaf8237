//! `dss` command-line entry point.
//!
//! Thin wrapper around the `mailsec_scanner` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - Reading domains from arguments, a file or stdin
//! - Writing results as JSON to stdout

use std::io::Write;
use std::process;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::io::AsyncRead;

use mailsec_scanner::config::Cli;
use mailsec_scanner::initialization::init_logger_with;
use mailsec_scanner::{ScanResult, Scanner};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger_with(cli.log_level.clone().into(), cli.log_format.clone())
        .context("Failed to initialize logger")?;

    match run(cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("dss error: {:#}", e);
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let scanner = Scanner::new(cli.scanner_config()).context("Invalid scanner options")?;

    let results = if !cli.domains.is_empty() {
        if cli.zone_file || cli.file.is_some() {
            bail!("domains given as arguments cannot be combined with --file or --zone-file");
        }
        scanner.scan(&cli.domains).await?
    } else {
        let input = open_input(&cli).await?;
        if cli.zone_file {
            scanner.scan_zone(input).await?
        } else {
            scanner.scan_text(input).await?
        }
    };

    scanner.close().await;
    print_results(&results, cli.pretty)
}

async fn open_input(cli: &Cli) -> Result<Box<dyn AsyncRead + Unpin + Send>> {
    match &cli.file {
        Some(path) if path.as_os_str() != "-" => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Ok(Box::new(file))
        }
        _ => Ok(Box::new(tokio::io::stdin())),
    }
}

fn print_results(results: &[ScanResult], pretty: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if pretty {
        serde_json::to_writer_pretty(&mut out, results).context("Failed to write results")?;
        writeln!(out)?;
    } else {
        for result in results {
            serde_json::to_writer(&mut out, result).context("Failed to write results")?;
            writeln!(out)?;
        }
    }

    out.flush()?;
    Ok(())
}
