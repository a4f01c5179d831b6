//! zotllm - Run model-backed tasks over a Zotero library.

use clap::Parser;
use std::error::Error;
use zotllm_cli::{logging, AppConfig, Cli, Formatter};

fn main() {
    let cli = Cli::parse();
    let formatter = Formatter::new(cli.format, !cli.no_color);

    if let Err(e) = run(&cli, &formatter) {
        eprintln!("{}", formatter.error(&format!("Error: {}", e)));
        if cli.verbose {
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli, formatter: &Formatter) -> zotllm_cli::Result<()> {
    let path = AppConfig::locate(cli.config.as_deref())?;
    let config = AppConfig::load(&path)?;

    logging::init(
        cli.verbose,
        cli.log_level.as_deref(),
        config.logging.level.as_deref(),
    );
    tracing::debug!(config = %path.display(), "Configuration loaded");

    let report = zotllm_cli::execute(&cli.command, &config)?;
    println!("{}", formatter.format_report(&report)?);
    Ok(())
}
