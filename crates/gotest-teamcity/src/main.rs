//! gotest-teamcity: `go test -v` output to TeamCity service messages
//!
//! Reads test output from stdin (or `--input`), writes service messages to
//! stdout (or `--output`). Logs go to stderr.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gotest_teamcity::config::Config;
use gotest_teamcity::convert::{ConvertOptions, convert_stream, write_summary};

fn main() -> Result<()> {
    let config = Config::parse();

    // Initialize tracing subscriber on stderr; stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(config.log_level().into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    config.validate().context("Invalid configuration")?;

    let options = ConvertOptions {
        escape_mode: config.escape_mode(),
        flush_unterminated: config.flush_unterminated,
    };
    info!(
        input = %config.input.as_ref().map_or("<stdin>".into(), |p| p.display().to_string()),
        output = %config.output.as_ref().map_or("<stdout>".into(), |p| p.display().to_string()),
        escape_mode = ?options.escape_mode,
        "Starting gotest-teamcity"
    );

    let result = match (&config.input, &config.output) {
        (None, None) => convert_stream(io::stdin().lock(), io::stdout().lock(), &options),
        (Some(input), None) => {
            let reader = open_input(input)?;
            convert_stream(reader, io::stdout().lock(), &options)
        }
        (None, Some(output)) => {
            let writer = create_output(output)?;
            convert_stream(io::stdin().lock(), writer, &options)
        }
        (Some(input), Some(output)) => {
            let reader = open_input(input)?;
            let writer = create_output(output)?;
            convert_stream(reader, writer, &options)
        }
    };

    let stats = match result {
        Ok(stats) => stats,
        Err(e) => {
            error!(error = %e, "conversion aborted");
            return Err(e).context("Failed to convert test output");
        }
    };

    if let Some(ref path) = config.summary {
        write_summary(path, &stats)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
    }

    Ok(())
}

fn open_input(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}
