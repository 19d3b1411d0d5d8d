// docsweep - extract text, tables and images from a folder of documents
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use docsweep::config::{BatchConfig, FileConfig, Overrides};
use docsweep::logging::{self, LogSettings};
use docsweep::TracingObserver;

#[derive(Parser, Debug)]
#[command(name = "docsweep", version, about = "Batch-extract text, tables and images from PDF, DOCX and CSV files")]
struct Cli {
    /// Directory containing the documents to process
    #[arg(short, long, env = "DOCSWEEP_INPUT")]
    input: Option<PathBuf>,

    /// Directory for the JSON output and extracted images
    #[arg(short, long, env = "DOCSWEEP_OUTPUT")]
    output: Option<PathBuf>,

    /// Name of the aggregate JSON file inside the output directory
    #[arg(long, env = "DOCSWEEP_OUTPUT_FILE")]
    output_file: Option<String>,

    /// Maximum number of files extracted at once
    #[arg(short = 'j', long, env = "DOCSWEEP_JOBS")]
    jobs: Option<usize>,

    /// Give up on a single file after this many seconds
    #[arg(long, env = "DOCSWEEP_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Append log lines to this file
    #[arg(long, env = "DOCSWEEP_LOG_FILE", conflicts_with = "no_log_file")]
    log_file: Option<PathBuf>,

    /// Log to stderr only
    #[arg(long)]
    no_log_file: bool,

    /// TOML file with default settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            input_dir: self.input.clone(),
            output_dir: self.output.clone(),
            output_file: self.output_file.clone(),
            max_in_flight: self.jobs,
            file_timeout_secs: self.timeout_secs,
            log_file: self.log_file.clone(),
            no_log_file: self.no_log_file,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = cli.config.as_deref().map(FileConfig::load).transpose()?;
    let config = BatchConfig::resolve(file_config, cli.overrides())?;

    logging::init(&LogSettings {
        file: config.log_file.clone(),
        verbose: cli.verbose,
    })?;

    let outcome = docsweep::run_batch(&config, Arc::new(TracingObserver)).await?;
    let summary = &outcome.summary;

    println!(
        "✅ Processing complete! Data saved in {}",
        summary.output_path.display()
    );
    println!(
        "   {} file(s): {} succeeded, {} failed ({:.2}s)",
        summary.total,
        summary.succeeded,
        summary.failed,
        summary.elapsed.as_secs_f64()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_maps_to_overrides() {
        let cli = Cli::try_parse_from([
            "docsweep", "-i", "docs", "-o", "out", "-j", "3", "--timeout-secs", "9", "--no-log-file",
        ])
        .unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.input_dir, Some(PathBuf::from("docs")));
        assert_eq!(overrides.output_dir, Some(PathBuf::from("out")));
        assert_eq!(overrides.max_in_flight, Some(3));
        assert_eq!(overrides.file_timeout_secs, Some(9));
        assert!(overrides.no_log_file);
    }

    #[test]
    fn test_log_file_conflicts_with_no_log_file() {
        let parsed = Cli::try_parse_from(["docsweep", "--log-file", "x.log", "--no-log-file"]);
        assert!(parsed.is_err());
    }
}
