//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

use crate::config::{ConfigError, ProofConfig};

const LEDGER_FILE: &str = "processed_files.json";

#[derive(Parser, Debug)]
#[command(name = "audioproof")]
#[command(about = "Score audio submissions for proof-of-contribution: uniqueness, quality, validity")]
pub struct Args {
    /// Input files or directories
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Data-licensing program id written to proof metadata
    #[arg(long, env = "DLP_ID")]
    pub dlp_id: Option<String>,

    /// Use a fixed threshold instead of the remote source
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Remote threshold source URL
    #[arg(long)]
    pub threshold_url: Option<String>,

    /// Accept only submissions with quality above this value
    #[arg(short, long)]
    pub quality_cutoff: Option<f64>,

    /// Dedup ledger file
    #[arg(long)]
    pub ledger: Option<PathBuf>,

    /// Keep the ledger in memory only
    #[arg(long, conflicts_with = "ledger")]
    pub no_ledger: bool,

    /// Load and save the corpus of accepted embeddings here
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Generate one proof over all inputs instead of one submission per file
    #[arg(short, long)]
    pub batch: bool,

    /// Emit JSON instead of the terminal report
    #[arg(long)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Config file (or defaults) with command-line overrides applied
    pub fn to_config(&self) -> Result<ProofConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ProofConfig::from_file(path)?,
            None => ProofConfig::default(),
        };

        if let Some(dlp_id) = &self.dlp_id {
            config.dlp_id = Some(dlp_id.clone());
        }
        if let Some(threshold) = self.threshold {
            config.threshold.fixed = Some(threshold);
        }
        if let Some(url) = &self.threshold_url {
            config.threshold.url = url.clone();
        }
        if let Some(cutoff) = self.quality_cutoff {
            config.acceptance.quality_cutoff = cutoff;
        }

        config.validate()?;
        Ok(config)
    }

    /// Ledger location: explicit flag, else the user data directory
    pub fn ledger_path(&self) -> PathBuf {
        if let Some(path) = &self.ledger {
            return path.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join("audioproof").join(LEDGER_FILE))
            .unwrap_or_else(|| PathBuf::from("data").join(LEDGER_FILE))
    }
}
