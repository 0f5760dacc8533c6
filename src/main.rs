// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use colorful::Colorful;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use audioproof::cli::{self, Args};
use audioproof::{
    Corpus, DedupLedger, JsonFileLedger, MemoryLedger, ProofConfig, Submission, SubmissionPipeline,
};

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = args.to_config().context("Invalid configuration")?;

    let audio_files = cli::collect_audio_files(&args.inputs);
    if audio_files.is_empty() {
        println!("{}", "No audio files found!".red());
        return Ok(());
    }

    let ledger: Box<dyn DedupLedger> = if args.no_ledger {
        Box::new(MemoryLedger::new())
    } else {
        let path = args.ledger_path();
        Box::new(
            JsonFileLedger::open(&path)
                .with_context(|| format!("Failed to open ledger {}", path.display()))?,
        )
    };

    let corpus = match &args.corpus {
        Some(path) => Corpus::load(path)
            .with_context(|| format!("Failed to load corpus {}", path.display()))?,
        None => Corpus::new(),
    };

    let pipeline = SubmissionPipeline::from_config(&config, ledger, corpus)
        .context("Invalid configuration")?;

    if args.batch {
        run_batch(&pipeline, &audio_files, &args)?;
    } else {
        run_submissions(&pipeline, &audio_files, &args, &config)?;
    }

    if let Some(path) = &args.corpus {
        pipeline
            .save_corpus(path)
            .with_context(|| format!("Failed to save corpus {}", path.display()))?;
    }

    Ok(())
}

fn run_batch(pipeline: &SubmissionPipeline, files: &[PathBuf], args: &Args) -> Result<()> {
    let proof = pipeline.score_batch(files)?;
    if args.json {
        println!("{}", proof.to_json_pretty()?);
    } else {
        println!("{}", cli::format_batch(files, &proof));
    }
    Ok(())
}

fn run_submissions(
    pipeline: &SubmissionPipeline,
    files: &[PathBuf],
    args: &Args,
    config: &ProofConfig,
) -> Result<()> {
    let progress = if args.json {
        ProgressBar::hidden()
    } else {
        println!("Found {} audio file(s)\n", files.len());
        let bar = ProgressBar::new(files.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")?
                .progress_chars("=> "),
        );
        bar
    };

    let mut records = Vec::with_capacity(files.len());
    for path in files {
        progress.set_message(path.display().to_string());

        let submission = Submission::new(uuid::Uuid::new_v4().to_string(), path.clone());
        let outcome = pipeline.submit(&submission);

        if args.json {
            records.push(cli::outcome_json(path, &outcome));
        } else {
            progress.suspend(|| {
                println!(
                    "{}",
                    cli::format_outcome(
                        path,
                        &outcome,
                        config.acceptance.quality_cutoff,
                        args.verbose
                    )
                )
            });
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        println!("Corpus holds {} embedding(s)", pipeline.corpus_len());
    }

    Ok(())
}
