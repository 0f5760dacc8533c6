// src/pipeline.rs
//
// Submission flow around the engine: dedup, score, then accept or reject.
//
//   Received -> Scored -> Accepted  (embedding appended, payout computed)
//                      -> Rejected  (low quality, corpus untouched)
//   Received -> Duplicate           (ledger hit, never scored)

use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

use crate::config::{AcceptancePolicy, ConfigError, ProofConfig};
use crate::core::{CancelToken, Clip, Corpus, ProofEngine, ProofError};
use crate::ledger::{content_hash, DedupLedger, LedgerEntry, LedgerError, LedgerStatus};
use crate::proof::ProofResponse;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to read submission {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Corpus persistence failed: {0}")]
    Corpus(#[source] std::io::Error),
}

impl PipelineError {
    /// True when the submitted file could not be decoded or analysed
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, PipelineError::Proof(e) if e.is_malformed_input())
    }
}

/// One uploaded clip
#[derive(Debug, Clone)]
pub struct Submission {
    /// Transport-level identifier (message or file id)
    pub id: String,
    pub path: PathBuf,
}

impl Submission {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }
}

/// Terminal state of a submission
#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    Accepted {
        hash: String,
        proof: ProofResponse,
        payout: f64,
    },
    Rejected {
        hash: String,
        proof: ProofResponse,
    },
    Duplicate {
        hash: String,
        previous: LedgerEntry,
    },
}

impl SubmissionOutcome {
    pub fn hash(&self) -> &str {
        match self {
            SubmissionOutcome::Accepted { hash, .. }
            | SubmissionOutcome::Rejected { hash, .. }
            | SubmissionOutcome::Duplicate { hash, .. } => hash,
        }
    }

    pub fn proof(&self) -> Option<&ProofResponse> {
        match self {
            SubmissionOutcome::Accepted { proof, .. } | SubmissionOutcome::Rejected { proof, .. } => {
                Some(proof)
            }
            SubmissionOutcome::Duplicate { .. } => None,
        }
    }
}

/// Owns the process-wide corpus and ledger.
///
/// Decoding, extraction and the threshold fetch run outside any lock. The
/// corpus lock covers only the comparison, the ledger record and the append,
/// so two near-identical submissions can never both score against a corpus
/// that lacks the other.
pub struct SubmissionPipeline {
    engine: ProofEngine,
    acceptance: AcceptancePolicy,
    corpus: Mutex<Corpus>,
    ledger: Mutex<Box<dyn DedupLedger>>,
}

impl SubmissionPipeline {
    pub fn new(engine: ProofEngine, acceptance: AcceptancePolicy, ledger: Box<dyn DedupLedger>) -> Self {
        Self::with_corpus(engine, acceptance, ledger, Corpus::new())
    }

    pub fn with_corpus(
        engine: ProofEngine,
        acceptance: AcceptancePolicy,
        ledger: Box<dyn DedupLedger>,
        corpus: Corpus,
    ) -> Self {
        Self {
            engine,
            acceptance,
            corpus: Mutex::new(corpus),
            ledger: Mutex::new(ledger),
        }
    }

    pub fn from_config(
        config: &ProofConfig,
        ledger: Box<dyn DedupLedger>,
        corpus: Corpus,
    ) -> Result<Self, ConfigError> {
        let engine = ProofEngine::new(config)?;

        let expected = config.features.num_coefficients;
        match corpus.dimension() {
            Ok(Some(dim)) if dim != expected => {
                return Err(ConfigError::Invalid(format!(
                    "corpus embeddings have {} coefficients, features.num_coefficients is {}",
                    dim, expected
                )));
            }
            Err(e) => return Err(ConfigError::Invalid(format!("corpus: {}", e))),
            _ => {}
        }

        Ok(Self::with_corpus(engine, config.acceptance.clone(), ledger, corpus))
    }

    pub fn engine(&self) -> &ProofEngine {
        &self.engine
    }

    pub fn corpus_len(&self) -> usize {
        self.lock_corpus().len()
    }

    /// Write the current corpus to disk
    pub fn save_corpus(&self, path: &Path) -> Result<(), PipelineError> {
        self.lock_corpus().save(path).map_err(PipelineError::Corpus)
    }

    pub fn submit(&self, submission: &Submission) -> Result<SubmissionOutcome, PipelineError> {
        self.submit_with_cancel(submission, None)
    }

    pub fn submit_with_cancel(
        &self,
        submission: &Submission,
        cancel: Option<&CancelToken>,
    ) -> Result<SubmissionOutcome, PipelineError> {
        info!("Processing submission {} ({})", submission.id, submission.path.display());

        let bytes = fs::read(&submission.path).map_err(|source| PipelineError::Read {
            path: submission.path.clone(),
            source,
        })?;
        let hash = content_hash(&bytes);

        if let Some(previous) = self.lock_ledger().lookup(&hash)? {
            return Ok(Self::duplicate(hash, previous));
        }

        let prepared = match self
            .engine
            .prepare(&[Clip::File(submission.path.clone())], cancel)
        {
            Ok(prepared) => prepared,
            Err(e) => {
                error!("Scoring failed for submission {}: {}", submission.id, e);
                return Err(e.into());
            }
        };

        // Lock order: corpus, then ledger. Held until the outcome is recorded.
        let mut corpus = self.lock_corpus();

        // Same bytes may have been recorded while this one was being prepared
        if let Some(previous) = self.lock_ledger().lookup(&hash)? {
            return Ok(Self::duplicate(hash, previous));
        }

        let batch = self.engine.finish(prepared, &corpus);
        let proof = batch.response;

        if !self.acceptance.accepts(proof.quality, proof.valid) {
            info!(
                "Quality too low ({:.2}), rejecting submission {}",
                proof.quality, submission.id
            );
            self.lock_ledger()
                .record(&hash, LedgerEntry::new(LedgerStatus::LowQuality, submission.id.clone()))?;
            return Ok(SubmissionOutcome::Rejected { hash, proof });
        }

        self.lock_ledger()
            .record(&hash, LedgerEntry::new(LedgerStatus::Processed, submission.id.clone()))?;
        for embedding in batch.embeddings {
            corpus.append(embedding);
        }

        let payout = proof.score * self.acceptance.payout_multiplier;
        info!(
            "Accepted submission {}: uniqueness {:.2}, quality {:.2}, payout {:.2}",
            submission.id, proof.uniqueness, proof.quality, payout
        );

        Ok(SubmissionOutcome::Accepted { hash, proof, payout })
    }

    fn duplicate(hash: String, previous: LedgerEntry) -> SubmissionOutcome {
        info!(
            "File with hash {} already processed ({:?}), skipping",
            hash, previous.status
        );
        SubmissionOutcome::Duplicate { hash, previous }
    }

    /// One proof over several files against the current corpus; nothing is
    /// recorded or appended.
    pub fn score_batch(&self, paths: &[PathBuf]) -> Result<ProofResponse, PipelineError> {
        let clips: Vec<Clip> = paths.iter().cloned().map(Clip::File).collect();
        let prepared = self.engine.prepare(&clips, None)?;
        let corpus = self.lock_corpus();
        Ok(self.engine.finish(prepared, &corpus).response)
    }

    fn lock_corpus(&self) -> MutexGuard<'_, Corpus> {
        self.corpus.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_ledger(&self) -> MutexGuard<'_, Box<dyn DedupLedger>> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
