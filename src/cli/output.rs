//! Output formatting for CLI results

use colorful::Colorful;
use serde_json::{json, Value};
use std::path::Path;

use crate::ledger::LedgerStatus;
use crate::pipeline::{PipelineError, SubmissionOutcome};
use crate::proof::ProofResponse;

/// Terminal report for one submission
pub fn format_outcome(
    path: &Path,
    outcome: &Result<SubmissionOutcome, PipelineError>,
    quality_cutoff: f64,
    verbose: bool,
) -> String {
    let mut output = format!("{}\n", path.display().to_string().cyan());

    match outcome {
        Ok(SubmissionOutcome::Accepted { proof, payout, .. }) => {
            output.push_str(&format!("  Status: {}\n", "✓ ACCEPTED".green()));
            output.push_str(&format!("  Valid: {}\n", if proof.valid { "yes" } else { "no" }));
            output.push_str(&format!("  Uniqueness: {:.2}\n", proof.uniqueness));
            output.push_str(&format!("  Quality: {:.2}\n", proof.quality));
            output.push_str(&format!("  Score: {:.2}\n", proof.score));
            output.push_str(&format!("  Payout: {:.2} units\n", payout));
            if verbose {
                output.push_str(&format_details(proof));
            }
        }
        Ok(SubmissionOutcome::Rejected { proof, .. }) => {
            output.push_str(&format!("  Status: {}\n", "✗ REJECTED".red()));
            output.push_str(&format!(
                "  {}\n",
                format!(
                    "Quality too low ({:.2}, needs more than {:.2}), file not stored",
                    proof.quality, quality_cutoff
                )
                .yellow()
            ));
            if verbose {
                output.push_str(&format_details(proof));
            }
        }
        Ok(SubmissionOutcome::Duplicate { previous, .. }) => {
            output.push_str(&format!("  Status: {}\n", "⊘ DUPLICATE".yellow()));
            let reason = match previous.status {
                LedgerStatus::LowQuality => {
                    "Sent before and rejected for low quality"
                }
                LedgerStatus::Processed => "Already processed, resubmission is not allowed",
            };
            output.push_str(&format!("  {}\n", reason));
        }
        Err(e) if e.is_malformed_input() => {
            output.push_str(&format!("  Status: {}\n", "✗ UNREADABLE".red()));
            output.push_str(&format!("  {}\n", format!("Could not analyse audio: {}", e).yellow()));
        }
        Err(e) => {
            output.push_str(&format!("  Status: {}\n", "✗ ERROR".red()));
            output.push_str(&format!("  {}\n", e));
        }
    }

    output
}

/// Terminal report for a whole-batch proof
pub fn format_batch(paths: &[impl AsRef<Path>], proof: &ProofResponse) -> String {
    let mut output = format!("Batch of {} clip(s)\n", paths.len());
    for path in paths {
        output.push_str(&format!("  • {}\n", path.as_ref().display().to_string().cyan()));
    }
    let status = if proof.valid { "✓ VALID".green() } else { "✗ INVALID".red() };
    output.push_str(&format!("  Status: {}\n", status));
    output.push_str(&format!("  Uniqueness: {:.2}\n", proof.uniqueness));
    output.push_str(&format!("  Quality: {:.2}\n", proof.quality));
    output.push_str(&format!("  Score: {:.2}\n", proof.score));
    output.push_str(&format_details(proof));
    output
}

fn format_details(proof: &ProofResponse) -> String {
    let mut output = String::from("\n  Technical Details:\n");
    output.push_str(&format!("    Total Score: {:.4}\n", proof.attributes.total_score));
    output.push_str(&format!("    Threshold: {:.4}\n", proof.attributes.score_threshold));
    output.push_str(&format!("    Authenticity: {:.2}\n", proof.authenticity));
    output.push_str(&format!("    Ownership: {:.2}\n", proof.ownership));
    if let Some(dlp_id) = &proof.metadata.dlp_id {
        output.push_str(&format!("    DLP: {}\n", dlp_id));
    }
    output
}

/// JSON record for one submission
pub fn outcome_json(path: &Path, outcome: &Result<SubmissionOutcome, PipelineError>) -> Value {
    let file = path.display().to_string();
    match outcome {
        Ok(SubmissionOutcome::Accepted { hash, proof, payout }) => json!({
            "file": file,
            "status": "accepted",
            "hash": hash,
            "payout": payout,
            "proof": proof,
        }),
        Ok(SubmissionOutcome::Rejected { hash, proof }) => json!({
            "file": file,
            "status": "rejected",
            "hash": hash,
            "proof": proof,
        }),
        Ok(SubmissionOutcome::Duplicate { hash, previous }) => json!({
            "file": file,
            "status": "duplicate",
            "hash": hash,
            "previous": previous,
        }),
        Err(e) => json!({
            "file": file,
            "status": if e.is_malformed_input() { "unreadable" } else { "error" },
            "error": e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DecodeError, ProofError};
    use crate::core::engine::compose_proof;
    use crate::ledger::LedgerEntry;

    #[test]
    fn test_json_statuses() {
        let path = Path::new("clip.ogg");
        let proof = compose_proof(&[1.0], 0.5, 1.0, None);

        let accepted = outcome_json(
            path,
            &Ok(SubmissionOutcome::Accepted { hash: "h".into(), proof: proof.clone(), payout: 100.0 }),
        );
        assert_eq!(accepted["status"], "accepted");
        assert_eq!(accepted["proof"]["score"], 1.0);

        let duplicate = outcome_json(
            path,
            &Ok(SubmissionOutcome::Duplicate {
                hash: "h".into(),
                previous: LedgerEntry::new(LedgerStatus::LowQuality, "1"),
            }),
        );
        assert_eq!(duplicate["previous"]["status"], "low_quality");

        let unreadable = outcome_json(
            path,
            &Err(PipelineError::Proof(ProofError::Decode { clip: 0, source: DecodeError::Empty })),
        );
        assert_eq!(unreadable["status"], "unreadable");
    }

    #[test]
    fn test_rejection_mentions_cutoff() {
        let proof = compose_proof(&[0.1], 0.5, 1.0, None);
        let text = format_outcome(
            Path::new("a.wav"),
            &Ok(SubmissionOutcome::Rejected { hash: "h".into(), proof }),
            0.5,
            false,
        );
        assert!(text.contains("REJECTED"));
        assert!(text.contains("0.20"));
    }
}
