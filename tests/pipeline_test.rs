// tests/pipeline_test.rs
//
// Submission flow: ledger dedup, acceptance, corpus growth and persistence.

mod test_utils;

use audioproof::core::{Corpus, Embedding, ProofEngine, ThresholdProvider};
use audioproof::{
    AcceptancePolicy, JsonFileLedger, LedgerStatus, MemoryLedger, Submission, SubmissionOutcome, SubmissionPipeline,
};
use std::fs;
use std::path::Path;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use test_utils::*;

fn pipeline() -> SubmissionPipeline {
    SubmissionPipeline::from_config(&fixed_config(0.5), Box::new(MemoryLedger::new()), Corpus::new())
        .unwrap()
}

fn voice(path: &Path) {
    write_wav_i16(path, &chord(&[196.0, 294.0], 6.0, 16000), 16000, 1);
}

#[test]
fn test_accept_then_duplicate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.wav");
    voice(&path);

    let pipeline = pipeline();

    let first = pipeline.submit(&Submission::new("1", &path)).unwrap();
    match &first {
        SubmissionOutcome::Accepted { proof, payout, .. } => {
            assert_eq!(proof.uniqueness, 1.0);
            assert_eq!(*payout, 100.0);
        }
        other => panic!("expected acceptance, got {:?}", other),
    }
    assert_eq!(pipeline.corpus_len(), 1);

    let second = pipeline.submit(&Submission::new("2", &path)).unwrap();
    match second {
        SubmissionOutcome::Duplicate { hash, previous } => {
            assert_eq!(hash, first.hash());
            assert_eq!(previous.status, LedgerStatus::Processed);
            assert_eq!(previous.ids, vec!["1".to_string()]);
        }
        other => panic!("expected duplicate, got {:?}", other),
    }
    assert_eq!(pipeline.corpus_len(), 1);
}

#[test]
fn test_same_audio_in_new_container_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let original = dir.path().join("original.wav");
    let reencoded = dir.path().join("reencoded.wav");
    let samples = chord(&[196.0, 294.0], 6.0, 16000);
    write_wav_i16(&original, &samples, 16000, 1);
    write_wav_f32(&reencoded, &samples, 16000, 1);

    let pipeline = pipeline();
    assert!(matches!(
        pipeline.submit(&Submission::new("a", &original)).unwrap(),
        SubmissionOutcome::Accepted { .. }
    ));

    let outcome = pipeline.submit(&Submission::new("b", &reencoded)).unwrap();
    match &outcome {
        SubmissionOutcome::Rejected { proof, .. } => {
            assert!(proof.uniqueness < 0.01);
            assert!(!proof.valid);
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(pipeline.corpus_len(), 1);

    // The rejection is remembered
    match pipeline.submit(&Submission::new("c", &reencoded)).unwrap() {
        SubmissionOutcome::Duplicate { previous, .. } => {
            assert_eq!(previous.status, LedgerStatus::LowQuality)
        }
        other => panic!("expected duplicate, got {:?}", other),
    }
}

#[test]
fn test_malformed_file_is_not_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.ogg");
    fs::write(&path, [0u8; 512]).unwrap();

    let pipeline = pipeline();
    let err = pipeline.submit(&Submission::new("x", &path)).unwrap_err();
    assert!(err.is_malformed_input());

    // Still an error the second time, not a duplicate
    assert!(pipeline.submit(&Submission::new("y", &path)).is_err());
    assert_eq!(pipeline.corpus_len(), 0);
}

#[test]
fn test_missing_file_is_read_error() {
    let err = pipeline()
        .submit(&Submission::new("x", "/nonexistent/clip.wav"))
        .unwrap_err();
    assert!(!err.is_malformed_input());
}

#[test]
fn test_batch_scoring_leaves_state_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.wav");
    let b = dir.path().join("b.wav");
    voice(&a);
    write_wav_i16(&b, &sine(660.0, 6.0, 16000, 0.4), 16000, 1);

    let pipeline = pipeline();
    let proof = pipeline.score_batch(&[a.clone(), b]).unwrap();

    assert_eq!(proof.attributes.total_score, 2.0);
    assert_eq!(proof.uniqueness, 1.0);
    assert!(proof.valid);
    assert_eq!(pipeline.corpus_len(), 0);

    assert!(matches!(
        pipeline.submit(&Submission::new("1", &a)).unwrap(),
        SubmissionOutcome::Accepted { .. }
    ));
}

#[test]
fn test_ledger_and_corpus_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let clip = dir.path().join("clip.wav");
    let copy = dir.path().join("copy.wav");
    let ledger_path = dir.path().join("state").join("ledger.json");
    let corpus_path = dir.path().join("state").join("corpus.json");
    voice(&clip);
    write_wav_f32(&copy, &chord(&[196.0, 294.0], 6.0, 16000), 16000, 1);

    {
        let pipeline = SubmissionPipeline::from_config(
            &fixed_config(0.5),
            Box::new(JsonFileLedger::open(&ledger_path).unwrap()),
            Corpus::load(&corpus_path).unwrap(),
        )
        .unwrap();
        assert!(matches!(
            pipeline.submit(&Submission::new("1", &clip)).unwrap(),
            SubmissionOutcome::Accepted { .. }
        ));
        pipeline.save_corpus(&corpus_path).unwrap();
    }

    let corpus = Corpus::load(&corpus_path).unwrap();
    assert_eq!(corpus.len(), 1);

    let pipeline = SubmissionPipeline::from_config(
        &fixed_config(0.5),
        Box::new(JsonFileLedger::open(&ledger_path).unwrap()),
        corpus,
    )
    .unwrap();
    assert!(matches!(
        pipeline.submit(&Submission::new("2", &clip)).unwrap(),
        SubmissionOutcome::Duplicate { .. }
    ));
    assert!(matches!(
        pipeline.submit(&Submission::new("3", &copy)).unwrap(),
        SubmissionOutcome::Rejected { .. }
    ));
}

#[test]
fn test_concurrent_near_duplicates_admit_one() {
    let dir = tempfile::tempdir().unwrap();
    let samples = chord(&[196.0, 294.0], 6.0, 16000);
    let a = dir.path().join("a.wav");
    let b = dir.path().join("b.wav");
    write_wav_i16(&a, &samples, 16000, 1);
    write_wav_f32(&b, &samples, 16000, 1);

    let pipeline = pipeline();
    let (ra, rb) = std::thread::scope(|s| {
        let ha = s.spawn(|| pipeline.submit(&Submission::new("a", &a)).unwrap());
        let hb = s.spawn(|| pipeline.submit(&Submission::new("b", &b)).unwrap());
        (ha.join().unwrap(), hb.join().unwrap())
    });

    let accepted = [&ra, &rb]
        .iter()
        .filter(|o| matches!(o, SubmissionOutcome::Accepted { .. }))
        .count();
    assert_eq!(accepted, 1);
    assert_eq!(pipeline.corpus_len(), 1);
}

#[test]
fn test_unwritable_ledger_records_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let clip = dir.path().join("clip.wav");
    let blocker = dir.path().join("blocker");
    voice(&clip);
    fs::write(&blocker, b"plain file").unwrap();

    let pipeline = SubmissionPipeline::from_config(
        &fixed_config(0.5),
        Box::new(JsonFileLedger::open(blocker.join("ledger.json")).unwrap()),
        Corpus::new(),
    )
    .unwrap();

    assert!(pipeline.submit(&Submission::new("1", &clip)).is_err());
    assert_eq!(pipeline.corpus_len(), 0);

    // A retry is scored again rather than reported as a duplicate
    let retry = pipeline.submit(&Submission::new("2", &clip));
    assert!(!matches!(retry, Ok(SubmissionOutcome::Duplicate { .. })));
    assert_eq!(pipeline.corpus_len(), 0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = fixed_config(0.5);
    config.features.hop_size = 0;
    let result = SubmissionPipeline::from_config(&config, Box::new(MemoryLedger::new()), Corpus::new());
    assert!(result.is_err());
}

#[test]
fn test_corpus_from_other_feature_size_is_refused() {
    let corpus = Corpus::from(vec![Embedding::new(vec![1.0; 13])]);
    let result =
        SubmissionPipeline::from_config(&fixed_config(0.5), Box::new(MemoryLedger::new()), corpus);
    assert!(result.is_err());

    let matching = Corpus::from(vec![Embedding::new(vec![1.0; 20])]);
    let pipeline =
        SubmissionPipeline::from_config(&fixed_config(0.5), Box::new(MemoryLedger::new()), matching)
            .unwrap();
    assert_eq!(pipeline.corpus_len(), 1);
}

/// Threshold source that announces the fetch and then waits to be released
struct GatedThreshold {
    entered: Sender<()>,
    release: Mutex<Receiver<()>>,
}

impl ThresholdProvider for GatedThreshold {
    fn fetch_threshold(&self) -> f64 {
        let _ = self.entered.send(());
        if let Ok(release) = self.release.lock() {
            let _ = release.recv_timeout(Duration::from_secs(5));
        }
        0.5
    }
}

#[test]
fn test_threshold_fetch_does_not_hold_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let clip = dir.path().join("clip.wav");
    voice(&clip);

    let (entered_tx, entered_rx) = channel();
    let (release_tx, release_rx) = channel();
    let engine = ProofEngine::builder()
        .threshold_provider(GatedThreshold {
            entered: entered_tx,
            release: Mutex::new(release_rx),
        })
        .build()
        .unwrap();
    let pipeline = SubmissionPipeline::new(
        engine,
        AcceptancePolicy::default(),
        Box::new(MemoryLedger::new()),
    );

    std::thread::scope(|s| {
        let worker = s.spawn(|| pipeline.submit(&Submission::new("1", &clip)).unwrap());

        entered_rx.recv_timeout(Duration::from_secs(30)).unwrap();
        let start = Instant::now();
        assert_eq!(pipeline.corpus_len(), 0);
        assert!(start.elapsed() < Duration::from_secs(2));
        release_tx.send(()).unwrap();

        assert!(matches!(worker.join().unwrap(), SubmissionOutcome::Accepted { .. }));
    });
    assert_eq!(pipeline.corpus_len(), 1);
}
