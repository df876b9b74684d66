use crate::helpers::{
    chunk_texts, expected_audio, sample_text, settings, ConcatMerger, FailingMerger, FakeTts, TestContext,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tts_cli::domain::narration::{NarrationError, NarrationOutcome, NarrationServiceApi, ProgressError};
use tts_cli::infrastructure::repositories::ProgressStore;

const CHUNK_BYTES: usize = 70;

/// Runs the sample text with chunk 3 failing, one worker at a time
async fn interrupted_run(ctx: &TestContext) -> Vec<String> {
    let text = sample_text();
    let chunks = chunk_texts(&text, CHUNK_BYTES);
    assert!(chunks.len() > 3);

    let tts = Arc::new(FakeTts::new().failing_on(&chunks[2]));
    let service = ctx.service(tts, Arc::new(ConcatMerger::new()), settings(CHUNK_BYTES, 1));
    let err = service.narrate(&text, &ctx.output).await.unwrap_err();
    assert!(matches!(err, NarrationError::Synthesis { index: 2, .. }));

    chunks
}

#[tokio::test]
async fn test_failure_keeps_completed_chunks_on_disk() {
    let ctx = TestContext::new();
    let chunks = interrupted_run(&ctx).await;

    let state = ProgressStore::load(&ctx.state_path()).await.unwrap().unwrap();
    assert_eq!(state.chunks, chunks);
    assert_eq!(
        state.completed,
        vec!["book_part1.mp3".to_string(), "book_part2.mp3".to_string()]
    );
    assert!(ctx.part(1).exists());
    assert!(ctx.part(2).exists());
    assert!(!ctx.part(3).exists());
    assert!(!ctx.output.exists());
}

#[tokio::test]
async fn test_resume_skips_finished_chunks_and_matches_clean_run() {
    let ctx = TestContext::new();
    let chunks = interrupted_run(&ctx).await;
    let text = sample_text();

    let tts = Arc::new(FakeTts::new());
    let service = ctx.service(tts.clone(), Arc::new(ConcatMerger::new()), settings(CHUNK_BYTES, 1));
    let outcome = service.narrate(&text, &ctx.output).await.unwrap();

    assert_eq!(
        outcome,
        NarrationOutcome::Merged {
            output: ctx.output.clone(),
            chunks: chunks.len(),
            synthesized: chunks.len() - 2,
            reused: 2,
        }
    );
    assert_eq!(tts.calls(), chunks[2..].to_vec());

    // Byte-identical to a run that never failed
    let clean = TestContext::new();
    let clean_service = clean.service(Arc::new(FakeTts::new()), Arc::new(ConcatMerger::new()), settings(CHUNK_BYTES, 3));
    clean_service.narrate(&text, &clean.output).await.unwrap();
    assert_eq!(ctx.read_output(), clean.read_output());
    assert_eq!(ctx.read_output(), expected_audio(&text, CHUNK_BYTES));

    assert_eq!(ctx.files(), vec!["book.mp3".to_string()]);
}

#[tokio::test]
async fn test_recorded_chunk_with_missing_audio_is_resynthesized() {
    let ctx = TestContext::new();
    let chunks = interrupted_run(&ctx).await;
    std::fs::remove_file(ctx.part(1)).unwrap();

    let tts = Arc::new(FakeTts::new());
    let service = ctx.service(tts.clone(), Arc::new(ConcatMerger::new()), settings(CHUNK_BYTES, 1));
    let outcome = service.narrate(&sample_text(), &ctx.output).await.unwrap();

    assert!(matches!(outcome, NarrationOutcome::Merged { reused: 1, .. }));
    let mut expected_calls = vec![chunks[0].clone()];
    expected_calls.extend(chunks[2..].iter().cloned());
    assert_eq!(tts.calls(), expected_calls);
    assert_eq!(ctx.read_output(), expected_audio(&sample_text(), CHUNK_BYTES));
}

#[tokio::test]
async fn test_stored_chunks_win_over_new_input() {
    let ctx = TestContext::new();
    interrupted_run(&ctx).await;

    // A different, single-chunk text must not take the single-shot path
    let tts = Arc::new(FakeTts::new());
    let service = ctx.service(tts.clone(), Arc::new(ConcatMerger::new()), settings(CHUNK_BYTES, 2));
    service.narrate("Completely different.", &ctx.output).await.unwrap();

    assert!(!tts.calls().contains(&"Completely different.".to_string()));
    assert_eq!(ctx.read_output(), expected_audio(&sample_text(), CHUNK_BYTES));
}

#[tokio::test]
async fn test_corrupt_state_is_fatal_and_untouched() {
    let ctx = TestContext::new();
    std::fs::write(ctx.state_path(), "{\"chunks\": [").unwrap();

    let tts = Arc::new(FakeTts::new());
    let service = ctx.service(tts.clone(), Arc::new(ConcatMerger::new()), settings(CHUNK_BYTES, 2));
    let err = service.narrate(&sample_text(), &ctx.output).await.unwrap_err();

    assert!(matches!(err, NarrationError::Progress(ProgressError::Corrupt { .. })));
    assert!(tts.calls().is_empty());
    assert_eq!(std::fs::read_to_string(ctx.state_path()).unwrap(), "{\"chunks\": [");
}

#[tokio::test]
async fn test_failed_merge_keeps_state_for_retry() {
    let ctx = TestContext::new();
    let text = sample_text();
    let total = chunk_texts(&text, CHUNK_BYTES).len();

    let service = ctx.service(Arc::new(FakeTts::new()), Arc::new(FailingMerger), settings(CHUNK_BYTES, 2));
    let err = service.narrate(&text, &ctx.output).await.unwrap_err();
    assert!(matches!(err, NarrationError::Merge(_)));
    assert!(ctx.state_path().exists());
    assert!((1..=total).all(|n| ctx.part(n).exists()));

    // Retry only merges
    let tts = Arc::new(FakeTts::new());
    let service = ctx.service(tts.clone(), Arc::new(ConcatMerger::new()), settings(CHUNK_BYTES, 2));
    let outcome = service.narrate(&text, &ctx.output).await.unwrap();

    assert!(matches!(outcome, NarrationOutcome::Merged { synthesized: 0, reused, .. } if reused == total));
    assert!(tts.calls().is_empty());
    assert_eq!(ctx.read_output(), expected_audio(&text, CHUNK_BYTES));
}

#[tokio::test]
async fn test_stored_chunk_over_current_limit_is_refused() {
    let ctx = TestContext::new();
    let stored = vec!["y".repeat(95), "Tail end.".to_string()];
    ProgressStore::init_or_resume(ctx.state_path(), stored).await.unwrap();
    let before = std::fs::read(ctx.state_path()).unwrap();

    // The record was written under a larger limit than this run allows
    let tts = Arc::new(FakeTts::new());
    let service = ctx.service(tts.clone(), Arc::new(ConcatMerger::new()), settings(40, 1));
    let err = service.narrate(&sample_text(), &ctx.output).await.unwrap_err();

    assert!(matches!(
        err,
        NarrationError::StoredChunkTooLarge { index: 0, bytes: 95, limit: 40, .. }
    ));
    assert!(tts.calls().is_empty());
    assert_eq!(std::fs::read(ctx.state_path()).unwrap(), before);
    assert!(!ctx.output.exists());
}

#[tokio::test]
async fn test_stored_chunks_checked_against_provider_limit() {
    let ctx = TestContext::new();
    interrupted_run(&ctx).await;

    // Same settings, but the provider now accepts less than the stored chunks
    let tts = Arc::new(FakeTts::new().with_max_request_bytes(20));
    let service = ctx.service(tts.clone(), Arc::new(ConcatMerger::new()), settings(CHUNK_BYTES, 1));
    let err = service.narrate(&sample_text(), &ctx.output).await.unwrap_err();

    assert!(matches!(err, NarrationError::StoredChunkTooLarge { limit: 20, .. }));
    assert!(tts.calls().is_empty());
    assert!(ctx.part(1).exists());
}
