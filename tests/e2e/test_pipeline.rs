use crate::helpers::{
    chunk_texts, expected_audio, sample_text, settings, ConcatMerger, DeclineConfirm, FakeTts, TestContext,
};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tts_cli::domain::narration::{NarrationError, NarrationOutcome, NarrationServiceApi};

const CHUNK_BYTES: usize = 70;

#[tokio::test]
async fn test_short_text_is_synthesized_in_one_request() {
    let ctx = TestContext::new();
    let tts = Arc::new(FakeTts::new());
    let merger = Arc::new(ConcatMerger::new());
    let service = ctx.service(tts.clone(), merger.clone(), settings(4000, 4));

    let outcome = service.narrate("Hello there. Short text.", &ctx.output).await.unwrap();

    assert_eq!(outcome, NarrationOutcome::SingleShot { output: ctx.output.clone() });
    assert_eq!(ctx.read_output(), FakeTts::audio_for("Hello there. Short text."));
    assert_eq!(tts.calls().len(), 1);
    assert!(merger.merges().is_empty());
    assert_eq!(ctx.files(), vec!["book.mp3".to_string()]);
}

#[tokio::test]
async fn test_long_text_is_chunked_and_merged_in_order() {
    let ctx = TestContext::new();
    let text = sample_text();
    let chunks = chunk_texts(&text, CHUNK_BYTES);
    assert!(chunks.len() > 2);

    let tts = Arc::new(FakeTts::new());
    let merger = Arc::new(ConcatMerger::new());
    let service = ctx.service(tts.clone(), merger.clone(), settings(CHUNK_BYTES, 3));

    let outcome = service.narrate(&text, &ctx.output).await.unwrap();

    assert_eq!(
        outcome,
        NarrationOutcome::Merged {
            output: ctx.output.clone(),
            chunks: chunks.len(),
            synthesized: chunks.len(),
            reused: 0,
        }
    );
    assert_eq!(ctx.read_output(), expected_audio(&text, CHUNK_BYTES));

    let mut requested = tts.calls();
    requested.sort();
    let mut expected = chunks.clone();
    expected.sort();
    assert_eq!(requested, expected);

    // Chunk audio, chunk text and the progress record are gone
    assert_eq!(ctx.files(), vec!["book.mp3".to_string()]);
}

#[tokio::test]
async fn test_merge_order_ignores_completion_order() {
    let ctx = TestContext::new();
    let text = sample_text();
    let chunks = chunk_texts(&text, CHUNK_BYTES);
    let total = chunks.len();

    // Later chunks answer sooner, so they complete first
    let positions: HashMap<String, usize> = chunks.iter().cloned().zip(0..).collect();
    let tts = Arc::new(FakeTts::new().with_delay(move |text| {
        let index = positions.get(text).copied().unwrap_or(0);
        Duration::from_millis(((total - index) * 25) as u64)
    }));
    let merger = Arc::new(ConcatMerger::new());
    let service = ctx.service(tts.clone(), merger.clone(), settings(CHUNK_BYTES, total));

    service.narrate(&text, &ctx.output).await.unwrap();

    let merges = merger.merges();
    assert_eq!(merges.len(), 1);
    let expected_inputs: Vec<_> = (1..=total).map(|n| ctx.part(n)).collect();
    assert_eq!(merges[0], expected_inputs);
    assert_eq!(ctx.read_output(), expected_audio(&text, CHUNK_BYTES));
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let ctx = TestContext::new();
    let text = sample_text();
    let tts = Arc::new(FakeTts::new().with_delay(|_| Duration::from_millis(30)));
    let service = ctx.service(tts.clone(), Arc::new(ConcatMerger::new()), settings(CHUNK_BYTES, 2));

    service.narrate(&text, &ctx.output).await.unwrap();

    assert!(tts.peak_in_flight() <= 2, "peak was {}", tts.peak_in_flight());
    assert_eq!(ctx.read_output(), expected_audio(&text, CHUNK_BYTES));
}

#[tokio::test]
async fn test_single_worker_synthesizes_in_index_order() {
    let ctx = TestContext::new();
    let text = sample_text();
    let tts = Arc::new(FakeTts::new());
    let service = ctx.service(tts.clone(), Arc::new(ConcatMerger::new()), settings(CHUNK_BYTES, 1));

    service.narrate(&text, &ctx.output).await.unwrap();

    assert_eq!(tts.calls(), chunk_texts(&text, CHUNK_BYTES));
    assert_eq!(tts.peak_in_flight(), 1);
}

#[tokio::test]
async fn test_chunks_never_exceed_provider_limit() {
    let ctx = TestContext::new();
    let text = sample_text();
    let tts = Arc::new(FakeTts::new().with_max_request_bytes(40));
    let service = ctx.service(tts.clone(), Arc::new(ConcatMerger::new()), settings(4000, 2));

    service.narrate(&text, &ctx.output).await.unwrap();

    let calls = tts.calls();
    assert_eq!(calls.len(), chunk_texts(&text, 40).len());
    assert!(calls.iter().all(|c| c.len() <= 40));
    assert_eq!(ctx.read_output(), expected_audio(&text, 40));
}

#[tokio::test]
async fn test_declined_confirmation_leaves_no_trace() {
    let ctx = TestContext::new();
    let text = sample_text();
    let tts = Arc::new(FakeTts::new());
    let confirmation = Arc::new(DeclineConfirm::new());
    let mut pipeline = settings(CHUNK_BYTES, 2);
    pipeline.assume_yes = false;
    let service = ctx.service_with_confirmation(tts.clone(), confirmation.clone(), pipeline);

    let err = service.narrate(&text, &ctx.output).await.unwrap_err();

    let total = chunk_texts(&text, CHUNK_BYTES).len();
    assert!(matches!(err, NarrationError::Aborted { chunks } if chunks == total));
    assert_eq!(confirmation.times_asked(), 1);
    assert!(tts.calls().is_empty());
    assert!(ctx.files().is_empty());
}

#[tokio::test]
async fn test_single_chunk_run_skips_confirmation() {
    let ctx = TestContext::new();
    let tts = Arc::new(FakeTts::new());
    let confirmation = Arc::new(DeclineConfirm::new());
    let mut pipeline = settings(4000, 2);
    pipeline.assume_yes = false;
    let service = ctx.service_with_confirmation(tts.clone(), confirmation.clone(), pipeline);

    service.narrate("One sentence only.", &ctx.output).await.unwrap();

    assert_eq!(confirmation.times_asked(), 0);
    assert_eq!(ctx.read_output(), FakeTts::audio_for("One sentence only."));
}

#[tokio::test]
async fn test_empty_text_is_a_no_op() {
    let ctx = TestContext::new();
    let tts = Arc::new(FakeTts::new());
    let service = ctx.service(tts.clone(), Arc::new(ConcatMerger::new()), settings(4000, 2));

    for text in ["", "   \n\t  "] {
        let outcome = service.narrate(text, &ctx.output).await.unwrap();
        assert_eq!(outcome, NarrationOutcome::Empty);
    }

    assert!(tts.calls().is_empty());
    assert!(ctx.files().is_empty());
}

#[tokio::test]
async fn test_oversized_word_is_hard_split() {
    let ctx = TestContext::new();
    let word = "x".repeat(100);
    let tts = Arc::new(FakeTts::new());
    let service = ctx.service(tts.clone(), Arc::new(ConcatMerger::new()), settings(40, 1));

    let outcome = service.narrate(&word, &ctx.output).await.unwrap();

    assert!(matches!(outcome, NarrationOutcome::Merged { chunks: 3, .. }));
    assert_eq!(tts.calls().concat(), word);
    assert!(tts.calls().iter().all(|c| c.len() <= 40));
}
