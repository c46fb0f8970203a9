//! Integration tests for the query pipeline
//!
//! Tests the full path: text → embedding → metrics → field → narrative → log

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use zenome::core::{
    EmbeddingProvider, NarrativeProvider, QueryPipeline, Session, SubmitOptions, Tokenizer,
};
use zenome::types::{ErrorKind, NarrativeOutcome, ZenomeConfig, ZenomeError, ZenomeResult};

/// Always returns the same vector
struct FixedEmbedder(Vec<f64>);

#[async_trait]
impl EmbeddingProvider for FixedEmbedder {
    async fn embed(&self, _text: &str, _model: &str) -> ZenomeResult<Vec<f64>> {
        Ok(self.0.clone())
    }
    fn name(&self) -> &str {
        "fixed"
    }
}

/// Fails every call with an auth error
struct RejectingEmbedder;

#[async_trait]
impl EmbeddingProvider for RejectingEmbedder {
    async fn embed(&self, _text: &str, _model: &str) -> ZenomeResult<Vec<f64>> {
        Err(ZenomeError::Auth("invalid api key".to_string()))
    }
    fn name(&self) -> &str {
        "rejecting"
    }
}

/// Maps known texts to fixed token ids
struct TableTokenizer;

impl Tokenizer for TableTokenizer {
    fn encoding_name(&self) -> &str {
        "table"
    }
    fn tokenize(&self, text: &str) -> ZenomeResult<Vec<u32>> {
        match text {
            "hello world" => Ok(vec![5, 12]),
            "hello" => Ok(vec![5]),
            _ => Ok(text.bytes().map(u32::from).collect()),
        }
    }
}

/// Records prompts and replies with a canned insight
#[derive(Default)]
struct RecordingNarrator {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl NarrativeProvider for RecordingNarrator {
    async fn complete(&self, _system_prompt: &str, user_prompt: &str) -> ZenomeResult<String> {
        self.prompts.lock().unwrap().push(user_prompt.to_string());
        Ok("Coherent and focused; narrow the scope next.".to_string())
    }
    fn name(&self) -> &str {
        "recording"
    }
}

/// Always fails like an expired key
struct BrokenNarrator;

#[async_trait]
impl NarrativeProvider for BrokenNarrator {
    async fn complete(&self, _: &str, _: &str) -> ZenomeResult<String> {
        Err(ZenomeError::Auth("401 Unauthorized".to_string()))
    }
    fn name(&self) -> &str {
        "broken"
    }
}

fn pipeline_with(
    embedder: Arc<dyn EmbeddingProvider>,
    narrator: Option<Arc<dyn NarrativeProvider>>,
) -> QueryPipeline {
    QueryPipeline::new(ZenomeConfig::default(), embedder, Arc::new(TableTokenizer), narrator)
        .unwrap()
}

fn unit_embedder() -> Arc<dyn EmbeddingProvider> {
    Arc::new(FixedEmbedder(vec![1.0, 1.0, 1.0, 1.0]))
}

/// Mocked embedding [1,1,1,1] and tokens [5,12] for "hello world"
#[tokio::test]
async fn test_end_to_end_hello_world() {
    let pipeline = pipeline_with(unit_embedder(), None);
    let mut session = Session::new();

    let sub = session
        .submit(&pipeline, "hello world", SubmitOptions::default())
        .await
        .unwrap()
        .expect("non-empty query must be accepted");

    assert_eq!(session.log().len(), 1);
    let record = &session.log().as_table()[0];
    assert_eq!(record.text, "hello world");
    assert_eq!(record.mu, 0.5);
    assert_eq!(record.variance, 0.0);
    assert!((record.entropy - 1.0).abs() < 1e-8, "entropy {}", record.entropy);

    assert_eq!(sub.field.grid_size, 40);
    assert_eq!(sub.field.z.len(), 40);
    assert!(sub.field.values().all(|v| v > 0.0 && v < 1.0));
}

/// Single-token query: 0 / ln(1 + 1e-9) must come out as 0 without error
#[tokio::test]
async fn test_single_token_entropy() {
    let pipeline = pipeline_with(unit_embedder(), None);
    let mut session = Session::new();

    let sub = session
        .submit(&pipeline, "hello", SubmitOptions::default())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(sub.record.entropy, 0.0);
    assert!(sub.field.values().all(|v| v > 0.0 && v < 1.0));
}

/// Records come back in submission order; empty submissions are skipped
#[tokio::test]
async fn test_log_order_and_empty_skips() {
    let pipeline = pipeline_with(unit_embedder(), None);
    let mut session = Session::new();

    for text in ["first query", "", "second query", "   ", "third query"] {
        session.submit(&pipeline, text, SubmitOptions::default()).await.unwrap();
    }

    let texts: Vec<&str> = session.log().as_table().iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["first query", "second query", "third query"]);
    assert_eq!(session.log().trends().len(), 3);
}

/// Embedding failure aborts before anything is logged
#[tokio::test]
async fn test_embedding_failure_aborts() {
    let pipeline = pipeline_with(Arc::new(RejectingEmbedder), None);
    let mut session = Session::new();

    let err = session
        .submit(&pipeline, "hello world", SubmitOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(session.log().is_empty());
    assert!(session.latest_field().is_none());
}

/// Narrative failure still logs the record
#[tokio::test]
async fn test_narrative_failure_isolated() {
    let pipeline = pipeline_with(unit_embedder(), Some(Arc::new(BrokenNarrator)));
    let mut session = Session::new();

    session
        .submit(&pipeline, "first query", SubmitOptions::default())
        .await
        .unwrap();
    let sub = session
        .submit(&pipeline, "hello world", SubmitOptions::default())
        .await
        .unwrap()
        .unwrap();

    match &sub.narrative {
        Some(NarrativeOutcome::Failed { kind, .. }) => assert_eq!(*kind, ErrorKind::Auth),
        other => panic!("expected failed narrative, got {:?}", other),
    }
    assert!(sub.narrative.as_ref().unwrap().warning().is_some());

    assert_eq!(session.log().len(), 2);
    let latest = session.log().latest().unwrap();
    assert_eq!(latest.text, "hello world");
    assert_eq!(latest.mu, 0.5);
    assert_eq!(sub.index, 1);
}

/// Successful narrative receives the formatted metrics
#[tokio::test]
async fn test_narrative_prompt_and_text() {
    let narrator = Arc::new(RecordingNarrator::default());
    let pipeline = pipeline_with(unit_embedder(), Some(narrator.clone()));
    let mut session = Session::new();

    let sub = session
        .submit(&pipeline, "hello world", SubmitOptions::default())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        sub.narrative.as_ref().and_then(|n| n.text()),
        Some("Coherent and focused; narrow the scope next.")
    );
    let prompts = narrator.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("The μ (Zeno) score is 0.5000"));
    assert!(prompts[0].contains("Variance is 0.0000"));
    assert!(prompts[0].contains("for the query: hello world"));
}

/// Same query twice yields the identical field
#[tokio::test]
async fn test_field_reproducible_across_sessions() {
    let pipeline = pipeline_with(unit_embedder(), None);
    let mut a = Session::new();
    let mut b = Session::new();

    let fa = a.submit(&pipeline, "hello world", SubmitOptions::default()).await.unwrap().unwrap();
    let fb = b.submit(&pipeline, "hello world", SubmitOptions::default()).await.unwrap().unwrap();

    assert_eq!(fa.field, fb.field);
    assert_eq!(a.log().len(), 1);
    assert_eq!(b.log().len(), 1);
}

/// Overlay toggles change the surface
#[tokio::test]
async fn test_overlay_changes_field() {
    let pipeline = pipeline_with(unit_embedder(), None);
    let mut session = Session::new();

    let all = session
        .submit(&pipeline, "hello world", SubmitOptions::default())
        .await
        .unwrap()
        .unwrap();
    let mu_only = session
        .submit(
            &pipeline,
            "hello world",
            SubmitOptions {
                overlay: Some(zenome::types::ChannelOverlay::mu_only()),
                grid_size: None,
            },
        )
        .await
        .unwrap()
        .unwrap();

    // entropy ≈ 1 adds ~+1.0, variance 0 adds -0.3: net bias differs
    assert_ne!(all.field, mu_only.field);
    assert_eq!(all.record.metrics(), mu_only.record.metrics());
}
