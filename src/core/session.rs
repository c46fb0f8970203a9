//! Session context and the per-query pipeline
//!
//! text → embed → (μ, H, σ²) → field → narrative → log append
//!
//! A failed embedding or tokenization aborts the submission before the
//! log is touched. A failed narrative is carried in the result and the
//! record is still appended.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::embedding::{EmbeddingProvider, HashEmbedder, OpenAiEmbedder};
use crate::core::field::FieldGenerator;
use crate::core::narrative::{interpret, NarrativeProvider, OpenAiNarrator};
use crate::core::query_log::QueryLog;
use crate::core::tokenizer::{build_tokenizer, Tokenizer};
use crate::types::{
    ChannelOverlay, Field, Metrics, Submission, ZenomeConfig, ZenomeError, ZenomeResult,
};
use crate::MAX_GRID_SIZE;

/// Shared, immutable bundle of config and collaborators
pub struct QueryPipeline {
    config: ZenomeConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    tokenizer: Arc<dyn Tokenizer>,
    narrator: Option<Arc<dyn NarrativeProvider>>,
}

impl std::fmt::Debug for QueryPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryPipeline")
            .field("grid_size", &self.config.grid_size)
            .field("embedding_model", &self.config.embedding_model)
            .field("embedder", &self.embedder.name())
            .field("tokenizer", &self.tokenizer.encoding_name())
            .field("narrator", &self.narrator.as_ref().map(|n| n.name()))
            .finish()
    }
}

impl QueryPipeline {
    /// Assemble a pipeline from explicit collaborators
    pub fn new(
        config: ZenomeConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        tokenizer: Arc<dyn Tokenizer>,
        narrator: Option<Arc<dyn NarrativeProvider>>,
    ) -> ZenomeResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            embedder,
            tokenizer,
            narrator,
        })
    }

    /// Hosted embedding + chat clients built from config
    pub fn from_config(config: ZenomeConfig) -> ZenomeResult<Self> {
        let embedder = Arc::new(OpenAiEmbedder::new(&config.api_base, config.api_key.clone()));
        let tokenizer = build_tokenizer(config.tokenizer, &config.encoding)?;
        let narrator: Option<Arc<dyn NarrativeProvider>> = if config.narrative_enabled {
            Some(Arc::new(OpenAiNarrator::new(
                &config.api_base,
                config.api_key.clone(),
                &config.narrative_model,
            )))
        } else {
            None
        };
        Self::new(config, embedder, tokenizer, narrator)
    }

    /// No network: hash embeddings, no narrative
    pub fn offline(config: ZenomeConfig) -> ZenomeResult<Self> {
        let tokenizer = build_tokenizer(config.tokenizer, &config.encoding)?;
        Self::new(config, Arc::new(HashEmbedder::default()), tokenizer, None)
    }

    pub fn config(&self) -> &ZenomeConfig {
        &self.config
    }

    pub fn has_narrator(&self) -> bool {
        self.narrator.is_some()
    }
}

/// Per-call overrides of the configured defaults
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmitOptions {
    pub overlay: Option<ChannelOverlay>,
    pub grid_size: Option<usize>,
}

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// One interactive session: owns its query log for its whole lifetime
#[derive(Debug)]
pub struct Session {
    id: String,
    created_at: DateTime<Utc>,
    log: QueryLog,
    latest_field: Option<Field>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// New session with a generated id
    pub fn new() -> Self {
        Self::with_id(generate_session_id())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            log: QueryLog::new(),
            latest_field: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn log(&self) -> &QueryLog {
        &self.log
    }

    /// Field of the most recent accepted query
    pub fn latest_field(&self) -> Option<&Field> {
        self.latest_field.as_ref()
    }

    /// Run one query through the pipeline.
    ///
    /// Returns `Ok(None)` for empty text. Collaborator failures other than
    /// the narrative propagate and leave the log unchanged.
    pub async fn submit(
        &mut self,
        pipeline: &QueryPipeline,
        text: &str,
        options: SubmitOptions,
    ) -> ZenomeResult<Option<Submission>> {
        if text.trim().is_empty() {
            log::debug!("session {}: empty query ignored", self.id);
            return Ok(None);
        }

        let config = &pipeline.config;
        let grid_size = options.grid_size.unwrap_or(config.grid_size);
        if !(2..=MAX_GRID_SIZE).contains(&grid_size) {
            return Err(ZenomeError::Config(format!(
                "grid_size must be in [2, {}], got {}",
                MAX_GRID_SIZE, grid_size
            )));
        }
        let overlay = options.overlay.unwrap_or(config.overlay);

        let embedding = pipeline.embedder.embed(text, &config.embedding_model).await?;
        let metrics = Metrics::extract(text, &embedding, pipeline.tokenizer.as_ref())?;
        log::debug!(
            "session {}: {} dims via {}, {}",
            self.id,
            embedding.len(),
            pipeline.embedder.name(),
            metrics.summary()
        );

        let field = FieldGenerator::with_overlay(overlay).generate(&metrics, grid_size);

        let narrative = match &pipeline.narrator {
            Some(narrator) => Some(interpret(narrator.as_ref(), text, &metrics).await),
            None => None,
        };

        let record = match self.log.append(text, metrics) {
            Some(record) => record.clone(),
            None => return Ok(None),
        };
        self.latest_field = Some(field.clone());

        Ok(Some(Submission {
            index: self.log.len() - 1,
            record,
            field,
            narrative,
        }))
    }
}

/// Generate session ID
fn generate_session_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let seq = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("session_{:x}_{}", nanos as u64, seq)
}
