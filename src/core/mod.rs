//! Core modules for Zenome

pub mod tokenizer;
pub mod metrics;
pub mod field;
pub mod query_log;
pub mod embedding;
pub mod narrative;
pub mod session;
pub mod render;
pub mod api;

pub use tokenizer::{build_tokenizer, BpeTokenizer, HashingTokenizer, Tokenizer};
pub use metrics::{compute_alignment, compute_token_entropy, compute_variance, entropy_from_tokens, sigmoid};
pub use field::{generate_field, FieldGenerator};
pub use query_log::QueryLog;
pub use embedding::{EmbeddingProvider, HashEmbedder, OpenAiEmbedder};
pub use narrative::{interpret, NarrativeProvider, OpenAiNarrator};
pub use session::{QueryPipeline, Session, SubmitOptions};
pub use render::{render_heatmap, render_table, render_trends};
pub use api::{create_router, run_server};
