//! Zenome: Expectation-to-Outcome Mapper
//!
//! Query text → embedding + tokens → (μ, H, σ²) → Zeno field surface,
//! with every accepted query appended to a per-session log.

pub mod core;
pub mod types;

// =============================================================================
// FIELD DOMAIN
// =============================================================================

/// Lower bound of the square sampling domain (both axes)
pub const FIELD_DOMAIN_MIN: f64 = -2.0;

/// Upper bound of the square sampling domain (both axes)
pub const FIELD_DOMAIN_MAX: f64 = 2.0;

/// Default samples per axis
pub const DEFAULT_GRID_SIZE: usize = 40;

/// Largest grid the config will accept
pub const MAX_GRID_SIZE: usize = 512;

// =============================================================================
// FIELD BIAS WEIGHTS - canonical formula
// Z = sigmoid(sin(3R) + cos(2X)sin(2Y) + 4(μ-0.5) + 2(H-0.5) + 3(σ²-0.1))
// =============================================================================

/// Weight of the alignment channel
pub const FIELD_WEIGHT_MU: f64 = 4.0;
/// Weight of the entropy channel
pub const FIELD_WEIGHT_ENTROPY: f64 = 2.0;
/// Weight of the variance channel
pub const FIELD_WEIGHT_VARIANCE: f64 = 3.0;

/// Reference point μ is centered on
pub const FIELD_CENTER_MU: f64 = 0.5;
/// Reference point entropy is centered on
pub const FIELD_CENTER_ENTROPY: f64 = 0.5;
/// Reference point variance is centered on
pub const FIELD_CENTER_VARIANCE: f64 = 0.1;

// =============================================================================
// METRICS
// =============================================================================

/// Added to the token count before taking the log in entropy normalization
pub const ENTROPY_EPSILON: f64 = 1e-9;

// =============================================================================
// COLLABORATOR DEFAULTS
// =============================================================================

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_NARRATIVE_MODEL: &str = "gpt-4";
pub const DEFAULT_ENCODING: &str = "cl100k_base";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Dimensionality of ada-002 vectors, also used by the offline embedder
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
