//! Core types for Zenome

mod config;
mod error;
mod field;
mod narrative;
mod output;
mod record;

pub use config::{TokenizerKind, ZenomeConfig, ENV_API_BASE, ENV_API_KEY};
pub use error::{ErrorKind, ZenomeError, ZenomeResult};
pub use field::{ChannelOverlay, Field};
pub use narrative::NarrativeOutcome;
pub use output::Submission;
pub use record::{Metrics, QueryRecord, Trends};
