//! Narrative interpretation outcome
//!
//! The narrative call is best-effort: failure is a value, not an error.

use serde::{Deserialize, Serialize};

use crate::types::ErrorKind;

/// Result of asking the narrative service for an interpretation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NarrativeOutcome {
    /// Interpretation text returned by the service
    Ok { text: String },
    /// Service failed; the rest of the submission is unaffected
    Failed { kind: ErrorKind, message: String },
}

impl NarrativeOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Ok { text } => Some(text),
            Self::Failed { .. } => None,
        }
    }

    /// User-facing warning for a failed outcome
    pub fn warning(&self) -> Option<String> {
        match self {
            Self::Ok { .. } => None,
            Self::Failed { kind: ErrorKind::Auth, .. } => {
                Some("Insight unavailable. Check API key.".to_string())
            }
            Self::Failed { kind, .. } => Some(format!("Insight unavailable ({}).", kind)),
        }
    }
}
