//! Narrative interpretation of a query's metrics
//!
//! The chat call is best-effort. [`interpret`] never fails: any provider
//! error becomes [`NarrativeOutcome::Failed`].

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::types::{Metrics, NarrativeOutcome, ZenomeError, ZenomeResult};

pub const SYSTEM_PROMPT: &str =
    "You are a strategic AI analyst interpreting coherence metrics from natural language.";

/// Produces free-text completions
#[async_trait]
pub trait NarrativeProvider: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> ZenomeResult<String>;

    fn name(&self) -> &str;
}

/// User prompt for one query
pub fn user_prompt(query: &str, metrics: &Metrics) -> String {
    format!(
        "The μ (Zeno) score is {:.4}, Entropy is {:.3}, and Variance is {:.4} for the query: {}. \
         Offer a short insight on coherence and potential next step.",
        metrics.mu, metrics.entropy, metrics.variance, query
    )
}

/// Ask `provider` to interpret `metrics`; failures come back as values
pub async fn interpret(
    provider: &dyn NarrativeProvider,
    query: &str,
    metrics: &Metrics,
) -> NarrativeOutcome {
    match provider.complete(SYSTEM_PROMPT, &user_prompt(query, metrics)).await {
        Ok(text) => NarrativeOutcome::Ok { text },
        Err(e) => {
            log::warn!("narrative via {} failed: {}", provider.name(), e);
            NarrativeOutcome::Failed {
                kind: e.kind(),
                message: e.to_string(),
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client
#[derive(Debug, Clone)]
pub struct OpenAiNarrator {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiNarrator {
    pub fn new(api_base: &str, api_key: Option<String>, model: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl NarrativeProvider for OpenAiNarrator {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> ZenomeResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ZenomeError::Auth("no API key configured".to_string()))?;

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: user_prompt },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ZenomeError::from_status(status.as_u16(), body));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ZenomeError::Malformed("chat response has no content".to_string()))
    }

    fn name(&self) -> &str {
        "openai-chat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorKind;

    struct Echo;

    #[async_trait]
    impl NarrativeProvider for Echo {
        async fn complete(&self, system_prompt: &str, user_prompt: &str) -> ZenomeResult<String> {
            Ok(format!("{}|{}", system_prompt.len(), user_prompt))
        }
        fn name(&self) -> &str {
            "echo"
        }
    }

    struct RateLimited;

    #[async_trait]
    impl NarrativeProvider for RateLimited {
        async fn complete(&self, _: &str, _: &str) -> ZenomeResult<String> {
            Err(ZenomeError::RateLimit("slow down".to_string()))
        }
        fn name(&self) -> &str {
            "rate-limited"
        }
    }

    #[test]
    fn test_user_prompt_format() {
        let prompt = user_prompt("why now", &Metrics::new(0.5, 1.0, 0.0));
        assert!(prompt.starts_with("The μ (Zeno) score is 0.5000, Entropy is 1.000, and Variance is 0.0000"));
        assert!(prompt.contains("for the query: why now."));
    }

    #[tokio::test]
    async fn test_interpret_ok() {
        let outcome = interpret(&Echo, "q", &Metrics::new(0.5, 1.0, 0.0)).await;
        let text = outcome.text().unwrap();
        assert!(text.contains("for the query: q"));
    }

    #[tokio::test]
    async fn test_interpret_failure_is_value() {
        let outcome = interpret(&RateLimited, "q", &Metrics::new(0.5, 1.0, 0.0)).await;
        match outcome {
            NarrativeOutcome::Failed { kind, message } => {
                assert_eq!(kind, ErrorKind::RateLimit);
                assert!(message.contains("slow down"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let narrator = OpenAiNarrator::new("http://127.0.0.1:9", None, "gpt-4");
        let outcome = interpret(&narrator, "q", &Metrics::new(0.5, 1.0, 0.0)).await;
        assert!(matches!(outcome, NarrativeOutcome::Failed { kind: ErrorKind::Auth, .. }));
    }

    #[test]
    fn test_null_content_is_malformed_contract() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#)
                .unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
