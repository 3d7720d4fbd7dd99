use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default chat-completions endpoint.
const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// HTTP-level ceiling; the resolver applies its own shorter deadline on top.
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(20);

static RE_SCORE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").unwrap());

/// Which comparison a term pair belongs to; selects the scoring prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    General,
    HardSkill,
    JobTitle,
    DegreeField,
    SoftSkill,
}

/// Failures of the external similarity call. The resolver collapses all of
/// them into one "provider failure" outcome.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request timed out")]
    Timeout,
    #[error("provider rate limited")]
    RateLimited,
    #[error("provider http error: {0}")]
    Http(String),
    #[error("provider returned no usable score: {0}")]
    MalformedResponse(String),
    #[error("provider configuration error: {0}")]
    Config(String),
}

/// The external semantic-similarity capability: two strings in, a score in
/// [0, 1] out. May be slow, rate-limited, or down; callers must bound it
/// with a timeout and treat every failure mode alike.
#[async_trait]
pub trait SimilarityProvider: Send + Sync {
    async fn similarity(&self, a: &str, b: &str, kind: PromptKind) -> Result<f64, ProviderError>;

    fn name(&self) -> &'static str;
}

/// Similarity provider over the OpenAI chat-completions API: a scoring
/// prompt at temperature zero, numeric answer extracted from the reply.
pub struct OpenAiSimilarityProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl OpenAiSimilarityProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ProviderError::Config("API key must not be empty".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            model: DEFAULT_MODEL.into(),
            url: OPENAI_CHAT_URL.into(),
        })
    }

    /// Create a provider from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ProviderError::Config("OPENAI_API_KEY not set".into()))?;
        Self::new(api_key)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    fn prompt(a: &str, b: &str, kind: PromptKind) -> String {
        match kind {
            PromptKind::General => format!(
                "On a scale from 0 to 1, where 0 means 'not similar at all' and 1 means \
                 'identical', rate the similarity of these two texts:\nText 1: {a}\nText 2: {b}\n\
                 Answer with the numeric score only."
            ),
            PromptKind::HardSkill => format!(
                "As a tech recruitment expert, rate the similarity of these two technical \
                 skills on a scale from 0 to 1:\nSkill 1: {a}\nSkill 2: {b}\n\
                 Closely related skills (like TypeScript and JavaScript) deserve a high score \
                 (>0.8); fundamentally different skills (like Python and Photoshop) deserve a \
                 low score (<0.3). Answer with the numeric score only."
            ),
            PromptKind::JobTitle => format!(
                "You are an IT recruitment expert. Rate the similarity of these two job \
                 titles on a scale from 0 to 1:\nTitle 1: {a}\nTitle 2: {b}\n\
                 Consider the domains and skills involved, not only the exact words. \
                 Answer with the numeric score only."
            ),
            PromptKind::DegreeField => format!(
                "As a tech recruitment expert, rate the similarity of these two fields of \
                 study on a scale from 0 to 1:\nField 1: {a}\nField 2: {b}\n\
                 Consider the overlap in skills and knowledge. Answer with the numeric score only."
            ),
            PromptKind::SoftSkill => format!(
                "On a scale from 0 to 1, rate the similarity of these two behavioural \
                 (soft) skills:\nSkill 1: {a}\nSkill 2: {b}\n\
                 Answer with the numeric score only."
            ),
        }
    }

    /// Pull the first number out of the model reply and clamp it to [0, 1].
    fn parse_score(text: &str) -> Result<f64, ProviderError> {
        let matched = RE_SCORE
            .find(text)
            .ok_or_else(|| ProviderError::MalformedResponse(text.to_string()))?;

        matched
            .as_str()
            .replace(',', ".")
            .parse::<f64>()
            .map(|score| score.clamp(0.0, 1.0))
            .map_err(|_| ProviderError::MalformedResponse(text.to_string()))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[async_trait]
impl SimilarityProvider for OpenAiSimilarityProvider {
    async fn similarity(&self, a: &str, b: &str, kind: PromptKind) -> Result<f64, ProviderError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: Self::prompt(a, b, kind),
            }],
            temperature: 0.0,
            max_tokens: 10,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Http(e.to_string())
                }
            })?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(ProviderError::Http(format!("status {}", response.status())));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let content = body
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or_else(|| ProviderError::MalformedResponse("empty choices".into()))?;

        let score = Self::parse_score(content)?;
        debug!(score, "provider similarity resolved");
        Ok(score)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
