//! Free-text coaching narrative produced by an external language model.
//!
//! The engine only forwards structured metrics and returns whatever JSON
//! object comes back; nothing here interprets the narrative content.

mod fallback;
mod groq;
mod offline;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use fallback::FallbackNarrativeClient;
pub use groq::GroqNarrativeClient;
pub use offline::OfflineNarrativeClient;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeKind {
    Speech,
    Emotion,
    Posture,
    Comprehensive,
}

impl NarrativeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NarrativeKind::Speech => "speech",
            NarrativeKind::Emotion => "emotion",
            NarrativeKind::Posture => "posture",
            NarrativeKind::Comprehensive => "comprehensive",
        }
    }

    /// Keys the model is asked to return.
    pub fn response_keys(&self) -> &'static [&'static str] {
        match self {
            NarrativeKind::Speech => &["quality", "strengths", "improvements", "score"],
            NarrativeKind::Emotion => &["authenticity", "confidence", "engagement", "recommendations"],
            NarrativeKind::Posture => &["quality", "presence", "corrections", "impact"],
            NarrativeKind::Comprehensive => &["assessment", "feedback", "recommendations", "actionPlan"],
        }
    }

    fn instructions(&self) -> &'static str {
        match self {
            NarrativeKind::Speech => {
                "Analyze this speech performance. Cover speech quality (clarity, pace, confidence), \
                 three strengths, three specific improvements and an overall communication score from 1 to 10."
            }
            NarrativeKind::Emotion => {
                "Analyze this emotional presentation. Cover emotional authenticity, a confidence level \
                 from 1 to 10, engagement quality and recommendations for improvement."
            }
            NarrativeKind::Posture => {
                "Analyze this body language and posture. Cover overall body language quality, professional \
                 presence from 1 to 10, specific posture corrections and the impact on communication."
            }
            NarrativeKind::Comprehensive => {
                "Generate comprehensive professional feedback for this communication practice session. \
                 Give a two to three sentence assessment, three key strengths, three actionable improvements \
                 and a three step action plan for the next practice."
            }
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NarrativeRequest {
    pub kind: NarrativeKind,
    /// Structured metrics as produced by the analyzers, passed through untouched.
    pub metrics: serde_json::Value,
}

impl NarrativeRequest {
    pub fn new(kind: NarrativeKind, metrics: serde_json::Value) -> Self {
        Self { kind, metrics }
    }

    pub fn prompt(&self) -> String {
        let metrics =
            serde_json::to_string_pretty(&self.metrics).unwrap_or_else(|_| self.metrics.to_string());
        format!(
            "{}\n\nMetrics:\n{}\n\nRespond with a single JSON object with keys: {}. Return ONLY valid JSON.",
            self.kind.instructions(),
            metrics,
            self.kind.response_keys().join(", ")
        )
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeSource {
    Model,
    Offline,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Narrative {
    pub kind: NarrativeKind,
    pub source: NarrativeSource,
    pub content: serde_json::Value,
}

#[derive(thiserror::Error, Debug)]
pub enum NarrativeError {
    #[error("narrative api key is not configured")]
    MissingApiKey,

    #[error("invalid narrative endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("narrative api returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid narrative response: {0}")]
    InvalidResponse(String),
}

impl NarrativeError {
    pub fn is_retryable(&self) -> bool {
        match self {
            NarrativeError::Network(e) => e.is_timeout() || e.is_connect(),
            NarrativeError::Api { status, .. } => crate::util::is_http_retryable(*status),
            _ => false,
        }
    }

    /// The remote service rejected our credentials; retrying later will not help.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, NarrativeError::Api { status: 401 | 403, .. })
    }
}

pub trait NarrativeClient: Send + Sync {
    fn narrate(&self, request: NarrativeRequest) -> BoxFuture<'_, Result<Narrative, NarrativeError>>;
}

/// First JSON object in a model reply. Accepts a bare object, a fenced code
/// block, or an object embedded in prose.
pub fn extract_json_object(reply: &str) -> Option<serde_json::Value> {
    let trimmed = reply.trim();
    if let Ok(value @ serde_json::Value::Object(_)) = serde_json::from_str(trimmed) {
        return Some(value);
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str(&trimmed[start..=end]) {
        Ok(value @ serde_json::Value::Object(_)) => Some(value),
        _ => None,
    }
}
