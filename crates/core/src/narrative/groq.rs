use crate::config::NarrativeConfig;
use crate::narrative::{
    extract_json_object, Narrative, NarrativeClient, NarrativeError, NarrativeRequest, NarrativeSource,
};
use crate::util::{retry_with_backoff, RetryConfig};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

const LOG_TARGET: &str = "narrative::groq";
const SYSTEM_PROMPT: &str =
    "You are an expert communication coach. You always answer with a single valid JSON object.";
const MAX_TOKENS: u32 = 1024;

/// OpenAI-compatible chat completion client (Groq by default).
#[derive(Clone)]
pub struct GroqNarrativeClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: Url,
    retry: RetryConfig,
}

impl GroqNarrativeClient {
    pub fn new(config: &NarrativeConfig) -> Result<Self, NarrativeError> {
        let api_key = config
            .api_key
            .as_ref()
            .ok_or(NarrativeError::MissingApiKey)?
            .expose()
            .to_owned();
        Ok(Self {
            client: Client::new(),
            api_key,
            model: config.model.clone(),
            endpoint: Url::parse(&config.endpoint)?,
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn body(&self, request: &NarrativeRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![
                ChatMessage {
                    role: "system".to_owned(),
                    content: SYSTEM_PROMPT.to_owned(),
                },
                ChatMessage {
                    role: "user".to_owned(),
                    content: request.prompt(),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object".to_owned(),
            },
        }
    }

    async fn send_once(&self, body: &ChatRequest) -> Result<String, NarrativeError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_owned());
            return Err(NarrativeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| NarrativeError::InvalidResponse(format!("failed to parse completion: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| NarrativeError::InvalidResponse("no choices in completion".to_owned()))
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl NarrativeClient for GroqNarrativeClient {
    fn narrate(&self, request: NarrativeRequest) -> BoxFuture<'_, Result<Narrative, NarrativeError>> {
        async move {
            let body = self.body(&request);
            tracing::debug!(target: LOG_TARGET, kind = request.kind.as_str(), model = %self.model, "requesting narrative");

            let reply = retry_with_backoff(&self.retry, || self.send_once(&body), NarrativeError::is_retryable)
                .await?;

            let content = extract_json_object(&reply).ok_or_else(|| {
                NarrativeError::InvalidResponse("reply did not contain a JSON object".to_owned())
            })?;

            Ok(Narrative {
                kind: request.kind,
                source: NarrativeSource::Model,
                content,
            })
        }
        .boxed()
    }
}
