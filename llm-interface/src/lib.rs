use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use subscope_core::{CategoryFlags, CoreError, LlmError, RedditPost};
use tracing::{debug, error, info};

const OPENAI_API_BASE: &str = "https://api.openai.com";

const SYSTEM_PROMPT: &str = "You are an expert at analyzing subreddit posts. \
     Categorize the given post content based on the defined criteria.";

/// OpenAI chat-completions client issuing classification requests with a
/// strict four-boolean JSON schema.
#[derive(Debug)]
pub struct OpenAiClient {
    http_client: Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(CoreError::Network)?;

        Ok(Self {
            http_client,
            api_key,
            model,
            api_base: OPENAI_API_BASE.to_string(),
        })
    }

    /// Point the client at a different API host. Used by tests.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Classify one post's title+body against the four categories.
    pub async fn classify_post(&self, post: &RedditPost) -> Result<CategoryFlags, CoreError> {
        let content = format!("{}\n{}", post.title, post.selftext);
        self.classify(&content).await
    }

    /// Classify every post with at most `max_concurrency` requests in flight.
    ///
    /// Output order matches input order. The batch is all-or-nothing: the
    /// first failed classification aborts the rest and surfaces its error.
    pub async fn classify_batch(
        &self,
        posts: &[RedditPost],
        max_concurrency: usize,
    ) -> Result<Vec<CategoryFlags>, CoreError> {
        info!(
            count = posts.len(),
            max_concurrency, "Classifying post batch"
        );
        let requests: Vec<_> = posts
            .iter()
            .map(|post| self.classify_post(post).boxed())
            .collect();
        stream::iter(requests)
            .buffered(max_concurrency.max(1))
            .try_collect()
            .await
    }

    async fn classify(&self, content: &str) -> Result<CategoryFlags, CoreError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content,
                },
            ],
            response_format: categorization_response_format(),
        };

        let response = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Network error reaching completion API: {e}");
                if e.is_timeout() {
                    CoreError::Llm(LlmError::RequestTimeout)
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_error_status(&response));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!("Failed to parse completion response: {e}");
            CoreError::Llm(LlmError::InvalidResponse {
                details: "Failed to parse completion response".to_string(),
            })
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(CoreError::Llm(LlmError::InvalidResponse {
                details: "completion has no message content".to_string(),
            }))?;

        let flags: CategoryFlags = serde_json::from_str(&content).map_err(|e| {
            error!("Malformed categorization payload: {e}");
            CoreError::Llm(LlmError::InvalidResponse {
                details: format!("malformed categorization payload: {e}"),
            })
        })?;

        debug!(?flags, "Classified post");
        Ok(flags)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// The strict response schema: exactly the four boolean category fields.
fn categorization_response_format() -> serde_json::Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "subreddit_categorization",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "solution_request": {
                        "type": "boolean",
                        "description": "True when people are asking for tools & solutions"
                    },
                    "pain_anger": {
                        "type": "boolean",
                        "description": "True when people are expressing pain points & frustrations"
                    },
                    "advice_request": {
                        "type": "boolean",
                        "description": "True when people are asking for advice & resources"
                    },
                    "money_talk": {
                        "type": "boolean",
                        "description": "True when people are talking about spending money"
                    }
                },
                "required": ["solution_request", "pain_anger", "advice_request", "money_talk"],
                "additionalProperties": false
            }
        }
    })
}

fn map_error_status(response: &reqwest::Response) -> CoreError {
    let status = response.status();
    error!(status = status.as_u16(), "Completion request failed");

    match status.as_u16() {
        401 | 403 => CoreError::Llm(LlmError::AuthenticationFailed),
        429 => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);
            CoreError::Llm(LlmError::RateLimitExceeded { retry_after })
        }
        code if status.is_server_error() => {
            CoreError::Llm(LlmError::ServerError { status_code: code })
        }
        code => CoreError::Llm(LlmError::InvalidResponse {
            details: format!("unexpected status {code}"),
        }),
    }
}
