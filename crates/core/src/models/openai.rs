//! # OpenAI Backend
//!
//! `AssistantBackend` over the OpenAI REST API: chat completions for
//! summaries, and the assistants / threads / runs endpoints (v2) for the
//! two pipeline roles.

use super::backend::{
    AssistantBackend, AssistantDefinition, AssistantId, ResponseSchema, Run, ThreadId,
};
use crate::error::BackendError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::env;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const ASSISTANTS_BETA: &str = "assistants=v2";

/// Backend that talks to the OpenAI HTTP API.
#[derive(Clone)]
pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiBackend {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Reads `OPENAI_API_KEY`; the base URL comes from the argument, then
    /// `OPENAI_BASE_URL`, then the public endpoint.
    pub fn from_env(base_url: Option<&str>) -> Result<Self, BackendError> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| BackendError::MissingApiKey)?;
        let base_url = base_url
            .map(str::to_string)
            .or_else(|| env::var("OPENAI_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self::new(api_key, base_url))
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", ASSISTANTS_BETA)
            .json(body)
            .send()
            .await?;
        decode(response).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, BackendError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", ASSISTANTS_BETA)
            .query(query)
            .send()
            .await?;
        decode(response).await
    }
}

#[async_trait]
impl AssistantBackend for OpenAiBackend {
    async fn complete(
        &self,
        model: &str,
        system: &str,
        user: &str,
    ) -> Result<String, BackendError> {
        let request = ChatCompletionRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };
        let response: ChatCompletionResponse = self.post("chat/completions", &request).await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| BackendError::Decode("completion returned no content".into()))
    }

    async fn create_assistant(
        &self,
        definition: &AssistantDefinition,
    ) -> Result<AssistantId, BackendError> {
        let request = CreateAssistantRequest {
            model: &definition.model,
            name: &definition.name,
            instructions: &definition.instructions,
            tools: Vec::new(),
            response_format: definition.response_schema.as_ref().map(response_format),
        };
        let created: IdObject = self.post("assistants", &request).await?;
        tracing::debug!(assistant = %created.id, name = %definition.name, "Created assistant");
        Ok(AssistantId(created.id))
    }

    async fn create_thread(&self) -> Result<ThreadId, BackendError> {
        let created: IdObject = self.post("threads", &json!({})).await?;
        tracing::debug!(thread = %created.id, "Created thread");
        Ok(ThreadId(created.id))
    }

    async fn post_message(&self, thread: &ThreadId, content: &str) -> Result<(), BackendError> {
        let request = CreateMessageRequest {
            role: "user",
            content,
        };
        let _: IdObject = self
            .post(&format!("threads/{}/messages", thread.0), &request)
            .await?;
        Ok(())
    }

    async fn create_run(
        &self,
        thread: &ThreadId,
        assistant: &AssistantId,
    ) -> Result<Run, BackendError> {
        let request = CreateRunRequest {
            assistant_id: &assistant.0,
        };
        let run: Run = self
            .post(&format!("threads/{}/runs", thread.0), &request)
            .await?;
        tracing::debug!(run = %run.id, status = %run.status, "Started run");
        Ok(run)
    }

    async fn poll_run(&self, thread: &ThreadId, run_id: &str) -> Result<Run, BackendError> {
        let run: Run = self
            .get(&format!("threads/{}/runs/{}", thread.0, run_id), &[])
            .await?;
        tracing::trace!(run = %run.id, status = %run.status, "Polled run");
        Ok(run)
    }

    async fn run_messages(
        &self,
        thread: &ThreadId,
        run: &Run,
    ) -> Result<Vec<String>, BackendError> {
        let list: MessageList = self
            .get(
                &format!("threads/{}/messages", thread.0),
                &[("run_id", run.id.as_str()), ("order", "desc")],
            )
            .await?;
        Ok(message_texts(list))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let retry_after = parse_retry_after(response.headers());
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "failed to read error body".to_string());
        return Err(map_http_error(status, body, retry_after));
    }
    response
        .json()
        .await
        .map_err(|err| BackendError::Decode(err.to_string()))
}

fn response_format(schema: &ResponseSchema) -> serde_json::Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": schema.name,
            "schema": schema.schema,
        }
    })
}

/// First text part of every message, keeping the API's order
fn message_texts(list: MessageList) -> Vec<String> {
    list.data
        .into_iter()
        .filter_map(|message| {
            message.content.into_iter().find_map(|part| match part {
                MessageContent::Text { text } => Some(text.value),
                MessageContent::Other => None,
            })
        })
        .collect()
}

fn map_http_error(status: StatusCode, body: String, retry_after: Option<Duration>) -> BackendError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    if status == StatusCode::TOO_MANY_REQUESTS {
        BackendError::RateLimited {
            message,
            retry_after,
        }
    } else {
        BackendError::Http {
            status: status.as_u16(),
            message,
        }
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value: &HeaderValue = headers.get("retry-after")?;
    let seconds: f64 = value.to_str().ok()?.trim().parse().ok()?;
    Duration::try_from_secs_f64(seconds).ok()
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct CreateAssistantRequest<'a> {
    model: &'a str,
    name: &'a str,
    instructions: &'a str,
    tools: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct CreateMessageRequest<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
}

#[derive(Deserialize)]
struct IdObject {
    id: String,
}

#[derive(Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

#[derive(Deserialize)]
struct ThreadMessage {
    content: Vec<MessageContent>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessageContent {
    Text { text: TextValue },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct TextValue {
    value: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let backend = OpenAiBackend::new("key", "http://localhost:8080/v1/");
        assert_eq!(
            backend.url("/threads/t1/runs"),
            "http://localhost:8080/v1/threads/t1/runs"
        );
    }

    #[test]
    fn test_rate_limit_mapping() {
        let body = r#"{"error":{"message":"Rate limit reached. Please try again in 6.5s.","type":"requests"}}"#;
        let err = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            body.to_string(),
            Some(Duration::from_secs(2)),
        );
        match err {
            BackendError::RateLimited {
                message,
                retry_after,
            } => {
                assert!(message.contains("try again in 6.5s"));
                assert_eq!(retry_after, Some(Duration::from_secs(2)));
            }
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[test]
    fn test_other_status_keeps_raw_body() {
        let err = map_http_error(StatusCode::BAD_GATEWAY, "upstream down".to_string(), None);
        assert!(matches!(
            err,
            BackendError::Http { status: 502, ref message } if message == "upstream down"
        ));
    }

    #[test]
    fn test_retry_after_header() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("3"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(3)));

        headers.insert("retry-after", HeaderValue::from_static("soon"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_message_texts_skip_non_text_parts() {
        let list: MessageList = serde_json::from_str(
            r#"{"data":[
                {"content":[{"type":"image_file","image_file":{"file_id":"f"}},
                            {"type":"text","text":{"value":"newest","annotations":[]}}]},
                {"content":[{"type":"text","text":{"value":"older","annotations":[]}}]},
                {"content":[]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(message_texts(list), vec!["newest", "older"]);
    }

    #[test]
    fn test_response_format_shape() {
        let schema = ResponseSchema {
            name: "ChangePlan".to_string(),
            schema: json!({"type": "object"}),
        };
        let format = response_format(&schema);
        assert_eq!(format["type"], "json_schema");
        assert_eq!(format["json_schema"]["name"], "ChangePlan");
    }
}
