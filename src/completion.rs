use std::future::Future;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{BotError, Result};
use crate::types::MessageRole;

const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

/// Something that turns a prompt into generated text.
pub trait Completer: Send + Sync + 'static {
    fn complete(&self, prompt: &str, model: &str) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: MessageRole,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat-completion endpoint.
pub struct OpenAiClient {
    api_key: String,
    client: reqwest::Client,
    endpoint: Url,
}

impl OpenAiClient {
    /// `base_url` must end with a slash, e.g. `https://api.openai.com/v1/`.
    pub fn new(api_key: String, base_url: &Url) -> Result<Self> {
        Ok(Self {
            api_key,
            client: reqwest::Client::new(),
            endpoint: base_url.join(CHAT_COMPLETIONS_PATH)?,
        })
    }

    pub async fn chat(&self, prompt: &str, model: &str) -> Result<String> {
        info!("Prompting {model} with: {prompt}");

        let request = ChatCompletionRequest {
            model,
            messages: vec![ChatMessage {
                role: MessageRole::User,
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {e}"));
            return Err(BotError::CompletionApi { status, message });
        }

        let api_response: ChatCompletionResponse = response.json().await?;

        let reply = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BotError::CompletionResponse("No choices in response".to_string()))?
            .message
            .content
            .unwrap_or_default();

        debug!("Received {} characters from completion API", reply.len());
        Ok(reply)
    }
}

impl Completer for OpenAiClient {
    fn complete(&self, prompt: &str, model: &str) -> impl Future<Output = Result<String>> + Send {
        self.chat(prompt, model)
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use reqwest::StatusCode;
    use serde_json::json;

    use super::*;

    fn client_for(server: &MockServer) -> OpenAiClient {
        let base = Url::parse(&server.url("/v1/")).unwrap();
        OpenAiClient::new("test-key".to_string(), &base).unwrap()
    }

    #[tokio::test]
    async fn sends_single_user_message_and_returns_first_choice() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("Authorization", "Bearer test-key")
                    .json_body(json!({
                        "model": "gpt-3.5-turbo",
                        "messages": [{"role": "user", "content": "What is 2+2?"}]
                    }));
                then.status(200).json_body(json!({
                    "choices": [
                        {"message": {"role": "assistant", "content": "4"}},
                        {"message": {"role": "assistant", "content": "four"}}
                    ]
                }));
            })
            .await;

        let reply = client_for(&server)
            .chat("What is 2+2?", "gpt-3.5-turbo")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reply, "4");
    }

    #[tokio::test]
    async fn prompt_is_passed_through_unmodified() {
        let prompt = "  <b>spaces</b> & \"quotes\"\n  ";
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions").json_body(json!({
                    "model": "m",
                    "messages": [{"role": "user", "content": prompt}]
                }));
                then.status(200).json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": "ok"}}]
                }));
            })
            .await;

        client_for(&server).chat(prompt, "m").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(401).body("invalid api key");
            })
            .await;

        let err = client_for(&server).chat("hi", "m").await.unwrap_err();
        match err {
            BotError::CompletionApi { status, message } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(message, "invalid api key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_a_response_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(json!({ "choices": [] }));
            })
            .await;

        let err = client_for(&server).chat("hi", "m").await.unwrap_err();
        assert!(matches!(err, BotError::CompletionResponse(_)));
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).body("not json");
            })
            .await;

        let err = client_for(&server).chat("hi", "m").await.unwrap_err();
        assert!(matches!(err, BotError::Reqwest(_)));
    }

    #[tokio::test]
    async fn null_content_becomes_empty_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": null}}]
                }));
            })
            .await;

        let reply = client_for(&server).chat("hi", "m").await.unwrap();
        assert_eq!(reply, "");
    }
}
