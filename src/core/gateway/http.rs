use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tracing::{debug, info};

use super::sse::fragment_stream;
use super::{build_request, ChatError, Completion, CompletionGateway};
use crate::api::CompletionResponse;
use crate::core::message::Turn;
use crate::core::params::ParameterSnapshot;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Gateway that talks to an OpenAI-compatible `chat/completions` endpoint.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpGateway {
    /// The key is only checked when a request is about to go out.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, ChatError> {
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/chat/completions")
    }
}

#[async_trait]
impl CompletionGateway for HttpGateway {
    async fn complete(
        &self,
        transcript: &[Turn],
        params: &ParameterSnapshot,
    ) -> Result<Completion, ChatError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ChatError::MissingCredential)?;

        let request = build_request(transcript, params);
        info!(
            model = %request.model,
            turns = request.messages.len(),
            stream = request.stream,
            "sending completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            debug!(status = status.as_u16(), body = %body, "completion request rejected");
            return Err(ChatError::api(status.as_u16(), &body));
        }

        if request.stream {
            let body = response
                .bytes_stream()
                .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(ChatError::from));
            return Ok(Completion::Stream(fragment_stream(body)));
        }

        let body = response.text().await?;
        parse_completion(&body).map(Completion::Text)
    }
}

/// Extract the reply text from a non-streamed completion body. A missing
/// `content` field counts as an empty reply.
pub(crate) fn parse_completion(body: &str) -> Result<String, ChatError> {
    let response: CompletionResponse =
        serde_json::from_str(body).map_err(|err| ChatError::Decode(err.to_string()))?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ChatError::Decode("response contained no choices".to_string()))?;
    Ok(choice.message.content.unwrap_or_default())
}
