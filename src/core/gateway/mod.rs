//! Boundary to the hosted completion API.
//!
//! [`CompletionGateway`] turns a transcript plus a parameter snapshot into
//! either a finished reply or a [`FragmentStream`] of deltas. The real
//! implementation is [`HttpGateway`]; tests substitute scripted gateways.

mod error;
mod http;
mod sse;

#[cfg(test)]
pub mod mock;

use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures_util::Stream;

use crate::api::{ChatMessage, ChatRequest, ResponseFormat, ResponseFormatKind};
use crate::core::message::Turn;
use crate::core::params::ParameterSnapshot;

pub use error::{summarize_error_body, ChatError, FaultKind};
pub use http::{HttpGateway, DEFAULT_BASE_URL};

/// Forward-only sequence of reply fragments. Polling it is what drives the
/// underlying network read; once exhausted it cannot be replayed.
pub struct FragmentStream {
    inner: Pin<Box<dyn Stream<Item = Result<String, ChatError>> + Send>>,
}

impl FragmentStream {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<String, ChatError>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    pub fn from_fragments<I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = String>,
        I::IntoIter: Send + 'static,
    {
        Self::new(futures_util::stream::iter(fragments.into_iter().map(Ok)))
    }
}

impl Stream for FragmentStream {
    type Item = Result<String, ChatError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

pub enum Completion {
    Text(String),
    Stream(FragmentStream),
}

#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(
        &self,
        transcript: &[Turn],
        params: &ParameterSnapshot,
    ) -> Result<Completion, ChatError>;
}

/// Map a transcript and parameter snapshot onto the request body.
///
/// `top_p` is only sent when it is a usable positive value, so the default of
/// 1.0 goes out on the wire while 0 is dropped. `stop` is dropped when empty.
pub fn build_request(transcript: &[Turn], params: &ParameterSnapshot) -> ChatRequest {
    let messages = transcript
        .iter()
        .map(|turn| ChatMessage {
            role: turn.role.as_str().to_string(),
            content: turn.content.clone(),
        })
        .collect();

    let response_format = ResponseFormat {
        kind: if params.json_mode {
            ResponseFormatKind::Json
        } else {
            ResponseFormatKind::Text
        },
    };

    ChatRequest {
        model: params.model.clone(),
        messages,
        stream: params.streaming,
        temperature: params.temperature,
        max_tokens: params.max_tokens,
        response_format,
        top_p: (params.top_p > 0.0).then_some(params.top_p),
        stop: params.stop().map(str::to_string),
    }
}
