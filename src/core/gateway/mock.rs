//! Scripted gateways for exercising the controller without a network.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream;

use super::{ChatError, Completion, CompletionGateway, FragmentStream};
use crate::core::message::Turn;
use crate::core::params::ParameterSnapshot;

pub enum Reply {
    Text(String),
    Fragments(Vec<String>),
    /// Yields the fragments, then fails mid-stream.
    BrokenStream(Vec<String>, String),
    Fail(ChatError),
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub transcript: Vec<Turn>,
    pub params: ParameterSnapshot,
}

/// Plays back one [`Reply`] per call and records what it was asked.
#[derive(Default)]
pub struct MockGateway {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockGateway {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionGateway for MockGateway {
    async fn complete(
        &self,
        transcript: &[Turn],
        params: &ParameterSnapshot,
    ) -> Result<Completion, ChatError> {
        self.calls.lock().unwrap().push(RecordedCall {
            transcript: transcript.to_vec(),
            params: params.clone(),
        });

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("mock gateway ran out of replies");

        match reply {
            Reply::Text(text) => Ok(Completion::Text(text)),
            Reply::Fragments(fragments) => {
                Ok(Completion::Stream(FragmentStream::from_fragments(fragments)))
            }
            Reply::BrokenStream(fragments, message) => {
                let items = fragments
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(ChatError::Stream(message))));
                Ok(Completion::Stream(FragmentStream::new(stream::iter(items))))
            }
            Reply::Fail(err) => Err(err),
        }
    }
}

/// Deterministic gateway: the reply is derived from the transcript alone and
/// split into word-sized fragments when streaming.
pub struct EchoGateway;

impl EchoGateway {
    pub fn reply_for(transcript: &[Turn]) -> String {
        let last = transcript
            .iter()
            .rev()
            .find(|turn| turn.is_user())
            .map(|turn| turn.content.as_str())
            .unwrap_or_default();
        format!("You said ({} turns so far): {last}", transcript.len())
    }
}

#[async_trait]
impl CompletionGateway for EchoGateway {
    async fn complete(
        &self,
        transcript: &[Turn],
        params: &ParameterSnapshot,
    ) -> Result<Completion, ChatError> {
        let reply = Self::reply_for(transcript);
        if !params.streaming {
            return Ok(Completion::Text(reply));
        }
        let fragments: Vec<String> = reply
            .split_inclusive(' ')
            .map(str::to_string)
            .collect();
        Ok(Completion::Stream(FragmentStream::from_fragments(fragments)))
    }
}
