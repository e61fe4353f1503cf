use std::collections::VecDeque;

use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};
use memchr::memchr;
use tracing::{debug, warn};

use super::{summarize_error_body, ChatError, FragmentStream};
use crate::api::ChatResponse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseEvent {
    Fragment(String),
    Error(String),
    /// Bytes that cannot be decoded; the reply would come out incomplete.
    Malformed(String),
    Done,
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

fn parse_data_payload(payload: &str) -> Option<SseEvent> {
    if payload == "[DONE]" {
        return Some(SseEvent::Done);
    }

    match serde_json::from_str::<ChatResponse>(payload) {
        Ok(response) => {
            let choice = response.choices.into_iter().next()?;
            if let Some(reason) = &choice.finish_reason {
                debug!(reason = %reason, "stream choice finished");
            }
            choice
                .delta
                .content
                .filter(|content| !content.is_empty())
                .map(SseEvent::Fragment)
        }
        Err(_) if payload.trim().is_empty() => None,
        Err(_) => match serde_json::from_str::<serde_json::Value>(payload) {
            Ok(value) if value.get("error").is_some() => {
                Some(SseEvent::Error(summarize_error_body(payload)))
            }
            Ok(_) => {
                debug!("skipping unrecognised stream payload: {payload}");
                None
            }
            Err(_) => Some(SseEvent::Malformed(summarize_error_body(payload))),
        },
    }
}

/// Parse a single server-sent-event line. Comments, `event:` lines and
/// keep-alives produce nothing.
pub(crate) fn parse_sse_line(line: &str) -> Option<SseEvent> {
    extract_data_payload(line).and_then(parse_data_payload)
}

/// Splits an arbitrary byte stream into SSE lines and parses each one.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
    finished: bool,
}

impl SseDecoder {
    pub(crate) fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        if self.finished {
            return Vec::new();
        }
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            if self.push_line(&line, &mut events) {
                break;
            }
        }
        events
    }

    /// Flush a trailing line that arrived without a newline.
    pub(crate) fn finish(&mut self) -> Vec<SseEvent> {
        let mut events = Vec::new();
        if !self.finished && !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.push_line(&line, &mut events);
        }
        self.finished = true;
        events
    }

    fn push_line(&mut self, raw: &[u8], events: &mut Vec<SseEvent>) -> bool {
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim(),
            Err(err) => {
                warn!("invalid UTF-8 in stream: {err}");
                self.finished = true;
                self.buffer.clear();
                events.push(SseEvent::Malformed(format!("invalid UTF-8 in stream: {err}")));
                return true;
            }
        };

        let Some(event) = parse_sse_line(line) else {
            return false;
        };
        let terminal = matches!(
            event,
            SseEvent::Done | SseEvent::Error(_) | SseEvent::Malformed(_)
        );
        events.push(event);
        if terminal {
            self.finished = true;
            self.buffer.clear();
        }
        terminal
    }
}

struct SseState {
    body: BoxStream<'static, Result<Vec<u8>, ChatError>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, ChatError>>,
    done: bool,
}

impl SseState {
    fn absorb(&mut self, events: Vec<SseEvent>) {
        for event in events {
            match event {
                SseEvent::Fragment(text) => self.pending.push_back(Ok(text)),
                SseEvent::Error(message) => {
                    self.pending.push_back(Err(ChatError::Stream(message)));
                    self.done = true;
                }
                SseEvent::Malformed(detail) => {
                    self.pending.push_back(Err(ChatError::Decode(detail)));
                    self.done = true;
                }
                SseEvent::Done => self.done = true,
            }
        }
    }
}

/// Wrap a response body in a lazy fragment stream. Nothing is read from
/// `body` until the returned stream is polled.
pub(crate) fn fragment_stream<S>(body: S) -> FragmentStream
where
    S: Stream<Item = Result<Vec<u8>, ChatError>> + Send + 'static,
{
    let state = SseState {
        body: body.boxed(),
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        done: false,
    };

    FragmentStream::new(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.done {
                return None;
            }
            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.feed(&chunk);
                    state.absorb(events);
                }
                Some(Err(err)) => {
                    state.pending.push_back(Err(err));
                    state.done = true;
                }
                None => {
                    let events = state.decoder.finish();
                    state.absorb(events);
                    state.done = true;
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str) -> String {
        format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":{}}}}}]}}\n",
            serde_json::to_string(content).unwrap()
        )
    }

    #[test]
    fn parse_handles_spacing_variants() {
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#),
            Some(SseEvent::Fragment("Hello".into()))
        );
        assert_eq!(
            parse_sse_line(r#"data:{"choices":[{"delta":{"content":"World"}}]}"#),
            Some(SseEvent::Fragment("World".into()))
        );
        assert_eq!(parse_sse_line("data: [DONE]"), Some(SseEvent::Done));
        assert_eq!(parse_sse_line("data:[DONE]"), Some(SseEvent::Done));
    }

    #[test]
    fn parse_skips_non_content_lines() {
        assert_eq!(parse_sse_line(""), None);
        assert_eq!(parse_sse_line(": keep-alive"), None);
        assert_eq!(parse_sse_line("event: message"), None);
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
            None
        );
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}],"x_groq":{"id":"req"}}"#),
            None
        );
        assert_eq!(parse_sse_line(r#"data: {"choices":[]}"#), None);
    }

    #[test]
    fn parse_routes_error_payloads() {
        assert_eq!(
            parse_sse_line(r#"data: {"error":{"message":"internal server error"}}"#),
            Some(SseEvent::Error("internal server error".into()))
        );
    }

    #[test]
    fn parse_tolerates_chunks_without_delta() {
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"index":0,"finish_reason":"stop"}]}"#),
            None
        );
        assert_eq!(
            parse_sse_line(r#"data: {"id":"req_1","object":"chat.completion.chunk","usage":{}}"#),
            None
        );
    }

    #[test]
    fn parse_reports_non_json_payloads() {
        assert!(matches!(
            parse_sse_line("data: {not json"),
            Some(SseEvent::Malformed(_))
        ));
    }

    #[test]
    fn decoder_ends_on_invalid_utf8() {
        let mut decoder = SseDecoder::default();
        let mut body = chunk("Hi").into_bytes();
        body.extend_from_slice(b"data: {\"choices\":[{\"delta\":{\"content\":\" th\xffere\"}}]}\n");
        body.extend_from_slice(chunk("!").as_bytes());

        let events = decoder.feed(&body);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], SseEvent::Fragment("Hi".into()));
        assert!(matches!(&events[1], SseEvent::Malformed(detail) if detail.contains("UTF-8")));
        assert!(decoder.feed(chunk("later").as_bytes()).is_empty());
    }

    #[test]
    fn decoder_reassembles_lines_split_across_chunks() {
        let mut decoder = SseDecoder::default();
        let line = chunk("Hi there");
        let (head, tail) = line.as_bytes().split_at(17);

        assert!(decoder.feed(head).is_empty());
        assert_eq!(
            decoder.feed(tail),
            vec![SseEvent::Fragment("Hi there".into())]
        );
    }

    #[test]
    fn decoder_keeps_multibyte_characters_intact() {
        let mut decoder = SseDecoder::default();
        let line = chunk("héllo ✓");
        let bytes = line.as_bytes();
        let split = line.find('é').unwrap() + 1;

        let mut events = decoder.feed(&bytes[..split]);
        events.extend(decoder.feed(&bytes[split..]));
        assert_eq!(events, vec![SseEvent::Fragment("héllo ✓".into())]);
    }

    #[test]
    fn decoder_stops_after_done() {
        let mut decoder = SseDecoder::default();
        let body = format!("{}data: [DONE]\n{}", chunk("a"), chunk("ignored"));
        assert_eq!(
            decoder.feed(body.as_bytes()),
            vec![SseEvent::Fragment("a".into()), SseEvent::Done]
        );
        assert!(decoder.feed(chunk("later").as_bytes()).is_empty());
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn decoder_flushes_trailing_line_on_finish() {
        let mut decoder = SseDecoder::default();
        let line = chunk("tail");
        assert!(decoder.feed(line.trim_end().as_bytes()).is_empty());
        assert_eq!(decoder.finish(), vec![SseEvent::Fragment("tail".into())]);
    }

    #[tokio::test]
    async fn fragment_stream_yields_deltas_in_order() {
        let body = format!(
            "{}{}{}data: [DONE]\n",
            chunk("Hi"),
            chunk(" there"),
            chunk("!")
        );
        let (first, second) = body.as_bytes().split_at(30);
        let chunks = vec![Ok(first.to_vec()), Ok(second.to_vec())];

        let fragments: Vec<String> = fragment_stream(stream::iter(chunks))
            .map(|item| item.expect("fragment"))
            .collect()
            .await;
        assert_eq!(fragments, ["Hi", " there", "!"]);
    }

    #[tokio::test]
    async fn fragment_stream_ends_with_error_item() {
        let body = format!(
            "{}data: {{\"error\":{{\"message\":\"overloaded\"}}}}\n{}",
            chunk("partial"),
            chunk("never")
        );
        let mut stream = fragment_stream(stream::iter(vec![Ok(body.into_bytes())]));

        assert_eq!(stream.next().await.unwrap().unwrap(), "partial");
        match stream.next().await {
            Some(Err(ChatError::Stream(message))) => assert_eq!(message, "overloaded"),
            other => panic!("expected stream error, got {:?}", other.map(|r| r.is_ok())),
        }
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn finish_only_chunk_does_not_fail_the_reply() {
        let body = format!(
            "{}data: {{\"choices\":[{{\"index\":0,\"finish_reason\":\"stop\"}}]}}\ndata: [DONE]\n",
            chunk("Hi there")
        );
        let items: Vec<Result<String, ChatError>> =
            fragment_stream(stream::iter(vec![Ok(body.into_bytes())]))
                .collect()
                .await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_deref().expect("fragment"), "Hi there");
    }

    #[tokio::test]
    async fn invalid_utf8_surfaces_as_decode_error() {
        let mut body = chunk("Hi").into_bytes();
        body.extend_from_slice(b"data: {\"choices\":[{\"delta\":{\"content\":\" th\xffere\"}}]}\n");
        body.extend_from_slice(chunk("!").as_bytes());
        body.extend_from_slice(b"data: [DONE]\n");
        let mut stream = fragment_stream(stream::iter(vec![Ok(body)]));

        assert_eq!(stream.next().await.unwrap().unwrap(), "Hi");
        assert!(matches!(
            stream.next().await,
            Some(Err(ChatError::Decode(_)))
        ));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn fragment_stream_propagates_body_errors() {
        let chunks = vec![
            Ok(chunk("a").into_bytes()),
            Err(ChatError::Decode("connection reset".into())),
        ];
        let mut stream = fragment_stream(stream::iter(chunks));

        assert_eq!(stream.next().await.unwrap().unwrap(), "a");
        assert!(matches!(
            stream.next().await,
            Some(Err(ChatError::Decode(_)))
        ));
        assert!(stream.next().await.is_none());
    }
}
