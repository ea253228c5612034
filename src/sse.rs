//! Demultiplexer for the streamed generation protocol.
//!
//! The stream is a text event stream of `event:`/`data:` line pairs with the
//! event types `log`, `sketch`, `result` and `error`. Network reads may split
//! a line (or a UTF-8 sequence) anywhere, so bytes are buffered until a full
//! line is available.

use tracing::{debug, trace, warn};

use crate::model::GenerationResult;

/// A decoded stream event.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// One line of the thinking log.
    Log(String),
    /// An intermediate sketch image.
    Sketch(String),
    /// The terminal result.
    Result(GenerationResult),
    /// The responder reported a failure.
    Error(String),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Result(_) | StreamEvent::Error(_))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
enum State {
    #[default]
    AwaitingEvent,
    AwaitingData {
        event: String,
    },
    Collecting {
        event: String,
        data: Vec<String>,
    },
}

/// Incremental decoder: feed raw chunks, collect complete events.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    state: State,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk and return every event it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            self.handle_line(line.trim_end_matches('\r'), &mut events);
        }
        events
    }

    /// Flush a trailing unterminated line and any pending event.
    pub fn finish(mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest);
            self.handle_line(line.trim_end_matches('\r'), &mut events);
        }
        self.dispatch(&mut events);
        events
    }

    fn handle_line(&mut self, line: &str, events: &mut Vec<StreamEvent>) {
        if line.is_empty() {
            self.dispatch(events);
            return;
        }
        if line.starts_with(':') {
            trace!("Skipping stream comment");
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => {
                self.dispatch(events);
                self.state = State::AwaitingData {
                    event: value.trim().to_string(),
                };
            }
            "data" => {
                self.state = match std::mem::take(&mut self.state) {
                    State::AwaitingEvent => State::Collecting {
                        event: "message".to_string(),
                        data: vec![value.to_string()],
                    },
                    State::AwaitingData { event } => State::Collecting {
                        event,
                        data: vec![value.to_string()],
                    },
                    State::Collecting { event, mut data } => {
                        data.push(value.to_string());
                        State::Collecting { event, data }
                    }
                };
            }
            other => trace!(field = other, "Ignoring stream field"),
        }
    }

    fn dispatch(&mut self, events: &mut Vec<StreamEvent>) {
        let State::Collecting { event, data } = std::mem::take(&mut self.state) else {
            return;
        };
        let data = data.join("\n");
        match event.as_str() {
            "log" => events.push(StreamEvent::Log(data)),
            "sketch" => events.push(StreamEvent::Sketch(data)),
            "result" => match serde_json::from_str::<GenerationResult>(&data) {
                Ok(result) => {
                    debug!("Received generation result");
                    events.push(StreamEvent::Result(result));
                }
                Err(err) => {
                    warn!(error = %err, "Malformed result payload");
                    events.push(StreamEvent::Error(format!("malformed result payload: {err}")));
                }
            },
            "error" => events.push(StreamEvent::Error(data)),
            other => trace!(event = other, "Ignoring unknown stream event"),
        }
    }
}

/// Partial deep-thinking state built from `log` and `sketch` events.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamProgress {
    pub log: Vec<String>,
    pub sketch: Option<String>,
}

impl StreamProgress {
    /// Record a non-terminal event. Terminal events are ignored here.
    pub fn apply(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::Log(line) => self.log.push(line.clone()),
            StreamEvent::Sketch(image) => self.sketch = Some(image.clone()),
            StreamEvent::Result(_) | StreamEvent::Error(_) => {}
        }
    }

    /// Combine with the terminal result.
    ///
    /// The result's own fields win; a field it leaves out is filled from what
    /// was streamed.
    pub fn finalize(self, mut result: GenerationResult) -> GenerationResult {
        if result.thinking_log.is_none() && !self.log.is_empty() {
            result.thinking_log = Some(self.log);
        }
        if result.sketch_image.is_none() {
            result.sketch_image = self.sketch;
        }
        result
    }
}
