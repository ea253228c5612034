use anyhow::{anyhow, bail, Result};
use futures_util::StreamExt;
use tracing::{debug, info, instrument, trace, warn};

use crate::ai::common::BackendClient;
use crate::ai::types::GenerateRequest;
use crate::model::GenerationResult;
use crate::sse::{SseDecoder, StreamEvent};

impl BackendClient {
    /// Generate an image in one request.
    #[instrument(level = "trace", skip(self, request), fields(engine = %request.engine))]
    pub async fn generate_image(&self, request: &GenerateRequest) -> Result<GenerationResult> {
        request.validate()?;
        let result: GenerationResult = self
            .post_json("generate", request, self.config().generate_timeout)
            .await?;
        info!(bytes = result.image_data.len(), "Image generated");
        Ok(result)
    }

    /// Generate an image over the event stream, reporting every decoded
    /// event to `on_event` as it arrives.
    ///
    /// Fails on an `error` event or when the stream ends without a result.
    #[instrument(level = "trace", skip(self, request, on_event), fields(engine = %request.engine))]
    pub async fn generate_image_stream<F>(
        &self,
        request: &GenerateRequest,
        mut on_event: F,
    ) -> Result<GenerationResult>
    where
        F: FnMut(&StreamEvent),
    {
        request.validate()?;
        let resp = self
            .with_retry("generate/stream", move || {
                self.send("generate/stream", request, self.config().stream_timeout)
            })
            .await?;

        let mut decoder = SseDecoder::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            trace!(len = chunk.len(), "stream chunk");
            for event in decoder.feed(&chunk) {
                if let Some(result) = handle_event(event, &mut on_event)? {
                    return Ok(result);
                }
            }
        }
        for event in decoder.finish() {
            if let Some(result) = handle_event(event, &mut on_event)? {
                return Ok(result);
            }
        }
        warn!("Stream ended without a result");
        bail!("generation stream ended without a result")
    }
}

fn handle_event<F>(event: StreamEvent, on_event: &mut F) -> Result<Option<GenerationResult>>
where
    F: FnMut(&StreamEvent),
{
    on_event(&event);
    match event {
        StreamEvent::Result(result) => {
            info!(bytes = result.image_data.len(), "Streamed image generated");
            Ok(Some(result))
        }
        StreamEvent::Error(message) => {
            warn!(message, "Generation stream reported an error");
            Err(anyhow!("generation failed: {message}"))
        }
        StreamEvent::Log(_) | StreamEvent::Sketch(_) => {
            debug!("stream progress");
            Ok(None)
        }
    }
}
