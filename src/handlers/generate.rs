use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use base64::Engine as _;
use tracing::{debug, info};

use super::{now_millis, App};
use crate::ai::GenerateRequest;
use crate::db::CredentialKind;
use crate::messages;
use crate::sse::{StreamEvent, StreamProgress};

/// Decode base64 image data and write it to `path`.
pub fn save_image_data(image_data: &str, path: &Path) -> Result<()> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(image_data.trim())
        .context("generated image is not valid base64")?;
    std::fs::write(path, &bytes)
        .with_context(|| format!("failed to write image {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Saved image");
    Ok(())
}

/// Generate an image from the assembled prompt and push it into the image
/// history.
///
/// Deep thinking always goes through the event stream; `stream` forces it
/// otherwise. Streamed events are passed to `on_event` as they arrive.
pub async fn generate_image<F>(
    app: &mut App,
    stream: bool,
    out: Option<&Path>,
    mut on_event: F,
) -> Result<String>
where
    F: FnMut(&StreamEvent),
{
    if !app.state.modules.has_tags() {
        bail!(messages::NO_TAGS);
    }
    let engine = app.state.settings.engine;
    let kind = CredentialKind::for_engine(engine);
    let Some(credential) = app.db.get_credential(kind).await? else {
        return Err(anyhow!(messages::missing_engine_credential(engine)));
    };

    let prompt = app.state.assembled_prompt();
    let request = GenerateRequest::new(
        prompt.clone(),
        &app.state.settings,
        credential,
        app.state.source_image.clone(),
    );

    let mut progress = StreamProgress::default();
    let result = if stream || app.state.settings.deep_thinking {
        app.client
            .generate_image_stream(&request, |event| {
                progress.apply(event);
                on_event(event);
            })
            .await?
    } else {
        app.client.generate_image(&request).await?
    };

    app.state
        .record_generation(result, progress, prompt, now_millis());
    let position = app.state.images.len();
    info!(position, engine = %engine, "Generation stored");

    if let (Some(path), Some(image)) = (out, app.state.images.current()) {
        save_image_data(&image.image_data, path)?;
        return Ok(format!(
            "Image {position} generated with {} and saved to {}.",
            engine.display_name(),
            path.display()
        ));
    }
    Ok(format!(
        "Image {position} generated with {}.",
        engine.display_name()
    ))
}
