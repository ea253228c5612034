use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::Engine as _;
use tracing::{debug, info};

use super::{modules::format_modules, App};
use crate::db::CredentialKind;
use crate::messages;

/// Read an image file as base64 without a data-URL prefix.
pub fn encode_image_file(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read image {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Encoding source image");
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Analyze `image` (or the image loaded earlier) and replace all modules
/// with the result.
pub async fn analyze_image(app: &mut App, image: Option<&Path>) -> Result<String> {
    let image_data = match image {
        Some(path) => encode_image_file(path)?,
        None => match &app.state.source_image {
            Some(data) => data.clone(),
            None => bail!(messages::NO_SOURCE_IMAGE),
        },
    };
    let Some(key) = app.db.get_credential(CredentialKind::Gemini).await? else {
        bail!(messages::MISSING_GEMINI_KEY);
    };

    let resp = app.client.analyze_image(&image_data, &key).await?;
    app.state.source_image = Some(image_data);
    app.state.apply_analysis(&resp.modules, resp.raw_prompt);
    info!(tags = app.state.modules.tag_count(), "Analysis stored");
    Ok(format_modules(&app.state))
}
