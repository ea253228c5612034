//! Request and response bodies exchanged with the backend.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::merge::RemoteModule;
use crate::model::EngineType;
use crate::state::EngineSettings;

pub const MIN_STEPS: u32 = 1;
pub const MAX_STEPS: u32 = 50;
pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 20.0;
pub const MAX_STRENGTH: f64 = 0.99;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub image_data: String,
    pub gemini_api_key: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub modules: Vec<RemoteModule>,
    #[serde(default)]
    pub raw_prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub prompt: String,
    pub engine: EngineType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub novelai_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_credentials: Option<String>,
    pub resolution: String,
    pub steps: u32,
    pub scale: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deep_thinking: Option<bool>,
}

impl GenerateRequest {
    /// Build a request for `settings`, attaching `credential` to the field
    /// its engine expects. The source image is only sent when a strength is
    /// set (img2img).
    pub fn new(
        prompt: String,
        settings: &EngineSettings,
        credential: String,
        source_image: Option<String>,
    ) -> Self {
        let (novelai_api_key, google_credentials) = match settings.engine {
            EngineType::NovelAi => (Some(credential), None),
            EngineType::GoogleImagen => (None, Some(credential)),
        };
        let (image, strength) = match (source_image, settings.strength) {
            (Some(image), Some(strength)) => (Some(image), Some(strength)),
            _ => (None, None),
        };
        Self {
            prompt,
            engine: settings.engine,
            novelai_api_key,
            google_credentials,
            resolution: settings.resolution.clone(),
            steps: settings.steps,
            scale: settings.scale,
            image,
            strength,
            deep_thinking: settings.deep_thinking.then_some(true),
        }
    }

    /// Reject requests the backend would refuse anyway.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            bail!("prompt is empty");
        }
        parse_resolution(&self.resolution)?;
        if !(MIN_STEPS..=MAX_STEPS).contains(&self.steps) {
            bail!("steps must be between {MIN_STEPS} and {MAX_STEPS}, got {}", self.steps);
        }
        if !(MIN_SCALE..=MAX_SCALE).contains(&self.scale) {
            bail!("scale must be between {MIN_SCALE} and {MAX_SCALE}, got {}", self.scale);
        }
        if let Some(strength) = self.strength {
            if !(0.0..=MAX_STRENGTH).contains(&strength) {
                bail!("strength must be between 0 and {MAX_STRENGTH}, got {strength}");
            }
            if self.image.is_none() {
                bail!("strength given without a source image");
            }
        }
        let credential = match self.engine {
            EngineType::NovelAi => &self.novelai_api_key,
            EngineType::GoogleImagen => &self.google_credentials,
        };
        if credential.as_deref().map_or(true, |c| c.trim().is_empty()) {
            bail!("missing credential for {}", self.engine.display_name());
        }
        Ok(())
    }
}

/// Parse `WxH` into positive dimensions.
pub fn parse_resolution(raw: &str) -> Result<(u32, u32)> {
    let Some((w, h)) = raw.trim().split_once(['x', 'X']) else {
        bail!("resolution must look like 832x1216, got {raw:?}");
    };
    match (w.trim().parse::<u32>(), h.trim().parse::<u32>()) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => bail!("resolution must look like 832x1216, got {raw:?}"),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineRequest {
    pub modules: Vec<RemoteModule>,
    pub instruction: String,
    pub gemini_api_key: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RefineResponse {
    #[serde(default)]
    pub modules: Vec<RemoteModule>,
}
