//! Explicit application state handed to every operation.
//!
//! Each collaborator result is applied here in one step, and only on
//! success: a failed call leaves the state exactly as it was.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::history::HistoryRing;
use crate::merge::RemoteModule;
use crate::model::{EngineType, GeneratedImage, GenerationResult};
use crate::prompt;
use crate::sse::StreamProgress;
use crate::store::ModuleStore;

/// Generation parameters chosen by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    pub engine: EngineType,
    pub resolution: String,
    pub steps: u32,
    pub scale: f64,
    /// Img2img strength; `None` generates from text only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
    #[serde(default)]
    pub deep_thinking: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            engine: EngineType::NovelAi,
            resolution: "832x1216".to_string(),
            steps: 28,
            scale: 6.0,
            strength: None,
            deep_thinking: false,
        }
    }
}

/// Everything the editor works on. Credentials live in the database and are
/// never part of this struct.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub settings: EngineSettings,
    pub modules: ModuleStore,
    pub raw_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
    pub images: HistoryRing<GeneratedImage>,
    pub refinements: HistoryRing<String>,
    pub thinking: StreamProgress,
}

impl AppState {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Prompt for the configured engine.
    pub fn assembled_prompt(&self) -> String {
        prompt::assemble(self.modules.modules(), self.settings.engine)
    }

    /// Store an analysis result verbatim.
    pub fn apply_analysis(&mut self, modules: &[RemoteModule], raw_prompt: String) {
        self.modules.set_remote_modules(modules);
        self.raw_prompt = raw_prompt;
        info!(tags = self.modules.tag_count(), "Applied analysis");
    }

    /// Merge a refinement result and remember the instruction.
    pub fn apply_refinement(&mut self, instruction: &str, modules: &[RemoteModule]) {
        self.modules.apply_refinement(modules);
        self.refinements.push(instruction.to_string());
        info!(instruction, "Applied refinement");
    }

    /// Record a finished generation and display it.
    ///
    /// `progress` is whatever a streamed call saw before its result; pass
    /// the default for plain calls.
    pub fn record_generation(
        &mut self,
        result: GenerationResult,
        progress: StreamProgress,
        prompt: String,
        timestamp: i64,
    ) {
        let result = progress.finalize(result);
        self.thinking = StreamProgress {
            log: result.thinking_log.clone().unwrap_or_default(),
            sketch: result.sketch_image.clone(),
        };
        self.images.push(result.into_image(Some(prompt), timestamp));
        debug!(history = self.images.len(), "Recorded generated image");
    }

    /// Load a saved session, or start fresh when the file does not exist.
    pub fn load(path: &Path, settings: EngineSettings) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No session file, starting fresh");
            return Ok(Self::new(settings));
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read session {}", path.display()))?;
        let state: AppState = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse session {}", path.display()))?;
        debug!(path = %path.display(), "Loaded session");
        Ok(state)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write session {}", path.display()))?;
        debug!(path = %path.display(), "Saved session");
        Ok(())
    }
}
