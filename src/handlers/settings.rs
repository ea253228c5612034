use anyhow::Result;
use tracing::info;

use super::App;
use crate::ai::types::{self, MAX_SCALE, MAX_STEPS, MAX_STRENGTH, MIN_SCALE, MIN_STEPS};
use crate::model::EngineType;
use crate::state::EngineSettings;

/// Requested settings changes. `None` leaves a setting as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsChange {
    pub engine: Option<EngineType>,
    pub resolution: Option<String>,
    pub steps: Option<u32>,
    pub scale: Option<f64>,
    /// `Some(None)` switches img2img off.
    pub strength: Option<Option<f64>>,
    pub deep_thinking: Option<bool>,
}

pub fn show_settings(settings: &EngineSettings) -> String {
    let strength = settings
        .strength
        .map(|s| format!("{s:.2}"))
        .unwrap_or_else(|| "off".to_string());
    format!(
        "Engine: {}\nResolution: {}\nSteps: {}\nScale: {}\nImg2img strength: {}\nDeep thinking: {}",
        settings.engine.display_name(),
        settings.resolution,
        settings.steps,
        settings.scale,
        strength,
        if settings.deep_thinking { "on" } else { "off" },
    )
}

/// Validate and apply `change`. Nothing is applied when any value is out
/// of range.
pub fn update_settings(app: &mut App, change: SettingsChange) -> Result<String> {
    let mut next = app.state.settings.clone();
    if let Some(engine) = change.engine {
        next.engine = engine;
    }
    if let Some(resolution) = change.resolution {
        types::parse_resolution(&resolution)?;
        next.resolution = resolution.trim().to_string();
    }
    if let Some(steps) = change.steps {
        anyhow::ensure!(
            (MIN_STEPS..=MAX_STEPS).contains(&steps),
            "steps must be between {MIN_STEPS} and {MAX_STEPS}"
        );
        next.steps = steps;
    }
    if let Some(scale) = change.scale {
        anyhow::ensure!(
            (MIN_SCALE..=MAX_SCALE).contains(&scale),
            "scale must be between {MIN_SCALE} and {MAX_SCALE}"
        );
        next.scale = scale;
    }
    if let Some(strength) = change.strength {
        if let Some(s) = strength {
            anyhow::ensure!(
                (0.0..=MAX_STRENGTH).contains(&s),
                "strength must be between 0 and {MAX_STRENGTH}"
            );
        }
        next.strength = strength;
    }
    if let Some(deep_thinking) = change.deep_thinking {
        next.deep_thinking = deep_thinking;
    }
    app.state.settings = next;
    info!(engine = %app.state.settings.engine, "Settings updated");
    Ok(show_settings(&app.state.settings))
}
