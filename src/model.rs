//! Core prompt data: tags, the eight fixed modules and generated images.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest weight a tag may carry.
pub const MIN_WEIGHT: f64 = 0.5;
/// Highest weight a tag may carry.
pub const MAX_WEIGHT: f64 = 5.0;
/// Weight of an unannotated tag.
pub const DEFAULT_WEIGHT: f64 = 1.0;
/// Increment used by the editor's weight buttons.
pub const WEIGHT_STEP: f64 = 0.5;
/// Weights closer than this to 1.0 are rendered bare.
pub const WEIGHT_EPSILON: f64 = 0.01;

/// Clamp a weight into `[MIN_WEIGHT, MAX_WEIGHT]`.
///
/// Non-finite input is treated as an anomaly and yields [`DEFAULT_WEIGHT`].
pub fn clamp_weight(weight: f64) -> f64 {
    if weight.is_finite() {
        weight.clamp(MIN_WEIGHT, MAX_WEIGHT)
    } else {
        DEFAULT_WEIGHT
    }
}

/// Whether the weight renders as a bare tag.
pub fn is_default_weight(weight: f64) -> bool {
    (weight - DEFAULT_WEIGHT).abs() <= WEIGHT_EPSILON
}

/// Stable identifier of a tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(pub String);

impl TagId {
    pub fn new() -> Self {
        TagId(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for TagId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TagId {
    fn from(id: &str) -> Self {
        TagId(id.to_string())
    }
}

fn default_weight() -> f64 {
    DEFAULT_WEIGHT
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A single weighted prompt fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(default)]
    pub id: TagId,
    pub text: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Hidden tags stay out of the editor text but still reach the prompt.
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
}

impl Tag {
    pub fn new(text: impl Into<String>, weight: f64) -> Self {
        Self::with_id(TagId::new(), text, weight)
    }

    pub fn with_id(id: TagId, text: impl Into<String>, weight: f64) -> Self {
        Self {
            id,
            text: text.into(),
            weight: clamp_weight(weight),
            hidden: false,
        }
    }

    /// Tag at weight 1.0.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, DEFAULT_WEIGHT)
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Shift the weight by `delta`, clamped into range.
    pub fn adjusted(&self, delta: f64) -> Self {
        Self {
            weight: clamp_weight(clamp_weight(self.weight) + delta),
            ..self.clone()
        }
    }
}

/// One of the eight fixed prompt dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleName {
    Style,
    Subject,
    Pose,
    Costume,
    Background,
    Composition,
    Atmosphere,
    Extra,
}

impl ModuleName {
    /// Canonical module order. Prompt emphasis follows this order.
    pub const ALL: [ModuleName; 8] = [
        ModuleName::Style,
        ModuleName::Subject,
        ModuleName::Pose,
        ModuleName::Costume,
        ModuleName::Background,
        ModuleName::Composition,
        ModuleName::Atmosphere,
        ModuleName::Extra,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModuleName::Style => "style",
            ModuleName::Subject => "subject",
            ModuleName::Pose => "pose",
            ModuleName::Costume => "costume",
            ModuleName::Background => "background",
            ModuleName::Composition => "composition",
            ModuleName::Atmosphere => "atmosphere",
            ModuleName::Extra => "extra",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ModuleName::Style => "Style",
            ModuleName::Subject => "Subject",
            ModuleName::Pose => "Pose",
            ModuleName::Costume => "Costume",
            ModuleName::Background => "Background",
            ModuleName::Composition => "Composition",
            ModuleName::Atmosphere => "Atmosphere",
            ModuleName::Extra => "Extra Description",
        }
    }

    /// Position in [`ModuleName::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Resolve a name as sent by an external responder.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace:
    /// `"Style"`, `"STYLE"` and `" style "` all map to [`ModuleName::Style`].
    pub fn normalize(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_lowercase();
        Self::ALL.into_iter().find(|name| name.as_str() == lowered)
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s).ok_or_else(|| anyhow::anyhow!("unknown module: {s}"))
    }
}

/// A prompt dimension and its tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub name: ModuleName,
    pub display_name: String,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Module {
    pub fn empty(name: ModuleName) -> Self {
        Self {
            name,
            display_name: name.display_name().to_string(),
            locked: false,
            tags: Vec::new(),
        }
    }

    pub fn with_tags(name: ModuleName, tags: Vec<Tag>) -> Self {
        Self {
            tags,
            ..Self::empty(name)
        }
    }

    /// Tags shown in the editor, in order.
    pub fn visible_tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags
            .iter()
            .filter(|t| !t.hidden && !t.text.trim().is_empty())
    }
}

/// Image generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EngineType {
    #[default]
    #[serde(rename = "novelai")]
    NovelAi,
    #[serde(rename = "google-imagen")]
    GoogleImagen,
}

impl EngineType {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineType::NovelAi => "novelai",
            EngineType::GoogleImagen => "google-imagen",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            EngineType::NovelAi => "NovelAI V3",
            EngineType::GoogleImagen => "Google Imagen",
        }
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "novelai" => Ok(EngineType::NovelAi),
            "google-imagen" | "google_imagen" | "imagen" => Ok(EngineType::GoogleImagen),
            other => Err(anyhow::anyhow!("unknown engine: {other}")),
        }
    }
}

/// A finished generation. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub image_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_log: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sketch_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub timestamp: i64,
}

/// Final payload of a generation call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub image_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sketch_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_log: Option<Vec<String>>,
}

impl GenerationResult {
    /// Freeze into a history entry.
    pub fn into_image(self, prompt: Option<String>, timestamp: i64) -> GeneratedImage {
        GeneratedImage {
            image_data: self.image_data,
            thinking_log: self.thinking_log,
            sketch_image: self.sketch_image,
            prompt,
            timestamp,
        }
    }
}
