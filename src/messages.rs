//! Shared text shown to the user.
//!
//! Keep all user-facing strings in this module so they stay in one place and are
//! easy to update or translate.

use crate::model::EngineType;

pub const NO_SOURCE_IMAGE: &str = "Load a reference image first: voidweaver analyze <IMAGE>.";
pub const MISSING_GEMINI_KEY: &str =
    "A Gemini API key is required. Save one with: voidweaver keys set gemini <KEY>.";
pub const NO_TAGS: &str = "There are no tags to generate from. Analyze an image or add tags first.";
pub const EMPTY_INSTRUCTION: &str = "Tell me how to refine the modules.";

pub const HISTORY_EMPTY: &str = "No images generated yet.";
pub const HISTORY_INDEX_OUT_OF_RANGE: &str = "There is no image at that position.";
pub const NO_SUCH_TAG: &str = "There is no tag at that line.";
pub const NO_CREDENTIALS: &str = "No credentials saved.";
pub const EMPTY_CREDENTIAL_IGNORED: &str = "Empty value ignored; the saved credential is unchanged.";

pub fn missing_engine_credential(engine: EngineType) -> String {
    match engine {
        EngineType::NovelAi => format!(
            "{} needs an API key. Save one with: voidweaver keys set novelai <KEY>.",
            engine.display_name()
        ),
        EngineType::GoogleImagen => format!(
            "{} needs service account credentials. Save them with: voidweaver keys set google <JSON>.",
            engine.display_name()
        ),
    }
}

pub fn module_locked(display_name: &str, locked: bool) -> String {
    if locked {
        format!("🔒 {display_name} is locked and will survive refinement.")
    } else {
        format!("🔓 {display_name} is unlocked.")
    }
}

pub fn module_is_locked(display_name: &str) -> String {
    format!("🔒 {display_name} is locked. Unlock it with: voidweaver lock <MODULE>.")
}

pub fn weight_changed(text: &str, weight: f64) -> String {
    format!("{text} is now weighted {weight:.1}.")
}
