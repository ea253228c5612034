use anyhow::{bail, Result};
use tracing::info;

use super::{modules::format_modules, App};
use crate::db::CredentialKind;
use crate::merge::RemoteModule;
use crate::messages;

/// Send the current modules and `instruction` for refinement and merge the
/// answer. Locked modules stay as they are.
pub async fn refine_modules(app: &mut App, instruction: &str) -> Result<String> {
    let instruction = instruction.trim();
    if instruction.is_empty() {
        bail!(messages::EMPTY_INSTRUCTION);
    }
    let Some(key) = app.db.get_credential(CredentialKind::Gemini).await? else {
        bail!(messages::MISSING_GEMINI_KEY);
    };

    let current: Vec<RemoteModule> = app
        .state
        .modules
        .modules()
        .iter()
        .map(|m| RemoteModule::from(&**m))
        .collect();
    let resp = app.client.refine_modules(current, instruction, &key).await?;
    app.state.apply_refinement(instruction, &resp.modules);
    info!(instruction, "Refinement stored");
    Ok(format_modules(&app.state))
}
