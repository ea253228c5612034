use anyhow::{bail, Result};
use tracing::info;

use super::{line_index, App};
use crate::codec::{self, Dialect};
use crate::messages;
use crate::model::{ModuleName, Tag, TagId, WEIGHT_STEP};
use crate::prompt;
use crate::state::AppState;
use crate::store::TagUpdate;

/// Render every module with numbered editor lines.
pub fn format_modules(state: &AppState) -> String {
    let mut out = String::new();
    for module in state.modules.modules() {
        let lock = if module.locked { "🔒" } else { "  " };
        out.push_str(&format!(
            "{lock} {} ({})\n",
            module.display_name,
            module.name.as_str()
        ));
        for (i, tag) in module.visible_tags().enumerate() {
            out.push_str(&format!("   {}. {}\n", i + 1, codec::format_tag(tag)));
        }
        let hidden = module.tags.iter().filter(|t| t.hidden).count();
        if hidden > 0 {
            out.push_str(&format!("   ({hidden} hidden)\n"));
        }
    }
    out
}

/// The prompt for the configured engine, or the unweighted copy form.
pub fn show_prompt(state: &AppState, raw: bool) -> String {
    if raw {
        prompt::raw_prompt(state.modules.modules())
    } else {
        state.assembled_prompt()
    }
}

/// Replace a module's tags with edited text. Tags keep their ids when
/// their text is unchanged.
pub fn edit_module(app: &mut App, name: ModuleName, text: &str) -> Result<String> {
    ensure_unlocked(app, name)?;
    app.state.modules.set_tags_from_text(name, text, app.dialect);
    info!(module = %name, "Module edited");
    Ok(app.state.modules.editor_text(name, app.dialect))
}

pub fn toggle_lock(app: &mut App, name: ModuleName) -> String {
    let locked = app.state.modules.toggle_lock(name);
    messages::module_locked(&app.state.modules.module(name).display_name, locked)
}

/// Raise (`up`) or lower the weight of the tag on 1-based `line`.
pub fn adjust_weight(app: &mut App, name: ModuleName, line: usize, up: bool) -> Result<String> {
    ensure_unlocked(app, name)?;
    let delta = if up { WEIGHT_STEP } else { -WEIGHT_STEP };
    let Some(weight) = line_index(line)
        .and_then(|index| app.state.modules.adjust_weight_at_line(name, index, delta))
    else {
        bail!(messages::NO_SUCH_TAG);
    };
    let text = visible_tag(app, name, line)
        .map(|t| t.text.clone())
        .unwrap_or_default();
    Ok(messages::weight_changed(&text, weight))
}

/// Append a tag written in the editor syntax, e.g. `1.5::red eyes::`.
pub fn add_tag(app: &mut App, name: ModuleName, text: &str) -> Result<String> {
    ensure_unlocked(app, name)?;
    let parsed = codec::parse(text, Dialect::Line, &[]);
    let [tag] = parsed.as_slice() else {
        bail!("expected exactly one tag, got {}", parsed.len());
    };
    app.state
        .modules
        .add_tag(name, Tag::new(tag.text.clone(), tag.weight));
    Ok(app.state.modules.editor_text(name, app.dialect))
}

pub fn remove_tag(app: &mut App, name: ModuleName, line: usize) -> Result<String> {
    ensure_unlocked(app, name)?;
    let id = tag_id_at(app, name, line)?;
    app.state.modules.remove_tag(name, &id);
    Ok(app.state.modules.editor_text(name, app.dialect))
}

/// Hide the tag on `line` from the editor, or bring every hidden tag back
/// when `line` is `None`. Hidden tags still take part in prompt assembly.
pub fn hide_tag(app: &mut App, name: ModuleName, line: Option<usize>) -> Result<String> {
    ensure_unlocked(app, name)?;
    match line {
        Some(line) => {
            let id = tag_id_at(app, name, line)?;
            app.state.modules.update_tag(
                name,
                &id,
                TagUpdate {
                    hidden: Some(true),
                    ..TagUpdate::default()
                },
            );
        }
        None => {
            let hidden: Vec<TagId> = app
                .state
                .modules
                .module(name)
                .tags
                .iter()
                .filter(|t| t.hidden)
                .map(|t| t.id.clone())
                .collect();
            for id in hidden {
                app.state.modules.update_tag(
                    name,
                    &id,
                    TagUpdate {
                        hidden: Some(false),
                        ..TagUpdate::default()
                    },
                );
            }
        }
    }
    Ok(app.state.modules.editor_text(name, app.dialect))
}

/// Locked modules are read-only until unlocked.
fn ensure_unlocked(app: &App, name: ModuleName) -> Result<()> {
    let module = app.state.modules.module(name);
    if module.locked {
        bail!(messages::module_is_locked(&module.display_name));
    }
    Ok(())
}

fn visible_tag(app: &App, name: ModuleName, line: usize) -> Option<&Tag> {
    let index = line_index(line)?;
    app.state.modules.module(name).visible_tags().nth(index)
}

fn tag_id_at(app: &App, name: ModuleName, line: usize) -> Result<TagId> {
    match visible_tag(app, name, line) {
        Some(tag) => Ok(tag.id.clone()),
        None => bail!(messages::NO_SUCH_TAG),
    }
}
