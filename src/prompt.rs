//! Flattening of the module list into the prompt sent to a generation engine.

use std::borrow::Borrow;

use tracing::debug;

use crate::codec::format_tag;
use crate::model::{EngineType, Module};

/// Build the weighted prompt for `engine`.
///
/// Tags are emitted in module order, then tag order within a module. Every
/// engine currently shares the `W::text::` rendering; hidden tags are
/// included. Returns an empty string when there are no tags at all.
pub fn assemble<M: Borrow<Module>>(modules: &[M], engine: EngineType) -> String {
    let parts: Vec<String> = modules
        .iter()
        .flat_map(|m| Borrow::<Module>::borrow(m).tags.iter())
        .map(format_tag)
        .collect();
    debug!(%engine, tags = parts.len(), "Assembled prompt");
    parts.join(", ")
}

/// Plain comma-joined tag texts without weights, for copying.
pub fn raw_prompt<M: Borrow<Module>>(modules: &[M]) -> String {
    modules
        .iter()
        .flat_map(|m| Borrow::<Module>::borrow(m).tags.iter())
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModuleName, Tag};
    use std::sync::Arc;

    #[test]
    fn assemble_keeps_module_then_tag_order() {
        let modules = vec![
            Arc::new(Module::with_tags(
                ModuleName::Style,
                vec![Tag::plain("anime"), Tag::new("watercolor", 1.5)],
            )),
            Arc::new(Module::with_tags(ModuleName::Subject, vec![Tag::plain("girl")])),
        ];
        assert_eq!(
            assemble(&modules, EngineType::NovelAi),
            "anime, 1.5::watercolor::, girl"
        );
        assert_eq!(raw_prompt(&modules), "anime, watercolor, girl");
    }

    #[test]
    fn engines_render_identically() {
        let modules = vec![Arc::new(Module::with_tags(
            ModuleName::Pose,
            vec![Tag::new("sitting", 0.5)],
        ))];
        assert_eq!(
            assemble(&modules, EngineType::NovelAi),
            assemble(&modules, EngineType::GoogleImagen)
        );
    }
}
