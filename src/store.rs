//! The authoritative list of prompt modules.
//!
//! Modules are held behind `Arc` and replaced whole on every change, so a
//! caller holding an older snapshot can compare entries with
//! [`Arc::ptr_eq`] to see which modules changed.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, trace, warn};

use crate::codec::{self, Dialect};
use crate::merge::{self, RemoteModule};
use crate::model::{clamp_weight, Module, ModuleName, Tag, TagId};

/// Fields to overwrite on a module. `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleUpdate {
    pub display_name: Option<String>,
    pub locked: Option<bool>,
    pub tags: Option<Vec<Tag>>,
}

impl ModuleUpdate {
    pub fn tags(tags: Vec<Tag>) -> Self {
        Self {
            tags: Some(tags),
            ..Self::default()
        }
    }
}

/// Fields to overwrite on a tag. `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagUpdate {
    pub text: Option<String>,
    pub weight: Option<f64>,
    pub hidden: Option<bool>,
}

/// The eight modules, always in canonical order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ModuleStore {
    modules: Vec<Arc<Module>>,
}

impl Default for ModuleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<'de> Deserialize<'de> for ModuleStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let modules = Vec::<Module>::deserialize(deserializer)?
            .into_iter()
            .map(|module| Module {
                tags: merge::sanitize_tags(&module.tags),
                ..module
            })
            .collect();
        let mut store = ModuleStore::new();
        store.set_modules(modules);
        Ok(store)
    }
}

impl ModuleStore {
    /// Eight empty, unlocked modules.
    pub fn new() -> Self {
        Self {
            modules: ModuleName::ALL
                .iter()
                .map(|&name| Arc::new(Module::empty(name)))
                .collect(),
        }
    }

    pub fn modules(&self) -> &[Arc<Module>] {
        &self.modules
    }

    pub fn module(&self, name: ModuleName) -> &Module {
        &self.modules[name.index()]
    }

    /// Whether any module holds at least one tag.
    pub fn has_tags(&self) -> bool {
        self.modules.iter().any(|m| !m.tags.is_empty())
    }

    pub fn tag_count(&self) -> usize {
        self.modules.iter().map(|m| m.tags.len()).sum()
    }

    /// Replace every module.
    ///
    /// The result is always the eight canonical modules in canonical order. A
    /// module missing from `modules` becomes empty; when a name appears twice
    /// the first one wins.
    pub fn set_modules(&mut self, modules: Vec<Module>) {
        let mut slots: Vec<Option<Module>> = ModuleName::ALL.iter().map(|_| None).collect();
        for module in modules {
            let slot = &mut slots[module.name.index()];
            if slot.is_some() {
                warn!(module = %module.name, "Duplicate module ignored");
                continue;
            }
            *slot = Some(module);
        }
        self.modules = ModuleName::ALL
            .iter()
            .zip(slots)
            .map(|(&name, slot)| Arc::new(slot.unwrap_or_else(|| Module::empty(name))))
            .collect();
        debug!(tags = self.tag_count(), "Replaced all modules");
    }

    /// Replace every module from a responder payload, matching names
    /// case-insensitively and dropping unknown ones.
    pub fn set_remote_modules(&mut self, incoming: &[RemoteModule]) {
        let modules = incoming
            .iter()
            .filter_map(|remote| match remote.module_name() {
                Some(name) => Some(remote.to_module(name, remote.locked.unwrap_or(false))),
                None => {
                    warn!(name = %remote.name, "Ignoring unknown module from responder");
                    None
                }
            })
            .collect();
        self.set_modules(modules);
    }

    /// Shallow-merge `update` into the named module.
    pub fn update_module(&mut self, name: ModuleName, update: ModuleUpdate) {
        self.replace_with(name, |module| {
            let mut next = module.clone();
            if let Some(display_name) = update.display_name {
                next.display_name = display_name;
            }
            if let Some(locked) = update.locked {
                next.locked = locked;
            }
            if let Some(tags) = update.tags {
                next.tags = tags;
            }
            Some(next)
        });
    }

    /// Flip the lock flag of a module. Returns the new state.
    pub fn toggle_lock(&mut self, name: ModuleName) -> bool {
        let locked = !self.module(name).locked;
        self.update_module(
            name,
            ModuleUpdate {
                locked: Some(locked),
                ..ModuleUpdate::default()
            },
        );
        debug!(module = %name, locked, "Toggled lock");
        locked
    }

    pub fn add_tag(&mut self, name: ModuleName, tag: Tag) {
        trace!(module = %name, text = %tag.text, "Adding tag");
        self.replace_with(name, |module| {
            let mut next = module.clone();
            next.tags.push(Tag {
                weight: clamp_weight(tag.weight),
                ..tag
            });
            Some(next)
        });
    }

    /// Remove a tag. Unknown ids are ignored.
    pub fn remove_tag(&mut self, name: ModuleName, id: &TagId) {
        self.replace_with(name, |module| {
            let position = module.tags.iter().position(|t| &t.id == id)?;
            let mut next = module.clone();
            next.tags.remove(position);
            trace!(module = %name, %id, "Removed tag");
            Some(next)
        });
    }

    /// Shallow-merge `update` into a tag. Unknown ids are ignored, and so is
    /// an update whose text is blank after trimming.
    pub fn update_tag(&mut self, name: ModuleName, id: &TagId, update: TagUpdate) {
        let text = match update.text.as_deref().map(str::trim) {
            Some("") => {
                trace!(module = %name, %id, "Ignoring blank tag text");
                return;
            }
            other => other.map(str::to_string),
        };
        self.replace_with(name, |module| {
            let position = module.tags.iter().position(|t| &t.id == id)?;
            let mut next = module.clone();
            let tag = &mut next.tags[position];
            if let Some(text) = text {
                tag.text = text;
            }
            if let Some(weight) = update.weight {
                tag.weight = clamp_weight(weight);
            }
            if let Some(hidden) = update.hidden {
                tag.hidden = hidden;
            }
            Some(next)
        });
    }

    /// Shift a tag's weight by `delta`, clamped into range.
    pub fn adjust_weight(&mut self, name: ModuleName, id: &TagId, delta: f64) {
        self.replace_with(name, |module| {
            let position = module.tags.iter().position(|t| &t.id == id)?;
            let mut next = module.clone();
            next.tags[position] = next.tags[position].adjusted(delta);
            trace!(module = %name, %id, weight = next.tags[position].weight, "Adjusted weight");
            Some(next)
        });
    }

    /// Shift the weight of the tag on editor line `line`.
    ///
    /// Lines count visible tags only. Returns the new weight, or `None` when
    /// the line has no tag.
    pub fn adjust_weight_at_line(&mut self, name: ModuleName, line: usize, delta: f64) -> Option<f64> {
        let id = self.module(name).visible_tags().nth(line)?.id.clone();
        self.adjust_weight(name, &id, delta);
        self.module(name)
            .tags
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.weight)
    }

    /// Text shown in the module's editor.
    pub fn editor_text(&self, name: ModuleName, dialect: Dialect) -> String {
        codec::editor_text(&self.module(name).tags, dialect)
    }

    /// Commit edited editor text to a module.
    ///
    /// Tags whose text is unchanged keep their ids. Hidden tags never appear
    /// in the editor, so they are carried over after the parsed ones unless
    /// the user typed the same text.
    pub fn set_tags_from_text(&mut self, name: ModuleName, raw: &str, dialect: Dialect) {
        let current = &self.module(name).tags;
        let visible: Vec<Tag> = current.iter().filter(|t| !t.hidden).cloned().collect();
        let mut tags = codec::parse(raw, dialect, &visible);
        let carried: Vec<Tag> = current
            .iter()
            .filter(|t| t.hidden && !tags.iter().any(|p| p.text == t.text))
            .cloned()
            .collect();
        tags.extend(carried);
        self.update_module(name, ModuleUpdate::tags(tags));
    }

    /// Apply a refinement result, respecting lock flags.
    pub fn apply_refinement(&mut self, incoming: &[RemoteModule]) {
        self.modules = merge::merge(&self.modules, incoming);
    }

    fn replace_with(&mut self, name: ModuleName, f: impl FnOnce(&Module) -> Option<Module>) {
        let slot = &mut self.modules[name.index()];
        match f(&**slot) {
            Some(next) => *slot = Arc::new(next),
            None => trace!(module = %name, "Update was a no-op"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_has_canonical_modules() {
        let store = ModuleStore::new();
        let names: Vec<ModuleName> = store.modules().iter().map(|m| m.name).collect();
        assert_eq!(names, ModuleName::ALL.to_vec());
        assert!(!store.has_tags());
    }

    #[test]
    fn set_modules_canonicalizes_order() {
        let mut store = ModuleStore::new();
        store.set_modules(vec![
            Module::with_tags(ModuleName::Extra, vec![Tag::plain("signature")]),
            Module::with_tags(ModuleName::Style, vec![Tag::plain("anime")]),
            Module::with_tags(ModuleName::Style, vec![Tag::plain("duplicate")]),
        ]);
        assert_eq!(store.modules().len(), 8);
        assert_eq!(store.modules()[0].tags[0].text, "anime");
        assert_eq!(store.modules()[7].tags[0].text, "signature");
        assert!(store.module(ModuleName::Pose).tags.is_empty());
    }

    #[test]
    fn hidden_tags_survive_editor_commit() {
        let mut store = ModuleStore::new();
        store.add_tag(ModuleName::Subject, Tag::plain("girl"));
        store.add_tag(ModuleName::Subject, Tag::plain("masterpiece").hidden());
        let text = store.editor_text(ModuleName::Subject, Dialect::Line);
        assert_eq!(text, "girl");

        store.set_tags_from_text(ModuleName::Subject, "girl\nsilver hair", Dialect::Line);
        let texts: Vec<&str> = store
            .module(ModuleName::Subject)
            .tags
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(texts, vec!["girl", "silver hair", "masterpiece"]);
    }

    #[test]
    fn adjust_weight_at_line_skips_hidden() {
        let mut store = ModuleStore::new();
        store.add_tag(ModuleName::Pose, Tag::plain("secret").hidden());
        store.add_tag(ModuleName::Pose, Tag::plain("standing"));
        assert_eq!(store.adjust_weight_at_line(ModuleName::Pose, 0, 0.5), Some(1.5));
        assert_eq!(store.adjust_weight_at_line(ModuleName::Pose, 1, 0.5), None);
        assert_eq!(store.module(ModuleName::Pose).tags[0].weight, 1.0);
    }

    #[test]
    fn adjust_weight_at_line_with_repeated_text() {
        let mut store = ModuleStore::new();
        store.set_tags_from_text(ModuleName::Style, "a\na", Dialect::Line);
        store.set_tags_from_text(ModuleName::Style, "a\na", Dialect::Line);
        assert_eq!(store.adjust_weight_at_line(ModuleName::Style, 1, 0.5), Some(1.5));
        let weights: Vec<f64> = store
            .module(ModuleName::Style)
            .tags
            .iter()
            .map(|t| t.weight)
            .collect();
        assert_eq!(weights, vec![1.0, 1.5]);
    }

    #[test]
    fn update_tag_trims_and_ignores_blank_text() {
        let mut store = ModuleStore::new();
        store.add_tag(ModuleName::Background, Tag::plain("rain"));
        let id = store.module(ModuleName::Background).tags[0].id.clone();

        store.update_tag(
            ModuleName::Background,
            &id,
            TagUpdate {
                text: Some("   ".to_string()),
                weight: Some(2.0),
                ..TagUpdate::default()
            },
        );
        let tag = &store.module(ModuleName::Background).tags[0];
        assert_eq!(tag.text, "rain");
        assert_eq!(tag.weight, 1.0);

        store.update_tag(
            ModuleName::Background,
            &id,
            TagUpdate {
                text: Some("  snow ".to_string()),
                ..TagUpdate::default()
            },
        );
        assert_eq!(store.module(ModuleName::Background).tags[0].text, "snow");
    }

    #[test]
    fn deserialize_sanitizes_tags() {
        let json = r#"[{"name":"style","displayName":"Style","locked":false,"tags":[
            {"id":"a","text":"  ","weight":1.0,"hidden":false},
            {"id":"b","text":" glow ","weight":9.0,"hidden":false}
        ]}]"#;
        let store: ModuleStore = serde_json::from_str(json).unwrap();
        let tags = &store.module(ModuleName::Style).tags;
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].text, "glow");
        assert_eq!(tags[0].weight, 5.0);
    }

    #[test]
    fn deserialize_restores_invariants() {
        let json = r#"[{"name":"pose","displayName":"Pose","locked":true,"tags":[]}]"#;
        let store: ModuleStore = serde_json::from_str(json).unwrap();
        assert_eq!(store.modules().len(), 8);
        assert!(store.module(ModuleName::Pose).locked);
    }
}
