//! Reconciliation of refinement results with the live module list.
//!
//! External responders name modules loosely (`"Style"`, `"STYLE"`), so every
//! incoming name goes through [`ModuleName::normalize`] before lookup. Lock
//! state is client-local: a merged module always keeps the current lock flag,
//! whatever the responder sent.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::model::{clamp_weight, Module, ModuleName, Tag};

/// A module as it arrives from an external responder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteModule {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl RemoteModule {
    pub fn new(name: impl Into<String>, tags: Vec<Tag>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            locked: None,
            tags,
        }
    }

    /// Canonical name, if the responder used a known one.
    pub fn module_name(&self) -> Option<ModuleName> {
        ModuleName::normalize(&self.name)
    }

    /// Convert into a live module with the given lock flag.
    pub fn to_module(&self, name: ModuleName, locked: bool) -> Module {
        Module {
            name,
            display_name: self
                .display_name
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| name.display_name().to_string()),
            locked,
            tags: sanitize_tags(&self.tags),
        }
    }
}

impl From<&Module> for RemoteModule {
    fn from(module: &Module) -> Self {
        Self {
            name: module.name.as_str().to_string(),
            display_name: Some(module.display_name.clone()),
            locked: Some(module.locked),
            tags: module.tags.clone(),
        }
    }
}

/// Trim tag text, drop empty tags and clamp weights.
pub fn sanitize_tags(tags: &[Tag]) -> Vec<Tag> {
    tags.iter()
        .filter_map(|tag| {
            let text = tag.text.trim();
            if text.is_empty() {
                trace!(id = %tag.id, "Dropping empty incoming tag");
                return None;
            }
            Some(Tag {
                id: tag.id.clone(),
                text: text.to_string(),
                weight: clamp_weight(tag.weight),
                hidden: tag.hidden,
            })
        })
        .collect()
}

/// Index incoming modules by canonical name. The first occurrence wins.
pub fn index_by_name(incoming: &[RemoteModule]) -> HashMap<ModuleName, &RemoteModule> {
    let mut index = HashMap::new();
    for remote in incoming {
        match remote.module_name() {
            Some(name) => {
                index.entry(name).or_insert(remote);
            }
            None => warn!(name = %remote.name, "Ignoring unknown module from responder"),
        }
    }
    index
}

/// Merge a refinement result into `current`.
///
/// The result follows `current`'s order. Locked modules and modules the
/// responder did not mention are returned as the same `Arc`.
pub fn merge(current: &[Arc<Module>], incoming: &[RemoteModule]) -> Vec<Arc<Module>> {
    let index = index_by_name(incoming);
    current
        .iter()
        .map(|module| {
            if module.locked {
                trace!(module = %module.name, "Keeping locked module");
                return Arc::clone(module);
            }
            match index.get(&module.name) {
                Some(remote) => {
                    debug!(module = %module.name, tags = remote.tags.len(), "Merging refined module");
                    Arc::new(remote.to_module(module.name, module.locked))
                }
                None => {
                    trace!(module = %module.name, "No refinement for module");
                    Arc::clone(module)
                }
            }
        })
        .collect()
}
