use std::path::Path;

use anyhow::{bail, Result};

use super::{generate::save_image_data, line_index, App};
use crate::messages;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStep {
    Previous,
    Next,
}

/// One line per image, oldest first, with the displayed one marked.
pub fn list_images(app: &App) -> String {
    let images = &app.state.images;
    if images.is_empty() {
        return messages::HISTORY_EMPTY.to_string();
    }
    images
        .iter()
        .enumerate()
        .map(|(i, image)| {
            let marker = if images.cursor() == Some(i) { '>' } else { ' ' };
            let thinking = image
                .thinking_log
                .as_ref()
                .map(|log| format!(" [{} thinking steps]", log.len()))
                .unwrap_or_default();
            format!(
                "{marker} {}. {}{thinking}",
                i + 1,
                image.prompt.as_deref().unwrap_or("(no prompt)")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Display the image at 1-based `position`.
pub fn select_image(app: &mut App, position: usize) -> Result<String> {
    match line_index(position) {
        Some(index) if app.state.images.set_index(index) => Ok(list_images(app)),
        _ => bail!(messages::HISTORY_INDEX_OUT_OF_RANGE),
    }
}

pub fn navigate_images(app: &mut App, step: HistoryStep) -> String {
    let moved = match step {
        HistoryStep::Previous => app.state.images.previous(),
        HistoryStep::Next => app.state.images.next(),
    };
    tracing::debug!(?step, moved, "History navigation");
    list_images(app)
}

/// Delete the image at 1-based `position`.
pub fn remove_image(app: &mut App, position: usize) -> Result<String> {
    let removed = line_index(position).and_then(|index| app.state.images.remove_at(index));
    if removed.is_none() {
        bail!(messages::HISTORY_INDEX_OUT_OF_RANGE);
    }
    Ok(list_images(app))
}

/// Write the image at `position` (or the displayed one) to `path`.
pub fn save_history_image(app: &App, position: Option<usize>, path: &Path) -> Result<String> {
    let image = match position {
        Some(position) => line_index(position).and_then(|i| app.state.images.get(i)),
        None => app.state.images.current(),
    };
    let Some(image) = image else {
        bail!(messages::HISTORY_INDEX_OUT_OF_RANGE);
    };
    save_image_data(&image.image_data, path)?;
    Ok(format!("Saved to {}.", path.display()))
}
