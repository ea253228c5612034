use std::time::{SystemTime, UNIX_EPOCH};

use crate::ai::BackendClient;
use crate::codec::Dialect;
use crate::db::Database;
use crate::state::AppState;

pub mod analyze;
pub mod generate;
pub mod history;
pub mod info;
pub mod keys;
pub mod modules;
pub mod refine;
pub mod settings;

pub use analyze::{analyze_image, encode_image_file};
pub use generate::{generate_image, save_image_data};
pub use history::{list_images, navigate_images, remove_image, save_history_image, select_image, HistoryStep};
pub use info::show_system_info;
pub use keys::{clear_key, set_key, show_keys};
pub use modules::{
    add_tag, adjust_weight, edit_module, format_modules, hide_tag, remove_tag, show_prompt,
    toggle_lock,
};
pub use refine::refine_modules;
pub use settings::{show_settings, update_settings, SettingsChange};

/// Everything a command handler works with.
pub struct App {
    pub state: AppState,
    pub db: Database,
    pub client: BackendClient,
    pub dialect: Dialect,
}

impl App {
    pub fn new(state: AppState, db: Database, client: BackendClient) -> Self {
        Self {
            state,
            db,
            client,
            dialect: Dialect::default(),
        }
    }
}

pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Convert a 1-based line number from the user into an index.
pub(crate) fn line_index(line: usize) -> Option<usize> {
    line.checked_sub(1)
}
