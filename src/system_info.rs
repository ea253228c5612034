use git_version::git_version;

use crate::model::EngineType;

// include -modified if the working tree has uncommitted changes
const COMMIT: &str = git_version!(args = ["--abbrev=10", "--always", "--dirty=-modified"], fallback = "unknown");

pub fn get_system_info() -> String {
    let profile = if cfg!(debug_assertions) {
        "Dev"
    } else {
        "Release"
    };

    let latest = option_env!("LATEST_TAG").unwrap_or("");
    let ahead = option_env!("COMMITS_AHEAD").unwrap_or("");
    let version = match option_env!("RELEASE_VERSION") {
        Some(tag) if !tag.is_empty() => format!("release {tag}"),
        _ if !latest.is_empty() && !ahead.is_empty() => {
            format!("development branch {ahead} commits ahead of {latest}")
        }
        _ if !latest.is_empty() => format!("development branch ahead of {latest}"),
        _ => format!("development {}", env!("CARGO_PKG_VERSION")),
    };

    let engines: Vec<&str> = [EngineType::NovelAi, EngineType::GoogleImagen]
        .iter()
        .map(|e| e.display_name())
        .collect();

    format!(
        "{} - {}\nCommit: {}\n{} build\nEngines: {}",
        env!("CARGO_PKG_NAME"),
        version,
        COMMIT,
        profile,
        engines.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_info_mentions_build_and_engines() {
        let info = get_system_info();
        assert!(info.starts_with("voidweaver - "));
        assert!(info.contains(COMMIT));
        assert!(info.contains("Dev build") || info.contains("Release build"));
        assert!(info.contains("NovelAI V3, Google Imagen"));
    }
}
