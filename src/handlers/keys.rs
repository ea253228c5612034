use anyhow::Result;

use super::App;
use crate::db::CredentialKind;
use crate::messages;

pub async fn set_key(app: &App, kind: CredentialKind, value: &str) -> Result<String> {
    if app.db.set_credential(kind, value.trim()).await? {
        Ok(format!("{kind} saved."))
    } else {
        Ok(messages::EMPTY_CREDENTIAL_IGNORED.to_string())
    }
}

pub async fn clear_key(app: &App, kind: CredentialKind) -> Result<String> {
    if app.db.remove_credential(kind).await? {
        Ok(format!("{kind} removed."))
    } else {
        Ok(format!("No {kind} was saved."))
    }
}

/// Which credentials are present. Values are never printed.
pub async fn show_keys(app: &App) -> Result<String> {
    let credentials = app.db.load_credentials().await?;
    let lines: Vec<String> = CredentialKind::ALL
        .iter()
        .filter_map(|&kind| credentials.get(kind).map(|v| format!("{kind}: {}", mask(v))))
        .collect();
    if lines.is_empty() {
        return Ok(messages::NO_CREDENTIALS.to_string());
    }
    Ok(lines.join("\n"))
}

fn mask(value: &str) -> String {
    let count = value.chars().count();
    if count <= 8 {
        return "*".repeat(count);
    }
    let tail: String = value.chars().skip(count - 4).collect();
    format!("{}{tail}", "*".repeat(8))
}

#[cfg(test)]
mod tests {
    use super::mask;

    #[test]
    fn mask_hides_all_but_tail() {
        assert_eq!(mask("abc"), "***");
        assert_eq!(mask("sk-1234567890"), "********7890");
    }
}
