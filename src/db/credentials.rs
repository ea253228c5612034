//! Credential strings kept between sessions.
//!
//! Values are opaque: the store only knows whether a value is present.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use tracing::{debug, trace};

use super::Database;
use crate::model::EngineType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Gemini,
    NovelAi,
    Google,
}

impl CredentialKind {
    pub const ALL: [CredentialKind; 3] = [Self::Gemini, Self::NovelAi, Self::Google];

    /// Storage key, shared with earlier clients.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Gemini => "voidweaver_gemini_key",
            Self::NovelAi => "voidweaver_novelai_key",
            Self::Google => "voidweaver_google_credentials",
        }
    }

    /// Credential the given engine needs.
    pub fn for_engine(engine: EngineType) -> Self {
        match engine {
            EngineType::NovelAi => Self::NovelAi,
            EngineType::GoogleImagen => Self::Google,
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gemini => "Gemini API key",
            Self::NovelAi => "NovelAI API key",
            Self::Google => "Google credentials",
        })
    }
}

impl FromStr for CredentialKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "novelai" => Ok(Self::NovelAi),
            "google" | "google-imagen" | "imagen" => Ok(Self::Google),
            other => Err(anyhow!("unknown credential: {other} (expected gemini, novelai or google)")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    pub gemini_api_key: Option<String>,
    pub novelai_api_key: Option<String>,
    pub google_credentials: Option<String>,
}

impl Credentials {
    pub fn get(&self, kind: CredentialKind) -> Option<&str> {
        match kind {
            CredentialKind::Gemini => self.gemini_api_key.as_deref(),
            CredentialKind::NovelAi => self.novelai_api_key.as_deref(),
            CredentialKind::Google => self.google_credentials.as_deref(),
        }
    }

    pub fn for_engine(&self, engine: EngineType) -> Option<&str> {
        self.get(CredentialKind::for_engine(engine))
    }
}

impl Database {
    pub async fn get_credential(&self, kind: CredentialKind) -> Result<Option<String>> {
        trace!(key = kind.storage_key(), "Reading credential");
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM credentials WHERE key = ?")
                .bind(kind.storage_key())
                .fetch_optional(self.pool())
                .await?;
        Ok(value.filter(|v| !v.is_empty()))
    }

    /// Store a credential. Empty values are ignored and leave any stored
    /// value in place; returns whether something was written.
    pub async fn set_credential(&self, kind: CredentialKind, value: &str) -> Result<bool> {
        if value.trim().is_empty() {
            debug!(key = kind.storage_key(), "Skipping empty credential");
            return Ok(false);
        }
        debug!(key = kind.storage_key(), "Saving credential");
        sqlx::query(
            "INSERT INTO credentials (key, value, updated_at) VALUES (?, ?, strftime('%s', 'now')) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(kind.storage_key())
        .bind(value)
        .execute(self.pool())
        .await?;
        Ok(true)
    }

    pub async fn remove_credential(&self, kind: CredentialKind) -> Result<bool> {
        debug!(key = kind.storage_key(), "Removing credential");
        let result = sqlx::query("DELETE FROM credentials WHERE key = ?")
            .bind(kind.storage_key())
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn load_credentials(&self) -> Result<Credentials> {
        Ok(Credentials {
            gemini_api_key: self.get_credential(CredentialKind::Gemini).await?,
            novelai_api_key: self.get_credential(CredentialKind::NovelAi).await?,
            google_credentials: self.get_credential(CredentialKind::Google).await?,
        })
    }
}
