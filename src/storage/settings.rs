use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    fs::operations::{read_locked_json, update_locked_json},
    ledger::entities::User,
};

/// Everything the popup keeps in the settings store. Keys that were never written are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_sites: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_tracking: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Persisted key-value store behind the popup. Every mutation of the ledger is written through
/// it right away, so an implementation should not buffer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<StoredSettings>;

    async fn set_blocked_sites(&self, sites: Vec<String>) -> Result<()>;

    async fn set_tracking(&self, enabled: bool) -> Result<()>;

    async fn set_auth(&self, token: String, user: User) -> Result<()>;

    /// Removes both the token and the user.
    async fn clear_auth(&self) -> Result<()>;
}

/// Keeps the settings in a single json file.
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn update(&self, update: impl FnOnce(&mut StoredSettings)) -> Result<()> {
        debug!("Writing settings to {:?}", self.path);
        update_locked_json(&self.path, update).await
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn load(&self) -> Result<StoredSettings> {
        Ok(read_locked_json(&self.path).await?.unwrap_or_default())
    }

    async fn set_blocked_sites(&self, sites: Vec<String>) -> Result<()> {
        self.update(|settings| settings.blocked_sites = Some(sites))
            .await
    }

    async fn set_tracking(&self, enabled: bool) -> Result<()> {
        self.update(|settings| settings.is_tracking = Some(enabled))
            .await
    }

    async fn set_auth(&self, token: String, user: User) -> Result<()> {
        self.update(|settings| {
            settings.auth_token = Some(token);
            settings.user = Some(user);
        })
        .await
    }

    async fn clear_auth(&self) -> Result<()> {
        self.update(|settings| {
            settings.auth_token = None;
            settings.user = None;
        })
        .await
    }
}
