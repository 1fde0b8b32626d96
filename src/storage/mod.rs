mod json;

pub use json::{JsonUserStore, StorageError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The two scalars that survive restarts. The fire time is deliberately
/// not stored; a restart re-arms at the configured default time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default)]
    pub notifications_enabled: bool,
    #[serde(default)]
    pub city: Option<String>,
}

#[async_trait]
pub trait SettingsStorage: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn load(&self) -> Result<NotificationSettings, Self::Error>;
    async fn save(&self, settings: &NotificationSettings) -> Result<(), Self::Error>;
}

#[async_trait]
pub trait FavoriteStorage: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn list(&self) -> Result<Vec<String>, Self::Error>;
    /// Returns `false` when the city was already a favorite.
    async fn add(&self, city: &str) -> Result<bool, Self::Error>;
    /// Returns `false` when the city was not a favorite.
    async fn remove(&self, city: &str) -> Result<bool, Self::Error>;
}
