use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{FavoriteStorage, NotificationSettings, SettingsStorage};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not access user data file: {0}")]
    Io(#[from] std::io::Error),

    #[error("user data file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserData {
    #[serde(default)]
    notification: NotificationSettings,
    #[serde(default)]
    favorites: Vec<String>,
}

/// Settings and favorites in one small JSON document on disk. A missing
/// file reads as defaults. Writes hold a lock so concurrent handler
/// invocations cannot interleave their read-modify-write cycles.
pub struct JsonUserStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonUserStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    async fn read(&self) -> Result<UserData, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(UserData::default()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, data: &UserData) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(data)?;
        tokio::fs::write(&self.path, bytes).await?;

        Ok(())
    }
}

#[async_trait]
impl SettingsStorage for JsonUserStore {
    type Error = StorageError;

    async fn load(&self) -> Result<NotificationSettings, StorageError> {
        Ok(self.read().await?.notification)
    }

    async fn save(&self, settings: &NotificationSettings) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.read().await?;
        data.notification = settings.clone();
        self.write(&data).await
    }
}

#[async_trait]
impl FavoriteStorage for JsonUserStore {
    type Error = StorageError;

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.read().await?.favorites)
    }

    async fn add(&self, city: &str) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.read().await?;

        if data.favorites.iter().any(|c| c.eq_ignore_ascii_case(city)) {
            return Ok(false);
        }

        data.favorites.push(city.to_string());
        self.write(&data).await?;

        Ok(true)
    }

    async fn remove(&self, city: &str) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.read().await?;
        let before = data.favorites.len();
        data.favorites.retain(|c| !c.eq_ignore_ascii_case(city));

        if data.favorites.len() == before {
            return Ok(false);
        }

        self.write(&data).await?;

        Ok(true)
    }
}
