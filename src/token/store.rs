use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The two durable secrets the client keeps between launches.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct StoredCredentials {
    pub auth_token: String,
    pub refresh_token: String,
}

#[allow(async_fn_in_trait)]
pub trait CredentialStore {
    async fn load(&self) -> Result<Option<StoredCredentials>, std::io::Error>;

    async fn save(&self, credentials: &StoredCredentials) -> Result<(), std::io::Error>;

    async fn clear(&self) -> Result<(), std::io::Error>;
}

/// On-device credential storage backed by a JSON file with owner-only
/// permissions.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CredentialStore for FileStore {
    async fn load(&self) -> Result<Option<StoredCredentials>, std::io::Error> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))
    }

    async fn save(&self, credentials: &StoredCredentials) -> Result<(), std::io::Error> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec(credentials)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;

        tokio::fs::write(&self.path, bytes).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        Ok(())
    }

    async fn clear(&self) -> Result<(), std::io::Error> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
