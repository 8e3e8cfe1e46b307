use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use paddock_core::{AppError, Credential};
use tracing::debug;

use crate::file_store::persistence_error;

const TOKEN_FILE: &str = "auth_token";

/// Stores the API token next to the collections.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(TOKEN_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the token, readable by the current user only on Unix.
    pub async fn save(&self, credential: &Credential) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| persistence_error("create", parent, e))?;
        }

        tokio::fs::write(&self.path, credential.token())
            .await
            .map_err(|e| persistence_error("write", &self.path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| persistence_error("protect", &self.path, e))?;
        }

        debug!(path = %self.path.display(), "Saved API token");
        Ok(())
    }

    /// Loads the stored token, if any.
    pub async fn load(&self) -> Result<Option<Credential>, AppError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(token) if token.trim().is_empty() => Ok(None),
            Ok(token) => Ok(Some(Credential::from_stored(&token))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(persistence_error("read", &self.path, e)),
        }
    }

    /// Removes the stored token. Returns whether one existed.
    pub async fn clear(&self) -> Result<bool, AppError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(persistence_error("remove", &self.path, e)),
        }
    }
}
