use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use paddock_core::traits::CollectionStore;
use paddock_core::{AppError, LocalRecord};
use tracing::debug;

/// Collection store keeping one JSON document per collection.
///
/// Each collection lives at `<data_dir>/<name>.json` and is always written
/// whole: the new document goes to a temporary file which then replaces the
/// old one, so a crash never leaves a half-written collection behind.
///
/// # Examples
///
/// ```no_run
/// use paddock_core::traits::CollectionStore;
/// use paddock_store::JsonFileStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = JsonFileStore::new("./paddock-data");
/// let horses = store.load("horses").await?;
/// println!("{} racing horses tracked", horses.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, collection: &str) -> Result<PathBuf, AppError> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(AppError::InvalidInput(format!(
                "Invalid collection name: {collection:?}"
            )));
        }
        Ok(self.data_dir.join(format!("{collection}.json")))
    }
}

impl CollectionStore for JsonFileStore {
    async fn save(&self, collection: &str, records: &[LocalRecord]) -> Result<(), AppError> {
        let path = self.path_for(collection)?;
        let json = serde_json::to_vec_pretty(records)?;

        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| persistence_error("create", &self.data_dir, e))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| persistence_error("write", &tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| persistence_error("replace", &path, e))?;

        debug!(collection, count = records.len(), path = %path.display(), "Saved collection");
        Ok(())
    }

    async fn load(&self, collection: &str) -> Result<Vec<LocalRecord>, AppError> {
        let path = self.path_for(collection)?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(persistence_error("read", &path, e)),
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::Persistence(format!("Corrupt collection {}: {}", path.display(), e))
        })
    }
}

pub(crate) fn persistence_error(action: &str, path: &Path, e: std::io::Error) -> AppError {
    AppError::Persistence(format!("Failed to {} {}: {}", action, path.display(), e))
}
