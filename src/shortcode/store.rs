use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::{debug, instrument};

use crate::entities::IdentityTriple;

use super::ShortCodeMap;

/// Default location of the short code file, relative to the working directory.
pub const DEFAULT_MAP_FILE: &str = ".clientprojecttask.json";

/// Interface for abstracting where short codes are kept between runs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShortCodeStore: Send + Sync {
    /// Reads every stored code. A store that has never been written is empty.
    async fn load(&self) -> Result<ShortCodeMap>;

    /// Replaces the stored codes with the contents of `map`.
    async fn save(&self, map: &ShortCodeMap) -> Result<()>;

    /// Where the codes are kept, as shown to the user.
    fn location(&self) -> String;
}

/// Keeps codes in a single pretty-printed JSON object keyed by code.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_locked(path: &Path) -> std::result::Result<String, std::io::Error> {
        let mut file = File::open(path).await?;
        file.lock_shared()?;
        let mut contents = String::new();
        let result = file.read_to_string(&mut contents).await;
        file.unlock_async().await?;
        result?;
        Ok(contents)
    }

    async fn write_locked(file: &mut File, buffer: &[u8]) -> Result<()> {
        file.set_len(0).await?;
        file.write_all(buffer).await?;
        file.flush().await?;
        file.sync_data().await?;
        Ok(())
    }
}

#[async_trait]
impl ShortCodeStore for JsonFileStore {
    #[instrument(skip(self), fields(path = ?self.path))]
    async fn load(&self) -> Result<ShortCodeMap> {
        let contents = match Self::read_locked(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No short code file yet");
                return Ok(ShortCodeMap::default());
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read {:?}", self.path))?,
        };

        if contents.trim().is_empty() {
            return Ok(ShortCodeMap::default());
        }

        let codes = serde_json::from_str::<BTreeMap<String, IdentityTriple>>(&contents)
            .with_context(|| format!("Short code file {:?} is malformed", self.path))?;
        Ok(ShortCodeMap::from_codes(codes))
    }

    #[instrument(skip_all, fields(path = ?self.path))]
    async fn save(&self, map: &ShortCodeMap) -> Result<()> {
        let buffer = serde_json::to_vec_pretty(map.codes())?;

        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open {:?}", self.path))?;

        // Truncate only while holding the lock.
        file.lock_exclusive()?;
        let result = Self::write_locked(&mut file, &buffer).await;
        file.unlock_async().await?;
        debug!("Wrote {} codes", map.len());
        result
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
