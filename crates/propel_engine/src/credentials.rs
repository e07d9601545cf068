use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use propel_logging::{propel_info, propel_warn};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Source of the bearer token attached to backend calls. Read before every call.
pub trait CredentialProvider: Send + Sync {
    fn current_token(&self) -> Option<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn current_token(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl CredentialProvider for StaticToken {
    fn current_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("token directory {path:?} unusable: {source}")]
    Directory { path: PathBuf, source: io::Error },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// File-backed single bearer token: saved on login, cleared on logout.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<String>, TokenStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                let token = text.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Replaces the stored token through a temp file so readers never see a partial write.
    pub fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|source| TokenStoreError::Directory {
            path: dir.clone(),
            source,
        })?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(token.trim().as_bytes())?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&self.path).map_err(|err| err.error)?;
        propel_info!("stored bearer token at {:?}", self.path);
        Ok(())
    }

    /// Removes the token. Returns whether one was present.
    pub fn clear(&self) -> Result<bool, TokenStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

impl CredentialProvider for TokenStore {
    fn current_token(&self) -> Option<String> {
        self.load().unwrap_or_else(|err| {
            propel_warn!("cannot read token from {:?}: {}", self.path, err);
            None
        })
    }
}
