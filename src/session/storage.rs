//! Client-local persistence for the bearer credential. Only the session store
//! reads or writes through these types. The credential is the single piece of
//! state that survives a restart; it lives under one fixed key.

use crate::errors::AppError;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::debug;

/// Key the credential is persisted under.
pub const TOKEN_KEY: &str = "token";

/// Opaque bearer token. Never printed; `Debug` is redacted by `SecretString`.
#[derive(Clone, Debug)]
pub struct Credential(SecretString);

impl Credential {
    /// Wraps a token, refusing blank values.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(SecretString::from(token)))
        }
    }

    #[must_use]
    pub const fn secret(&self) -> &SecretString {
        &self.0
    }
}

/// Storage for the persisted credential.
pub trait CredentialStorage: Send + Sync {
    /// Returns the persisted credential, if any.
    ///
    /// # Errors
    /// Returns `AppError::Storage` when the backing store cannot be read.
    fn load(&self) -> Result<Option<Credential>, AppError>;

    /// Persists the credential, replacing any previous one.
    ///
    /// # Errors
    /// Returns `AppError::Storage` when the backing store cannot be written.
    fn store(&self, credential: &Credential) -> Result<(), AppError>;

    /// Removes the persisted credential. Purging an empty store succeeds.
    ///
    /// # Errors
    /// Returns `AppError::Storage` when the backing store cannot be written.
    fn purge(&self) -> Result<(), AppError>;
}

/// JSON file holding `{ "token": "<credential>" }`.
#[derive(Debug)]
pub struct FileCredentialStorage {
    path: PathBuf,
}

impl FileCredentialStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Map<String, Value>, AppError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => {
                return Err(AppError::Storage(format!(
                    "Failed to read {}: {err}",
                    self.path.display()
                )))
            }
        };

        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(entries)) => Ok(entries),
            Ok(_) => Err(AppError::Storage(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
            Err(err) => Err(AppError::Storage(format!(
                "Failed to parse {}: {err}",
                self.path.display()
            ))),
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| {
                    AppError::Storage(format!("Failed to create {}: {err}", parent.display()))
                })?;
            }
        }

        let payload = serde_json::to_vec_pretty(entries)
            .map_err(|err| AppError::Serialization(format!("Failed to encode session: {err}")))?;

        let tmp_path = self.path.with_extension("json.tmp");
        let mut file = open_private(&tmp_path).map_err(|err| {
            AppError::Storage(format!("Failed to open {}: {err}", tmp_path.display()))
        })?;
        file.write_all(&payload)
            .and_then(|()| file.sync_all())
            .map_err(|err| {
                AppError::Storage(format!("Failed to write {}: {err}", tmp_path.display()))
            })?;

        fs::rename(&tmp_path, &self.path).map_err(|err| {
            AppError::Storage(format!(
                "Failed to replace {}: {err}",
                self.path.display()
            ))
        })
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

impl CredentialStorage for FileCredentialStorage {
    fn load(&self) -> Result<Option<Credential>, AppError> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(TOKEN_KEY)
            .and_then(Value::as_str)
            .and_then(Credential::new))
    }

    fn store(&self, credential: &Credential) -> Result<(), AppError> {
        // a missing file reads as empty; anything else would drop other keys
        let mut entries = self.read_entries()?;
        entries.insert(
            TOKEN_KEY.to_string(),
            Value::String(credential.secret().expose_secret().to_string()),
        );
        self.write_entries(&entries)?;
        debug!(path = %self.path.display(), "credential persisted");
        Ok(())
    }

    fn purge(&self) -> Result<(), AppError> {
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            // An unreadable file cannot hold a usable credential; drop it.
            Err(_) => Map::new(),
        };
        if entries.remove(TOKEN_KEY).is_none() && !self.path.exists() {
            return Ok(());
        }

        if entries.is_empty() {
            match fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(AppError::Storage(format!(
                        "Failed to remove {}: {err}",
                        self.path.display()
                    )))
                }
            }
        } else {
            self.write_entries(&entries)?;
        }
        debug!(path = %self.path.display(), "credential purged");
        Ok(())
    }
}

/// In-process storage, used by tests and embedders with their own persistence.
#[derive(Debug, Default)]
pub struct MemoryCredentialStorage {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, AppError> {
        self.token
            .lock()
            .map_err(|_| AppError::Storage("Credential storage lock poisoned".to_string()))
    }
}

impl CredentialStorage for MemoryCredentialStorage {
    fn load(&self) -> Result<Option<Credential>, AppError> {
        Ok(self.slot()?.clone().and_then(Credential::new))
    }

    fn store(&self, credential: &Credential) -> Result<(), AppError> {
        *self.slot()? = Some(credential.secret().expose_secret().to_string());
        Ok(())
    }

    fn purge(&self) -> Result<(), AppError> {
        *self.slot()? = None;
        Ok(())
    }
}
