use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::cookie::Cookie;
use crate::error::{ClientError, ClientResult};

/// Storage for client credentials.
///
/// The store is shared mutable state: every request reads it and refresh or
/// teardown write it. Implementations must be safe to call from many tasks.
pub trait CredentialStore: Send + Sync {
    fn get(&self, name: &str) -> Option<Cookie>;

    fn set(&self, cookie: Cookie) -> ClientResult<()>;

    fn remove(&self, name: &str) -> ClientResult<()>;

    fn clear(&self) -> ClientResult<()>;

    fn all(&self) -> Vec<Cookie>;
}

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    cookies: RwLock<HashMap<String, Cookie>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get(&self, name: &str) -> Option<Cookie> {
        self.cookies.read().get(name).cloned()
    }

    fn set(&self, cookie: Cookie) -> ClientResult<()> {
        self.cookies.write().insert(cookie.name.clone(), cookie);
        Ok(())
    }

    fn remove(&self, name: &str) -> ClientResult<()> {
        self.cookies.write().remove(name);
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        self.cookies.write().clear();
        Ok(())
    }

    fn all(&self) -> Vec<Cookie> {
        self.cookies.read().values().cloned().collect()
    }
}

/// Cookie jar persisted as JSON, rewritten on every change
pub struct FileCredentialStore {
    path: PathBuf,
    cookies: RwLock<HashMap<String, Cookie>>,
}

impl FileCredentialStore {
    /// Open the jar at `path`, starting empty when the file does not exist yet
    pub fn open(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref().to_path_buf();

        let cookies = match std::fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => {
                let list: Vec<Cookie> = serde_json::from_slice(&bytes)?;
                list.into_iter().map(|c| (c.name.clone(), c)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(ClientError::Storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        Ok(Self {
            path,
            cookies: RwLock::new(cookies),
        })
    }

    fn persist(&self, cookies: &HashMap<String, Cookie>) -> ClientResult<()> {
        self.write_file(cookies).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %self.path.display(),
                "Failed to persist credential jar"
            );
            e
        })
    }

    fn write_file(&self, cookies: &HashMap<String, Cookie>) -> ClientResult<()> {
        let storage_error =
            |e: std::io::Error| ClientError::Storage(format!("{}: {}", self.path.display(), e));

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(storage_error)?;
            }
        }
        let list: Vec<&Cookie> = cookies.values().collect();
        let bytes = serde_json::to_vec_pretty(&list)?;
        std::fs::write(&self.path, bytes).map_err(storage_error)
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, name: &str) -> Option<Cookie> {
        self.cookies.read().get(name).cloned()
    }

    fn set(&self, cookie: Cookie) -> ClientResult<()> {
        let mut cookies = self.cookies.write();
        cookies.insert(cookie.name.clone(), cookie);
        self.persist(&cookies)
    }

    fn remove(&self, name: &str) -> ClientResult<()> {
        let mut cookies = self.cookies.write();
        if cookies.remove(name).is_some() {
            self.persist(&cookies)?;
        }
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        let mut cookies = self.cookies.write();
        cookies.clear();
        self.persist(&cookies)
    }

    fn all(&self) -> Vec<Cookie> {
        self.cookies.read().values().cloned().collect()
    }
}
