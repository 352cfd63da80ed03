//! Durable storage for the access token.
//!
//! The store holds exactly one entry, keyed by [`ACCESS_TOKEN_KEY`]. An absent
//! entry means the client is unauthenticated.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::ClientError;

/// Key under which the access token is persisted.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Backing storage for the access token.
pub trait TokenStore: Send + Sync {
    /// Current token, if any.
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> Result<(), ClientError>;
    /// Remove the token. Removing an absent token is not an error.
    fn clear(&self) -> Result<(), ClientError>;
}

/// Token kept in memory only; lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn save(&self, token: &str) -> Result<(), ClientError> {
        *self.token.write() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        self.token.write().take();
        Ok(())
    }
}

/// Token persisted as a small JSON document on disk, e.g.
/// `{"access_token": "..."}`. Survives process restarts.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cached: RwLock<Option<String>>,
}

impl FileTokenStore {
    /// Open the store at `path`, reading any token already persisted there.
    ///
    /// A missing file is an empty store. An unreadable or corrupt file is also
    /// treated as empty; it gets overwritten on the next save.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cached = read_token(&path);
        debug!(
            path = %path.display(),
            present = cached.is_some(),
            "Opened token store"
        );
        Self {
            path,
            cached: RwLock::new(cached),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        self.cached.read().clone()
    }

    fn save(&self, token: &str) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut entries = BTreeMap::new();
        entries.insert(ACCESS_TOKEN_KEY, token);
        let content = serde_json::to_vec_pretty(&entries)?;

        // Write then rename so a crash never leaves a half-written file.
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, content)?;
        restrict_permissions(&tmp)?;
        std::fs::rename(&tmp, &self.path)?;

        *self.cached.write() = Some(token.to_string());
        Ok(())
    }

    /// The cached token is only dropped once the file is gone, so a failed
    /// removal keeps reporting the token that would be restored on restart.
    fn clear(&self) -> Result<(), ClientError> {
        let mut cached = self.cached.write();
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        cached.take();
        Ok(())
    }
}

fn read_token(path: &Path) -> Option<String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read token store");
            return None;
        }
    };

    match serde_json::from_str::<BTreeMap<String, String>>(&content) {
        Ok(mut entries) => entries
            .remove(ACCESS_TOKEN_KEY)
            .filter(|token| !token.is_empty()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring corrupt token store");
            None
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
