use std::fs::File;
use std::fs::OpenOptions;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Utc;

use crate::token_data::StoredAuth;
use crate::token_data::TokenPair;

pub const AUTH_FILE_NAME: &str = "auth.json";

/// Storage capability for the signed-in user's credentials.
///
/// Implementations must apply each mutating call as a unit: a reader never
/// observes a new access token paired with a stale refresh token from a
/// single [`TokenStore::update_tokens`] call.
pub trait TokenStore: Send + Sync {
    /// Current credentials, or `None` when nobody is signed in.
    fn load(&self) -> std::io::Result<Option<StoredAuth>>;

    /// Persist credentials from a fresh login, replacing whatever was stored.
    fn store_login(&self, username: &str, tokens: TokenPair) -> std::io::Result<()>;

    /// Replace the access token and, when present, the refresh token.
    fn update_tokens(
        &self,
        access_token: String,
        refresh_token: Option<String>,
    ) -> std::io::Result<StoredAuth>;

    /// Drop the credential pair but keep the display username.
    fn clear_tokens(&self) -> std::io::Result<()>;

    /// Remove all stored credentials. Returns `true` if anything was removed.
    fn clear(&self) -> std::io::Result<bool>;

    fn access_token(&self) -> Option<String> {
        self.load()
            .ok()
            .flatten()
            .and_then(|auth| auth.access_token().map(str::to_string))
    }

    fn refresh_token(&self) -> Option<String> {
        self.load()
            .ok()
            .flatten()
            .and_then(|auth| auth.refresh_token().map(str::to_string))
    }

    fn username(&self) -> Option<String> {
        self.load().ok().flatten().and_then(|auth| auth.username)
    }
}

fn login_record(username: &str, tokens: TokenPair) -> StoredAuth {
    StoredAuth {
        username: Some(username.to_string()),
        tokens: Some(tokens),
        last_refresh: Some(Utc::now()),
    }
}

fn missing_refresh_token() -> std::io::Error {
    std::io::Error::other("no stored refresh token to pair with the new access token")
}

/// Credentials kept in `auth.json` under the taskboard home directory.
#[derive(Debug)]
pub struct FileTokenStore {
    auth_file: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(taskboard_home: &Path) -> Self {
        Self {
            auth_file: get_auth_file(taskboard_home),
            lock: Mutex::new(()),
        }
    }

    pub fn auth_file(&self) -> &Path {
        &self.auth_file
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        // A poisoned lock only means another writer panicked; the file on disk
        // is still the source of truth.
        self.lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> std::io::Result<Option<StoredAuth>> {
        let _guard = self.guard();
        match try_read_auth_json(&self.auth_file) {
            Ok(auth) => Ok(Some(auth)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn store_login(&self, username: &str, tokens: TokenPair) -> std::io::Result<()> {
        let _guard = self.guard();
        write_auth_json(&self.auth_file, &login_record(username, tokens))
    }

    fn update_tokens(
        &self,
        access_token: String,
        refresh_token: Option<String>,
    ) -> std::io::Result<StoredAuth> {
        let _guard = self.guard();
        let current = match try_read_auth_json(&self.auth_file) {
            Ok(auth) => auth,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoredAuth::default(),
            Err(err) => {
                tracing::warn!(
                    "could not read {} before token update: {err}",
                    self.auth_file.display()
                );
                return Err(err);
            }
        };
        let updated = current
            .with_refreshed_tokens(access_token, refresh_token)
            .ok_or_else(missing_refresh_token)?;
        write_auth_json(&self.auth_file, &updated)?;
        Ok(updated)
    }

    fn clear_tokens(&self) -> std::io::Result<()> {
        let _guard = self.guard();
        let username = try_read_auth_json(&self.auth_file)
            .ok()
            .and_then(|auth| auth.username);
        match username {
            Some(username) => write_auth_json(
                &self.auth_file,
                &StoredAuth {
                    username: Some(username),
                    tokens: None,
                    last_refresh: None,
                },
            ),
            None => match std::fs::remove_file(&self.auth_file) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(err),
            },
        }
    }

    fn clear(&self) -> std::io::Result<bool> {
        let _guard = self.guard();
        match std::fs::remove_file(&self.auth_file) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// Process-local store, used by tests and by callers that never persist.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: Mutex<Option<StoredAuth>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(username: &str, tokens: TokenPair) -> Self {
        Self {
            inner: Mutex::new(Some(login_record(username, tokens))),
        }
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, Option<StoredAuth>> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> std::io::Result<Option<StoredAuth>> {
        Ok(self.guard().clone())
    }

    fn store_login(&self, username: &str, tokens: TokenPair) -> std::io::Result<()> {
        *self.guard() = Some(login_record(username, tokens));
        Ok(())
    }

    fn update_tokens(
        &self,
        access_token: String,
        refresh_token: Option<String>,
    ) -> std::io::Result<StoredAuth> {
        let mut guard = self.guard();
        let updated = guard
            .clone()
            .unwrap_or_default()
            .with_refreshed_tokens(access_token, refresh_token)
            .ok_or_else(missing_refresh_token)?;
        *guard = Some(updated.clone());
        Ok(updated)
    }

    fn clear_tokens(&self) -> std::io::Result<()> {
        if let Some(auth) = self.guard().as_mut() {
            auth.tokens = None;
            auth.last_refresh = None;
        }
        Ok(())
    }

    fn clear(&self) -> std::io::Result<bool> {
        Ok(self.guard().take().is_some())
    }
}

pub fn get_auth_file(taskboard_home: &Path) -> PathBuf {
    taskboard_home.join(AUTH_FILE_NAME)
}

/// Attempt to read and deserialize the `auth.json` file at the given path.
pub fn try_read_auth_json(auth_file: &Path) -> std::io::Result<StoredAuth> {
    let mut file = File::open(auth_file)?;
    let mut contents = String::new();
    use std::io::Read as _;
    file.read_to_string(&mut contents)?;
    let auth: StoredAuth = serde_json::from_str(&contents)?;
    Ok(auth)
}

pub(crate) fn write_auth_json(auth_file: &Path, auth: &StoredAuth) -> std::io::Result<()> {
    if let Some(parent) = auth_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json_data = serde_json::to_string_pretty(auth)?;
    let mut options = OpenOptions::new();
    options.truncate(true).write(true).create(true);
    #[cfg(unix)]
    {
        options.mode(0o600);
    }
    let mut file = options.open(auth_file)?;
    use std::io::Write as _;
    file.write_all(json_data.as_bytes())?;
    file.flush()?;
    Ok(())
}
