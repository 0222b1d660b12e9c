//! Persisted authentication store.
//!
//! # Design
//! - The token lives in memory behind a lock and is mirrored to a [`SessionStorage`].
//! - Cookies set by the server (the refresh cookie) are captured by [`SessionCookies`]
//!   and persisted with the token, so a later process can still refresh.
//! - Hydration reads storage once; the flag flips false → true exactly once per store.
//! - Consumers must not treat a missing token as "logged out" until hydrated.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{OnceCell, watch};
use tracing::{debug, warn};
use url::Url;

/// Fixed key under which session state is persisted.
pub const STORAGE_KEY: &str = "auth-storage";

/// Errors raised by session storage backends.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading or writing the backing file failed.
    #[error("session storage io failed for {path}")]
    Io {
        /// File involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The persisted document was not valid.
    #[error("session storage at {path} is corrupt")]
    Corrupt {
        /// File involved in the failure.
        path: PathBuf,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
    /// The session document could not be encoded.
    #[error("failed to encode session state")]
    Encode {
        /// Underlying encode error.
        #[source]
        source: serde_json::Error,
    },
}

/// Persisted document, shaped `{"state": {"token": ...}, "version": 0}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedSession {
    /// Session fields.
    #[serde(default)]
    pub state: SessionState,
    /// Document version.
    #[serde(default)]
    pub version: u32,
}

/// Persisted session fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionState {
    /// Bearer token, when logged in.
    #[serde(default)]
    pub token: Option<String>,
    /// Cookies the server set for this session.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<StoredCookie>,
}

impl PersistedSession {
    /// Document holding the given token.
    #[must_use]
    pub fn with_token(token: Option<String>) -> Self {
        Self {
            state: SessionState {
                token,
                cookies: Vec::new(),
            },
            version: 0,
        }
    }

    /// Attach captured cookies.
    #[must_use]
    pub fn with_cookies(mut self, cookies: Vec<StoredCookie>) -> Self {
        self.state.cookies = cookies;
        self
    }
}

/// A `Set-Cookie` header and the URL of the response that carried it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredCookie {
    /// Response URL.
    pub url: String,
    /// Raw header value.
    pub header: String,
}

impl StoredCookie {
    /// Cookie name, the text before the first `=`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.header
            .split(';')
            .next()
            .and_then(|pair| pair.split_once('='))
            .map_or("", |(name, _)| name.trim())
    }

    fn host(&self) -> Option<String> {
        Url::parse(&self.url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_owned))
    }

    /// A later cookie with the same name from the same host replaces this one.
    fn replaces(&self, other: &Self) -> bool {
        self.name() == other.name() && self.host() == other.host()
    }
}

/// Cookie jar handed to the HTTP client.
///
/// Matching and expiry are left to reqwest's [`Jar`]; the raw headers are kept on the
/// side so they can be written with the session and replayed on hydration.
#[derive(Default)]
pub struct SessionCookies {
    jar: RwLock<Arc<Jar>>,
    captured: Mutex<Vec<StoredCookie>>,
}

impl SessionCookies {
    /// Headers captured so far, oldest first.
    #[must_use]
    pub fn captured(&self) -> Vec<StoredCookie> {
        self.lock_captured().clone()
    }

    /// Load persisted cookies without overriding ones captured in this process.
    fn restore(&self, cookies: Vec<StoredCookie>) {
        let jar = self.jar();
        let mut captured = self.lock_captured();
        for cookie in cookies {
            if captured.iter().any(|existing| existing.replaces(&cookie)) {
                continue;
            }
            match Url::parse(&cookie.url) {
                Ok(url) => {
                    jar.add_cookie_str(&cookie.header, &url);
                    captured.push(cookie);
                }
                Err(err) => {
                    warn!(url = %cookie.url, error = %err, "dropping persisted cookie");
                }
            }
        }
    }

    fn clear(&self) {
        *self.jar.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(Jar::default());
        self.lock_captured().clear();
    }

    fn jar(&self) -> Arc<Jar> {
        Arc::clone(&self.jar.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn lock_captured(&self) -> std::sync::MutexGuard<'_, Vec<StoredCookie>> {
        self.captured.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CookieStore for SessionCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let headers: Vec<&HeaderValue> = cookie_headers.collect();
        {
            let mut captured = self.lock_captured();
            for header in &headers {
                let Ok(raw) = header.to_str() else {
                    debug!(url = %url, "ignoring non-ascii set-cookie header");
                    continue;
                };
                let cookie = StoredCookie {
                    url: url.to_string(),
                    header: raw.to_string(),
                };
                captured.retain(|existing| !existing.replaces(&cookie));
                captured.push(cookie);
            }
        }
        self.jar().set_cookies(&mut headers.into_iter(), url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.jar().cookies(url)
    }
}

impl std::fmt::Debug for SessionCookies {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SessionCookies")
            .field("captured", &self.lock_captured().len())
            .finish_non_exhaustive()
    }
}

/// Backend that persists session state between runs.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Read the stored session, if any.
    async fn load(&self) -> Result<Option<PersistedSession>, SessionError>;
    /// Replace the stored session.
    async fn save(&self, session: &PersistedSession) -> Result<(), SessionError>;
    /// Remove the stored session.
    async fn clear(&self) -> Result<(), SessionError>;
}

/// JSON file storage.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    /// Storage backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn load(&self) -> Result<Option<PersistedSession>, SessionError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| SessionError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    async fn save(&self, session: &PersistedSession) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| self.io_error(err))?;
        }
        let bytes =
            serde_json::to_vec_pretty(session).map_err(|source| SessionError::Encode { source })?;
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, bytes)
            .await
            .map_err(|err| self.io_error(err))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|err| self.io_error(err))
    }

    async fn clear(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_error(err)),
        }
    }
}

/// Process-local storage, used by tests and embedders without a filesystem.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    slot: Mutex<Option<PersistedSession>>,
}

impl MemorySessionStorage {
    /// Storage pre-populated with a token.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(PersistedSession::with_token(Some(token.into())))),
        }
    }

    /// Snapshot of the stored document.
    #[must_use]
    pub fn snapshot(&self) -> Option<PersistedSession> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn load(&self) -> Result<Option<PersistedSession>, SessionError> {
        Ok(self.snapshot())
    }

    async fn save(&self, session: &PersistedSession) -> Result<(), SessionError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Shared authentication store.
#[derive(Clone)]
pub struct AuthStore {
    inner: Arc<AuthInner>,
}

struct AuthInner {
    storage: Arc<dyn SessionStorage>,
    token: RwLock<Option<String>>,
    cookies: Arc<SessionCookies>,
    hydrated: watch::Sender<bool>,
    hydration: OnceCell<()>,
}

impl AuthStore {
    /// Store persisting through the given backend. Starts un-hydrated.
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        let (hydrated, _) = watch::channel(false);
        Self {
            inner: Arc::new(AuthInner {
                storage,
                token: RwLock::new(None),
                cookies: Arc::new(SessionCookies::default()),
                hydrated,
                hydration: OnceCell::new(),
            }),
        }
    }

    /// Store backed by a JSON file.
    #[must_use]
    pub fn file_backed(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileSessionStorage::new(path)))
    }

    /// Store backed by process memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStorage::default()))
    }

    /// Restore the persisted token and mark the store hydrated.
    ///
    /// Storage is read at most once; concurrent and repeated calls resolve once the
    /// first hydration has finished. Unreadable storage hydrates as logged out.
    pub async fn hydrate(&self) {
        self.inner
            .hydration
            .get_or_init(|| async {
                match self.inner.storage.load().await {
                    Ok(Some(session)) => {
                        {
                            let mut token = self.write_token();
                            if token.is_none() {
                                *token = session.state.token.filter(|value| !value.is_empty());
                            }
                        }
                        self.inner.cookies.restore(session.state.cookies);
                    }
                    Ok(None) => debug!("no persisted session found"),
                    Err(err) => warn!(error = %err, "failed to restore session; continuing logged out"),
                }
                self.inner.hydrated.send_replace(true);
            })
            .await;
    }

    /// Cookie jar to install on the HTTP client.
    #[must_use]
    pub fn cookies(&self) -> Arc<SessionCookies> {
        Arc::clone(&self.inner.cookies)
    }

    /// Whether hydration has completed.
    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        *self.inner.hydrated.borrow()
    }

    /// Wait until another task has hydrated the store.
    pub async fn wait_hydrated(&self) {
        let mut receiver = self.inner.hydrated.subscribe();
        // The sender lives as long as `self`, so this only resolves on hydration.
        let _ = receiver.wait_for(|hydrated| *hydrated).await;
    }

    /// Observe the hydration flag.
    #[must_use]
    pub fn subscribe_hydration(&self) -> watch::Receiver<bool> {
        self.inner.hydrated.subscribe()
    }

    /// Current bearer token.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a token is held. Only meaningful once hydrated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Replace the token and persist it with the captured cookies.
    ///
    /// # Errors
    ///
    /// Returns the storage error; the in-memory token is updated regardless.
    pub async fn set_token(&self, token: impl Into<String>) -> Result<(), SessionError> {
        let token = token.into();
        *self.write_token() = Some(token.clone());
        self.inner
            .storage
            .save(
                &PersistedSession::with_token(Some(token))
                    .with_cookies(self.inner.cookies.captured()),
            )
            .await
    }

    /// Drop the token and cookies and remove persisted state.
    ///
    /// # Errors
    ///
    /// Returns the storage error; the in-memory token is cleared regardless.
    pub async fn logout(&self) -> Result<(), SessionError> {
        *self.write_token() = None;
        self.inner.cookies.clear();
        self.inner.storage.clear().await
    }

    fn write_token(&self) -> std::sync::RwLockWriteGuard<'_, Option<String>> {
        self.inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AuthStore")
            .field("hydrated", &self.is_hydrated())
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingStorage {
        loads: AtomicUsize,
        inner: MemorySessionStorage,
    }

    #[async_trait]
    impl SessionStorage for CountingStorage {
        async fn load(&self) -> Result<Option<PersistedSession>, SessionError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.inner.load().await
        }

        async fn save(&self, session: &PersistedSession) -> Result<(), SessionError> {
            self.inner.save(session).await
        }

        async fn clear(&self) -> Result<(), SessionError> {
            self.inner.clear().await
        }
    }

    #[tokio::test]
    async fn hydration_restores_token_and_flips_once() {
        let storage = Arc::new(CountingStorage {
            loads: AtomicUsize::new(0),
            inner: MemorySessionStorage::with_token("persisted"),
        });
        let store = AuthStore::new(storage.clone());
        assert!(!store.is_hydrated());
        assert!(!store.is_authenticated());

        let mut flag = store.subscribe_hydration();
        tokio::join!(store.hydrate(), store.hydrate(), store.wait_hydrated());
        store.hydrate().await;

        assert!(store.is_hydrated());
        assert_eq!(store.token().as_deref(), Some("persisted"));
        assert_eq!(storage.loads.load(Ordering::SeqCst), 1);
        assert!(flag.has_changed().expect("sender alive"));
        assert!(*flag.borrow_and_update());
        assert!(!flag.has_changed().expect("sender alive"));
    }

    #[tokio::test]
    async fn hydration_keeps_token_set_before_restore() {
        let store = AuthStore::new(Arc::new(MemorySessionStorage::with_token("stale")));
        store.set_token("fresh").await.expect("save");
        store.hydrate().await;
        assert_eq!(store.token().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn file_storage_round_trips_and_clears() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("auth-storage.json");
        let store = AuthStore::file_backed(&path);
        store.hydrate().await;
        assert!(!store.is_authenticated());

        store.set_token("abc").await.expect("save");
        let raw = std::fs::read_to_string(&path).expect("file written");
        let doc: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(doc["state"]["token"], "abc");

        let reloaded = AuthStore::file_backed(&path);
        reloaded.hydrate().await;
        assert_eq!(reloaded.token().as_deref(), Some("abc"));

        reloaded.logout().await.expect("clear");
        assert!(!path.exists());
        assert!(!reloaded.is_authenticated());
        reloaded.logout().await.expect("clearing twice is fine");
    }

    #[tokio::test]
    async fn persisted_cookies_are_replayed_and_cleared_on_logout() {
        let login_url = "http://127.0.0.1:8000/api/v1/auth/login";
        let refresh_url = Url::parse("http://127.0.0.1:8000/api/v1/auth/refresh").expect("url");
        let storage = MemorySessionStorage::default();
        storage
            .save(
                &PersistedSession::with_token(Some("abc".into())).with_cookies(vec![
                    StoredCookie {
                        url: login_url.into(),
                        header: "refresh_token=r1; Path=/api/v1/auth/refresh; HttpOnly".into(),
                    },
                ]),
            )
            .await
            .expect("save");
        let storage = Arc::new(storage);
        let store = AuthStore::new(storage.clone());
        store.hydrate().await;

        let cookies = store.cookies();
        assert_eq!(cookies.captured()[0].name(), "refresh_token");
        let header = cookies.cookies(&refresh_url).expect("cookie sent to refresh");
        assert_eq!(header.to_str().expect("ascii"), "refresh_token=r1");
        let home = Url::parse("http://127.0.0.1:8000/api/v1/folders/").expect("url");
        assert!(cookies.cookies(&home).is_none());

        let rotated = HeaderValue::from_static("refresh_token=r2; Path=/api/v1/auth/refresh");
        cookies.set_cookies(&mut std::iter::once(&rotated), &refresh_url);
        store.set_token("def").await.expect("save");
        let saved = storage.snapshot().expect("persisted");
        assert_eq!(saved.state.cookies.len(), 1);
        assert!(saved.state.cookies[0].header.starts_with("refresh_token=r2"));

        store.logout().await.expect("clear");
        assert!(cookies.cookies(&refresh_url).is_none());
        assert!(cookies.captured().is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_hydrates_logged_out() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("auth-storage.json");
        std::fs::write(&path, "{not json").expect("write");
        let storage = FileSessionStorage::new(&path);
        assert!(matches!(
            storage.load().await,
            Err(SessionError::Corrupt { .. })
        ));

        let store = AuthStore::new(Arc::new(storage));
        store.hydrate().await;
        assert!(store.is_hydrated());
        assert!(!store.is_authenticated());
    }
}
