//! Shared REST client with bearer injection and single-flight token refresh.
//!
//! # Design
//! - Requests are plain data ([`ApiRequest`]) so a rejected call can be replayed.
//! - A `401` starts at most one refresh; other `401`s queue behind it.
//! - The refresh task replays the queue in arrival order, each request exactly once.
//! - A failed refresh rejects the whole queue, clears the session, and redirects to login.

use std::sync::Arc;

use flashdeck_api_models::{ErrorBody, Token};
use flashdeck_config::ClientConfig;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ApiError, ApiResult};
use crate::navigation::{Navigator, Route};
use crate::session::AuthStore;

/// Relative path of the refresh endpoint.
pub(crate) const REFRESH_PATH: &str = "auth/refresh";

#[derive(Debug, Clone, PartialEq)]
enum RequestBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

/// A replayable REST request relative to the client's base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: RequestBody,
    refreshable: bool,
}

impl ApiRequest {
    /// Request with the given method and relative path (no leading `/`).
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            refreshable: true,
        }
    }

    /// `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT` request.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `DELETE` request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query pair. Repeated keys are kept.
    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Encode`] when the body cannot be serialised.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> ApiResult<Self> {
        let value = serde_json::to_value(body).map_err(|err| ApiError::Encode {
            path: self.path.clone(),
            message: err.to_string(),
        })?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    /// Attach a form-encoded body.
    #[must_use]
    pub fn form(mut self, pairs: &[(&str, &str)]) -> Self {
        self.body = RequestBody::Form(
            pairs
                .iter()
                .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
                .collect(),
        );
        self
    }

    /// Surface `401` directly instead of refreshing (login, registration).
    #[must_use]
    pub const fn without_refresh(mut self) -> Self {
        self.refreshable = false;
        self
    }

    /// Relative path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Query pairs in the order they will be encoded.
    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }
}

/// Cloneable handle to the shared REST client.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: Client,
    base_url: Url,
    auth: AuthStore,
    navigator: Navigator,
    refresh: Mutex<RefreshGate>,
}

#[derive(Default)]
struct RefreshGate {
    in_flight: bool,
    queue: Vec<PendingReplay>,
}

struct PendingReplay {
    request: ApiRequest,
    reply: oneshot::Sender<ApiResult<Response>>,
}

impl ApiClient {
    /// Client over an existing `reqwest` client.
    ///
    /// The base URL is normalised to end with `/` so relative paths extend it.
    #[must_use]
    pub fn new(http: Client, mut base_url: Url, auth: AuthStore, navigator: Navigator) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                auth,
                navigator,
                refresh: Mutex::new(RefreshGate::default()),
            }),
        }
    }

    /// Client configured from [`ClientConfig`].
    ///
    /// The auth store's cookie jar is installed so the refresh cookie set at login
    /// is sent back, and persisted with the session.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the HTTP client cannot be built.
    pub fn from_config(
        config: &ClientConfig,
        auth: AuthStore,
        navigator: Navigator,
    ) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .cookie_provider(auth.cookies())
            .build()
            .map_err(|err| ApiError::ClientBuild {
                message: err.to_string(),
            })?;
        Ok(Self::new(http, config.api_url.clone(), auth, navigator))
    }

    /// Authentication store used for bearer tokens.
    #[must_use]
    pub fn auth(&self) -> &AuthStore {
        &self.inner.auth
    }

    /// Navigator receiving redirects.
    #[must_use]
    pub fn navigator(&self) -> &Navigator {
        &self.inner.navigator
    }

    /// Base URL every request path is joined onto.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Send a request, refreshing the session once on `401`.
    ///
    /// Non-success statuses other than a recoverable `401` are returned as responses;
    /// use [`ApiClient::fetch_json`] or [`ApiClient::fetch_empty`] to map them to errors.
    ///
    /// # Errors
    ///
    /// Transport failures, or the refresh error when the session could not be renewed.
    pub async fn execute(&self, request: ApiRequest) -> ApiResult<Response> {
        let sent_with = self.inner.auth.token();
        let response = self.dispatch(&request, sent_with.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED || !request.refreshable {
            return Ok(response);
        }
        self.recover_unauthorized(request, sent_with).await
    }

    /// Send a request and decode a JSON success body.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`]; non-success statuses map to [`ApiError::Status`].
    pub async fn fetch_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let path = request.path.clone();
        let response = self.execute(request).await?;
        decode_json(response, &path).await
    }

    /// Send a request whose success body is ignored.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`]; non-success statuses map to [`ApiError::Status`].
    pub async fn fetch_empty(&self, request: ApiRequest) -> ApiResult<()> {
        let path = request.path.clone();
        let response = self.execute(request).await?;
        ensure_success(response, &path).await.map(|_| ())
    }

    /// Ask the server for a new access token using the refresh cookie.
    ///
    /// The call bypasses the `401` handling and does not touch the session.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the refresh endpoint.
    pub async fn request_refresh(&self) -> ApiResult<Token> {
        let request = ApiRequest::post(REFRESH_PATH).without_refresh();
        let current = self.inner.auth.token();
        let response = self.dispatch(&request, current.as_deref()).await?;
        decode_json(response, REFRESH_PATH).await
    }

    async fn recover_unauthorized(
        &self,
        request: ApiRequest,
        sent_with: Option<String>,
    ) -> ApiResult<Response> {
        let path = request.path.clone();
        let (reply, receiver) = oneshot::channel();
        {
            let mut gate = self.inner.refresh.lock().await;
            if !gate.in_flight {
                let renewed = self
                    .inner
                    .auth
                    .token()
                    .filter(|current| sent_with.as_ref() != Some(current));
                if let Some(current) = renewed {
                    drop(gate);
                    debug!(path = %path, "token renewed while request was in flight; replaying");
                    return self.dispatch(&request, Some(&current)).await;
                }
                gate.in_flight = true;
                let coordinator = self.clone();
                tokio::spawn(async move { coordinator.run_refresh().await });
            }
            debug!(path = %path, queued = gate.queue.len() + 1, "request waiting for token refresh");
            gate.queue.push(PendingReplay { request, reply });
        }
        receiver
            .await
            .unwrap_or_else(|_| Err(ApiError::ReplayDropped { path }))
    }

    async fn run_refresh(self) {
        info!("access token rejected; refreshing session");
        let outcome = self.request_refresh().await.map(|token| token.access_token);
        if let Ok(token) = &outcome {
            if let Err(err) = self.inner.auth.set_token(token.clone()).await {
                warn!(error = %err, "failed to persist refreshed token");
            }
        }

        let queued = {
            let mut gate = self.inner.refresh.lock().await;
            gate.in_flight = false;
            std::mem::take(&mut gate.queue)
        };

        match outcome {
            Ok(token) => {
                info!(replayed = queued.len(), "session refreshed; replaying requests");
                for pending in queued {
                    let result = self.dispatch(&pending.request, Some(&token)).await;
                    let _ = pending.reply.send(result);
                }
            }
            Err(err) => {
                warn!(error = %err, rejected = queued.len(), "session refresh failed; logging out");
                if let Err(storage) = self.inner.auth.logout().await {
                    warn!(error = %storage, "failed to clear persisted session");
                }
                self.inner.navigator.navigate(Route::Login);
                let failure = ApiError::RefreshFailed {
                    cause: Box::new(err),
                };
                for pending in queued {
                    let _ = pending.reply.send(Err(failure.clone()));
                }
            }
        }
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> ApiResult<Response> {
        let url = self.url_for(request)?;
        let mut builder = self.inner.http.request(request.method.clone(), url);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(pairs) => builder.form(pairs),
        };
        debug!(method = %request.method, path = %request.path, "sending request");
        builder.send().await.map_err(|err| ApiError::Transport {
            path: request.path.clone(),
            message: err.to_string(),
        })
    }

    fn url_for(&self, request: &ApiRequest) -> ApiResult<Url> {
        let mut url =
            self.inner
                .base_url
                .join(&request.path)
                .map_err(|err| ApiError::InvalidPath {
                    path: request.path.clone(),
                    message: err.to_string(),
                })?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("auth", &self.inner.auth)
            .finish_non_exhaustive()
    }
}

async fn ensure_success(response: Response, path: &str) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let bytes = response.bytes().await.unwrap_or_default();
    let detail = serde_json::from_slice::<ErrorBody>(&bytes)
        .ok()
        .and_then(|body| body.message())
        .or_else(|| {
            let text = String::from_utf8_lossy(&bytes).trim().to_string();
            (!text.is_empty()).then_some(text)
        });
    Err(ApiError::Status {
        path: path.to_string(),
        status: status.as_u16(),
        detail,
    })
}

async fn decode_json<T: DeserializeOwned>(response: Response, path: &str) -> ApiResult<T> {
    let response = ensure_success(response, path).await?;
    response.json::<T>().await.map_err(|err| ApiError::Decode {
        path: path.to_string(),
        message: err.to_string(),
    })
}
