//! HTTP transport with authentication interceptors.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, trace, warn};

use coursedesk_core::error::{ApiError, AuthError, Error, InvalidInputError, TransportError};
use coursedesk_core::{AccessToken, RefreshToken, Result, TokenPair, TokenStore};

use crate::config::ClientConfig;
use crate::endpoints::{REFRESH, RefreshRequest, RefreshResponse, is_auth_endpoint};
use crate::refresh::RefreshFlight;

/// Session-level signals for whoever presents the login screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// The server rejected the session and it could not be renewed.
    SessionExpired,
    /// The user logged out.
    LoggedOut,
}

/// An outgoing request and whether it was already replayed after a refresh.
#[derive(Clone)]
pub struct PendingRequest {
    method: Method,
    path: String,
    body: Option<serde_json::Value>,
    authorization: Option<String>,
    retried: bool,
}

impl PendingRequest {
    /// Create a request for a path relative to the API base.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            authorization: None,
            retried: false,
        }
    }

    /// Attach a JSON body.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(|e| InvalidInputError::Other {
            message: format!("unserializable request body: {}", e),
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Whether this request has already been replayed once.
    pub fn retried(&self) -> bool {
        self.retried
    }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("authorization", &self.authorization.as_ref().map(|_| "[REDACTED]"))
            .field("retried", &self.retried)
            .finish()
    }
}

/// What the incoming interceptor decided.
enum Intercept {
    Done(Response),
    Replay,
}

/// Authenticated client for the REST backend.
///
/// Cheap to clone; clones share the token store, the refresh state and the
/// event channel.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

type EventHook = Box<dyn Fn(AuthEvent) + Send + Sync>;

struct ClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    store: Arc<dyn TokenStore>,
    refresh: RefreshFlight,
    events: broadcast::Sender<AuthEvent>,
    hooks: Mutex<Vec<EventHook>>,
}

fn transport(err: reqwest::Error) -> Error {
    let message = err.to_string();
    let err = if err.is_timeout() {
        TransportError::Timeout { message }
    } else if err.is_connect() {
        TransportError::Connection { message }
    } else if err.is_decode() {
        TransportError::Decode { message }
    } else {
        TransportError::Http { message }
    };
    Error::Transport(err)
}

/// Turn a non-success response into an [`ApiError`], keeping the body.
async fn api_error(response: Response) -> ApiError {
    let status = response.status().as_u16();

    match response.bytes().await {
        Ok(bytes) if !bytes.is_empty() => match serde_json::from_slice(&bytes) {
            Ok(body) => ApiError::new(status, Some(body)),
            Err(_) => {
                let mut error = ApiError::new(status, None);
                error.detail = Some(String::from_utf8_lossy(&bytes).trim().to_string());
                error
            }
        },
        _ => ApiError::new(status, None),
    }
}

async fn decode<R: DeserializeOwned>(response: Response) -> Result<R> {
    response.json::<R>().await.map_err(|e| {
        Error::Transport(TransportError::Decode {
            message: e.to_string(),
        })
    })
}

impl ApiClient {
    /// Create a client over the given token store.
    pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(transport)?;

        let (events, _) = broadcast::channel(16);

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                config,
                store,
                refresh: RefreshFlight::default(),
                events,
                hooks: Mutex::default(),
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.store
    }

    /// Subscribe to session-level signals.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.events.subscribe()
    }

    /// Run `hook` synchronously on every event, before broadcast
    /// subscribers see it.
    pub(crate) fn on_event(&self, hook: impl Fn(AuthEvent) + Send + Sync + 'static) {
        self.inner
            .hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(hook));
    }

    pub(crate) fn emit(&self, event: AuthEvent) {
        debug!(?event, "Emitting auth event");
        for hook in self
            .inner
            .hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            hook(event);
        }
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    /// Send a request through both interceptors.
    ///
    /// Non-success statuses come back as [`Error::Api`]. A 401 outside the
    /// login and refresh endpoints renews the session once and replays the
    /// request; the caller sees the replay's outcome.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, mut request: PendingRequest) -> Result<Response> {
        loop {
            self.attach_token(&mut request);
            let response = self.dispatch(&request).await?;

            match self.intercept(&mut request, response).await? {
                Intercept::Done(response) => return Ok(response),
                Intercept::Replay => debug!("Replaying request with renewed token"),
            }
        }
    }

    /// Outgoing interceptor.
    fn attach_token(&self, request: &mut PendingRequest) {
        if let Some(token) = self.inner.store.access_token() {
            request.authorization = Some(token.bearer());
        }
    }

    async fn dispatch(&self, request: &PendingRequest) -> Result<Response> {
        let url = self.inner.config.endpoint(&request.path)?;
        trace!(%url, authorized = request.authorization.is_some(), "Dispatching request");

        let mut builder = self.inner.http.request(request.method.clone(), url);
        if let Some(ref authorization) = request.authorization {
            builder = builder.header(AUTHORIZATION, authorization.as_str());
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        builder.send().await.map_err(transport)
    }

    /// Incoming interceptor.
    async fn intercept(&self, request: &mut PendingRequest, response: Response) -> Result<Intercept> {
        let status = response.status();
        trace!(%status, "Response received");

        if status.is_success() {
            return Ok(Intercept::Done(response));
        }

        let error = api_error(response).await;

        if status != StatusCode::UNAUTHORIZED || request.retried || is_auth_endpoint(&request.path)
        {
            return Err(error.into());
        }

        request.retried = true;

        // Someone else renewed the session while this request was in flight.
        if let Some(current) = self.inner.store.access_token().map(|t| t.bearer())
            && request.authorization.as_deref() != Some(current.as_str())
        {
            debug!("Access token changed since dispatch, replaying without refresh");
            request.authorization = Some(current);
            return Ok(Intercept::Replay);
        }

        if self.inner.store.refresh_token().is_none() {
            warn!("Session rejected and no refresh token is stored");
            self.inner.store.clear();
            self.emit(AuthEvent::SessionExpired);
            return Err(error.into());
        }

        match self.refresh().await {
            Ok(pair) => {
                request.authorization = Some(pair.access.bearer());
                Ok(Intercept::Replay)
            }
            Err(e) => {
                self.emit(AuthEvent::SessionExpired);
                Err(e)
            }
        }
    }

    /// Exchange the stored refresh token for a new pair.
    ///
    /// Concurrent callers share one refresh call. On failure both tokens are
    /// cleared.
    pub async fn refresh(&self) -> Result<TokenPair> {
        let inner = Arc::clone(&self.inner);
        self.inner
            .refresh
            .run(move || async move { inner.refresh_once().await }.boxed())
            .await
    }

    /// GET a JSON resource.
    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let response = self.send(PendingRequest::new(Method::GET, path)).await?;
        decode(response).await
    }

    /// POST a JSON body and decode the JSON reply.
    pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = PendingRequest::new(Method::POST, path).with_json(body)?;
        decode(self.send(request).await?).await
    }

    /// PUT a JSON body and decode the JSON reply.
    pub async fn put<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = PendingRequest::new(Method::PUT, path).with_json(body)?;
        decode(self.send(request).await?).await
    }

    /// DELETE a resource, ignoring any reply body.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(PendingRequest::new(Method::DELETE, path))
            .await
            .map(|_| ())
    }
}

impl ClientInner {
    #[instrument(skip(self))]
    async fn refresh_once(&self) -> Result<TokenPair> {
        info!("Refreshing session tokens");

        match self.request_refresh().await {
            Ok(pair) => {
                self.store.set(&pair);
                debug!("Session tokens renewed");
                Ok(pair)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing stored tokens");
                self.store.clear();
                Err(e)
            }
        }
    }

    /// The refresh call itself; bypasses the interceptors.
    async fn request_refresh(&self) -> Result<TokenPair> {
        let refresh_token = self
            .store
            .refresh_token()
            .ok_or(AuthError::RefreshTokenMissing)?;

        let url = self.config.endpoint(REFRESH)?;
        let response = self
            .http
            .post(url)
            .json(&RefreshRequest {
                refresh: refresh_token.as_str(),
            })
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(api_error(response).await.into());
        }

        let body: RefreshResponse = decode(response).await?;

        // Without rotation the server returns only a new access token.
        Ok(TokenPair {
            access: AccessToken::new(body.access),
            refresh: body.refresh.map(RefreshToken::new).unwrap_or(refresh_token),
        })
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url().as_str())
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}
