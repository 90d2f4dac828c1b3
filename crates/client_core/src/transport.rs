//! The single HTTP entry point: bearer injection, status classification, and
//! session teardown on 401.

use std::{sync::Arc, time::Duration, time::Instant};

use anyhow::Context;
use reqwest::{header, Client, Method, StatusCode};
use serde_json::Value;
use shared::error::ApiErrorBody;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    error::ClientError,
    session::{Session, SessionEvent},
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:7070";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Sent without a bearer token, e.g. sign-in.
    pub anonymous: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            anonymous: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// Decoded JSON body; `Null` when empty, a JSON string when the body was not JSON.
    pub body: Value,
}

pub struct AuthenticatedClient {
    http: Client,
    base_url: Url,
    session: Arc<Session>,
    events: broadcast::Sender<SessionEvent>,
}

impl AuthenticatedClient {
    pub fn new(config: ClientConfig, session: Arc<Session>) -> anyhow::Result<Arc<Self>> {
        let base_url = Url::parse(config.base_url.trim())
            .with_context(|| format!("invalid base url '{}'", config.base_url))?;
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build http client")?;
        let (events, _) = broadcast::channel(64);
        Ok(Arc::new(Self {
            http,
            base_url,
            session,
            events,
        }))
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn subscribe_session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // No subscribers is fine; the event is advisory.
        let _ = self.events.send(event);
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse, ClientError> {
        let mut request = ApiRequest::new(method, path);
        request.body = body;
        self.execute(request).await
    }

    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let url = self.url_for(&request.path);
        let token = if request.anonymous {
            None
        } else {
            self.session.get_token()
        };

        debug!(
            method = %request.method,
            url = %url,
            token_attached = token.is_some(),
            "sending request"
        );
        if token.is_none() && !request.anonymous {
            warn!(path = %request.path, "no session token; sending unauthenticated request");
        }

        let mut builder = self
            .http
            .request(request.method.clone(), url.as_str())
            .header(header::CONTENT_TYPE, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    method = %request.method,
                    path = %request.path,
                    timed_out = err.is_timeout(),
                    error = %err,
                    "request failed before a response arrived"
                );
                return Err(ClientError::from_transport(&err));
            }
        };

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| ClientError::from_transport(&err))?;
        let body = decode_body(&text);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if status.is_success() {
            info!(
                method = %request.method,
                path = %request.path,
                status = status.as_u16(),
                elapsed_ms,
                "request completed"
            );
            return Ok(ApiResponse { status, body });
        }

        warn!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            elapsed_ms,
            "request rejected"
        );

        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized(token.as_deref());
        }

        Err(ClientError::from_status(
            status.as_u16(),
            &request.path,
            ApiErrorBody::message_from(&body),
        ))
    }

    fn handle_unauthorized(&self, sent_token: Option<&str>) {
        let Some(sent_token) = sent_token else {
            return;
        };
        if self.session.invalidate_if_current(sent_token) {
            warn!("session rejected by server; signing out");
            self.emit(SessionEvent::Expired);
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod body_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_body_handles_empty_json_and_text() {
        assert_eq!(decode_body(""), Value::Null);
        assert_eq!(decode_body(" \n"), Value::Null);
        assert_eq!(decode_body("{\"ok\":true}"), json!({"ok": true}));
        assert_eq!(decode_body("<html>"), Value::String("<html>".into()));
    }

    #[test]
    fn url_for_joins_without_double_slashes() {
        let client = AuthenticatedClient::new(
            ClientConfig {
                base_url: "http://localhost:7070/".into(),
                timeout: DEFAULT_TIMEOUT,
            },
            Arc::new(Session::in_memory()),
        )
        .expect("client");
        assert!(AuthenticatedClient::new(
            ClientConfig {
                base_url: "not a url".into(),
                timeout: DEFAULT_TIMEOUT,
            },
            Arc::new(Session::in_memory()),
        )
        .is_err());
        assert_eq!(
            client.url_for("/api/staff/all-admins"),
            "http://localhost:7070/api/staff/all-admins"
        );
        assert_eq!(
            client.url_for("api/course/get-courses"),
            "http://localhost:7070/api/course/get-courses"
        );
    }
}
