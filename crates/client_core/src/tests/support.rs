use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    Json, Router,
};
use serde_json::Value;
use tokio::net::TcpListener;

use crate::{AuthenticatedClient, ClientConfig, Session};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Debug, Clone)]
struct Canned {
    status: u16,
    body: Value,
    delay: Option<Duration>,
}

/// Scripted fake of the console backend. Responses are queued per route; the
/// last queued response for a route keeps answering.
#[derive(Clone, Default)]
pub struct FakeBackend {
    requests: Arc<Mutex<Vec<Recorded>>>,
    responses: Arc<Mutex<HashMap<(String, String), VecDeque<Canned>>>>,
}

impl FakeBackend {
    pub fn respond(&self, method: &str, route: &str, status: u16, body: Value) -> &Self {
        self.push(method, route, Canned {
            status,
            body,
            delay: None,
        })
    }

    pub fn respond_after(
        &self,
        method: &str,
        route: &str,
        delay: Duration,
        status: u16,
        body: Value,
    ) -> &Self {
        self.push(method, route, Canned {
            status,
            body,
            delay: Some(delay),
        })
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == method && request.path == path)
            .collect()
    }

    fn push(&self, method: &str, route: &str, canned: Canned) -> &Self {
        self.responses
            .lock()
            .expect("responses lock")
            .entry((method.to_string(), route.to_string()))
            .or_default()
            .push_back(canned);
        self
    }

    fn next_response(&self, method: &str, path: &str, query: Option<&str>) -> Option<Canned> {
        let mut responses = self.responses.lock().expect("responses lock");
        let with_query = query.map(|query| (method.to_string(), format!("{path}?{query}")));
        let key = with_query
            .filter(|key| responses.contains_key(key))
            .unwrap_or_else(|| (method.to_string(), path.to_string()));
        let queue = responses.get_mut(&key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

async fn handle(
    State(backend): State<FakeBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let path = uri.path().to_string();
    let query = uri.query().map(str::to_string);
    backend.requests.lock().expect("requests lock").push(Recorded {
        method: method.to_string(),
        path: path.clone(),
        query: query.clone(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    let Some(canned) = backend.next_response(method.as_str(), &path, query.as_deref()) else {
        return (StatusCode::NOT_FOUND, Json(Value::Null));
    };
    if let Some(delay) = canned.delay {
        tokio::time::sleep(delay).await;
    }
    (
        StatusCode::from_u16(canned.status).expect("valid status"),
        Json(canned.body),
    )
}

pub async fn spawn_backend(backend: FakeBackend) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new().fallback(handle).with_state(backend);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

pub async fn spawn_router(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

pub fn client_with_timeout(base_url: &str, timeout: Duration) -> Arc<AuthenticatedClient> {
    AuthenticatedClient::new(
        ClientConfig {
            base_url: base_url.to_string(),
            timeout,
        },
        Arc::new(Session::in_memory()),
    )
    .expect("client")
}

pub fn client_for(base_url: &str) -> Arc<AuthenticatedClient> {
    client_with_timeout(base_url, Duration::from_secs(5))
}

pub fn signed_in_client(base_url: &str, token: &str) -> Arc<AuthenticatedClient> {
    let client = client_for(base_url);
    client.session().set_session(token, None);
    client
}
