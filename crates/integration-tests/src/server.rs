//! Local axum server with canned responses.
//!
//! Every request lands in a fallback handler that records it and replies
//! with whatever was registered for its method and target.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use aurum_storefront::api::ApiClient;
use aurum_storefront::config::ApiConfig;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A request as seen by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query, e.g. `/v1/wishlist/check/7`.
    pub target: String,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Default)]
struct Routes {
    responses: HashMap<String, (u16, String)>,
    requests: Vec<RecordedRequest>,
}

type SharedRoutes = Arc<Mutex<Routes>>;

/// Canned-response server bound to an ephemeral local port.
pub struct TestServer {
    addr: SocketAddr,
    routes: SharedRoutes,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes = SharedRoutes::default();

        let app = Router::new()
            .fallback(canned_response)
            .with_state(Arc::clone(&routes));
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            routes,
            handle,
        }
    }

    /// Respond to `method` on `target` (path under `/v1`, with query).
    pub fn respond(&self, method: &str, target: &str, status: u16, body: &str) {
        self.lock()
            .responses
            .insert(format!("{method} /v1{target}"), (status, body.to_string()));
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// `"METHOD target"` for each request received so far.
    pub fn request_lines(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| format!("{} {}", r.method, r.target))
            .collect()
    }

    /// Base URL with a path prefix, as configured in production.
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// A real API client pointed at this server.
    pub fn client(&self) -> ApiClient {
        let config = ApiConfig::new(&self.base_url(), Duration::from_secs(5)).unwrap();
        ApiClient::new(&config).unwrap()
    }

    fn lock(&self) -> MutexGuard<'_, Routes> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn canned_response(
    State(routes): State<SharedRoutes>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let target = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string);
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let (status, response_body) = {
        let mut routes = routes.lock().unwrap_or_else(PoisonError::into_inner);
        let key = format!("{method} {target}");
        routes.requests.push(RecordedRequest {
            method: method.to_string(),
            target,
            authorization,
            body,
        });
        routes
            .responses
            .get(&key)
            .cloned()
            .unwrap_or_else(|| (404, r#"{"message":"Not found"}"#.to_string()))
    };

    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        response_body,
    )
        .into_response()
}
