#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::post;
use collegia_core::{NewSubscription, Subscription, TenantId};
use collegia_registry::{SubscriptionRegistry, SubscriptionStore};
use collegia_registry_memory::MemorySubscriptionStore;
use tokio::sync::mpsc;

/// A request observed by [`TestReceiver`].
#[derive(Debug)]
pub struct Captured {
    /// Path and query, e.g. `/ok?sub=a`.
    pub target: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("body should be JSON")
    }
}

/// Local HTTP endpoint recording every webhook it receives.
///
/// - `POST /ok`: 200
/// - `POST /fail`: 500
/// - `POST /slow`: 200 after two seconds
pub struct TestReceiver {
    pub base_url: String,
    rx: mpsc::UnboundedReceiver<Captured>,
}

impl TestReceiver {
    pub async fn start() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = Router::new()
            .route("/ok", post(ok))
            .route("/fail", post(fail))
            .route("/slow", post(slow))
            .with_state(tx);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            rx,
        }
    }

    pub fn url(&self, target: &str) -> String {
        format!("{}{target}", self.base_url)
    }

    /// Wait for the next request, failing the test after five seconds.
    pub async fn next(&mut self) -> Captured {
        tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
            .await
            .expect("timed out waiting for webhook")
            .expect("receiver closed")
    }

    /// Every request received so far, without waiting.
    pub fn drain(&mut self) -> Vec<Captured> {
        let mut out = Vec::new();
        while let Ok(captured) = self.rx.try_recv() {
            out.push(captured);
        }
        out
    }

    /// Assert nothing arrives within `wait`.
    pub async fn expect_silence(&mut self, wait: Duration) {
        if let Ok(Some(captured)) = tokio::time::timeout(wait, self.rx.recv()).await {
            panic!("unexpected webhook: {}", captured.target);
        }
    }
}

type Tx = mpsc::UnboundedSender<Captured>;

fn record(tx: &Tx, uri: &Uri, headers: HeaderMap, body: Bytes) {
    let target = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_owned(), ToString::to_string);
    let _ = tx.send(Captured {
        target,
        headers,
        body,
    });
}

async fn ok(State(tx): State<Tx>, uri: Uri, headers: HeaderMap, body: Bytes) -> StatusCode {
    record(&tx, &uri, headers, body);
    StatusCode::OK
}

async fn fail(State(tx): State<Tx>, uri: Uri, headers: HeaderMap, body: Bytes) -> StatusCode {
    record(&tx, &uri, headers, body);
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn slow(State(tx): State<Tx>, uri: Uri, headers: HeaderMap, body: Bytes) -> StatusCode {
    tokio::time::sleep(Duration::from_secs(2)).await;
    record(&tx, &uri, headers, body);
    StatusCode::OK
}

pub fn registry() -> SubscriptionRegistry {
    let store: Arc<dyn SubscriptionStore> = Arc::new(MemorySubscriptionStore::new());
    SubscriptionRegistry::new(store)
}

pub fn college(id: u64) -> TenantId {
    TenantId::from(id)
}

pub async fn subscribe(
    registry: &SubscriptionRegistry,
    tenant: &TenantId,
    url: &str,
    event: &str,
    secret: &str,
) -> Subscription {
    registry
        .create(tenant, NewSubscription::new(url, event).with_secret(secret))
        .await
        .unwrap()
}
