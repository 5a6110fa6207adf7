//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use route_lookup::load_balancer::{Endpoint, RoutePool};
use route_lookup::observability::metrics::MetricsReporter;
use route_lookup::{InMemoryRegistry, Registry, RouteKey};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Start a mock backend that answers every request with `200` and a fixed body.
pub async fn start_mock_backend(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            response.len(),
                            response
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Registry calls observed by [`RecordingRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupCall {
    Unscoped(String),
    Scoped(String, String, String),
}

/// Wraps an [`InMemoryRegistry`] and records every lookup.
#[derive(Default)]
pub struct RecordingRegistry {
    pub inner: InMemoryRegistry,
    calls: Mutex<Vec<LookupCall>>,
}

impl RecordingRegistry {
    pub fn calls(&self) -> Vec<LookupCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Registry for RecordingRegistry {
    fn lookup(&self, key: &RouteKey) -> Option<Arc<RoutePool>> {
        self.calls.lock().unwrap().push(LookupCall::Unscoped(key.to_string()));
        self.inner.lookup(key)
    }

    fn lookup_with_instance(
        &self,
        key: &RouteKey,
        app_id: &str,
        instance_index: &str,
    ) -> Option<Arc<RoutePool>> {
        self.calls.lock().unwrap().push(LookupCall::Scoped(
            key.to_string(),
            app_id.to_string(),
            instance_index.to_string(),
        ));
        self.inner.lookup_with_instance(key, app_id, instance_index)
    }
}

pub fn endpoint(app_id: &str, index: &str, port: u16) -> Endpoint {
    Endpoint::new(app_id, index, SocketAddr::from(([127, 0, 0, 1], port)))
}

/// Counts `capture_bad_request` calls.
#[derive(Default)]
pub struct CountingReporter {
    bad_requests: AtomicUsize,
}

impl CountingReporter {
    pub fn bad_requests(&self) -> usize {
        self.bad_requests.load(Ordering::SeqCst)
    }
}

impl MetricsReporter for CountingReporter {
    fn capture_bad_request(&self) {
        self.bad_requests.fetch_add(1, Ordering::SeqCst);
    }
}

/// A log event as seen by [`EventCapture`].
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
    pub fields: HashMap<String, String>,
}

/// `tracing` layer that keeps every event for later assertions.
#[derive(Clone, Default)]
pub struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl EventCapture {
    /// Events whose message equals `message`.
    pub fn named(&self, message: &str) -> Vec<CapturedEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.message == message)
            .cloned()
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for EventCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: HashMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, format!("{:?}", value));
    }
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}
