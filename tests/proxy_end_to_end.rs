//! End-to-end tests through a real listener and mock backends.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use route_lookup::load_balancer::Endpoint;
use route_lookup::observability::metrics::PrometheusReporter;
use route_lookup::{HttpServer, InMemoryRegistry, LookupConfig, Shutdown};
use tokio::net::TcpListener;

mod common;

async fn start_proxy(registry: Arc<InMemoryRegistry>) -> (SocketAddr, Shutdown) {
    start_proxy_with_limit(registry, LookupConfig::default().listener.max_connections).await
}

async fn start_proxy_with_limit(
    registry: Arc<InMemoryRegistry>,
    max_connections: usize,
) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = LookupConfig::default();
    config.listener.bind_address = addr.to_string();
    config.listener.max_connections = max_connections;
    config.observability.metrics_enabled = false;

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, registry, Arc::new(PrometheusReporter));
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_forwards_to_resolved_endpoint() {
    let backend = common::start_mock_backend("hello from backend").await;
    let registry = Arc::new(InMemoryRegistry::new());
    registry.register("127.0.0.1/v2", Endpoint::new("guid-123", "0", backend));
    let (proxy_addr, shutdown) = start_proxy(registry).await;

    let res = client()
        .get(format!("http://{}/v2/info", proxy_addr))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-cf-instanceid"], "guid-123:0");
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "hello from backend");

    shutdown.trigger();
}

#[tokio::test]
async fn test_instance_header_pins_endpoint() {
    let b0 = common::start_mock_backend("b0").await;
    let b1 = common::start_mock_backend("b1").await;
    let registry = Arc::new(InMemoryRegistry::new());
    registry.register("127.0.0.1", Endpoint::new("guid-123", "0", b0));
    registry.register("127.0.0.1", Endpoint::new("guid-123", "1", b1));
    let (proxy_addr, shutdown) = start_proxy(registry).await;

    let client = client();
    for _ in 0..3 {
        let res = client
            .get(format!("http://{}/", proxy_addr))
            .header("X-CF-APP-INSTANCE", "guid-123:1")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(res.headers()["x-cf-instanceid"], "guid-123:1");
        assert_eq!(res.text().await.unwrap(), "b1");
    }

    shutdown.trigger();
}

#[tokio::test]
async fn test_unknown_route_over_the_wire() {
    let registry = Arc::new(InMemoryRegistry::new());
    let (proxy_addr, shutdown) = start_proxy(registry).await;

    let res = client()
        .get(format!("http://{}/v2/info", proxy_addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 404);
    assert_eq!(res.headers()["x-cf-routererror"], "unknown_route");
    assert_eq!(
        res.text().await.unwrap(),
        format!("Requested route ('{}') does not exist.", proxy_addr)
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_invalid_instance_header_over_the_wire() {
    let backend = common::start_mock_backend("never").await;
    let registry = Arc::new(InMemoryRegistry::new());
    registry.register("127.0.0.1", Endpoint::new("guid-123", "0", backend));
    let (proxy_addr, shutdown) = start_proxy(registry).await;

    let res = client()
        .get(format!("http://{}/", proxy_addr))
        .header("X-CF-APP-INSTANCE", "guid-123")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 404);
    assert_eq!(res.headers()["x-cf-routererror"], "unknown_route");

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_endpoint_is_bad_gateway() {
    let closed = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let registry = Arc::new(InMemoryRegistry::new());
    registry.register("127.0.0.1", Endpoint::new("guid-123", "0", closed));
    let (proxy_addr, shutdown) = start_proxy(registry).await;

    let res = client()
        .get(format!("http://{}/", proxy_addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 502);

    shutdown.trigger();
}

#[tokio::test]
async fn test_max_connections_holds_back_new_peers() {
    let (proxy, shutdown) = start_proxy_with_limit(Arc::new(InMemoryRegistry::new()), 1).await;
    let url = format!("http://{proxy}/v2");

    // An idle connection occupies the only slot.
    let idle = tokio::net::TcpStream::connect(proxy).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let blocked = tokio::time::timeout(
        Duration::from_millis(300),
        client().get(&url).header("Host", "api.example.com").send(),
    )
    .await;
    assert!(blocked.is_err());

    drop(idle);

    let resp = tokio::time::timeout(
        Duration::from_secs(5),
        client().get(&url).header("Host", "api.example.com").send(),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(resp.status(), 404);

    shutdown.trigger();
}
