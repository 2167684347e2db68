//! End-to-end tests for the gateway.

use std::net::SocketAddr;
use std::time::Duration;

use edge_guard::config::GatewayConfig;
use edge_guard::http::HttpServer;
use edge_guard::lifecycle::Shutdown;
use tokio::sync::mpsc;

mod common;

/// Start a gateway for the given config on an ephemeral port.
///
/// Returns the bound address and the shutdown coordinator; tests trigger
/// shutdown at the end.
async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let shutdown = Shutdown::new();
    let (_config_tx, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    (addr, shutdown)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

fn config_with_upstream(upstream: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.upstream.address = upstream.to_string();
    config
}

/// Build a JSON object nested exactly `levels` containers deep.
fn nested_json(levels: usize, leaf: &str) -> String {
    let mut s = String::new();
    for _ in 0..levels {
        s.push_str("{\"a\":");
    }
    s.push_str(&format!("\"{}\"", leaf));
    for _ in 0..levels {
        s.push('}');
    }
    s
}

#[tokio::test]
async fn oversized_post_is_rejected_with_413() {
    let upstream = common::start_mock_upstream("should never be reached").await;
    let (addr, shutdown) = start_gateway(config_with_upstream(upstream)).await;

    // 2 MiB body against the default 1 MiB limit.
    let body = vec![b'x'; 2 * 1024 * 1024];
    let res = client()
        .post(format!("http://{}/api/upload", addr))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .expect("Gateway unreachable");

    assert_eq!(res.status(), 413);
    let json: serde_json::Value = res.json().await.unwrap();
    assert_eq!(json["error"], "Request body too large");

    shutdown.trigger();
}

#[tokio::test]
async fn well_formed_post_is_forwarded_with_protective_headers() {
    let upstream = common::start_mock_upstream("{\"ok\":true}").await;
    let (addr, shutdown) = start_gateway(config_with_upstream(upstream)).await;

    // ~10 KiB payload nested five levels deep, well under the limit of 32.
    let body = format!(
        "{{\"a\":{{\"b\":{{\"c\":{{\"d\":{{\"e\":\"{}\"}}}}}}}}}}",
        "x".repeat(10 * 1024)
    );
    let res = client()
        .post(format!("http://{}/api/orders", addr))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .expect("Gateway unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(res.headers().get("x-frame-options").unwrap(), "DENY");
    assert_eq!(
        res.headers().get("x-xss-protection").unwrap(),
        "1; mode=block"
    );
    assert_eq!(
        res.headers().get("referrer-policy").unwrap(),
        "strict-origin-when-cross-origin"
    );

    shutdown.trigger();
}

#[tokio::test]
async fn hundred_and_first_request_is_rate_limited() {
    let upstream = common::start_mock_upstream("pong").await;
    let (addr, shutdown) = start_gateway(config_with_upstream(upstream)).await;

    let client = client();
    let url = format!("http://{}/api/ping", addr);

    for i in 0..100 {
        let res = client.get(&url).send().await.expect("Gateway unreachable");
        assert_eq!(res.status(), 200, "request {} should be admitted", i + 1);
    }

    let res = client.get(&url).send().await.expect("Gateway unreachable");
    assert_eq!(res.status(), 429);
    // Rejections carry the protective headers too.
    assert_eq!(
        res.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    let json: serde_json::Value = res.json().await.unwrap();
    assert_eq!(json["error"], "Too many requests. Please try again later.");

    shutdown.trigger();
}

#[tokio::test]
async fn deeply_nested_payload_is_rejected_quickly() {
    let upstream = common::start_mock_upstream("should never be reached").await;
    let (addr, shutdown) = start_gateway(config_with_upstream(upstream)).await;

    let started = std::time::Instant::now();
    let res = client()
        .post(format!("http://{}/api/orders", addr))
        .header("content-type", "application/json")
        .body(nested_json(33, "deep"))
        .send()
        .await
        .expect("Gateway unreachable");

    assert_eq!(res.status(), 400);
    let json: serde_json::Value = res.json().await.unwrap();
    assert!(
        json["error"].as_str().unwrap().contains("deeply nested"),
        "unexpected error: {}",
        json["error"]
    );
    assert!(started.elapsed() < Duration::from_secs(5), "depth check must be bounded");

    shutdown.trigger();
}

#[tokio::test]
async fn malformed_json_is_rejected_with_400() {
    let upstream = common::start_mock_upstream("should never be reached").await;
    let (addr, shutdown) = start_gateway(config_with_upstream(upstream)).await;

    let res = client()
        .post(format!("http://{}/api/orders", addr))
        .header("content-type", "application/json")
        .body("{\"a\":")
        .send()
        .await
        .expect("Gateway unreachable");

    assert_eq!(res.status(), 400);
    let json: serde_json::Value = res.json().await.unwrap();
    assert!(json["error"].as_str().unwrap().starts_with("Invalid payload"));

    shutdown.trigger();
}

#[tokio::test]
async fn exempt_paths_bypass_the_rate_limit_but_keep_headers() {
    let upstream = common::start_mock_upstream("icon-bytes").await;
    let mut config = config_with_upstream(upstream);
    config.rate_limit.max_requests = 2;
    let (addr, shutdown) = start_gateway(config).await;

    let client = client();
    // Far past the limit; exempt paths are never charged.
    for _ in 0..5 {
        let res = client
            .get(format!("http://{}/favicon.ico", addr))
            .send()
            .await
            .expect("Gateway unreachable");
        assert_eq!(res.status(), 200);
        assert_eq!(
            res.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
    }

    shutdown.trigger();
}

#[tokio::test]
async fn unmatched_paths_pass_through_unchecked() {
    let upstream = common::start_mock_upstream("<html>about</html>").await;
    let mut config = config_with_upstream(upstream);
    config.rate_limit.max_requests = 1;
    let (addr, shutdown) = start_gateway(config).await;

    let client = client();
    for _ in 0..3 {
        let res = client
            .get(format!("http://{}/about", addr))
            .send()
            .await
            .expect("Gateway unreachable");
        assert_eq!(res.status(), 200);
    }

    shutdown.trigger();
}

#[tokio::test]
async fn guarded_requests_share_one_counter_across_paths() {
    let upstream = common::start_mock_upstream("ok").await;
    let mut config = config_with_upstream(upstream);
    config.rate_limit.max_requests = 3;
    let (addr, shutdown) = start_gateway(config).await;

    let client = client();
    for path in ["/api/a", "/api/b", "/app/c"] {
        let res = client
            .get(format!("http://{}{}", addr, path))
            .send()
            .await
            .expect("Gateway unreachable");
        assert_eq!(res.status(), 200);
    }

    let res = client
        .get(format!("http://{}/api/a", addr))
        .send()
        .await
        .expect("Gateway unreachable");
    assert_eq!(res.status(), 429);

    shutdown.trigger();
}

#[tokio::test]
async fn upstream_failure_maps_to_502() {
    // Bind-and-drop to get an address nothing listens on.
    let dead = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = dead.local_addr().unwrap();
    drop(dead);

    let (addr, shutdown) = start_gateway(config_with_upstream(dead_addr)).await;

    let res = client()
        .get(format!("http://{}/api/ping", addr))
        .send()
        .await
        .expect("Gateway unreachable");
    assert_eq!(res.status(), 502);
    let json: serde_json::Value = res.json().await.unwrap();
    assert_eq!(json["error"], "Upstream request failed");

    shutdown.trigger();
}
