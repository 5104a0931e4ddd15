//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, Json, Router};
use kennel_bridge::config::{BridgeConfig, RuleConfig};
use kennel_bridge::{DevProxy, Shutdown};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// An address nothing is listening on.
#[allow(dead_code)]
pub async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Start a backend that answers every request with JSON describing it:
/// method, path with query, `Host`, `x-kennel-client` and body text.
#[allow(dead_code)]
pub async fn start_echo_backend() -> SocketAddr {
    async fn echo(request: Request<Body>) -> Json<Value> {
        let (parts, body) = request.into_parts();
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

        Json(json!({
            "method": parts.method.as_str(),
            "uri": parts.uri.path_and_query().map(|pq| pq.as_str()),
            "host": header("host"),
            "client": header("x-kennel-client"),
            "body": String::from_utf8_lossy(&bytes),
        }))
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, Router::new().fallback(echo)).await.unwrap();
    });
    addr
}

/// Start a raw programmable backend. `f` supplies status and JSON body text;
/// every response also carries `x-backend: kennel`.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        // Requests in these tests are bodiless GETs; one read
                        // drains the head.
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;

                        let (status, body) = f().await;
                        let reason = axum::http::StatusCode::from_u16(status)
                            .ok()
                            .and_then(|s| s.canonical_reason())
                            .unwrap_or("Unknown");

                        let response_str = format!(
                            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nX-Backend: kennel\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            reason,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Config forwarding `/api` and `/uploads` to `target`.
#[allow(dead_code)]
pub fn proxy_config(target: SocketAddr) -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.retarget(&format!("http://{}", target));
    config
}

/// Start the dev proxy on an ephemeral port.
#[allow(dead_code)]
pub async fn start_proxy(config: BridgeConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let proxy = DevProxy::new(config).unwrap();
    tokio::spawn(async move {
        let _ = proxy.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}

#[allow(dead_code)]
pub fn rule(prefix: &str, target: SocketAddr) -> RuleConfig {
    RuleConfig::new(prefix, format!("http://{}", target))
}

#[allow(dead_code)]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
