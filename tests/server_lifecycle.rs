//! Serving over a real socket and shutting down.

use std::net::SocketAddr;
use std::time::Duration;

use league_web::config::ServerConfig;
use league_web::lifecycle::startup::build_server;
use league_web::lifecycle::Shutdown;

mod common;

#[tokio::test]
async fn test_serves_until_shutdown() {
    let addr: SocketAddr = "127.0.0.1:28381".parse().unwrap();
    let mut config = ServerConfig::default();
    config.listener.bind_address = addr.to_string();

    let settings = common::settings(&[]);
    let (server, _sessions) = build_server(config, &settings).unwrap();
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    let client = reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let res = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "healthy");

    let res = client
        .get(format!("http://{}/games", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 302);
    assert_eq!(res.headers()["location"], "/login");

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop");
    assert!(result.unwrap().is_ok());
}
