// SPDX-License-Identifier: MIT

use super::*;
use tokio::net::TcpListener;

#[tokio::test]
async fn reaches_a_listening_port() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = listener.accept().await;
    });
    assert!(probe_reachable(&addr.ip().to_string(), addr.port()).await);
}

#[tokio::test]
async fn does_not_reach_a_closed_port() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    assert!(!probe_reachable(&addr.ip().to_string(), addr.port()).await);
}
