// SPDX-License-Identifier: MIT

//! Bounded-duration TCP connect reachability probing.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;

pub const REACHABILITY_TIMEOUT: Duration = Duration::from_secs(3);

/// Completes a TCP handshake within `REACHABILITY_TIMEOUT`, or classifies
/// the target as proxy-only.
pub async fn probe_reachable(address: &str, port: u16) -> bool {
    let target = format!("{address}:{port}");
    match tokio::time::timeout(REACHABILITY_TIMEOUT, connect(&target)).await {
        Ok(Ok(())) => true,
        Ok(Err(_)) | Err(_) => false,
    }
}

async fn connect(target: &str) -> std::io::Result<()> {
    if let Ok(addr) = target.parse::<SocketAddr>() {
        TcpStream::connect(addr).await?;
    } else {
        TcpStream::connect(target).await?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
