//! `prospector probe` — check the game host endpoint.
//!
//! A plain TCP connect with a timeout. The host process exposes its
//! control endpoint on a local port; if nothing answers there, no session
//! can run.

use std::time::Duration;

use prospector_config::AppConfig;
use tokio::net::TcpStream;
use tokio::time::timeout;

pub async fn run(
    host: &str,
    port: Option<u16>,
    timeout_secs: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let port = port.unwrap_or(config.probe.port);
    let timeout_secs = timeout_secs.unwrap_or(config.probe.timeout_secs);
    let addr = format!("{host}:{port}");

    println!("🔌 Probing {addr} (timeout {timeout_secs}s)...");

    match try_connect(&addr, Duration::from_secs(timeout_secs)).await {
        Ok(()) => {
            println!("SUCCESS: Connection established!");
            Ok(())
        }
        Err(reason) => {
            println!("FAILURE: Could not connect. ({reason})");
            std::process::exit(1);
        }
    }
}

/// Attempt one TCP connect within the window.
async fn try_connect(addr: &str, window: Duration) -> Result<(), String> {
    match timeout(window, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("timed out after {}s", window.as_secs())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn connect_succeeds_against_a_live_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        assert!(try_connect(&addr, Duration::from_secs(3)).await.is_ok());
    }

    #[tokio::test]
    async fn connect_reports_a_dead_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        assert!(try_connect(&addr, Duration::from_secs(3)).await.is_err());
    }
}
