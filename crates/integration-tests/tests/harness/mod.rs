//! Shared fixtures; each test binary uses a subset

#![allow(dead_code)]

pub mod config;
pub mod mock_llm;
pub mod server;

use std::time::Duration;

/// Poll `check` until it holds or `timeout` elapses
pub async fn eventually<F>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
