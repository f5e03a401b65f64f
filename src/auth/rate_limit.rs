use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::AppState;

/// Fixed-window limiter for the sign-in and sign-up endpoints, in memory
/// (single instance only).
#[derive(Clone)]
pub struct AuthThrottle {
    windows: Arc<Mutex<HashMap<String, Window>>>,
    max_requests: u32,
    window: Duration,
}

struct Window {
    count: u32,
    started: Instant,
}

impl AuthThrottle {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// `Ok(remaining)` if allowed, `Err(retry_after)` once the window is spent.
    pub async fn check(&self, key: &str) -> Result<u32, Duration> {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();

        let entry = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(entry.started) > self.window {
            entry.count = 0;
            entry.started = now;
        }

        if entry.count >= self.max_requests {
            return Err(self.window.saturating_sub(now.duration_since(entry.started)));
        }

        entry.count += 1;
        Ok(self.max_requests - entry.count)
    }

    /// Drop windows that ended long ago.
    pub async fn sweep(&self) {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();
        let keep_for = self.window * 2;
        windows.retain(|_, w| now.duration_since(w.started) < keep_for);
    }

    pub fn spawn_sweeper(&self) {
        let throttle = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(throttle.window.max(Duration::from_secs(1)));
            loop {
                ticker.tick().await;
                throttle.sweep().await;
            }
        });
    }
}

/// Keyed by client IP and path, so sign-in and sign-up are limited apart.
pub async fn throttle_auth(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".into());
    let path = req.uri().path().to_string();
    let key = format!("{}:{}", ip, path);

    match state.auth_throttle.check(&key).await {
        Ok(remaining) => {
            tracing::debug!(ip = %ip, path = %path, remaining = remaining, "Auth throttle passed");
            Ok(next.run(req).await)
        }
        Err(retry_after) => {
            tracing::warn!(
                ip = %ip,
                path = %path,
                retry_after_secs = retry_after.as_secs(),
                "Auth throttle exceeded"
            );
            Err(AppError::RateLimited)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_up_to_max() {
        let throttle = AuthThrottle::new(3, 60);
        assert_eq!(throttle.check("k").await, Ok(2));
        assert_eq!(throttle.check("k").await, Ok(1));
        assert_eq!(throttle.check("k").await, Ok(0));
        assert!(throttle.check("k").await.is_err());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let throttle = AuthThrottle::new(1, 60);
        assert!(throttle.check("a").await.is_ok());
        assert!(throttle.check("a").await.is_err());
        assert!(throttle.check("b").await.is_ok());
    }

    #[tokio::test]
    async fn test_window_resets() {
        let throttle = AuthThrottle::new(1, 0);
        assert!(throttle.check("k").await.is_ok());
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(throttle.check("k").await.is_ok());
    }
}
