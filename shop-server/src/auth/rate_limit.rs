//! Per-IP request limiting
//!
//! Fixed window per client IP: the first request opens a window, requests
//! beyond `max_requests` inside it are rejected, and the first request after
//! the window has elapsed opens a new one. A burst straddling a window
//! boundary can therefore see up to twice the limit.
//!
//! Each limiter owns one background sweep that evicts idle visitors. It is
//! started by the first request, under the same lock as the visitor map, and
//! stops on [`RateLimiter::shutdown`] or when the limiter is dropped.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::ServerState;
use crate::security_log;
use shared::AppError;

/// Login attempts allowed per window
pub const LOGIN_MAX_ATTEMPTS: u32 = 5;
/// Login window
pub const LOGIN_WINDOW: Duration = Duration::from_secs(15 * 60);

struct Visitor {
    /// Start of the current window
    last_seen: Instant,
    count: u32,
}

#[derive(Default)]
struct Visitors {
    by_ip: HashMap<String, Visitor>,
    sweep_started: bool,
}

struct Inner {
    name: &'static str,
    max_requests: u32,
    window: Duration,
    visitors: Mutex<Visitors>,
    cancel: CancellationToken,
}

impl Inner {
    fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut visitors = self.visitors.lock();
        let before = visitors.by_ip.len();
        visitors
            .by_ip
            .retain(|_, v| now.duration_since(v.last_seen) <= self.window);
        before - visitors.by_ip.len()
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

impl RateLimiter {
    pub fn new(name: &'static str, max_requests: u32, window: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                max_requests,
                window,
                visitors: Mutex::new(Visitors::default()),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Stricter limiter for the login route
    pub fn login() -> Self {
        Self::new("login", LOGIN_MAX_ATTEMPTS, LOGIN_WINDOW)
    }

    pub fn window(&self) -> Duration {
        self.inner.window
    }

    /// Count a request from `ip`
    ///
    /// `Err` carries the time left until the window resets.
    pub fn check(&self, ip: &str) -> Result<(), Duration> {
        let now = Instant::now();
        let mut visitors = self.inner.visitors.lock();

        if !visitors.sweep_started {
            visitors.sweep_started = true;
            self.spawn_sweep();
        }

        let Some(visitor) = visitors.by_ip.get_mut(ip) else {
            visitors.by_ip.insert(
                ip.to_string(),
                Visitor {
                    last_seen: now,
                    count: 1,
                },
            );
            return Ok(());
        };

        let elapsed = now.duration_since(visitor.last_seen);
        if elapsed > self.inner.window {
            visitor.last_seen = now;
            visitor.count = 1;
            return Ok(());
        }

        visitor.count += 1;
        if visitor.count > self.inner.max_requests {
            return Err(self.inner.window.saturating_sub(elapsed));
        }
        Ok(())
    }

    fn spawn_sweep(&self) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let cancel = self.inner.cancel.clone();
        let window = self.inner.window;
        let name = self.inner.name;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + window, window);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(inner) = weak.upgrade() else { break };
                        let evicted = inner.sweep();
                        if evicted > 0 {
                            tracing::debug!(limiter = name, evicted, "Evicted idle visitors");
                        }
                    }
                }
            }
            tracing::debug!(limiter = name, "Rate limiter sweep stopped");
        });
    }

    /// Evict visitors idle for longer than the window
    pub fn sweep(&self) -> usize {
        self.inner.sweep()
    }

    pub fn visitor_count(&self) -> usize {
        self.inner.visitors.lock().by_ip.len()
    }

    /// Stop the background sweep
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }
}

/// Client IP: first `X-Forwarded-For` entry, then the peer address.
fn extract_ip(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let ip = first.trim();
        if !ip.is_empty() {
            return ip.to_owned();
        }
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

/// Whole seconds, rounded up so a client never retries too early
fn retry_secs(remaining: Duration) -> u64 {
    remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
}

/// Global limiter wrapping every route
pub async fn global_rate_limit(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = extract_ip(&request);
    if let Err(remaining) = state.rate_limiter.check(&ip) {
        security_log!("WARN", "rate_limited", ip = ip.as_str(), limiter = "global");
        return Err(AppError::rate_limited(
            "Too many requests, try again later",
            Some(retry_secs(remaining)),
        ));
    }
    Ok(next.run(request).await)
}

/// Login limiter: 5 attempts per 15 minutes per IP
pub async fn login_rate_limit(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = extract_ip(&request);
    if let Err(remaining) = state.login_limiter.check(&ip) {
        let minutes = remaining.as_secs() / 60 + 1;
        security_log!(
            "WARN",
            "login_rate_limited",
            ip = ip.as_str(),
            retry_after_minutes = minutes
        );
        return Err(AppError::rate_limited(
            format!("Too many login attempts. Try again in {minutes} minutes."),
            Some(retry_secs(remaining)),
        )
        .with_detail("retry_after_minutes", minutes));
    }
    Ok(next.run(request).await)
}
