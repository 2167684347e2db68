//! Per-client fixed-window rate limiting.
//!
//! # Responsibilities
//! - Count requests per client over a fixed window
//! - Admit or reject without blocking unrelated clients
//! - Evict expired records on a periodic sweep
//!
//! # Design Decisions
//! - Fixed window, not sliding window or token bucket: simpler, and
//!   sufficient for a single-process edge guard. Known tradeoff: a client
//!   can land up to 2x `max_requests` across a window boundary (burst at
//!   the tail of one window plus burst at the head of the next).
//! - Lookup-decide-mutate happens under one `DashMap` entry guard, so two
//!   concurrent requests from the same client cannot both observe the
//!   pre-increment count
//! - The sweep uses `retain`, which locks one shard at a time; a sweep of
//!   any size never stalls checks for keys in other shards
//! - A rejected request does not increment the counter further

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::RateLimitConfig;

/// Counter key used when no client identity can be derived.
///
/// All unidentifiable clients share one counter; a conservative fallback,
/// not a bug.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Admit,
    Reject,
}

/// One client's counter for the current window.
#[derive(Debug, Clone, Copy)]
struct WindowRecord {
    count: u32,
    reset_at: Instant,
}

/// Shared fixed-window rate limiter.
///
/// Holds only the counter table; window duration and admit threshold are
/// passed per check so a config reload takes effect immediately.
#[derive(Debug, Default)]
pub struct RateLimiter {
    store: DashMap<String, WindowRecord>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check one request from `client_id` at time `now`.
    pub fn check(&self, client_id: &str, now: Instant, settings: &RateLimitConfig) -> RateDecision {
        if !settings.enabled {
            return RateDecision::Admit;
        }

        let window = Duration::from_millis(settings.window_ms);
        match self.store.entry(client_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                let record = occupied.get_mut();
                if record.reset_at <= now {
                    *record = WindowRecord {
                        count: 1,
                        reset_at: now + window,
                    };
                    RateDecision::Admit
                } else if record.count >= settings.max_requests {
                    RateDecision::Reject
                } else {
                    record.count += 1;
                    RateDecision::Admit
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(WindowRecord {
                    count: 1,
                    reset_at: now + window,
                });
                RateDecision::Admit
            }
        }
    }

    /// Remove every record whose window has already passed.
    ///
    /// Returns the number of records removed.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let before = self.store.len();
        self.store.retain(|_, record| record.reset_at > now);
        before.saturating_sub(self.store.len())
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.store.len()
    }
}

/// Derive the rate-limit key for a request.
///
/// First entry of `x-forwarded-for` if present, else the peer address,
/// else [`UNKNOWN_CLIENT`].
pub fn client_id(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(first) = value.split(',').next() {
                let trimmed = first.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Spawn the periodic eviction sweep.
///
/// Runs until the shutdown signal fires. The period is the window duration
/// captured at startup.
pub fn spawn_sweeper(
    limiter: Arc<RateLimiter>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval fires immediately; consume the first tick
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = limiter.sweep_expired(Instant::now());
                    if removed > 0 {
                        tracing::debug!(removed, "Swept expired rate-limit records");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Rate-limit sweeper stopping");
                    break;
                }
            }
        }
    })
}
