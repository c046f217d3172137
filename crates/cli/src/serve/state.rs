//! Shared server state and per-IP rate limiting.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use chainscope_advisor::Analyst;
use chainscope_core::Assessor;
use chainscope_sources::{ChainDataService, GitHubClient};
use tokio::sync::Mutex;

use super::RATE_LIMIT_WINDOW_SECS;

/// Request count and window start per client IP, plus the time of the
/// last sweep for expired windows.
struct Windows {
    clients: HashMap<IpAddr, (u64, Instant)>,
    last_sweep: Instant,
}

impl Windows {
    /// Drop clients whose window has closed. Runs at most once a window.
    fn sweep(&mut self, now: Instant) {
        if now.duration_since(self.last_sweep).as_secs() < RATE_LIMIT_WINDOW_SECS {
            return;
        }
        self.clients
            .retain(|_, (_, start)| now.duration_since(*start).as_secs() < RATE_LIMIT_WINDOW_SECS);
        self.last_sweep = now;
    }
}

/// Fixed-window request limiter keyed by client IP. A limit of zero
/// disables limiting.
pub(crate) struct RateLimiter {
    windows: Mutex<Windows>,
    pub(crate) max_requests: u64,
}

impl RateLimiter {
    pub(crate) fn new(max_requests: u64) -> Self {
        Self {
            windows: Mutex::new(Windows {
                clients: HashMap::new(),
                last_sweep: Instant::now(),
            }),
            max_requests,
        }
    }

    /// `Err(retry_after_secs)` once `ip` exceeds its allowance.
    pub(crate) async fn check(&self, ip: IpAddr) -> Result<(), u64> {
        self.check_at(ip, Instant::now()).await
    }

    async fn check_at(&self, ip: IpAddr, now: Instant) -> Result<(), u64> {
        if self.max_requests == 0 {
            return Ok(());
        }
        let mut windows = self.windows.lock().await;
        windows.sweep(now);

        let (count, window_start) = windows.clients.entry(ip).or_insert((0, now));
        let elapsed = now.saturating_duration_since(*window_start).as_secs();
        if elapsed >= RATE_LIMIT_WINDOW_SECS {
            *count = 0;
            *window_start = now;
        }

        *count += 1;
        if *count > self.max_requests {
            Err(RATE_LIMIT_WINDOW_SECS.saturating_sub(elapsed))
        } else {
            Ok(())
        }
    }

    #[cfg(test)]
    async fn tracked_clients(&self) -> usize {
        self.windows.lock().await.clients.len()
    }
}

pub(crate) struct AppState {
    pub(crate) assessor: Assessor,
    pub(crate) data: ChainDataService,
    pub(crate) analyst: Arc<Analyst>,
    /// None in offline mode.
    pub(crate) github: Option<GitHubClient>,
    pub(crate) rate_limiter: RateLimiter,
    /// None disables API key checks.
    pub(crate) api_key: Option<String>,
    pub(crate) access_password: Option<String>,
}
