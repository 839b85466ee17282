//! Per-service daily quota and call pacing.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::CoreResult;
use crate::traits::{Clock, QuotaRepository};
use crate::types::{ApiQuota, QuotaStatus, ThreatService};

/// The daily quota of a service is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaExhausted {
    pub used: u32,
    pub limit: u32,
}

struct QuotaState {
    date: NaiveDate,
    used: u32,
    last_call: Option<Instant>,
}

/// Daily call counter plus minimum spacing between calls for one service.
///
/// Both are checked under one lock, so callers of the same service are
/// serialized process-wide. The counter is persisted on every increment and
/// reset the first time the UTC day changes.
pub struct QuotaTracker {
    service: ThreatService,
    daily_limit: u32,
    min_interval: Duration,
    repository: Arc<dyn QuotaRepository>,
    clock: Arc<dyn Clock>,
    state: Mutex<QuotaState>,
}

impl QuotaTracker {
    pub fn new(
        service: ThreatService,
        daily_limit: u32,
        min_interval: Duration,
        repository: Arc<dyn QuotaRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let date = clock.today();
        Self {
            service,
            daily_limit,
            min_interval,
            repository,
            clock,
            state: Mutex::new(QuotaState {
                date,
                used: 0,
                last_call: None,
            }),
        }
    }

    pub fn service(&self) -> ThreatService {
        self.service
    }

    /// Reload today's counter from storage. Counters of other days are ignored.
    pub async fn restore(&self) -> CoreResult<()> {
        let today = self.clock.today();
        let stored = self.repository.find(self.service, today).await?;
        let mut state = self.state.lock().await;
        state.date = today;
        state.used = stored.map_or(0, |q| q.used_count.min(self.daily_limit));
        log::info!(
            "[quota] {} restored: {}/{} for {today}",
            self.service.as_str(),
            state.used,
            self.daily_limit
        );
        Ok(())
    }

    /// Take one call from today's quota, waiting out the pacing interval first.
    ///
    /// Returns immediately with [`QuotaExhausted`] when the quota is spent.
    pub async fn acquire(&self) -> Result<(), QuotaExhausted> {
        let mut state = self.state.lock().await;

        let today = self.clock.today();
        if state.date != today {
            log::info!(
                "[quota] {} counter reset ({} -> {today})",
                self.service.as_str(),
                state.date
            );
            state.date = today;
            state.used = 0;
        }

        if state.used >= self.daily_limit {
            log::warn!(
                "[quota] {} daily quota exhausted ({}/{})",
                self.service.as_str(),
                state.used,
                self.daily_limit
            );
            return Err(QuotaExhausted {
                used: state.used,
                limit: self.daily_limit,
            });
        }

        if let Some(last_call) = state.last_call {
            let ready_at = last_call + self.min_interval;
            if ready_at > Instant::now() {
                log::trace!("[quota] {} pacing", self.service.as_str());
                tokio::time::sleep_until(ready_at).await;
            }
        }

        state.used += 1;
        state.last_call = Some(Instant::now());
        self.persist(ApiQuota {
            service: self.service,
            date: state.date,
            used_count: state.used,
            daily_limit: self.daily_limit,
        });
        Ok(())
    }

    /// Snapshot for today.
    pub async fn status(&self) -> QuotaStatus {
        let state = self.state.lock().await;
        let today = self.clock.today();
        let used = if state.date == today { state.used } else { 0 };
        QuotaStatus {
            service: self.service,
            used,
            limit: self.daily_limit,
            date: today,
        }
    }

    fn persist(&self, quota: ApiQuota) {
        let repository = Arc::clone(&self.repository);
        tokio::spawn(async move {
            if let Err(e) = repository.save(&quota).await {
                log::warn!(
                    "[quota] Failed to persist {} counter: {e}",
                    quota.service.as_str()
                );
            }
        });
    }
}
