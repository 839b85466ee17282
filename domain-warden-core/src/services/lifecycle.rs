//! Suspend/delete/recover state machine.
//!
//! [`decide`] and [`decide_pending`] are pure: they look at the stored state, this
//! cycle's health and the clock, and name a transition. [`LifecycleService`]
//! applies it (persistence, DNS, notifications).

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::dns_reconciler::DnsReconciler;
use super::log_core_error;
use crate::ServiceContext;
use crate::error::CoreResult;
use crate::types::{
    CheckOutcome, CheckType, Domain, DomainStatus, LifecyclePolicy, Notification,
    NotificationPriority, PendingDomain, PendingStatus, ScanDetails, SuspendReason,
    SuspensionRecord,
};

/// Lifecycle-relevant fields of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainState {
    pub status: DomainStatus,
    pub suspend_reason: Option<SuspendReason>,
    pub first_failed_at: Option<DateTime<Utc>>,
    pub last_deletion_warning_day: Option<i64>,
}

impl DomainState {
    pub fn of(domain: &Domain) -> Self {
        Self {
            status: domain.status,
            suspend_reason: domain.suspend_reason,
            first_failed_at: domain.first_failed_at,
            last_deletion_warning_day: domain.last_deletion_warning_day,
        }
    }

    fn is_suspended(&self) -> bool {
        self.status == DomainStatus::Suspended
    }
}

/// What one cycle does to a registered domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    /// A reputation service confirmed a threat.
    SuspendForThreat,
    /// First failing cycle; the grace clock starts.
    StartMonitoring,
    SuspendForDowntime { days_offline: i64 },
    DeletionWarning { days_offline: i64, days_remaining: i64 },
    Delete { days_offline: i64 },
    /// Reachable again after an outage; `reactivate` lifts a downtime suspension.
    Recover { reactivate: bool },
}

/// What one cycle does to a pending reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingTransition {
    None,
    StartMonitoring,
    MarkUnhealthy { days_offline: i64 },
    DeletionWarning { days_offline: i64, days_remaining: i64 },
    /// Drop the reservation; the name becomes available again.
    Release { days_offline: i64 },
    Recover,
}

/// Whole days between `since` and `now`.
fn days_between(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - since).num_days()
}

fn is_warning_day(policy: &LifecyclePolicy, days: i64, last_warned: Option<i64>) -> bool {
    policy.warning_days.contains(&days) && last_warned != Some(days)
}

/// Decide the transition of a registered domain for this cycle.
///
/// `threat` is this cycle's `ThreatDetected` outcome, if any.
pub fn decide(
    state: &DomainState,
    is_down: bool,
    threat: Option<&CheckOutcome>,
    now: DateTime<Utc>,
    policy: &LifecyclePolicy,
) -> Transition {
    let threat_suspended =
        state.is_suspended() && state.suspend_reason == Some(SuspendReason::Threat);
    if threat.is_some() && !threat_suspended {
        return Transition::SuspendForThreat;
    }

    if !is_down {
        return if state.first_failed_at.is_some() {
            Transition::Recover {
                reactivate: state.is_suspended()
                    && state.suspend_reason == Some(SuspendReason::Downtime),
            }
        } else {
            Transition::None
        };
    }

    let Some(first_failed_at) = state.first_failed_at else {
        return Transition::StartMonitoring;
    };
    let days_offline = days_between(first_failed_at, now);

    if days_offline >= policy.delete_after_days {
        Transition::Delete { days_offline }
    } else if days_offline >= policy.suspend_after_days && !state.is_suspended() {
        Transition::SuspendForDowntime { days_offline }
    } else if state.is_suspended()
        && is_warning_day(policy, days_offline, state.last_deletion_warning_day)
    {
        Transition::DeletionWarning {
            days_offline,
            days_remaining: policy.delete_after_days - days_offline,
        }
    } else {
        Transition::None
    }
}

/// Decide the transition of a pending reservation for this cycle.
pub fn decide_pending(
    pending: &PendingDomain,
    is_down: bool,
    now: DateTime<Utc>,
    policy: &LifecyclePolicy,
) -> PendingTransition {
    if !is_down {
        return if pending.first_failed_at.is_some() {
            PendingTransition::Recover
        } else {
            PendingTransition::None
        };
    }

    let Some(first_failed_at) = pending.first_failed_at else {
        return PendingTransition::StartMonitoring;
    };
    let days_offline = days_between(first_failed_at, now);
    let unhealthy = pending.status == PendingStatus::Unhealthy;

    if days_offline >= policy.delete_after_days {
        PendingTransition::Release { days_offline }
    } else if days_offline >= policy.suspend_after_days && !unhealthy {
        PendingTransition::MarkUnhealthy { days_offline }
    } else if unhealthy && is_warning_day(policy, days_offline, pending.last_deletion_warning_day)
    {
        PendingTransition::DeletionWarning {
            days_offline,
            days_remaining: policy.delete_after_days - days_offline,
        }
    } else {
        PendingTransition::None
    }
}

/// One-line description of a confirming threat outcome.
fn threat_details(outcome: &CheckOutcome) -> String {
    match (&outcome.details, outcome.check_type) {
        (Some(ScanDetails::SafeBrowsing { matches }), _) if !matches.is_empty() => {
            let kinds: Vec<&str> = matches.iter().map(|m| m.threat_type.as_str()).collect();
            format!("Google Safe Browsing: {}", kinds.join(", "))
        }
        (Some(ScanDetails::VirusTotal { stats }), _) => format!(
            "VirusTotal: {} malicious, {} suspicious detections",
            stats.malicious, stats.suspicious
        ),
        (_, CheckType::SafeBrowsing) => "Google Safe Browsing: threat detected".to_string(),
        (_, CheckType::VirusTotal) => "VirusTotal: threat detected".to_string(),
        (_, other) => format!("{}: threat detected", other.as_str()),
    }
}

/// Applies lifecycle transitions.
pub struct LifecycleService {
    ctx: Arc<ServiceContext>,
    reconciler: Arc<DnsReconciler>,
    policy: LifecyclePolicy,
}

impl LifecycleService {
    pub fn new(
        ctx: Arc<ServiceContext>,
        reconciler: Arc<DnsReconciler>,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            ctx,
            reconciler,
            policy,
        }
    }

    /// Decide and apply this cycle's transition for `domain`.
    ///
    /// `domain` only identifies the row: the decision runs on a fresh read,
    /// since the batch snapshot may predate CRUD changes made during the scan.
    /// A domain tombstoned in the meantime is left alone.
    pub async fn evaluate_domain(
        &self,
        domain: Domain,
        is_down: bool,
        issues: Vec<String>,
        outcomes: &[CheckOutcome],
    ) -> CoreResult<Transition> {
        let Some(mut domain) = self.ctx.domain_repository.find_by_id(domain.id).await? else {
            log::debug!("[lifecycle] {}: gone before evaluation", domain.full_domain);
            return Ok(Transition::None);
        };
        if domain.deleted_at.is_some() {
            log::debug!("[lifecycle] {}: deleted during scan, skipping", domain.full_domain);
            return Ok(Transition::None);
        }
        let now = self.ctx.clock.now();
        let threat = outcomes.iter().find(|o| o.is_threat());
        let transition = decide(&DomainState::of(&domain), is_down, threat, now, &self.policy);
        let fqdn = domain.full_domain.clone();

        match transition {
            Transition::None => {}
            Transition::SuspendForThreat => {
                let details = threat.map(threat_details).unwrap_or_default();
                log::warn!("[lifecycle] {fqdn}: threat confirmed ({details}), suspending");
                domain.status = DomainStatus::Suspended;
                domain.suspend_reason = Some(SuspendReason::Threat);
                if is_down && domain.first_failed_at.is_none() {
                    domain.first_failed_at = Some(now);
                }
                self.suspend(&domain, SuspendReason::Threat, details.clone(), now)
                    .await?;
                self.ctx
                    .notifier
                    .notify(Notification::auto_suspend(fqdn, vec![details], now));
            }
            Transition::StartMonitoring => {
                log::info!("[lifecycle] {fqdn}: down, monitoring started");
                domain.first_failed_at = Some(now);
                self.ctx.domain_repository.save_lifecycle_state(&domain).await?;
                self.ctx.notifier.notify(Notification::health_alert(
                    fqdn,
                    NotificationPriority::Info,
                    issues,
                    format!(
                        "Monitoring started - will suspend in {} days if not resolved",
                        self.policy.suspend_after_days
                    ),
                    now,
                ));
            }
            Transition::SuspendForDowntime { days_offline } => {
                log::warn!("[lifecycle] {fqdn}: down for {days_offline} days, suspending");
                domain.status = DomainStatus::Suspended;
                domain.suspend_reason = Some(SuspendReason::Downtime);
                self.suspend(
                    &domain,
                    SuspendReason::Downtime,
                    format!("Offline for {days_offline} days: {}", issues.join(", ")),
                    now,
                )
                .await?;
                self.ctx.notifier.notify(Notification::health_alert(
                    fqdn,
                    NotificationPriority::High,
                    issues,
                    format!(
                        "Domain SUSPENDED - will be deleted in {} days if not resolved",
                        self.policy.delete_after_days - days_offline
                    ),
                    now,
                ));
            }
            Transition::DeletionWarning {
                days_offline,
                days_remaining,
            } => {
                log::info!("[lifecycle] {fqdn}: deletion warning, {days_remaining} days left");
                domain.last_deletion_warning_day = Some(days_offline);
                self.ctx.domain_repository.save_lifecycle_state(&domain).await?;
                self.ctx.notifier.notify(Notification::deletion_warning(
                    fqdn,
                    days_offline,
                    days_remaining,
                    now,
                ));
            }
            Transition::Delete { days_offline } => {
                log::warn!("[lifecycle] {fqdn}: down for {days_offline} days, deleting");
                if let Err(e) = self.reconciler.reconcile_domain_deletion(&domain).await {
                    log_core_error(&format!("[lifecycle] {fqdn}: DNS teardown failed"), &e);
                }
                self.ctx.domain_repository.tombstone(domain.id, now).await?;
                self.ctx.notifier.notify(Notification::health_alert(
                    fqdn,
                    NotificationPriority::High,
                    issues,
                    format!("Domain DELETED after {days_offline} days offline"),
                    now,
                ));
            }
            Transition::Recover { reactivate } => {
                log::info!("[lifecycle] {fqdn}: recovered (reactivate={reactivate})");
                domain.first_failed_at = None;
                domain.last_deletion_warning_day = None;
                if reactivate {
                    domain.status = DomainStatus::Active;
                    domain.suspend_reason = None;
                }
                self.ctx.domain_repository.save_lifecycle_state(&domain).await?;
                let action = if reactivate {
                    if let Err(e) = self.reconciler.set_subdomain_disabled(&domain, false).await {
                        log_core_error(&format!("[lifecycle] {fqdn}: re-enabling DNS failed"), &e);
                    }
                    "Domain is back online and has been reactivated".to_string()
                } else if domain.is_suspended() {
                    "Domain is back online (remains suspended)".to_string()
                } else {
                    "Domain is back online".to_string()
                };
                self.ctx
                    .notifier
                    .notify(Notification::recovery(fqdn, action, now));
            }
        }

        Ok(transition)
    }

    /// Persist a suspension, write the audit row and disable the domain's DNS.
    async fn suspend(
        &self,
        domain: &Domain,
        reason: SuspendReason,
        details: String,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.ctx.domain_repository.save_lifecycle_state(domain).await?;
        let record = SuspensionRecord {
            domain_id: domain.id,
            reason,
            details,
            created_at: now,
        };
        if let Err(e) = self.ctx.domain_repository.record_suspension(&record).await {
            log_core_error(
                &format!("[lifecycle] {}: suspension audit write failed", domain.full_domain),
                &e,
            );
        }
        if let Err(e) = self.reconciler.set_subdomain_disabled(domain, true).await {
            log_core_error(
                &format!("[lifecycle] {}: disabling DNS failed", domain.full_domain),
                &e,
            );
        }
        Ok(())
    }

    /// Decide and apply this cycle's transition for a pending reservation.
    pub async fn evaluate_pending(
        &self,
        pending: PendingDomain,
        is_down: bool,
        issues: Vec<String>,
    ) -> CoreResult<PendingTransition> {
        let repository = &self.ctx.pending_domain_repository;
        let Some(mut pending) = repository.find_by_id(pending.id).await? else {
            log::debug!(
                "[lifecycle] pending {}: released during scan, skipping",
                pending.full_domain
            );
            return Ok(PendingTransition::None);
        };
        let now = self.ctx.clock.now();
        let transition = decide_pending(&pending, is_down, now, &self.policy);
        let fqdn = pending.full_domain.clone();

        match transition {
            PendingTransition::None => {}
            PendingTransition::StartMonitoring => {
                log::info!("[lifecycle] pending {fqdn}: down, monitoring started");
                pending.first_failed_at = Some(now);
                repository.update(&pending).await?;
                self.ctx.notifier.notify(Notification::health_alert(
                    fqdn,
                    NotificationPriority::Info,
                    issues,
                    format!(
                        "Pending domain monitoring started - will be marked unhealthy in {} days",
                        self.policy.suspend_after_days
                    ),
                    now,
                ));
            }
            PendingTransition::MarkUnhealthy { days_offline } => {
                log::warn!("[lifecycle] pending {fqdn}: down for {days_offline} days, unhealthy");
                pending.status = PendingStatus::Unhealthy;
                repository.update(&pending).await?;
                self.ctx.notifier.notify(Notification::health_alert(
                    fqdn,
                    NotificationPriority::High,
                    issues,
                    format!(
                        "Pending domain marked UNHEALTHY - reservation released in {} days",
                        self.policy.delete_after_days - days_offline
                    ),
                    now,
                ));
            }
            PendingTransition::DeletionWarning {
                days_offline,
                days_remaining,
            } => {
                pending.last_deletion_warning_day = Some(days_offline);
                repository.update(&pending).await?;
                self.ctx.notifier.notify(Notification::deletion_warning(
                    fqdn,
                    days_offline,
                    days_remaining,
                    now,
                ));
            }
            PendingTransition::Release { days_offline } => {
                log::warn!("[lifecycle] pending {fqdn}: down for {days_offline} days, releasing");
                repository.delete(pending.id).await?;
                self.ctx.notifier.notify(Notification::health_alert(
                    fqdn,
                    NotificationPriority::High,
                    issues,
                    "Pending domain DELETED - now available for registration".to_string(),
                    now,
                ));
            }
            PendingTransition::Recover => {
                log::info!("[lifecycle] pending {fqdn}: recovered");
                pending.first_failed_at = None;
                pending.last_deletion_warning_day = None;
                pending.status = PendingStatus::Pending;
                repository.update(&pending).await?;
                self.ctx.notifier.notify(Notification::recovery(
                    fqdn,
                    "Pending domain is back online",
                    now,
                ));
            }
        }

        Ok(transition)
    }
}
