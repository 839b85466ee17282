//! Notification type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    HealthAlert,
    AutoSuspend,
    DeletionWarning,
    Recovery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Info,
    High,
}

/// A lifecycle event worth telling an operator about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: NotificationKind,
    pub priority: NotificationPriority,
    pub domain: String,
    pub issues: Vec<String>,
    pub action: String,
    pub occurred_at: DateTime<Utc>,
}

impl Notification {
    pub fn health_alert(
        domain: impl Into<String>,
        priority: NotificationPriority,
        issues: Vec<String>,
        action: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: NotificationKind::HealthAlert,
            priority,
            domain: domain.into(),
            issues,
            action: action.into(),
            occurred_at,
        }
    }

    /// Immediate suspension after a confirmed threat.
    pub fn auto_suspend(
        domain: impl Into<String>,
        issues: Vec<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: NotificationKind::AutoSuspend,
            priority: NotificationPriority::High,
            domain: domain.into(),
            issues,
            action: "Domain SUSPENDED immediately (threat detected)".to_string(),
            occurred_at,
        }
    }

    pub fn deletion_warning(
        domain: impl Into<String>,
        days_offline: i64,
        days_remaining: i64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: NotificationKind::DeletionWarning,
            priority: NotificationPriority::High,
            domain: domain.into(),
            issues: vec![format!("Offline for {days_offline} days")],
            action: format!("Domain will be DELETED in {days_remaining} days if not resolved"),
            occurred_at,
        }
    }

    pub fn recovery(domain: impl Into<String>, action: impl Into<String>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            kind: NotificationKind::Recovery,
            priority: NotificationPriority::Info,
            domain: domain.into(),
            issues: Vec::new(),
            action: action.into(),
            occurred_at,
        }
    }
}
