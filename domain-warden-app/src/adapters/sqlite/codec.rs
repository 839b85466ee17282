//! Column encoding shared by the repositories.

use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use serde::Serialize;
use serde::de::DeserializeOwned;

use domain_warden_core::error::CoreError;
use domain_warden_core::CoreResult;

/// Map a database error onto `StorageError` with what was being attempted.
pub(super) fn storage(action: &str) -> impl FnOnce(DbErr) -> CoreError + '_ {
    move |e| CoreError::StorageError(format!("Failed to {action}: {e}"))
}

/// Serde name of a unit enum variant, e.g. `Suspended` -> `"suspended"`.
pub(super) fn enum_to_string<T: Serialize>(value: &T) -> CoreResult<String> {
    serde_json::to_value(value)?
        .as_str()
        .map(String::from)
        .ok_or_else(|| CoreError::SerializationError("Expected a unit enum variant".to_string()))
}

pub(super) fn enum_from_string<T: DeserializeOwned>(field: &str, value: String) -> CoreResult<T> {
    serde_json::from_value(serde_json::Value::String(value))
        .map_err(|e| CoreError::SerializationError(format!("Invalid {field}: {e}")))
}

pub(super) fn optional_enum_from_string<T: DeserializeOwned>(
    field: &str,
    value: Option<String>,
) -> CoreResult<Option<T>> {
    value.map(|v| enum_from_string(field, v)).transpose()
}

pub(super) fn parse_timestamp(field: &str, value: &str) -> CoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoreError::SerializationError(format!("Invalid {field}: {e}")))
}

pub(super) fn parse_optional_timestamp(
    field: &str,
    value: Option<String>,
) -> CoreResult<Option<DateTime<Utc>>> {
    value.map(|v| parse_timestamp(field, &v)).transpose()
}

pub(super) fn optional_timestamp(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|dt| dt.to_rfc3339())
}

/// Unsigned counter read back from a signed column; negative values become 0.
pub(super) fn unsigned<T: TryFrom<i64> + Default>(value: i64) -> T {
    T::try_from(value).unwrap_or_default()
}

/// Unsigned value written to a signed column, saturating at `i64::MAX`.
pub(super) fn signed<T: TryInto<i64>>(value: T) -> i64 {
    value.try_into().unwrap_or(i64::MAX)
}

/// Row limit for `QuerySelect::limit`.
pub(super) fn limit(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use domain_warden_core::types::{DomainStatus, SuspendReason};

    #[test]
    fn enums_use_serde_names() {
        assert_eq!(enum_to_string(&DomainStatus::Suspended).unwrap(), "suspended");
        let reason: SuspendReason = enum_from_string("reason", "downtime".to_string()).unwrap();
        assert_eq!(reason, SuspendReason::Downtime);
        assert!(enum_from_string::<SuspendReason>("reason", "bogus".to_string()).is_err());
    }

    #[test]
    fn counters_clamp_instead_of_wrapping() {
        assert_eq!(unsigned::<u32>(-5), 0);
        assert_eq!(unsigned::<u32>(42), 42);
        assert_eq!(signed(u64::MAX), i64::MAX);
        assert_eq!(signed(7_u32), 7);
    }
}
