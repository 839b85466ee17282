//! Keeps the authoritative zone in line with the stored record set.

use std::collections::BTreeSet;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use tokio::task::JoinHandle;

use domain_warden_provider::{
    ProviderError, RecordType, ResourceRecord, Rrset, RrsetChange, ensure_trailing_dot,
    full_name_to_relative, is_name_within,
};

use super::detached::DetachedTasks;
use super::log_core_error;
use crate::ServiceContext;
use crate::error::{CoreError, CoreResult};
use crate::types::{
    DEFAULT_MX_PRIORITY, DEFAULT_TTL, DnsRecord, Domain, DomainId, NameserverMode, NewDnsRecord,
    PullSyncStats, RecordId,
};

/// DNS reconciliation service.
pub struct DnsReconciler {
    ctx: Arc<ServiceContext>,
    tasks: DetachedTasks,
}

impl DnsReconciler {
    pub fn new(ctx: Arc<ServiceContext>, max_concurrent: usize) -> Self {
        Self {
            ctx,
            tasks: DetachedTasks::new(max_concurrent),
        }
    }

    // ===== RRset sync =====

    /// Zone-file content of a stored record.
    ///
    /// MX gets its preference prepended; CNAME/NS/MX/SRV targets are
    /// dot-terminated; TXT is quoted.
    pub fn wire_content(record: &DnsRecord) -> String {
        let content = record.content.trim();
        match record.record_type {
            RecordType::Mx => format!(
                "{} {}",
                record.priority.unwrap_or(DEFAULT_MX_PRIORITY),
                ensure_trailing_dot(content)
            ),
            RecordType::Cname | RecordType::Ns => ensure_trailing_dot(content),
            RecordType::Srv => {
                let mut parts: Vec<String> =
                    content.split_whitespace().map(str::to_string).collect();
                if parts.len() == 3 {
                    parts.insert(0, record.priority.unwrap_or(0).to_string());
                }
                if let Some(target) = parts.last_mut() {
                    *target = ensure_trailing_dot(target);
                }
                parts.join(" ")
            }
            RecordType::Txt => quote_txt(content),
            _ => content.to_string(),
        }
    }

    /// The PATCH entry that makes the zone hold exactly `records`.
    ///
    /// `records` are the group's active records ordered by id; the TTL comes from
    /// the first one. An empty group becomes a DELETE.
    pub fn group_change(
        domain: &Domain,
        name: &str,
        record_type: RecordType,
        records: &[DnsRecord],
    ) -> RrsetChange {
        let fqdn = domain.record_fqdn(name);
        match records.first() {
            None => RrsetChange::delete(fqdn, record_type),
            Some(first) => RrsetChange::replace(
                fqdn,
                record_type,
                first.ttl,
                records
                    .iter()
                    .map(|r| ResourceRecord::new(Self::wire_content(r)))
                    .collect(),
            ),
        }
    }

    /// Rebuild one RRset from the store and push it.
    ///
    /// The group's records are marked synced or failed according to the outcome,
    /// and the domain's `dns_synced` flag is recomputed either way.
    pub async fn reconcile_group(
        &self,
        domain: &Domain,
        name: &str,
        record_type: RecordType,
    ) -> CoreResult<()> {
        let repository = &self.ctx.dns_record_repository;
        let records = repository
            .list_active_group(domain.id, name, record_type)
            .await?;
        let change = Self::group_change(domain, name, record_type, &records);
        let zone = domain.authoritative_zone();
        log::info!(
            "[reconcile] {:?} {} {record_type} in {zone} ({} records)",
            change.changetype,
            change.name,
            records.len()
        );

        let ids: Vec<RecordId> = records.iter().map(|r| r.id).collect();
        let pushed = self
            .ctx
            .zone_provider
            .patch_rrsets(&zone, std::slice::from_ref(&change))
            .await;

        let marked = match &pushed {
            Ok(()) if ids.is_empty() => Ok(()),
            Ok(()) => repository.mark_synced(&ids, self.ctx.clock.now()).await,
            Err(_) if ids.is_empty() => Ok(()),
            Err(e) => repository.mark_sync_failed(&ids, &e.to_string()).await,
        };
        self.refresh_dns_synced(domain.id).await;

        pushed?;
        marked
    }

    /// Sync the RRset `record` belongs to.
    pub async fn reconcile_record(&self, record: &DnsRecord, domain: &Domain) -> CoreResult<()> {
        self.reconcile_group(domain, &record.name, record.record_type)
            .await
    }

    /// [`reconcile_record`](Self::reconcile_record) on a detached task.
    ///
    /// Returns at once. The outcome is recorded on the records only; nothing is
    /// retried.
    pub fn reconcile_record_detached(
        self: &Arc<Self>,
        record: DnsRecord,
        domain: Domain,
    ) -> JoinHandle<()> {
        let this = Arc::clone(self);
        let label = format!(
            "reconcile {} {}",
            record.record_type,
            domain.record_fqdn(&record.name)
        );
        self.tasks.spawn(label, async move {
            this.reconcile_record(&record, &domain).await
        })
    }

    /// Detached sync after an update that may have moved a record to another
    /// name or type; both the old and the new RRset are rebuilt.
    pub fn reconcile_record_move_detached(
        self: &Arc<Self>,
        previous: DnsRecord,
        current: DnsRecord,
        domain: Domain,
    ) -> JoinHandle<()> {
        let this = Arc::clone(self);
        let label = format!(
            "reconcile move {} -> {}",
            domain.record_fqdn(&previous.name),
            domain.record_fqdn(&current.name)
        );
        self.tasks.spawn(label, async move {
            let moved = previous.group_key() != current.group_key();
            let old_group = if moved {
                this.reconcile_record(&previous, &domain).await
            } else {
                Ok(())
            };
            let new_group = this.reconcile_record(&current, &domain).await;
            old_group.and(new_group)
        })
    }

    async fn refresh_dns_synced(&self, domain_id: DomainId) {
        if let Err(e) = self.recompute_dns_synced(domain_id).await {
            log_core_error(
                &format!("[reconcile] Failed to refresh dns_synced of domain {domain_id}"),
                &e,
            );
        }
    }

    async fn recompute_dns_synced(&self, domain_id: DomainId) -> CoreResult<()> {
        let unsynced = self
            .ctx
            .dns_record_repository
            .count_unsynced_active(domain_id)
            .await?;
        self.ctx
            .domain_repository
            .set_dns_synced(domain_id, unsynced == 0)
            .await
    }

    // ===== Admission =====

    /// Reject a record write that is malformed or breaks CNAME exclusivity.
    ///
    /// `exclude` is the id of the record being updated, so it does not conflict
    /// with itself.
    pub async fn check_record_admissible(
        &self,
        candidate: &NewDnsRecord,
        exclude: Option<RecordId>,
    ) -> CoreResult<()> {
        let candidate = candidate.clone().normalize();
        validate_content(&candidate)?;

        let neighbours: Vec<DnsRecord> = self
            .ctx
            .dns_record_repository
            .list_active_by_name(candidate.domain_id, &candidate.name)
            .await?
            .into_iter()
            .filter(|r| Some(r.id) != exclude)
            .collect();

        if candidate.record_type == RecordType::Cname {
            if let Some(other) = neighbours.first() {
                return Err(CoreError::RecordConflict(format!(
                    "CNAME at '{}' cannot coexist with the existing {} record",
                    candidate.name, other.record_type
                )));
            }
        } else if neighbours
            .iter()
            .any(|r| r.record_type == RecordType::Cname)
        {
            return Err(CoreError::RecordConflict(format!(
                "'{}' already has a CNAME record; no other record may share the name",
                candidate.name
            )));
        }
        Ok(())
    }

    // ===== Zone-wide operations =====

    /// Flip the `disabled` flag on every RRset at or under the domain's FQDN.
    ///
    /// SOA and NS sets are left alone. All matches go out in one PATCH; returns
    /// how many RRsets were touched.
    ///
    /// Types outside [`RecordType`] (DS, TLSA, HTTPS, ...) are read back as
    /// `Other` without their wire name, so they cannot be re-sent and stay as
    /// they are; a warning names how many were skipped.
    pub async fn set_subdomain_disabled(&self, domain: &Domain, disabled: bool) -> CoreResult<usize> {
        let zone_name = domain.authoritative_zone();
        let fqdn = domain.fqdn();
        if domain.nameserver_mode == NameserverMode::Delegated {
            log::debug!("[reconcile] {fqdn} is delegated; toggling records in its own zone");
        }

        let zone = self.ctx.zone_provider.get_zone(&zone_name).await?;
        let (unmodeled, rrsets): (Vec<Rrset>, Vec<Rrset>) = zone
            .rrsets
            .into_iter()
            .filter(|rrset| is_name_within(&rrset.name, &fqdn))
            .filter(|rrset| !matches!(rrset.record_type, RecordType::Soa | RecordType::Ns))
            .partition(|rrset| rrset.record_type == RecordType::Other);
        if !unmodeled.is_empty() {
            log::warn!(
                "[reconcile] {fqdn}: {} RRsets of unsupported types not toggled",
                unmodeled.len()
            );
        }

        let changes: Vec<RrsetChange> = rrsets
            .into_iter()
            .map(|rrset| {
                let records = rrset
                    .records
                    .into_iter()
                    .map(|r| ResourceRecord {
                        content: r.content,
                        disabled,
                    })
                    .collect();
                RrsetChange::replace(rrset.name, rrset.record_type, rrset.ttl, records)
            })
            .collect();

        if changes.is_empty() {
            log::debug!("[reconcile] No RRsets under {fqdn} in {zone_name}, nothing to toggle");
            return Ok(0);
        }

        log::info!(
            "[reconcile] {} {} RRsets under {fqdn}",
            if disabled { "Disabling" } else { "Enabling" },
            changes.len()
        );
        self.ctx
            .zone_provider
            .patch_rrsets(&zone_name, &changes)
            .await?;
        Ok(changes.len())
    }

    /// Remove every trace of a domain from DNS and from the record store.
    ///
    /// RRset deletions are best-effort: a failure is logged and the next group is
    /// still processed.
    pub async fn reconcile_domain_deletion(&self, domain: &Domain) -> CoreResult<()> {
        let provider = &self.ctx.zone_provider;
        let zone = domain.authoritative_zone();
        let fqdn = domain.fqdn();

        let records = self
            .ctx
            .dns_record_repository
            .list_by_domain(domain.id)
            .await?;
        let groups: BTreeSet<(String, RecordType)> = records
            .iter()
            .map(|r| (r.name.clone(), r.record_type))
            .collect();

        let mut failures = 0usize;
        for (name, record_type) in &groups {
            let owner = domain.record_fqdn(name);
            if let Err(e) = provider.delete_rrset(&zone, &owner, *record_type).await {
                failures += 1;
                log::warn!("[reconcile] Failed to delete {owner} {record_type} from {zone}: {e}");
            }
        }

        let removed = self
            .ctx
            .dns_record_repository
            .delete_by_domain(domain.id)
            .await?;

        let teardown = match domain.nameserver_mode {
            NameserverMode::Delegated => provider.delete_zone(&fqdn).await,
            NameserverMode::Shared => {
                provider
                    .delete_rrset(&zone, &fqdn, RecordType::Ns)
                    .await
            }
        };
        match teardown {
            Ok(()) => {}
            Err(e) if e.is_zone_not_found() => {
                log::debug!("[reconcile] {fqdn}: zone already gone");
            }
            Err(e) => {
                failures += 1;
                log::warn!("[reconcile] {fqdn}: teardown failed: {e}");
            }
        }

        log::info!(
            "[reconcile] {fqdn} deleted: {} RRsets, {removed} records, {failures} failures",
            groups.len()
        );
        Ok(())
    }

    /// Move a domain between the shared parent zone and its own zone.
    ///
    /// Zone-exists and zone-not-found answers are treated as already done. The
    /// new mode is persisted and the updated domain returned.
    pub async fn switch_nameserver_mode(
        &self,
        domain: &Domain,
        target: NameserverMode,
    ) -> CoreResult<Domain> {
        if domain.nameserver_mode == target {
            log::debug!(
                "[reconcile] {} already in {target:?} mode",
                domain.full_domain
            );
            return Ok(domain.clone());
        }

        let provider = &self.ctx.zone_provider;
        let fqdn = domain.fqdn();
        let parent_zone = ensure_trailing_dot(&domain.parent_zone);
        let nameservers: Vec<ResourceRecord> = domain
            .nameservers
            .iter()
            .map(|ns| ResourceRecord::new(ensure_trailing_dot(ns)))
            .collect();

        match target {
            NameserverMode::Shared => {
                benign(provider.delete_zone(&fqdn).await, &fqdn)?;
                if nameservers.is_empty() {
                    log::warn!("[reconcile] {fqdn} has no nameservers, skipping NS RRset");
                } else {
                    let change =
                        RrsetChange::replace(fqdn.clone(), RecordType::Ns, DEFAULT_TTL, nameservers);
                    provider
                        .patch_rrsets(&parent_zone, std::slice::from_ref(&change))
                        .await?;
                }
            }
            NameserverMode::Delegated => {
                benign(
                    provider.delete_rrset(&parent_zone, &fqdn, RecordType::Ns).await,
                    &fqdn,
                )?;
                benign(provider.create_zone(&fqdn, &domain.nameservers).await, &fqdn)?;
            }
        }

        let mut updated = domain.clone();
        updated.nameserver_mode = target;
        self.ctx.domain_repository.update(&updated).await?;
        log::info!("[reconcile] {fqdn} switched to {target:?} mode");
        Ok(updated)
    }

    /// Import the zone's records into the store.
    ///
    /// Records match on `(name, type, content)`; matches get the zone's TTL and
    /// priority and are marked synced, everything else is created active and synced.
    pub async fn pull_sync(&self, domain: &Domain) -> CoreResult<PullSyncStats> {
        let zone = self
            .ctx
            .zone_provider
            .get_zone(&domain.authoritative_zone())
            .await?;
        let repository = &self.ctx.dns_record_repository;
        let existing = repository.list_by_domain(domain.id).await?;
        let fqdn = domain.fqdn();
        let now = self.ctx.clock.now();
        let mut stats = PullSyncStats::default();

        for rrset in zone.rrsets {
            if !is_name_within(&rrset.name, &fqdn) {
                continue;
            }
            let name = full_name_to_relative(&rrset.name, &domain.full_domain);
            let skip_set = !rrset.record_type.is_managed()
                || (rrset.record_type == RecordType::Ns && name == "@");

            for rr in rrset.records {
                if skip_set || rr.disabled {
                    stats.skipped += 1;
                    continue;
                }
                let (content, priority) = parse_wire_content(rrset.record_type, &rr.content);

                let found = existing.iter().find(|r| {
                    r.name == name && r.record_type == rrset.record_type && r.content == content
                });
                if let Some(found) = found {
                    let mut updated = found.clone();
                    updated.ttl = rrset.ttl;
                    if priority.is_some() {
                        updated.priority = priority;
                    }
                    updated.synced = true;
                    updated.last_sync_error = None;
                    updated.last_synced_at = Some(now);
                    updated.updated_at = now;
                    repository.update(&updated).await?;
                    stats.updated += 1;
                } else {
                    repository
                        .create(&DnsRecord {
                            id: 0,
                            domain_id: domain.id,
                            name: name.clone(),
                            record_type: rrset.record_type,
                            content,
                            ttl: rrset.ttl,
                            priority,
                            active: true,
                            synced: true,
                            last_sync_error: None,
                            last_synced_at: Some(now),
                            created_at: now,
                            updated_at: now,
                        })
                        .await?;
                    stats.created += 1;
                }
            }
        }

        self.refresh_dns_synced(domain.id).await;
        log::info!(
            "[reconcile] Pulled {fqdn}: {} created, {} updated, {} skipped",
            stats.created,
            stats.updated,
            stats.skipped
        );
        Ok(stats)
    }
}

/// Treat zone-exists / zone-not-found as success.
fn benign(result: Result<(), ProviderError>, fqdn: &str) -> CoreResult<()> {
    match result {
        Err(e) if e.is_zone_exists() || e.is_zone_not_found() => {
            log::debug!("[reconcile] {fqdn}: {e} (ignored)");
            Ok(())
        }
        other => other.map_err(CoreError::from),
    }
}

fn validate_content(record: &NewDnsRecord) -> CoreResult<()> {
    let invalid = |msg: String| -> CoreResult<()> { Err(CoreError::ValidationError(msg)) };
    let content = record.content.as_str();

    if !record.record_type.is_managed() {
        return invalid(format!("Unsupported record type: {}", record.record_type));
    }
    if content.is_empty() {
        return invalid("Record content is required".to_string());
    }
    if record.ttl == Some(0) {
        return invalid("TTL must be positive".to_string());
    }
    match record.record_type {
        RecordType::A if content.parse::<Ipv4Addr>().is_err() => {
            invalid(format!("A record requires an IPv4 address, got '{content}'"))
        }
        RecordType::Aaaa if content.parse::<Ipv6Addr>().is_err() => {
            invalid(format!("AAAA record requires an IPv6 address, got '{content}'"))
        }
        RecordType::Cname | RecordType::Mx | RecordType::Ns
            if content.split_whitespace().count() != 1 =>
        {
            invalid(format!(
                "{} record requires a single host name, got '{content}'",
                record.record_type
            ))
        }
        RecordType::Srv if !matches!(content.split_whitespace().count(), 3 | 4) => invalid(
            format!("SRV record requires 'weight port target', got '{content}'"),
        ),
        _ => Ok(()),
    }
}

fn quote_txt(content: &str) -> String {
    if content.len() >= 2 && content.starts_with('"') && content.ends_with('"') {
        content.to_string()
    } else {
        format!("\"{}\"", content.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

fn unquote_txt(content: &str) -> String {
    match content
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
    {
        Some(inner) if !inner.contains("\" \"") => {
            inner.replace("\\\"", "\"").replace("\\\\", "\\")
        }
        _ => content.to_string(),
    }
}

/// Split zone-file content back into stored content and priority.
fn parse_wire_content(record_type: RecordType, content: &str) -> (String, Option<u16>) {
    let content = content.trim();
    match record_type {
        RecordType::Mx => match content.split_once(char::is_whitespace) {
            Some((priority, target)) => (
                target.trim().trim_end_matches('.').to_string(),
                priority.parse().ok(),
            ),
            None => (content.trim_end_matches('.').to_string(), None),
        },
        RecordType::Srv => {
            let parts: Vec<&str> = content.split_whitespace().collect();
            if let [priority, weight, port, target] = parts.as_slice() {
                (
                    format!("{weight} {port} {}", target.trim_end_matches('.')),
                    priority.parse().ok(),
                )
            } else {
                (content.to_string(), None)
            }
        }
        RecordType::Cname | RecordType::Ns => (content.trim_end_matches('.').to_string(), None),
        RecordType::Txt => (unquote_txt(content), None),
        _ => (content.to_string(), None),
    }
}
