//! Tab identity reconciliation
//!
//! Tab ids are ephemeral, so a tab's age hangs off a fingerprint of
//! `url#window#position` instead. Each fingerprint owns one [`TabInstance`]
//! record. When a live tab has no exact record, continuity is looked for in
//! this order:
//!
//! 1. exact fingerprint
//! 2. same URL in the same window at another position (earliest `createdAt`
//!    wins, record is re-keyed)
//! 3. URL first-seen timestamp
//! 4. brand new sitting
//!
//! All writes for a pass are collected in [`Changes`] and committed at the
//! end, so a pass is a read-compute-write over the store with
//! last-writer-wins semantics.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

use crate::browser::{Tab, TabId, WindowId};
use crate::error::Result;
use crate::store::{keys, Entries, KvStore};

/// Instance records unseen for longer than this are swept
pub const DEFAULT_INSTANCE_TTL_DAYS: i64 = 30;

pub fn fingerprint(url: &str, window_id: WindowId, position: usize) -> String {
    format!("{}#{}#{}", url, window_id, position)
}

/// One logical sitting of a tab at a URL, window and position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInstance {
    pub url: String,
    pub window_id: WindowId,
    pub position: usize,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_seen_at: DateTime<Utc>,
}

impl TabInstance {
    pub fn new(
        url: &str,
        window_id: WindowId,
        position: usize,
        created_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            url: url.to_string(),
            window_id,
            position,
            created_at,
            last_seen_at: now,
        }
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.url, self.window_id, self.position)
    }
}

/// How a live tab's age was established
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Exact,
    Relocated,
    UrlFirstSeen,
    New,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAge {
    pub tab_id: TabId,
    pub created_at: DateTime<Utc>,
    pub resolution: Resolution,
}

/// Timestamps are stored as epoch milliseconds
pub fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    value.as_i64().and_then(DateTime::from_timestamp_millis)
}

fn timestamp_value(ts: DateTime<Utc>) -> Value {
    Value::from(ts.timestamp_millis())
}

// ============================================
// PENDING WRITES
// ============================================

#[derive(Debug, Default)]
struct Changes {
    set: Entries,
    remove: Vec<String>,
}

impl Changes {
    fn put(&mut self, key: String, value: Value) {
        self.remove.retain(|k| k != &key);
        self.set.insert(key, value);
    }

    fn put_instance(&mut self, instance: &TabInstance) -> Result<()> {
        let value = serde_json::to_value(instance)?;
        self.put(keys::instance(&instance.fingerprint()), value);
        Ok(())
    }

    fn put_timestamp(&mut self, key: String, ts: DateTime<Utc>) {
        self.put(key, timestamp_value(ts));
    }

    fn drop_key(&mut self, key: String) {
        self.set.remove(&key);
        if !self.remove.contains(&key) {
            self.remove.push(key);
        }
    }

    fn commit(self, store: &mut dyn KvStore) -> Result<()> {
        if !self.set.is_empty() {
            store.set(self.set)?;
        }
        if !self.remove.is_empty() {
            store.remove(&self.remove)?;
        }
        Ok(())
    }
}

/// Instance records from a full store snapshot, keyed by fingerprint
fn load_instances(entries: &Entries) -> BTreeMap<String, TabInstance> {
    entries
        .iter()
        .filter_map(|(key, value)| {
            let fp = key.strip_prefix(keys::INSTANCE_PREFIX)?;
            match serde_json::from_value::<TabInstance>(value.clone()) {
                Ok(instance) => Some((fp.to_string(), instance)),
                Err(err) => {
                    warn!(key = %key, error = %err, "Skipping malformed tab instance record");
                    None
                }
            }
        })
        .collect()
}

/// Fingerprint of the matching unclaimed instance with the earliest
/// `createdAt`. Ties go to the first record in key order.
fn earliest_match<F>(
    instances: &BTreeMap<String, TabInstance>,
    claimed: &HashSet<String>,
    matches: F,
) -> Option<String>
where
    F: Fn(&TabInstance) -> bool,
{
    let mut best: Option<(&String, &TabInstance)> = None;
    let mut tied = false;

    for (fp, instance) in instances
        .iter()
        .filter(|(fp, instance)| !claimed.contains(*fp) && matches(instance))
    {
        match best {
            Some((_, current)) if instance.created_at < current.created_at => {
                best = Some((fp, instance));
                tied = false;
            }
            Some((_, current)) if instance.created_at == current.created_at => tied = true,
            Some(_) => {}
            None => best = Some((fp, instance)),
        }
    }

    if let Some((fp, instance)) = best {
        if tied {
            warn!(
                fingerprint = %fp,
                url = %instance.url,
                "Several prior instances share the earliest creation time; using the first"
            );
        }
    }
    best.map(|(fp, _)| fp.clone())
}

// ============================================
// STARTUP PASS
// ============================================

/// Delete every instance record not seen within `ttl`. Malformed instance
/// records are deleted too. Returns the number of records removed.
pub fn sweep_expired(store: &mut dyn KvStore, now: DateTime<Utc>, ttl: Duration) -> Result<usize> {
    let cutoff = now - ttl;
    let entries = store.get(None)?;

    let expired: Vec<String> = entries
        .iter()
        .filter(|(key, _)| key.starts_with(keys::INSTANCE_PREFIX))
        .filter(|(_, value)| {
            serde_json::from_value::<TabInstance>((*value).clone())
                .map_or(true, |instance| instance.last_seen_at < cutoff)
        })
        .map(|(key, _)| key.clone())
        .collect();

    if !expired.is_empty() {
        store.remove(&expired)?;
    }
    debug!(removed = expired.len(), "Swept expired tab instances");
    Ok(expired.len())
}

/// Resolve `createdAt` for every live tab with a URL and persist the
/// results. Exact fingerprints are claimed before any relocation search so
/// two live tabs never share a lineage. Age records for ids that did not
/// resolve in this pass are dropped.
pub fn reconcile_all(
    store: &mut dyn KvStore,
    tabs: &[Tab],
    now: DateTime<Utc>,
) -> Result<Vec<ResolvedAge>> {
    let entries = store.get(None)?;
    let mut instances = load_instances(&entries);
    let mut first_seen: HashMap<String, DateTime<Utc>> = HashMap::new();
    let mut changes = Changes::default();

    let live: Vec<(&Tab, &str, String)> = tabs
        .iter()
        .filter_map(|tab| {
            let url = tab.resolved_url()?;
            Some((tab, url, fingerprint(url, tab.window_id, tab.position)))
        })
        .collect();

    let mut claimed: HashSet<String> = live
        .iter()
        .filter(|(_, _, fp)| instances.contains_key(fp))
        .map(|(_, _, fp)| fp.clone())
        .collect();

    let mut resolved = Vec::with_capacity(live.len());
    for (tab, url, fp) in &live {
        let (created_at, resolution) = if let Some(instance) = instances.get_mut(fp) {
            instance.last_seen_at = now;
            changes.put_instance(instance)?;
            (instance.created_at, Resolution::Exact)
        } else if let Some((old_fp, mut instance)) = earliest_match(&instances, &claimed, |i| {
            i.url == *url && i.window_id == tab.window_id
        })
        .and_then(|old_fp| instances.remove(&old_fp).map(|i| (old_fp, i)))
        {
            debug!(tab_id = tab.id, from = %old_fp, to = %fp, "Re-keying repositioned tab");
            instance.position = tab.position;
            instance.last_seen_at = now;
            changes.drop_key(keys::instance(&old_fp));
            changes.put_instance(&instance)?;
            let created_at = instance.created_at;
            instances.insert(fp.clone(), instance);
            claimed.insert(fp.clone());
            (created_at, Resolution::Relocated)
        } else {
            let seen = first_seen.get(*url).copied().or_else(|| {
                entries
                    .get(&keys::url_first_seen(url))
                    .and_then(timestamp_from_value)
            });
            let (created_at, resolution) = match seen {
                Some(seen) => (seen, Resolution::UrlFirstSeen),
                None => {
                    changes.put_timestamp(keys::url_first_seen(url), now);
                    first_seen.insert(url.to_string(), now);
                    (now, Resolution::New)
                }
            };
            let instance = TabInstance::new(url, tab.window_id, tab.position, created_at, now);
            changes.put_instance(&instance)?;
            instances.insert(fp.clone(), instance);
            claimed.insert(fp.clone());
            (created_at, resolution)
        };

        changes.put_timestamp(keys::tab_created(tab.id), created_at);
        resolved.push(ResolvedAge {
            tab_id: tab.id,
            created_at,
            resolution,
        });
    }

    let resolved_ids: HashSet<TabId> = resolved.iter().map(|r| r.tab_id).collect();
    for key in entries.keys() {
        if let Some(id) = keys::parse_tab_created(key) {
            if !resolved_ids.contains(&id) {
                changes.drop_key(key.clone());
            }
        }
    }

    changes.commit(store)?;
    Ok(resolved)
}

// ============================================
// INCREMENTAL UPDATES
// ============================================

/// A tab appeared at a URL (created, or navigated to a new URL). Starts a
/// fresh lineage at the current fingerprint.
pub fn record_new_sitting(
    store: &mut dyn KvStore,
    tab_id: TabId,
    url: &str,
    window_id: WindowId,
    position: usize,
    now: DateTime<Utc>,
) -> Result<()> {
    let mut changes = Changes::default();
    let first_seen_key = keys::url_first_seen(url);
    if store.get_one(&first_seen_key)?.is_none() {
        changes.put_timestamp(first_seen_key, now);
    }
    changes.put_instance(&TabInstance::new(url, window_id, position, now, now))?;
    changes.put_timestamp(keys::tab_created(tab_id), now);
    changes.commit(store)
}

/// Re-key the record at `url#window#from` to `url#window#to`. Returns the
/// carried `createdAt`, or `None` when there was no record to move.
pub fn relocate(
    store: &mut dyn KvStore,
    url: &str,
    window_id: WindowId,
    from: usize,
    to: usize,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>> {
    let old_key = keys::instance(&fingerprint(url, window_id, from));
    let Some(value) = store.get_one(&old_key)? else {
        debug!(url, window_id, from, "No instance record at old position");
        return Ok(None);
    };
    let mut instance: TabInstance = serde_json::from_value(value)?;
    instance.position = to;
    instance.last_seen_at = now;

    let mut changes = Changes::default();
    changes.drop_key(old_key);
    changes.put_instance(&instance)?;
    changes.commit(store)?;
    Ok(Some(instance.created_at))
}

/// A tab arrived in a new window. Takes over the earliest instance with the
/// same URL (any window) that no other live tab sits on exactly, and returns
/// the resolved `createdAt`.
pub fn reattach(
    store: &mut dyn KvStore,
    tab_id: TabId,
    url: &str,
    window_id: WindowId,
    position: usize,
    live: &[Tab],
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    let entries = store.get(None)?;
    let mut instances = load_instances(&entries);
    let mut changes = Changes::default();

    let claimed: HashSet<String> = live
        .iter()
        .filter(|tab| tab.id != tab_id)
        .filter_map(|tab| {
            let fp = fingerprint(tab.resolved_url()?, tab.window_id, tab.position);
            instances.contains_key(&fp).then_some(fp)
        })
        .collect();

    let previous = earliest_match(&instances, &claimed, |i| i.url == url)
        .and_then(|fp| instances.remove(&fp).map(|i| (fp, i)));

    let created_at = match previous {
        Some((old_fp, instance)) => {
            changes.drop_key(keys::instance(&old_fp));
            instance.created_at
        }
        None => now,
    };

    changes.put_instance(&TabInstance::new(url, window_id, position, created_at, now))?;
    changes.put_timestamp(keys::tab_created(tab_id), created_at);
    changes.commit(store)?;
    Ok(created_at)
}

/// Drop the per-id age cache for a closed tab. Instance records stay for
/// restoration and age out through the sweep.
pub fn forget_tab(store: &mut dyn KvStore, tab_id: TabId) -> Result<()> {
    store.remove(&[keys::tab_created(tab_id)])
}

/// Resolved `createdAt` for each id that has an age record
pub fn created_at_for(store: &dyn KvStore, ids: &[TabId]) -> Result<HashMap<TabId, DateTime<Utc>>> {
    let wanted: Vec<String> = ids.iter().map(|id| keys::tab_created(*id)).collect();
    let entries = store.get(Some(&wanted))?;
    Ok(ids
        .iter()
        .filter_map(|id| {
            let ts = entries
                .get(&keys::tab_created(*id))
                .and_then(timestamp_from_value)?;
            Some((*id, ts))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn tab(id: TabId, url: &str, window_id: WindowId, position: usize) -> Tab {
        Tab {
            id,
            url: Some(url.to_string()),
            window_id,
            position,
            title: None,
            favicon: None,
            active: false,
            pinned: false,
            audible: false,
            discarded: false,
            last_accessed_at: None,
        }
    }

    fn instance(store: &MemoryStore, fp: &str) -> Option<TabInstance> {
        store
            .get_one(&keys::instance(fp))
            .unwrap()
            .map(|v| serde_json::from_value(v).unwrap())
    }

    fn seed(store: &mut MemoryStore, instance: TabInstance) {
        let mut entries = Entries::new();
        entries.insert(
            keys::instance(&instance.fingerprint()),
            serde_json::to_value(&instance).unwrap(),
        );
        store.set(entries).unwrap();
    }

    #[test]
    fn test_fingerprint_format() {
        assert_eq!(fingerprint("https://a.test/", 3, 7), "https://a.test/#3#7");
    }

    #[test]
    fn test_new_tab_creates_instance_and_first_seen() {
        let mut store = MemoryStore::new();
        let tabs = vec![tab(1, "https://a.test/", 1, 0)];

        let resolved = reconcile_all(&mut store, &tabs, at(0)).unwrap();
        assert_eq!(resolved[0].resolution, Resolution::New);
        assert_eq!(resolved[0].created_at, at(0));
        assert!(instance(&store, "https://a.test/#1#0").is_some());
        assert_eq!(
            store.get_one(&keys::url_first_seen("https://a.test/")).unwrap(),
            Some(Value::from(at(0).timestamp_millis()))
        );
        assert_eq!(
            created_at_for(&store, &[1]).unwrap().get(&1).copied(),
            Some(at(0))
        );
    }

    #[test]
    fn test_repeated_passes_are_idempotent() {
        let mut store = MemoryStore::new();
        let tabs = vec![tab(1, "https://a.test/", 1, 0), tab(2, "https://b.test/", 1, 1)];

        let first = reconcile_all(&mut store, &tabs, at(0)).unwrap();
        let second = reconcile_all(&mut store, &tabs, at(60)).unwrap();
        let third = reconcile_all(&mut store, &tabs, at(3600)).unwrap();

        for ((a, b), c) in first.iter().zip(&second).zip(&third) {
            assert_eq!(a.created_at, b.created_at);
            assert_eq!(b.created_at, c.created_at);
            assert_eq!(c.resolution, Resolution::Exact);
        }
        assert_eq!(
            instance(&store, "https://a.test/#1#0").unwrap().last_seen_at,
            at(3600)
        );
    }

    #[test]
    fn test_repositioned_tab_keeps_age_and_old_key_is_removed() {
        let mut store = MemoryStore::new();
        seed(&mut store, TabInstance::new("https://a.test/", 1, 0, at(0), at(0)));

        let resolved = reconcile_all(&mut store, &[tab(5, "https://a.test/", 1, 4)], at(100)).unwrap();
        assert_eq!(resolved[0].resolution, Resolution::Relocated);
        assert_eq!(resolved[0].created_at, at(0));
        assert!(instance(&store, "https://a.test/#1#0").is_none());
        let moved = instance(&store, "https://a.test/#1#4").unwrap();
        assert_eq!(moved.created_at, at(0));
        assert_eq!(moved.last_seen_at, at(100));
    }

    #[test]
    fn test_relocation_prefers_earliest_created() {
        let mut store = MemoryStore::new();
        seed(&mut store, TabInstance::new("https://a.test/", 1, 2, at(50), at(50)));
        seed(&mut store, TabInstance::new("https://a.test/", 1, 3, at(10), at(10)));

        let resolved = reconcile_all(&mut store, &[tab(1, "https://a.test/", 1, 0)], at(100)).unwrap();
        assert_eq!(resolved[0].created_at, at(10));
        assert!(instance(&store, "https://a.test/#1#3").is_none());
        assert!(instance(&store, "https://a.test/#1#2").is_some());
    }

    #[test]
    fn test_exact_claims_win_over_relocation() {
        // The tab at position 5 owns its exact record even though it is the
        // oldest candidate for the tab at position 4.
        let mut store = MemoryStore::new();
        seed(&mut store, TabInstance::new("https://a.test/", 1, 3, at(20), at(20)));
        seed(&mut store, TabInstance::new("https://a.test/", 1, 5, at(10), at(10)));

        let tabs = vec![tab(1, "https://a.test/", 1, 4), tab(2, "https://a.test/", 1, 5)];
        let resolved = reconcile_all(&mut store, &tabs, at(100)).unwrap();

        assert_eq!(resolved[0].created_at, at(20));
        assert_eq!(resolved[0].resolution, Resolution::Relocated);
        assert_eq!(resolved[1].created_at, at(10));
        assert_eq!(resolved[1].resolution, Resolution::Exact);
    }

    #[test]
    fn test_duplicate_urls_do_not_share_lineage() {
        let mut store = MemoryStore::new();
        seed(&mut store, TabInstance::new("https://a.test/", 1, 0, at(10), at(10)));

        let tabs = vec![tab(1, "https://a.test/", 1, 1), tab(2, "https://a.test/", 1, 2)];
        let resolved = reconcile_all(&mut store, &tabs, at(100)).unwrap();

        assert_eq!(resolved[0].resolution, Resolution::Relocated);
        assert_eq!(resolved[1].resolution, Resolution::UrlFirstSeen);
    }

    #[test]
    fn test_falls_back_to_url_first_seen() {
        let mut store = MemoryStore::new();
        // Known URL, but the only instance lives in another window
        seed(&mut store, TabInstance::new("https://a.test/", 9, 0, at(5), at(5)));
        let mut entries = Entries::new();
        entries.insert(keys::url_first_seen("https://a.test/"), Value::from(at(1).timestamp_millis()));
        store.set(entries).unwrap();

        let resolved = reconcile_all(&mut store, &[tab(1, "https://a.test/", 1, 0)], at(100)).unwrap();
        assert_eq!(resolved[0].resolution, Resolution::UrlFirstSeen);
        assert_eq!(resolved[0].created_at, at(1));
        assert!(instance(&store, "https://a.test/#9#0").is_some());
        assert_eq!(instance(&store, "https://a.test/#1#0").unwrap().created_at, at(1));
    }

    #[test]
    fn test_blank_tabs_are_skipped() {
        let mut store = MemoryStore::new();
        let mut blank = tab(1, "", 1, 0);
        blank.url = None;
        let resolved = reconcile_all(&mut store, &[blank, tab(2, "", 1, 1)], at(0)).unwrap();
        assert!(resolved.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_stale_tab_age_records_are_dropped() {
        let mut store = MemoryStore::new();
        let mut entries = Entries::new();
        entries.insert(keys::tab_created(99), Value::from(at(0).timestamp_millis()));
        store.set(entries).unwrap();

        reconcile_all(&mut store, &[tab(1, "https://a.test/", 1, 0)], at(10)).unwrap();
        assert!(store.get_one(&keys::tab_created(99)).unwrap().is_none());
        assert!(store.get_one(&keys::tab_created(1)).unwrap().is_some());
    }

    #[test]
    fn test_sweep_respects_ttl() {
        let mut store = MemoryStore::new();
        let now = at(0);
        seed(&mut store, TabInstance::new("https://old.test/", 1, 0, now - Duration::days(40), now - Duration::days(31)));
        seed(&mut store, TabInstance::new("https://new.test/", 1, 1, now - Duration::days(40), now - Duration::days(29)));

        let removed = sweep_expired(&mut store, now, Duration::days(DEFAULT_INSTANCE_TTL_DAYS)).unwrap();
        assert_eq!(removed, 1);
        assert!(instance(&store, "https://old.test/#1#0").is_none());
        assert!(instance(&store, "https://new.test/#1#1").is_some());
    }

    #[test]
    fn test_relocate_moves_record() {
        let mut store = MemoryStore::new();
        seed(&mut store, TabInstance::new("https://a.test/", 1, 0, at(0), at(0)));

        let carried = relocate(&mut store, "https://a.test/", 1, 0, 3, at(50)).unwrap();
        assert_eq!(carried, Some(at(0)));
        assert!(instance(&store, "https://a.test/#1#0").is_none());
        assert_eq!(instance(&store, "https://a.test/#1#3").unwrap().created_at, at(0));

        assert_eq!(relocate(&mut store, "https://a.test/", 1, 0, 1, at(60)).unwrap(), None);
    }

    #[test]
    fn test_relocate_to_same_position_keeps_record() {
        let mut store = MemoryStore::new();
        seed(&mut store, TabInstance::new("https://a.test/", 1, 2, at(0), at(0)));
        relocate(&mut store, "https://a.test/", 1, 2, 2, at(50)).unwrap();
        assert_eq!(instance(&store, "https://a.test/#1#2").unwrap().last_seen_at, at(50));
    }

    #[test]
    fn test_reattach_carries_age_across_windows() {
        let mut store = MemoryStore::new();
        seed(&mut store, TabInstance::new("https://a.test/", 1, 4, at(0), at(0)));

        let created = reattach(&mut store, 7, "https://a.test/", 2, 0, &[], at(100)).unwrap();
        assert_eq!(created, at(0));
        assert!(instance(&store, "https://a.test/#1#4").is_none());
        assert_eq!(instance(&store, "https://a.test/#2#0").unwrap().created_at, at(0));

        let fresh = reattach(&mut store, 8, "https://b.test/", 2, 1, &[], at(200)).unwrap();
        assert_eq!(fresh, at(200));
    }

    #[test]
    fn test_reattach_skips_records_held_by_live_siblings() {
        let mut store = MemoryStore::new();
        seed(&mut store, TabInstance::new("https://x.test/", 1, 0, at(0), at(0)));
        seed(&mut store, TabInstance::new("https://x.test/", 1, 1, at(1000), at(1000)));

        // Tab 2 (the younger one) leaves window 1; tab 1 still sits on #1#0
        let live = vec![tab(1, "https://x.test/", 1, 0), tab(2, "https://x.test/", 2, 0)];
        let created = reattach(&mut store, 2, "https://x.test/", 2, 0, &live, at(2000)).unwrap();

        assert_eq!(created, at(1000));
        assert_eq!(instance(&store, "https://x.test/#1#0").unwrap().created_at, at(0));
        assert!(instance(&store, "https://x.test/#1#1").is_none());
        assert_eq!(instance(&store, "https://x.test/#2#0").unwrap().created_at, at(1000));
    }

    #[test]
    fn test_relocation_tie_goes_to_first_key() {
        let mut store = MemoryStore::new();
        seed(&mut store, TabInstance::new("https://a.test/", 1, 7, at(10), at(10)));
        seed(&mut store, TabInstance::new("https://a.test/", 1, 3, at(10), at(10)));

        let resolved = reconcile_all(&mut store, &[tab(1, "https://a.test/", 1, 0)], at(100)).unwrap();

        assert_eq!(resolved[0].resolution, Resolution::Relocated);
        assert_eq!(resolved[0].created_at, at(10));
        // "#1#3" sorts before "#1#7"
        assert!(instance(&store, "https://a.test/#1#3").is_none());
        assert!(instance(&store, "https://a.test/#1#7").is_some());
        assert!(instance(&store, "https://a.test/#1#0").is_some());
    }

    #[test]
    fn test_new_sitting_keeps_existing_first_seen() {
        let mut store = MemoryStore::new();
        record_new_sitting(&mut store, 1, "https://a.test/", 1, 0, at(0)).unwrap();
        record_new_sitting(&mut store, 2, "https://a.test/", 1, 1, at(100)).unwrap();

        assert_eq!(
            store.get_one(&keys::url_first_seen("https://a.test/")).unwrap(),
            Some(Value::from(at(0).timestamp_millis()))
        );
        assert_eq!(created_at_for(&store, &[2]).unwrap()[&2], at(100));
    }
}
