//! Per-interface record cache.
//!
//! Records are keyed by (lowercase name, type, class). Each cached record
//! owns one revalidation timer that fires at 80 %, 90 % and 95 % of its TTL
//! to ask for a refresh, then at 100 % to expire it.

mod key;

pub use key::CacheKey;

use super::scheduler::{Scheduler, TimerId};
use super::TimerTask;
use compact_str::CompactString;
use mdnsd_domain::{names_equal, Question, RecordType, ResourceRecord};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Revalidation points in per-mille of the TTL, indexed by revision.
const REVISION_PERMILLE: [u64; 4] = [800, 900, 950, 1000];
const LAST_REVISION: u8 = 3;

/// A copy of an already cached record arriving this soon after the last
/// refresh, with the same TTL, is ignored.
const DUPLICATE_WINDOW: Duration = Duration::from_secs(1);

/// A goodbye keeps the record around this long before it is dropped
/// (RFC 6762 §10.1).
const GOODBYE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEffect {
    InsertedNew,
    /// Identical data already cached; TTL and revision reset.
    Refreshed,
    /// A cache-flush record removed cached records with different data.
    Superseded,
    DuplicateIgnored,
    /// TTL 0 for a cached record; it expires one second later. Unknown
    /// goodbyes come back as `DuplicateIgnored`.
    Goodbye,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOutcome {
    pub effect: CacheEffect,
    pub added: Vec<ResourceRecord>,
    pub removed: Vec<ResourceRecord>,
}

impl CacheOutcome {
    fn only(effect: CacheEffect) -> Self {
        Self {
            effect,
            added: Vec::new(),
            removed: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionOutcome {
    /// Time to ask the network for a fresh copy.
    Requery(Question),
    /// The record reached its TTL and is gone.
    Expired(ResourceRecord),
}

#[derive(Debug)]
struct CachedRecord {
    id: u64,
    rr: ResourceRecord,
    inserted: Instant,
    revision: u8,
    timer: TimerId,
}

impl CachedRecord {
    fn remaining_ttl(&self, now: Instant) -> u32 {
        let elapsed = now.saturating_duration_since(self.inserted).as_secs();
        (self.rr.ttl as u64).saturating_sub(elapsed) as u32
    }
}

pub struct RecordCache {
    iface: CompactString,
    entries: FxHashMap<CacheKey, SmallVec<[CachedRecord; 2]>>,
    /// Record id → key, for timer dispatch.
    index: FxHashMap<u64, CacheKey>,
    next_id: u64,
}

impl RecordCache {
    pub fn new(iface: &str) -> Self {
        Self {
            iface: CompactString::from(iface),
            entries: FxHashMap::default(),
            index: FxHashMap::default(),
            next_id: 0,
        }
    }

    pub fn iface(&self) -> &str {
        &self.iface
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Feeds one record learned from the network into the cache.
    pub fn process(
        &mut self,
        rr: ResourceRecord,
        now: Instant,
        sched: &mut Scheduler<TimerTask>,
    ) -> CacheOutcome {
        let key = CacheKey::of(&rr);

        if rr.is_goodbye() {
            return self.goodbye(&key, &rr, now, sched);
        }

        let mut removed = Vec::new();
        if rr.cache_flush {
            removed = self.flush_others(&key, &rr, sched);
        }

        let iface = self.iface.clone();
        let slot = self.entries.entry(key.clone()).or_default();

        if let Some(existing) = slot.iter_mut().find(|c| c.rr.same_data(&rr)) {
            let recent = now.saturating_duration_since(existing.inserted) < DUPLICATE_WINDOW;
            if recent && existing.rr.ttl == rr.ttl && removed.is_empty() {
                trace!(name = %rr.name, rtype = %rr.record_type(), "Duplicate record ignored");
                return CacheOutcome::only(CacheEffect::DuplicateIgnored);
            }

            sched.cancel(existing.timer);
            existing.rr = rr;
            existing.inserted = now;
            existing.revision = 0;
            existing.timer =
                schedule_revision(sched, &iface, existing.id, now, existing.rr.ttl, 0);

            let effect = if removed.is_empty() {
                CacheEffect::Refreshed
            } else {
                CacheEffect::Superseded
            };
            return CacheOutcome {
                effect,
                added: Vec::new(),
                removed,
            };
        }

        self.next_id += 1;
        let id = self.next_id;
        let timer = schedule_revision(sched, &iface, id, now, rr.ttl, 0);
        slot.push(CachedRecord {
            id,
            rr: rr.clone(),
            inserted: now,
            revision: 0,
            timer,
        });
        self.index.insert(id, key);

        debug!(
            iface = %self.iface,
            name = %rr.name,
            rtype = %rr.record_type(),
            ttl = rr.ttl,
            "Record cached"
        );

        let effect = if removed.is_empty() {
            CacheEffect::InsertedNew
        } else {
            CacheEffect::Superseded
        };
        CacheOutcome {
            effect,
            added: vec![rr],
            removed,
        }
    }

    fn goodbye(
        &mut self,
        key: &CacheKey,
        rr: &ResourceRecord,
        now: Instant,
        sched: &mut Scheduler<TimerTask>,
    ) -> CacheOutcome {
        let Some(cached) = self
            .entries
            .get_mut(key)
            .and_then(|slot| slot.iter_mut().find(|c| c.rr.same_data(rr)))
        else {
            return CacheOutcome::only(CacheEffect::DuplicateIgnored);
        };

        sched.cancel(cached.timer);
        cached.revision = LAST_REVISION;
        cached.timer = sched.schedule(
            now + GOODBYE_DELAY,
            TimerTask::CacheRevision {
                iface: self.iface.clone(),
                record: cached.id,
            },
        );
        debug!(iface = %self.iface, name = %rr.name, rtype = %rr.record_type(), "Goodbye received");
        CacheOutcome::only(CacheEffect::Goodbye)
    }

    fn flush_others(
        &mut self,
        key: &CacheKey,
        rr: &ResourceRecord,
        sched: &mut Scheduler<TimerTask>,
    ) -> Vec<ResourceRecord> {
        let Some(slot) = self.entries.get_mut(key) else {
            return Vec::new();
        };

        let mut removed = Vec::new();
        slot.retain(|cached| {
            if cached.rr.same_data(rr) {
                return true;
            }
            sched.cancel(cached.timer);
            self.index.remove(&cached.id);
            removed.push(cached.rr.clone());
            false
        });

        if !removed.is_empty() {
            debug!(
                iface = %self.iface,
                name = %rr.name,
                rtype = %rr.record_type(),
                flushed = removed.len(),
                "Cache-flush superseded records"
            );
        }
        removed
    }

    /// Handles a fired revalidation timer for record `id`.
    pub fn revise(
        &mut self,
        id: u64,
        now: Instant,
        sched: &mut Scheduler<TimerTask>,
    ) -> Option<RevisionOutcome> {
        let key = self.index.get(&id)?.clone();
        let slot = self.entries.get_mut(&key)?;
        let pos = slot.iter().position(|c| c.id == id)?;

        if slot[pos].revision < LAST_REVISION {
            let iface = self.iface.clone();
            let cached = &mut slot[pos];
            cached.revision += 1;
            cached.timer = schedule_revision(
                sched,
                &iface,
                cached.id,
                cached.inserted,
                cached.rr.ttl,
                cached.revision,
            );
            trace!(
                iface = %self.iface,
                name = %cached.rr.name,
                revision = cached.revision,
                "Record due for refresh"
            );
            return Some(RevisionOutcome::Requery(cached.rr.question()));
        }

        let cached = slot.remove(pos);
        if slot.is_empty() {
            self.entries.remove(&key);
        }
        self.index.remove(&id);
        debug!(
            iface = %self.iface,
            name = %cached.rr.name,
            rtype = %cached.rr.record_type(),
            age_ms = now.saturating_duration_since(cached.inserted).as_millis() as u64,
            "Record expired"
        );
        Some(RevisionOutcome::Expired(cached.rr))
    }

    /// Cached records for a name, type and class. `ANY` matches every type.
    pub fn lookup(&self, name: &str, rtype: RecordType, class: u16) -> Vec<ResourceRecord> {
        if rtype == RecordType::ANY {
            return self
                .entries
                .iter()
                .filter(|(k, _)| k.class == class && names_equal(&k.name, name))
                .flat_map(|(_, slot)| slot.iter().map(|c| c.rr.clone()))
                .collect();
        }
        self.entries
            .get(&CacheKey::new(name, rtype, class))
            .map(|slot| slot.iter().map(|c| c.rr.clone()).collect())
            .unwrap_or_default()
    }

    /// Records answering `question`, with TTLs lowered to what is left.
    pub fn answers(&self, question: &Question, now: Instant) -> Vec<ResourceRecord> {
        self.entries
            .iter()
            .flat_map(|(_, slot)| slot.iter())
            .filter(|c| c.rr.answers(question))
            .map(|c| c.rr.clone().with_ttl(c.remaining_ttl(now)))
            .collect()
    }

    /// Drops every record, cancelling their timers.
    pub fn clear(&mut self, sched: &mut Scheduler<TimerTask>) -> Vec<ResourceRecord> {
        let mut removed = Vec::with_capacity(self.index.len());
        for (_, slot) in self.entries.drain() {
            for cached in slot {
                sched.cancel(cached.timer);
                removed.push(cached.rr);
            }
        }
        self.index.clear();
        removed
    }
}

fn schedule_revision(
    sched: &mut Scheduler<TimerTask>,
    iface: &CompactString,
    id: u64,
    inserted: Instant,
    ttl: u32,
    revision: u8,
) -> TimerId {
    let permille = REVISION_PERMILLE[revision as usize];
    let delay = Duration::from_millis(ttl as u64 * permille);
    sched.schedule(
        inserted + delay,
        TimerTask::CacheRevision {
            iface: iface.clone(),
            record: id,
        },
    )
}
