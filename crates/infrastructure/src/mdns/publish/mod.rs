//! Locally owned records and their per-interface publish sets.

pub mod fsm;
mod rename;

pub use fsm::{transition, Packet, PublishEvent, PublishState, Step};
pub use rename::next_name;

use super::cache::RecordCache;
use super::scheduler::{Scheduler, TimerId};
use super::transport::PacketSink;
use super::TimerTask;
use compact_str::CompactString;
use fsm::{MAX_INITIAL_DELAY, SEND_RETRY_INTERVAL};
use mdnsd_domain::{names_equal, to_key, Message, Question, RecordType, ResourceRecord};
use rustc_hash::FxHashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublishId(pub u64);

/// One owned name/type on one interface.
#[derive(Debug)]
pub struct PublishSet {
    pub id: PublishId,
    pub iface: CompactString,
    /// Index into the owned record groups.
    group: usize,
    pub records: Vec<ResourceRecord>,
    pub state: PublishState,
    pub sent: u8,
    timer: Option<TimerId>,
}

impl PublishSet {
    pub fn is_authoritative(&self) -> bool {
        matches!(self.state, PublishState::Announce | PublishState::Done)
    }

    fn probe(&self) -> Message {
        let mut msg = Message::query();
        for rr in &self.records {
            let q = Question::new(&rr.name, rr.record_type());
            if !msg.questions.contains(&q) {
                msg.questions.push(q);
            }
        }
        msg.authorities = self.records.clone();
        msg
    }

    fn announcement(&self) -> Message {
        let mut msg = Message::response();
        msg.answers = self.records.clone();
        msg
    }

    /// Whether `other` holds different data under the key of one of our
    /// unique records.
    fn conflicts_with(&self, other: &ResourceRecord) -> bool {
        self.records
            .iter()
            .any(|rr| rr.cache_flush && rr.same_key(other) && !rr.rdata.same_data(&other.rdata))
    }
}

/// Owned records sharing a name and type. A scoped group is published on
/// one interface only.
#[derive(Debug, Clone)]
struct OwnedGroup {
    scope: Option<CompactString>,
    records: Vec<ResourceRecord>,
}

impl OwnedGroup {
    fn covers(&self, iface: &str) -> bool {
        self.scope.as_deref().is_none_or(|scope| scope == iface)
    }

    fn holds(&self, name: &str, rtype: RecordType) -> bool {
        self.records
            .first()
            .is_some_and(|rr| rr.record_type() == rtype && names_equal(&rr.name, name))
    }
}

/// Records the daemon owns, grouped by name and type, plus one
/// [`PublishSet`] per group and active interface.
#[derive(Default)]
pub struct PublishEngine {
    groups: Vec<Option<OwnedGroup>>,
    sets: FxHashMap<PublishId, PublishSet>,
    /// Names given up after a conflict, keyed by [`to_key`], and their
    /// replacements. Records added later follow them.
    renamed: FxHashMap<String, String>,
    next_id: u64,
}

impl PublishEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, id: PublishId) -> Option<&PublishSet> {
        self.sets.get(&id)
    }

    pub fn sets(&self) -> impl Iterator<Item = &PublishSet> {
        self.sets.values()
    }

    pub fn owned(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.groups.iter().flatten().flat_map(|g| g.records.iter())
    }

    /// The name `name` is published under after any conflict renames.
    pub fn current_name<'a>(&'a self, name: &'a str) -> &'a str {
        let mut current = name;
        for _ in 0..=self.renamed.len() {
            match self.renamed.get(&to_key(current)) {
                Some(next) => current = next.as_str(),
                None => break,
            }
        }
        current
    }

    fn follow_renames(&self, mut rr: ResourceRecord) -> ResourceRecord {
        let names = [Some(rr.name.clone()), rr.rdata.target().map(str::to_string)];
        for name in names.into_iter().flatten() {
            let current = self.current_name(&name);
            if !names_equal(current, &name) {
                rr.rename(&name, current);
            }
        }
        rr
    }

    /// Adds an owned record and starts publishing it on every listed
    /// interface, or only on `scope` when given. A record with the same
    /// name, type and data replaces the earlier copy.
    pub fn add(
        &mut self,
        rr: ResourceRecord,
        scope: Option<&str>,
        ifaces: &[CompactString],
        now: Instant,
        sched: &mut Scheduler<TimerTask>,
    ) {
        let rr = self.follow_renames(rr);
        let existing = self.groups.iter().position(|g| {
            g.as_ref().is_some_and(|g| {
                g.scope.as_deref() == scope && g.holds(&rr.name, rr.record_type())
            })
        });
        let group = match existing {
            Some(group) => group,
            None => {
                self.groups.push(Some(OwnedGroup {
                    scope: scope.map(CompactString::from),
                    records: Vec::new(),
                }));
                self.groups.len() - 1
            }
        };

        let Some(owned) = self.groups[group].as_mut() else {
            return;
        };
        owned.records.retain(|r| !r.same_data(&rr));
        owned.records.push(rr);
        let owned = owned.clone();

        self.destroy_where(sched, |set| set.group == group);
        for iface in ifaces.iter().filter(|iface| owned.covers(iface)) {
            self.start_group(group, iface, now, sched);
        }
    }

    /// Stops publishing `name`/`rtype`. Returns goodbye copies (TTL 0) of
    /// the records per interface where they had been announced.
    pub fn withdraw(
        &mut self,
        name: &str,
        rtype: RecordType,
        sched: &mut Scheduler<TimerTask>,
    ) -> Vec<(CompactString, Vec<ResourceRecord>)> {
        let name = self.current_name(name).to_string();
        let groups: Vec<usize> = (0..self.groups.len())
            .filter(|&i| self.groups[i].as_ref().is_some_and(|g| g.holds(&name, rtype)))
            .collect();
        for &group in &groups {
            self.groups[group] = None;
        }

        self.destroy_where(sched, |set| groups.contains(&set.group))
            .into_iter()
            .filter(|set| set.is_authoritative())
            .map(|set| {
                let goodbyes = set.records.into_iter().map(|rr| rr.with_ttl(0)).collect();
                (set.iface, goodbyes)
            })
            .collect()
    }

    /// Creates a set in `Initial` for every owned group on `iface`.
    pub fn start_interface(
        &mut self,
        iface: &str,
        now: Instant,
        sched: &mut Scheduler<TimerTask>,
    ) {
        for group in 0..self.groups.len() {
            if self.groups[group].as_ref().is_some_and(|g| g.covers(iface)) {
                self.start_group(group, iface, now, sched);
            }
        }
    }

    /// Destroys the sets of `iface`, cancelling their timers, and forgets
    /// the records owned for that interface alone.
    pub fn stop_interface(&mut self, iface: &str, sched: &mut Scheduler<TimerTask>) {
        let destroyed = self.destroy_where(sched, |set| set.iface == iface);
        for group in self.groups.iter_mut() {
            if group.as_ref().is_some_and(|g| g.scope.as_deref() == Some(iface)) {
                *group = None;
            }
        }
        debug!(iface = %iface, sets = destroyed.len(), "Publish sets destroyed");
    }

    fn start_group(
        &mut self,
        group: usize,
        iface: &str,
        now: Instant,
        sched: &mut Scheduler<TimerTask>,
    ) {
        let Some(records) = self.groups[group].as_ref().map(|g| g.records.clone()) else {
            return;
        };
        self.next_id += 1;
        let id = PublishId(self.next_id);

        let jitter = fastrand::u64(0..=MAX_INITIAL_DELAY.as_millis() as u64);
        let timer = sched.schedule(now + Duration::from_millis(jitter), TimerTask::Publish(id));

        self.sets.insert(
            id,
            PublishSet {
                id,
                iface: CompactString::from(iface),
                group,
                records,
                state: PublishState::Initial,
                sent: 0,
                timer: Some(timer),
            },
        );
    }

    fn destroy_where(
        &mut self,
        sched: &mut Scheduler<TimerTask>,
        pred: impl Fn(&PublishSet) -> bool,
    ) -> Vec<PublishSet> {
        let ids: Vec<PublishId> = self
            .sets
            .values()
            .filter(|set| pred(set))
            .map(|set| set.id)
            .collect();

        let mut destroyed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(set) = self.sets.remove(&id) {
                if let Some(timer) = set.timer {
                    sched.cancel(timer);
                }
                destroyed.push(set);
            }
        }
        destroyed
    }

    /// Drives set `id` one step on its timer. While probing, a conflicting
    /// record already in `cache` restarts the set instead. Nothing is
    /// committed when the send fails; the same step is retried after
    /// [`SEND_RETRY_INTERVAL`].
    pub fn on_timer(
        &mut self,
        id: PublishId,
        cache: Option<&RecordCache>,
        now: Instant,
        sched: &mut Scheduler<TimerTask>,
        sink: &mut dyn PacketSink,
    ) {
        let probing = self
            .sets
            .get(&id)
            .is_some_and(|set| matches!(set.state, PublishState::Initial | PublishState::Probe));
        if probing && cache.is_some_and(|cache| self.cache_conflict(id, cache)) {
            self.restart(id, now, sched);
            return;
        }

        let Some(set) = self.sets.get_mut(&id) else {
            return;
        };
        set.timer = None;

        let step = transition(set.state, set.sent, PublishEvent::Timer);
        let packet = match step.send {
            Some(Packet::Probe) => Some(set.probe()),
            Some(Packet::Announce) => Some(set.announcement()),
            None => None,
        };

        if let Some(msg) = packet {
            if let Err(e) = sink.send(&set.iface, None, &msg) {
                warn!(
                    iface = %set.iface,
                    name = %set.records[0].name,
                    state = %set.state,
                    error = %e,
                    "Publish send failed, will retry"
                );
                set.timer = Some(sched.schedule(now + SEND_RETRY_INTERVAL, TimerTask::Publish(id)));
                return;
            }
        }

        if step.state != set.state {
            debug!(
                iface = %set.iface,
                name = %set.records[0].name,
                from = %set.state,
                to = %step.state,
                "Publish state changed"
            );
        }
        if step.state == PublishState::Done && set.state != PublishState::Done {
            info!(
                iface = %set.iface,
                name = %set.records[0].name,
                rtype = %set.records[0].record_type(),
                "Record published"
            );
        }

        set.state = step.state;
        set.sent = step.sent;
        set.timer = step
            .next
            .map(|delay| sched.schedule(now + delay, TimerTask::Publish(id)));
    }

    /// Applies a conflicting record seen on `iface` to every affected set.
    /// Returns how many sets restarted.
    pub fn conflict(
        &mut self,
        iface: &str,
        other: &ResourceRecord,
        now: Instant,
        sched: &mut Scheduler<TimerTask>,
    ) -> usize {
        let ids: Vec<PublishId> = self
            .sets
            .values()
            .filter(|set| set.iface == iface && set.conflicts_with(other))
            .map(|set| set.id)
            .collect();

        for &id in &ids {
            // An earlier rename may already have moved this set off the name.
            if self.sets.get(&id).is_some_and(|set| set.conflicts_with(other)) {
                self.restart(id, now, sched);
            }
        }
        ids.len()
    }

    /// Whether the cache already holds a record that conflicts with set `id`.
    pub fn cache_conflict(&self, id: PublishId, cache: &RecordCache) -> bool {
        let Some(set) = self.sets.get(&id) else {
            return false;
        };
        set.records.iter().filter(|rr| rr.cache_flush).any(|rr| {
            cache
                .lookup(&rr.name, rr.record_type(), rr.class)
                .iter()
                .any(|cached| set.conflicts_with(cached))
        })
    }

    fn restart(&mut self, id: PublishId, now: Instant, sched: &mut Scheduler<TimerTask>) {
        let Some(set) = self.sets.get_mut(&id) else {
            return;
        };
        let step = transition(set.state, set.sent, PublishEvent::Conflict);

        if step.rename {
            let old = set.records[0].name.clone();
            let new = next_name(&old);
            info!(iface = %set.iface, from = %old, to = %new, "Name conflict, renamed");
            self.rename(&old, &new, step, now, sched);
        } else {
            info!(
                iface = %set.iface,
                name = %set.records[0].name,
                state = %set.state,
                "Conflict on published record, probing again"
            );
            apply_step(set, step, now, sched);
        }
    }

    /// Moves every owned record that names `old`, as owner or as target, to
    /// `new` and restarts each set holding one of them with `step`.
    fn rename(
        &mut self,
        old: &str,
        new: &str,
        step: Step,
        now: Instant,
        sched: &mut Scheduler<TimerTask>,
    ) {
        self.renamed.insert(to_key(old), new.to_string());

        let mut touched = Vec::new();
        for (i, group) in self.groups.iter_mut().enumerate() {
            let Some(group) = group else {
                continue;
            };
            let hit = group
                .records
                .iter_mut()
                .fold(false, |hit, rr| rr.rename(old, new) || hit);
            if hit {
                touched.push(i);
            }
        }

        for set in self.sets.values_mut() {
            if !touched.contains(&set.group) {
                continue;
            }
            if let Some(group) = &self.groups[set.group] {
                set.records = group.records.clone();
            }
            apply_step(set, step, now, sched);
        }
        debug!(from = %old, to = %new, groups = touched.len(), "Owned records renamed");
    }

    /// Authoritative records on `iface` answering `question`.
    pub fn answers(&self, iface: &str, question: &Question) -> Vec<ResourceRecord> {
        self.sets
            .values()
            .filter(|set| set.iface == iface && set.is_authoritative())
            .flat_map(|set| set.records.iter())
            .filter(|rr| rr.answers(question))
            .cloned()
            .collect()
    }

    /// Every announced record on `iface`, as goodbyes.
    pub fn goodbyes(&self, iface: &str) -> Vec<ResourceRecord> {
        self.sets
            .values()
            .filter(|set| set.iface == iface && set.is_authoritative())
            .flat_map(|set| set.records.iter())
            .map(|rr| rr.clone().with_ttl(0))
            .collect()
    }
}

fn apply_step(set: &mut PublishSet, step: Step, now: Instant, sched: &mut Scheduler<TimerTask>) {
    if let Some(timer) = set.timer.take() {
        sched.cancel(timer);
    }
    set.state = step.state;
    set.sent = step.sent;
    set.timer = step
        .next
        .map(|delay| sched.schedule(now + delay, TimerTask::Publish(set.id)));
}
