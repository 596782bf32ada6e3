//! Outstanding questions asked on behalf of local requesters.
//!
//! A lookup waits for one answer and gives up at its deadline. A browse
//! stays registered, reporting every matching record that comes and goes,
//! until its requester goes away.

use super::cache::RecordCache;
use super::scheduler::{Scheduler, TimerId};
use super::TimerTask;
use mdnsd_domain::{BrowseEvent, BrowseEventKind, LookupReply, Question, ResourceRecord};
use rustc_hash::FxHashMap;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

const INITIAL_SLEEP: Duration = Duration::from_secs(1);
const LOOKUP_MAX_SLEEP: Duration = Duration::from_secs(4);
const BROWSE_MAX_SLEEP: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStyle {
    Lookup,
    Browse,
}

/// Where results go.
#[derive(Debug)]
pub enum Requester {
    Lookup(oneshot::Sender<LookupReply>),
    Browse(mpsc::UnboundedSender<BrowseEvent>),
}

impl Requester {
    fn style(&self) -> QueryStyle {
        match self {
            Requester::Lookup(_) => QueryStyle::Lookup,
            Requester::Browse(_) => QueryStyle::Browse,
        }
    }

    fn is_closed(&self) -> bool {
        match self {
            Requester::Lookup(tx) => tx.is_closed(),
            Requester::Browse(tx) => tx.is_closed(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Placed {
    /// Answered from a cache; nothing was registered.
    Answered,
    /// Registered; the caller sends the first query right away.
    Registered(QueryId),
}

/// A query due on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub question: Question,
    /// Browse queries list what each interface already knows.
    pub known_answers: bool,
}

#[derive(Debug)]
struct Query {
    question: Question,
    requester: Requester,
    sleep: Duration,
    retransmit: Option<TimerId>,
    deadline: Option<TimerId>,
}

impl Query {
    fn max_sleep(&self) -> Duration {
        match self.requester.style() {
            QueryStyle::Lookup => LOOKUP_MAX_SLEEP,
            QueryStyle::Browse => BROWSE_MAX_SLEEP,
        }
    }
}

pub struct QueryEngine {
    queries: FxHashMap<QueryId, Query>,
    next_id: u64,
    lookup_timeout: Duration,
}

impl QueryEngine {
    pub fn new(lookup_timeout: Duration) -> Self {
        Self {
            queries: FxHashMap::default(),
            next_id: 0,
            lookup_timeout,
        }
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn contains(&self, id: QueryId) -> bool {
        self.queries.contains_key(&id)
    }

    pub fn outgoing(&self, id: QueryId) -> Option<Outgoing> {
        self.queries.get(&id).map(|q| Outgoing {
            question: q.question.clone(),
            known_answers: q.requester.style() == QueryStyle::Browse,
        })
    }

    /// Starts answering `question` for `requester`.
    pub fn place<'a>(
        &mut self,
        requester: Requester,
        question: Question,
        caches: impl IntoIterator<Item = &'a RecordCache>,
        now: Instant,
        sched: &mut Scheduler<TimerTask>,
    ) -> Placed {
        let cached: Vec<(&str, ResourceRecord)> = caches
            .into_iter()
            .flat_map(|cache| {
                cache
                    .answers(&question, now)
                    .into_iter()
                    .filter(|rr| rr.ttl > 0)
                    .map(move |rr| (cache.iface(), rr))
            })
            .collect();

        let requester = match requester {
            Requester::Lookup(tx) => match cached.into_iter().next() {
                Some((iface, rr)) => {
                    debug!(question = %question, iface = %iface, "Lookup answered from cache");
                    let _ = tx.send(LookupReply::Found(rr.rdata));
                    return Placed::Answered;
                }
                None => Requester::Lookup(tx),
            },
            Requester::Browse(tx) => {
                for (iface, rr) in cached {
                    let _ = tx.send(BrowseEvent {
                        kind: BrowseEventKind::Added,
                        interface: iface.to_string(),
                        record: rr,
                    });
                }
                Requester::Browse(tx)
            }
        };

        self.next_id += 1;
        let id = QueryId(self.next_id);

        let deadline = match requester.style() {
            QueryStyle::Lookup => {
                Some(sched.schedule(now + self.lookup_timeout, TimerTask::QueryDeadline(id)))
            }
            QueryStyle::Browse => None,
        };
        let retransmit = sched.schedule(now + INITIAL_SLEEP, TimerTask::QueryRetransmit(id));

        debug!(id = id.0, question = %question, style = ?requester.style(), "Query placed");
        self.queries.insert(
            id,
            Query {
                question,
                requester,
                sleep: INITIAL_SLEEP,
                retransmit: Some(retransmit),
                deadline,
            },
        );
        Placed::Registered(id)
    }

    /// Fans a cache change out to every matching query.
    pub fn notify(
        &mut self,
        iface: &str,
        rr: &ResourceRecord,
        kind: BrowseEventKind,
        sched: &mut Scheduler<TimerTask>,
    ) {
        let matching: Vec<QueryId> = self
            .queries
            .iter()
            .filter(|(_, q)| rr.answers(&q.question))
            .map(|(id, _)| *id)
            .collect();

        for id in matching {
            let Some(query) = self.queries.get(&id) else {
                continue;
            };
            match (&query.requester, kind) {
                (Requester::Lookup(_), BrowseEventKind::Added) => {
                    if let Some(Requester::Lookup(tx)) = self.remove_with(id, sched) {
                        debug!(id = id.0, iface = %iface, record = %rr, "Lookup answered");
                        let _ = tx.send(LookupReply::Found(rr.rdata.clone()));
                    }
                }
                (Requester::Lookup(_), BrowseEventKind::Removed) => {}
                (Requester::Browse(tx), kind) => {
                    let event = BrowseEvent {
                        kind,
                        interface: iface.to_string(),
                        record: rr.clone(),
                    };
                    if tx.send(event).is_err() {
                        debug!(id = id.0, "Browse requester gone");
                        self.remove_with(id, sched);
                    }
                }
            }
        }
    }

    /// Handles a fired retransmit timer: returns the query to send and
    /// re-arms the timer with a doubled interval.
    pub fn on_retransmit(
        &mut self,
        id: QueryId,
        now: Instant,
        sched: &mut Scheduler<TimerTask>,
    ) -> Option<Outgoing> {
        let query = self.queries.get_mut(&id)?;
        query.retransmit = None;

        if query.requester.is_closed() {
            debug!(id = id.0, "Requester gone, query dropped");
            self.remove_with(id, sched);
            return None;
        }

        query.sleep = (query.sleep * 2).min(query.max_sleep());
        query.retransmit = Some(sched.schedule(now + query.sleep, TimerTask::QueryRetransmit(id)));
        trace!(id = id.0, question = %query.question, next_in = ?query.sleep, "Query retransmit");
        self.outgoing(id)
    }

    /// Handles a lookup deadline: the requester gets `NotFound`.
    pub fn on_deadline(&mut self, id: QueryId, sched: &mut Scheduler<TimerTask>) {
        if let Some(query) = self.queries.get_mut(&id) {
            query.deadline = None;
        }
        if let Some(Requester::Lookup(tx)) = self.remove_with(id, sched) {
            debug!(id = id.0, "Lookup timed out");
            let _ = tx.send(LookupReply::NotFound);
        }
    }

    /// Cancels query `id` and its timers.
    pub fn remove(&mut self, id: QueryId, sched: &mut Scheduler<TimerTask>) -> bool {
        self.remove_with(id, sched).is_some()
    }

    fn remove_with(&mut self, id: QueryId, sched: &mut Scheduler<TimerTask>) -> Option<Requester> {
        let query = self.queries.remove(&id)?;
        for timer in [query.retransmit, query.deadline].into_iter().flatten() {
            sched.cancel(timer);
        }
        Some(query.requester)
    }
}
