//! Event handlers of the mDNS engine: inbound packets, due timers and
//! commands from local requesters.

use super::cache::RevisionOutcome;
use super::interface::{InterfaceManager, LinkAction};
use super::publish::PublishEngine;
use super::query::{Outgoing, Placed, QueryEngine, QueryId, Requester};
use super::scheduler::Scheduler;
use super::transport::{PacketSink, MDNS_PORT};
use super::wire;
use super::TimerTask;
use compact_str::CompactString;
use mdnsd_domain::{
    reverse_name, BrowseEvent, BrowseEventKind, InterfaceInfo, LookupReply, Message, Question,
    RData, RecordType, ResourceRecord,
};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

/// TTL ceiling for answers to legacy (non-5353) queriers (RFC 6762 §6.7).
const LEGACY_UNICAST_TTL: u32 = 10;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Host name published with an A and a reverse PTR record on every
    /// interface that comes up.
    pub hostname: Option<String>,
    pub host_ttl: u32,
    pub lookup_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hostname: None,
            host_ttl: 120,
            lookup_timeout: Duration::from_secs(3),
        }
    }
}

#[derive(Debug)]
pub enum EngineCommand {
    Lookup {
        question: Question,
        reply: oneshot::Sender<LookupReply>,
    },
    Browse {
        question: Question,
        events: mpsc::UnboundedSender<BrowseEvent>,
        reply: oneshot::Sender<u64>,
    },
    CancelBrowse(u64),
    Publish(ResourceRecord),
    Withdraw {
        name: String,
        rtype: RecordType,
    },
    InterfaceUp(InterfaceInfo),
    InterfaceDown(String),
}

pub struct Engine {
    config: EngineConfig,
    interfaces: InterfaceManager,
    publish: PublishEngine,
    queries: QueryEngine,
    sched: Scheduler<TimerTask>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let queries = QueryEngine::new(config.lookup_timeout);
        Self {
            config,
            interfaces: InterfaceManager::new(),
            publish: PublishEngine::new(),
            queries,
            sched: Scheduler::new(),
        }
    }

    pub fn interfaces(&self) -> &InterfaceManager {
        &self.interfaces
    }

    pub fn publisher(&self) -> &PublishEngine {
        &self.publish
    }

    pub fn queries(&self) -> &QueryEngine {
        &self.queries
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.sched.next_deadline()
    }

    pub fn handle_command(&mut self, cmd: EngineCommand, now: Instant, sink: &mut dyn PacketSink) {
        match cmd {
            EngineCommand::Lookup { question, reply } => {
                let placed = self.queries.place(
                    Requester::Lookup(reply),
                    question,
                    self.interfaces.caches(),
                    now,
                    &mut self.sched,
                );
                if let Placed::Registered(id) = placed {
                    self.send_initial_query(id, now, sink);
                }
            }
            EngineCommand::Browse {
                question,
                events,
                reply,
            } => {
                let placed = self.queries.place(
                    Requester::Browse(events),
                    question,
                    self.interfaces.caches(),
                    now,
                    &mut self.sched,
                );
                if let Placed::Registered(id) = placed {
                    self.send_initial_query(id, now, sink);
                    let _ = reply.send(id.0);
                }
            }
            EngineCommand::CancelBrowse(id) => {
                if self.queries.remove(QueryId(id), &mut self.sched) {
                    debug!(id, "Browse cancelled");
                }
            }
            EngineCommand::Publish(rr) => {
                info!(record = %rr, "Publishing record");
                let ifaces = self.interfaces.active_names();
                self.publish.add(rr, None, &ifaces, now, &mut self.sched);
            }
            EngineCommand::Withdraw { name, rtype } => {
                for (iface, goodbyes) in self.publish.withdraw(&name, rtype, &mut self.sched) {
                    send_goodbyes(sink, &iface, goodbyes);
                }
                info!(name = %name, rtype = %rtype, "Record withdrawn");
            }
            EngineCommand::InterfaceUp(info) => {
                let name = info.name.clone();
                let address = info.address;
                if self.interfaces.up(info) == LinkAction::Start {
                    self.publish.start_interface(&name, now, &mut self.sched);
                    self.publish_host(&name, address, now);
                }
            }
            EngineCommand::InterfaceDown(name) => {
                if self.interfaces.down(&name) == LinkAction::Reset {
                    self.reset_interface(&name);
                }
            }
        }
    }

    fn reset_interface(&mut self, name: &str) {
        self.publish.stop_interface(name, &mut self.sched);
        let Some(iface) = self.interfaces.get_mut(name) else {
            return;
        };
        let removed = iface.cache.clear(&mut self.sched);
        debug!(iface = %name, records = removed.len(), "Cache cleared");
        for rr in &removed {
            self.queries
                .notify(name, rr, BrowseEventKind::Removed, &mut self.sched);
        }
    }

    fn publish_host(&mut self, iface: &str, address: Ipv4Addr, now: Instant) {
        let Some(hostname) = self.config.hostname.clone() else {
            return;
        };
        let ttl = self.config.host_ttl;
        let records = [
            ResourceRecord::new(&hostname, ttl, RData::A(address)),
            ResourceRecord::new(&reverse_name(address), ttl, RData::Ptr(hostname.clone())),
        ];

        let scope = [CompactString::from(iface)];
        for rr in records {
            match rr {
                Ok(rr) => {
                    self.publish
                        .add(rr.unique(), Some(iface), &scope, now, &mut self.sched)
                }
                Err(e) => warn!(iface = %iface, hostname = %hostname, error = %e, "Invalid host record"),
            }
        }
    }

    /// Decodes and handles one datagram received on socket `received_on`.
    /// Packets are attributed to interfaces by source address; a copy
    /// delivered to another interface's socket is dropped.
    pub fn handle_packet(
        &mut self,
        received_on: &str,
        bytes: &[u8],
        src: SocketAddr,
        now: Instant,
        sink: &mut dyn PacketSink,
    ) {
        let SocketAddr::V4(src_v4) = src else {
            return;
        };
        let Some(iface) = self.interfaces.find_by_source(*src_v4.ip()) else {
            trace!(src = %src, "Packet from off-link source dropped");
            return;
        };
        if iface.name() != received_on {
            return;
        }
        let iface = CompactString::from(iface.name());

        let msg = match wire::decode(bytes) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(iface = %iface, src = %src, error = %e, "Dropping malformed packet");
                return;
            }
        };

        if msg.header.is_response() {
            if src.port() != MDNS_PORT {
                debug!(iface = %iface, src = %src, "Ignoring response from non-mDNS port");
                return;
            }
            self.handle_response(&iface, msg, now);
        } else {
            self.handle_query(&iface, &msg, src, sink);
        }
    }

    fn handle_response(&mut self, iface: &str, msg: Message, now: Instant) {
        for rr in msg.answers.into_iter().chain(msg.additionals) {
            if !rr.is_goodbye() {
                self.publish.conflict(iface, &rr, now, &mut self.sched);
            }

            let Some(interface) = self.interfaces.get_mut(iface) else {
                return;
            };
            let outcome = interface.cache.process(rr, now, &mut self.sched);
            trace!(iface = %iface, effect = ?outcome.effect, "Record processed");

            for removed in &outcome.removed {
                self.queries
                    .notify(iface, removed, BrowseEventKind::Removed, &mut self.sched);
            }
            for added in &outcome.added {
                self.queries
                    .notify(iface, added, BrowseEventKind::Added, &mut self.sched);
            }
        }
    }

    fn handle_query(
        &self,
        iface: &str,
        query: &Message,
        src: SocketAddr,
        sink: &mut dyn PacketSink,
    ) {
        let legacy = src.port() != MDNS_PORT;
        let mut multicast: Vec<ResourceRecord> = Vec::new();
        let mut unicast: Vec<ResourceRecord> = Vec::new();

        for question in &query.questions {
            let target = if legacy || question.unicast_response {
                &mut unicast
            } else {
                &mut multicast
            };
            for rr in self.publish.answers(iface, question) {
                if is_known_answer(&rr, &query.answers) {
                    trace!(iface = %iface, record = %rr, "Answer suppressed by known answer");
                    continue;
                }
                if !target.iter().any(|r| r.same_data(&rr)) {
                    target.push(rr);
                }
            }
        }

        if !multicast.is_empty() {
            let msg = self.response(iface, multicast);
            if let Err(e) = sink.send(iface, None, &msg) {
                warn!(iface = %iface, error = %e, "Failed to send response");
            }
        }

        if !unicast.is_empty() {
            let mut msg = self.response(iface, unicast);
            if legacy {
                msg.header.id = query.header.id;
                msg.questions = query.questions.clone();
                for rr in msg.answers.iter_mut().chain(msg.additionals.iter_mut()) {
                    rr.ttl = rr.ttl.min(LEGACY_UNICAST_TTL);
                    rr.cache_flush = false;
                }
            }
            if let Err(e) = sink.send(iface, Some(src), &msg) {
                warn!(iface = %iface, dest = %src, error = %e, "Failed to send unicast response");
            }
        }
    }

    /// A response carrying `answers`, plus the records their PTR and SRV
    /// targets point at in the additional section.
    fn response(&self, iface: &str, answers: Vec<ResourceRecord>) -> Message {
        let mut additionals: Vec<ResourceRecord> = Vec::new();
        let mut pending: Vec<String> = answers
            .iter()
            .filter_map(|rr| rr.rdata.target().map(str::to_string))
            .collect();

        while let Some(target) = pending.pop() {
            for rr in self
                .publish
                .answers(iface, &Question::new(&target, RecordType::ANY))
            {
                let known = answers.iter().chain(additionals.iter()).any(|r| r.same_data(&rr));
                if known {
                    continue;
                }
                if let Some(next) = rr.rdata.target() {
                    pending.push(next.to_string());
                }
                additionals.push(rr);
            }
        }

        let mut msg = Message::response();
        msg.answers = answers;
        msg.additionals = additionals;
        msg
    }

    /// Runs every timer due at `now`.
    pub fn handle_timers(&mut self, now: Instant, sink: &mut dyn PacketSink) {
        while let Some((_, task)) = self.sched.pop_due(now) {
            match task {
                TimerTask::CacheRevision { iface, record } => {
                    self.revise(&iface, record, now, sink);
                }
                TimerTask::Publish(id) => {
                    let iface = self.publish.set(id).map(|set| set.iface.clone());
                    let cache = iface
                        .as_deref()
                        .and_then(|name| self.interfaces.get(name))
                        .map(|i| &i.cache);
                    self.publish.on_timer(id, cache, now, &mut self.sched, sink);
                }
                TimerTask::QueryRetransmit(id) => {
                    if let Some(out) = self.queries.on_retransmit(id, now, &mut self.sched) {
                        self.send_query(&out, now, sink);
                    }
                }
                TimerTask::QueryDeadline(id) => {
                    self.queries.on_deadline(id, &mut self.sched);
                }
            }
        }
    }

    fn revise(&mut self, iface: &str, record: u64, now: Instant, sink: &mut dyn PacketSink) {
        let Some(interface) = self.interfaces.get_mut(iface) else {
            return;
        };
        match interface.cache.revise(record, now, &mut self.sched) {
            Some(RevisionOutcome::Requery(question)) => {
                let msg = Message::query().with_question(question);
                if let Err(e) = sink.send(iface, None, &msg) {
                    warn!(iface = %iface, error = %e, "Failed to send refresh query");
                }
            }
            Some(RevisionOutcome::Expired(rr)) => {
                self.queries
                    .notify(iface, &rr, BrowseEventKind::Removed, &mut self.sched);
            }
            None => {}
        }
    }

    fn send_initial_query(&mut self, id: QueryId, now: Instant, sink: &mut dyn PacketSink) {
        if let Some(out) = self.queries.outgoing(id) {
            self.send_query(&out, now, sink);
        }
    }

    /// Multicasts `out` on every active interface, listing that interface's
    /// cached answers when asked to.
    fn send_query(&self, out: &Outgoing, now: Instant, sink: &mut dyn PacketSink) {
        for iface in self.interfaces.active() {
            let mut msg = Message::query().with_question(out.question.clone());
            if out.known_answers {
                msg.answers = iface
                    .cache
                    .answers(&out.question, now)
                    .into_iter()
                    .filter(|rr| rr.ttl > 0)
                    .collect();
            }
            if let Err(e) = sink.send(iface.name(), None, &msg) {
                warn!(iface = %iface.name(), question = %out.question, error = %e, "Failed to send query");
            }
        }
    }

    /// Multicasts goodbyes for every announced record.
    pub fn shutdown(&mut self, sink: &mut dyn PacketSink) {
        for iface in self.interfaces.active_names() {
            let goodbyes = self.publish.goodbyes(&iface);
            if !goodbyes.is_empty() {
                send_goodbyes(sink, &iface, goodbyes);
            }
        }
        info!("mDNS engine stopped");
    }
}

fn send_goodbyes(sink: &mut dyn PacketSink, iface: &str, goodbyes: Vec<ResourceRecord>) {
    let count = goodbyes.len();
    let mut msg = Message::response();
    msg.answers = goodbyes;
    match sink.send(iface, None, &msg) {
        Ok(()) => debug!(iface = %iface, records = count, "Goodbyes sent"),
        Err(e) => warn!(iface = %iface, error = %e, "Failed to send goodbyes"),
    }
}

/// The querier already holds `rr` with at least half our TTL left
/// (RFC 6762 §7.1).
fn is_known_answer(rr: &ResourceRecord, known: &[ResourceRecord]) -> bool {
    known
        .iter()
        .any(|k| k.same_data(rr) && k.ttl >= rr.ttl / 2)
}
