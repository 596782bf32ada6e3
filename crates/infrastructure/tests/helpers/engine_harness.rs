#![allow(dead_code)]
use super::builders::{eth0, peer};
use super::recording_sink::{RecordingSink, Sent};
use mdnsd_domain::{
    BrowseEvent, LookupReply, Message, Question, RecordType, ResourceRecord,
};
use mdnsd_infrastructure::mdns::{wire, Engine, EngineCommand, EngineConfig};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};

pub const HOSTNAME: &str = "myhost.local";

/// An engine with eth0 up, driven on a synthetic clock.
pub struct EngineHarness {
    pub engine: Engine,
    pub sink: RecordingSink,
    pub t0: Instant,
    now: Instant,
}

impl EngineHarness {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_host() -> Self {
        Self::with_config(EngineConfig {
            hostname: Some(HOSTNAME.to_string()),
            ..EngineConfig::default()
        })
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let t0 = Instant::now();
        let mut harness = Self {
            engine: Engine::new(config),
            sink: RecordingSink::new(),
            t0,
            now: t0,
        };
        harness.command(EngineCommand::InterfaceUp(eth0()));
        harness
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn command(&mut self, cmd: EngineCommand) {
        self.engine.handle_command(cmd, self.now, &mut self.sink);
    }

    pub fn receive(&mut self, bytes: &[u8], src: SocketAddr) {
        self.engine
            .handle_packet("eth0", bytes, src, self.now, &mut self.sink);
    }

    pub fn receive_msg(&mut self, msg: &Message, src: SocketAddr) {
        let bytes = wire::encode(msg).unwrap();
        self.receive(&bytes, src);
    }

    /// A response from a peer on the mDNS port.
    pub fn announce(&mut self, records: Vec<ResourceRecord>) {
        let mut msg = Message::response();
        msg.answers = records;
        self.receive_msg(&msg, peer());
    }

    /// Moves the clock to `t0 + at`, firing every timer on the way at its
    /// own deadline.
    pub fn advance_to(&mut self, at: Duration) {
        let until = self.t0 + at;
        while let Some(deadline) = self.engine.next_deadline() {
            if deadline > until {
                break;
            }
            self.now = self.now.max(deadline);
            self.engine.handle_timers(self.now, &mut self.sink);
        }
        self.now = self.now.max(until);
    }

    pub fn lookup(&mut self, name: &str, rtype: RecordType) -> oneshot::Receiver<LookupReply> {
        let (reply, rx) = oneshot::channel();
        self.command(EngineCommand::Lookup {
            question: Question::new(name, rtype),
            reply,
        });
        rx
    }

    pub fn browse(&mut self, name: &str) -> (u64, mpsc::UnboundedReceiver<BrowseEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (reply, mut rx) = oneshot::channel();
        self.command(EngineCommand::Browse {
            question: Question::new(name, RecordType::PTR),
            events,
            reply,
        });
        (rx.try_recv().unwrap(), events_rx)
    }

    pub fn take_sent(&mut self) -> Vec<Sent> {
        self.sink.take()
    }
}
