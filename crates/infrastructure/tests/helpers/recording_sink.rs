#![allow(dead_code)]
use mdnsd_domain::Message;
use mdnsd_infrastructure::mdns::{wire, PacketSink, TransportError};
use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct Sent {
    pub iface: String,
    pub dest: Option<SocketAddr>,
    pub msg: Message,
}

impl Sent {
    /// A probe: a query carrying proposed records in the authority section.
    pub fn is_probe(&self) -> bool {
        self.msg.header.is_query() && !self.msg.authorities.is_empty()
    }

    pub fn is_announcement(&self) -> bool {
        self.msg.header.is_response() && self.dest.is_none()
    }
}

/// Keeps every packet instead of sending it. Messages are run through the
/// encoder so anything unencodable fails the test.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Vec<Sent>,
    pub fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Vec::new(),
            fail: true,
        }
    }

    pub fn take(&mut self) -> Vec<Sent> {
        std::mem::take(&mut self.sent)
    }

    pub fn probes(&self) -> usize {
        self.sent.iter().filter(|s| s.is_probe()).count()
    }

    pub fn announcements(&self) -> usize {
        self.sent.iter().filter(|s| s.is_announcement()).count()
    }

    pub fn queries(&self) -> Vec<&Message> {
        self.sent
            .iter()
            .filter(|s| s.msg.header.is_query() && s.msg.authorities.is_empty())
            .map(|s| &s.msg)
            .collect()
    }
}

impl PacketSink for RecordingSink {
    fn send(
        &mut self,
        iface: &str,
        dest: Option<SocketAddr>,
        msg: &Message,
    ) -> Result<(), TransportError> {
        if self.fail {
            return Err(TransportError::UnknownInterface(iface.to_string()));
        }
        wire::encode(msg)?;
        self.sent.push(Sent {
            iface: iface.to_string(),
            dest,
            msg: msg.clone(),
        });
        Ok(())
    }
}
