use super::{WireError, HEADER_LEN, MAX_PACKET_SIZE};
use mdnsd_domain::name::{labels, normalize};
use mdnsd_domain::{
    DomainError, Message, Question, RData, ResourceRecord, CLASS_FLAG, MAX_LABEL_LEN,
};
use rustc_hash::FxHashMap;

/// Offsets at or above this cannot be expressed in a 14-bit pointer.
const MAX_POINTER_OFFSET: usize = 0x3FFF;
const POINTER_MASK: u16 = 0xC000;

pub fn encode(msg: &Message) -> Result<Vec<u8>, WireError> {
    encode_with_limit(msg, MAX_PACKET_SIZE)
}

/// Size of the encoded form of `msg`, compression included.
pub fn encoded_len(msg: &Message) -> Result<usize, WireError> {
    encode(msg).map(|bytes| bytes.len())
}

/// Encodes `msg` into at most `limit` bytes.
///
/// Records that do not fit are dropped whole, and so is everything after
/// them. The header counts describe what was written. For a query that lost
/// known answers the TC bit is set.
pub fn encode_with_limit(msg: &Message, limit: usize) -> Result<Vec<u8>, WireError> {
    let mut w = Writer::new();
    w.buf.extend_from_slice(&[0u8; HEADER_LEN]);

    for q in &msg.questions {
        w.question(q)?;
    }
    if w.buf.len() > limit {
        return Err(WireError::MessageTooLarge(w.buf.len()));
    }

    let mut counts = [msg.questions.len() as u16, 0, 0, 0];
    let mut dropped = false;
    let sections = [&msg.answers, &msg.authorities, &msg.additionals];

    'sections: for (i, section) in sections.into_iter().enumerate() {
        for rr in section {
            let mark = w.mark();
            w.record(rr)?;
            if w.buf.len() > limit {
                w.rollback(mark);
                dropped = true;
                break 'sections;
            }
            counts[i + 1] += 1;
        }
    }

    let mut header = msg.header;
    if dropped && header.is_query() {
        header.set_truncated();
    }

    w.buf[0..2].copy_from_slice(&header.id.to_be_bytes());
    w.buf[2..4].copy_from_slice(&header.flags.to_be_bytes());
    for (i, count) in counts.iter().enumerate() {
        let at = 4 + i * 2;
        w.buf[at..at + 2].copy_from_slice(&count.to_be_bytes());
    }

    Ok(w.buf)
}

/// Length-prefixed labels, the uncompressed wire form without the root.
fn suffix_key(labels: &[Vec<u8>]) -> Vec<u8> {
    let mut key = Vec::with_capacity(labels.iter().map(|l| l.len() + 1).sum());
    for label in labels {
        key.push(label.len() as u8);
        key.extend_from_slice(label);
    }
    key
}

struct Mark {
    len: usize,
    names: usize,
}

struct Writer {
    buf: Vec<u8>,
    /// Uncompressed name suffix → offset of its first occurrence.
    names: FxHashMap<Vec<u8>, u16>,
    /// Insertion order of `names`, so a rolled back record forgets its
    /// suffixes too.
    order: Vec<Vec<u8>>,
}

impl Writer {
    fn new() -> Self {
        Self {
            buf: Vec::with_capacity(512),
            names: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    fn mark(&self) -> Mark {
        Mark {
            len: self.buf.len(),
            names: self.order.len(),
        }
    }

    fn rollback(&mut self, mark: Mark) {
        self.buf.truncate(mark.len);
        for suffix in self.order.drain(mark.names..) {
            self.names.remove(&suffix);
        }
    }

    fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn name(&mut self, name: &str) -> Result<(), WireError> {
        let labels = labels(name)?;
        if labels.iter().any(|l| l.is_empty() || l.len() > MAX_LABEL_LEN) {
            return Err(WireError::InvalidName(DomainError::InvalidLabel {
                name: normalize(name).to_string(),
                reason: "label must be 1 to 63 bytes",
            }));
        }

        for i in 0..labels.len() {
            let suffix = suffix_key(&labels[i..]);
            if let Some(&offset) = self.names.get(&suffix) {
                self.u16(offset | POINTER_MASK);
                return Ok(());
            }

            let offset = self.buf.len();
            if offset <= MAX_POINTER_OFFSET {
                self.names.insert(suffix.clone(), offset as u16);
                self.order.push(suffix);
            }

            self.buf.push(labels[i].len() as u8);
            self.buf.extend_from_slice(&labels[i]);
        }

        self.buf.push(0);
        Ok(())
    }

    fn character_string(&mut self, s: &str, rdata: &RData) -> Result<(), WireError> {
        if s.len() > u8::MAX as usize {
            return Err(WireError::BadRdata {
                rtype: rdata.record_type(),
                reason: "character-string longer than 255 bytes",
            });
        }
        self.buf.push(s.len() as u8);
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }

    fn question(&mut self, q: &Question) -> Result<(), WireError> {
        self.name(&q.name)?;
        self.u16(q.qtype.to_u16());
        let flag = if q.unicast_response { CLASS_FLAG } else { 0 };
        self.u16(q.qclass | flag);
        Ok(())
    }

    fn record(&mut self, rr: &ResourceRecord) -> Result<(), WireError> {
        self.name(&rr.name)?;
        self.u16(rr.record_type().to_u16());
        let flag = if rr.cache_flush { CLASS_FLAG } else { 0 };
        self.u16(rr.class | flag);
        self.u32(rr.ttl);

        let len_at = self.buf.len();
        self.u16(0);
        self.rdata(&rr.rdata)?;

        let rdlength = (self.buf.len() - len_at - 2) as u16;
        self.buf[len_at..len_at + 2].copy_from_slice(&rdlength.to_be_bytes());
        Ok(())
    }

    fn rdata(&mut self, rdata: &RData) -> Result<(), WireError> {
        match rdata {
            RData::A(addr) => self.buf.extend_from_slice(&addr.octets()),
            RData::Ns(name) | RData::Cname(name) | RData::Ptr(name) => self.name(name)?,
            RData::Txt(strings) if strings.is_empty() => self.buf.push(0),
            RData::Txt(strings) => {
                for s in strings {
                    self.character_string(s, rdata)?;
                }
            }
            RData::Srv(srv) => {
                self.u16(srv.priority);
                self.u16(srv.weight);
                self.u16(srv.port);
                self.name(&srv.target)?;
            }
            RData::Hinfo(hinfo) => {
                self.character_string(&hinfo.cpu, rdata)?;
                self.character_string(&hinfo.os, rdata)?;
            }
        }
        Ok(())
    }
}
