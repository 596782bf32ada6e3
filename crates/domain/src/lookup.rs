use crate::dns_record::{RData, RecordType, ResourceRecord};
use crate::name::{labels, normalize, reverse_name, MAX_LABEL_LEN, MAX_NAME_LEN};
use crate::question::Question;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Record types a local client may resolve.
pub const LOOKUP_TYPES: [RecordType; 5] = [
    RecordType::A,
    RecordType::HINFO,
    RecordType::PTR,
    RecordType::SRV,
    RecordType::TXT,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOperation {
    /// Host name to address.
    ByName,
    /// Address to host name, through the reverse PTR record.
    ByAddress,
    Hinfo,
    Srv,
    Txt,
}

impl LookupOperation {
    pub fn record_type(&self) -> RecordType {
        match self {
            LookupOperation::ByName => RecordType::A,
            LookupOperation::ByAddress => RecordType::PTR,
            LookupOperation::Hinfo => RecordType::HINFO,
            LookupOperation::Srv => RecordType::SRV,
            LookupOperation::Txt => RecordType::TXT,
        }
    }
}

impl FromStr for LookupOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "host" | "name" => Ok(LookupOperation::ByName),
            "addr" | "address" => Ok(LookupOperation::ByAddress),
            "hinfo" => Ok(LookupOperation::Hinfo),
            "srv" => Ok(LookupOperation::Srv),
            "txt" => Ok(LookupOperation::Txt),
            _ => Err(format!("Unknown lookup operation: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub operation: LookupOperation,
    /// A name, or a dotted IPv4 address for [`LookupOperation::ByAddress`].
    pub target: String,
}

impl LookupRequest {
    pub fn new(operation: LookupOperation, target: impl Into<String>) -> Self {
        Self {
            operation,
            target: target.into(),
        }
    }

    /// Resolves the request into the question sent on the wire.
    pub fn question(&self) -> Result<Question, RequestError> {
        let name = match self.operation {
            LookupOperation::ByAddress => {
                let addr: Ipv4Addr = self
                    .target
                    .parse()
                    .map_err(|_| RequestError::InvalidTarget(self.target.clone()))?;
                reverse_name(addr)
            }
            _ => self.target.clone(),
        };
        check_question(&name, self.operation.record_type())
    }
}

/// Checks a raw (name, type) pair the way the request layer does.
pub fn check_question(name: &str, rtype: RecordType) -> Result<Question, RequestError> {
    if !LOOKUP_TYPES.contains(&rtype) {
        return Err(RequestError::UnsupportedType(rtype));
    }
    let name = normalize(name);
    if name.len() > MAX_NAME_LEN {
        return Err(RequestError::NameTooLong(name.len()));
    }
    let valid = labels(name).is_ok_and(|labels| {
        !labels.is_empty()
            && labels
                .iter()
                .all(|l| !l.is_empty() && l.len() <= MAX_LABEL_LEN)
    });
    if !valid {
        return Err(RequestError::InvalidTarget(name.to_string()));
    }
    Ok(Question::new(name, rtype))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupReply {
    Found(RData),
    NotFound,
}

impl LookupReply {
    pub fn is_found(&self) -> bool {
        matches!(self, LookupReply::Found(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Unsupported record type: {0}")]
    UnsupportedType(RecordType),

    #[error("Name too long: {0} bytes")]
    NameTooLong(usize),

    #[error("Not connected to the mDNS engine")]
    NotConnected,

    #[error("Invalid lookup target: {0}")]
    InvalidTarget(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseEventKind {
    Added,
    Removed,
}

impl fmt::Display for BrowseEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowseEventKind::Added => write!(f, "+"),
            BrowseEventKind::Removed => write!(f, "-"),
        }
    }
}

/// Incremental browse result. Events carry the interface that observed the
/// record; the same record seen on two interfaces yields two events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseEvent {
    pub kind: BrowseEventKind,
    pub interface: String,
    pub record: ResourceRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_address_uses_reverse_name() {
        let req = LookupRequest::new(LookupOperation::ByAddress, "192.168.0.7");
        let q = req.question().unwrap();
        assert_eq!(q.name, "7.0.168.192.in-addr.arpa");
        assert_eq!(q.qtype, RecordType::PTR);
    }

    #[test]
    fn test_by_address_rejects_garbage() {
        let req = LookupRequest::new(LookupOperation::ByAddress, "not-an-ip");
        assert!(matches!(
            req.question(),
            Err(RequestError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_unsupported_type() {
        assert_eq!(
            check_question("host.local", RecordType::CNAME),
            Err(RequestError::UnsupportedType(RecordType::CNAME))
        );
        assert_eq!(
            check_question("host.local", RecordType::ANY),
            Err(RequestError::UnsupportedType(RecordType::ANY))
        );
    }

    #[test]
    fn test_name_too_long() {
        let name = "a".repeat(300);
        assert_eq!(
            check_question(&name, RecordType::A),
            Err(RequestError::NameTooLong(300))
        );
    }
}
