use super::RecordType;
use crate::errors::DomainError;
use crate::name::{names_equal, validate_name};
use std::fmt;
use std::net::Ipv4Addr;

/// Longest DNS character-string (one length octet).
pub const MAX_CHARACTER_STRING: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Srv {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hinfo {
    pub cpu: String,
    pub os: String,
}

/// Type-tagged record payload. The record type is derived from the variant,
/// so a record can never carry a payload that disagrees with its type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RData {
    A(Ipv4Addr),
    Ns(String),
    Cname(String),
    Ptr(String),
    /// Character-strings in wire order. An empty list is the empty TXT record.
    Txt(Vec<String>),
    Srv(Srv),
    Hinfo(Hinfo),
}

impl RData {
    pub fn record_type(&self) -> RecordType {
        match self {
            RData::A(_) => RecordType::A,
            RData::Ns(_) => RecordType::NS,
            RData::Cname(_) => RecordType::CNAME,
            RData::Ptr(_) => RecordType::PTR,
            RData::Txt(_) => RecordType::TXT,
            RData::Srv(_) => RecordType::SRV,
            RData::Hinfo(_) => RecordType::HINFO,
        }
    }

    /// Name embedded in the payload, if the type carries one.
    pub fn target(&self) -> Option<&str> {
        match self {
            RData::Ns(name) | RData::Cname(name) | RData::Ptr(name) => Some(name),
            RData::Srv(srv) => Some(&srv.target),
            _ => None,
        }
    }

    pub fn target_mut(&mut self) -> Option<&mut String> {
        match self {
            RData::Ns(name) | RData::Cname(name) | RData::Ptr(name) => Some(name),
            RData::Srv(srv) => Some(&mut srv.target),
            _ => None,
        }
    }

    /// Payload equality with embedded names compared case-insensitively.
    pub fn same_data(&self, other: &RData) -> bool {
        match (self, other) {
            (RData::Ns(a), RData::Ns(b))
            | (RData::Cname(a), RData::Cname(b))
            | (RData::Ptr(a), RData::Ptr(b)) => names_equal(a, b),
            (RData::Srv(a), RData::Srv(b)) => {
                a.priority == b.priority
                    && a.weight == b.weight
                    && a.port == b.port
                    && names_equal(&a.target, &b.target)
            }
            _ => self == other,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), DomainError> {
        match self {
            RData::A(_) => Ok(()),
            RData::Ns(name) | RData::Cname(name) | RData::Ptr(name) => validate_name(name),
            RData::Srv(srv) => validate_name(&srv.target),
            RData::Txt(strings) => strings
                .iter()
                .try_for_each(|s| check_character_string(s)),
            RData::Hinfo(hinfo) => {
                check_character_string(&hinfo.cpu)?;
                check_character_string(&hinfo.os)
            }
        }
    }
}

fn check_character_string(s: &str) -> Result<(), DomainError> {
    if s.len() > MAX_CHARACTER_STRING {
        return Err(DomainError::CharacterStringTooLong(s.len()));
    }
    Ok(())
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RData::A(addr) => write!(f, "{}", addr),
            RData::Ns(name) | RData::Cname(name) | RData::Ptr(name) => write!(f, "{}", name),
            RData::Txt(strings) => write!(f, "{}", strings.join(" ")),
            RData::Srv(srv) => write!(
                f,
                "{} {} {} {}",
                srv.priority, srv.weight, srv.port, srv.target
            ),
            RData::Hinfo(hinfo) => write!(f, "\"{}\" \"{}\"", hinfo.cpu, hinfo.os),
        }
    }
}
