//! mDNS packet codec (RFC 1035 §4 framing, RFC 6762 class bits).
//!
//! Decoding expands compressed names and rejects compression pointers that
//! do not point strictly backwards. Encoding compresses every repeated name
//! suffix and never emits a half-written record.

mod decoder;
mod encoder;

pub use decoder::decode;
pub use encoder::{encode, encode_with_limit, encoded_len};

use mdnsd_domain::{DomainError, RecordType};
use thiserror::Error;

/// Largest datagram we build (RFC 6762 §17 jumbo limit).
pub const MAX_PACKET_SIZE: usize = 9000;

pub const HEADER_LEN: usize = 12;

/// Longest name in wire form, including the root label.
pub const MAX_WIRE_NAME_LEN: usize = 255;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("Packet truncated")]
    Truncated,

    #[error("Compression pointer at {at} to {target} does not point backwards")]
    BadPointer { at: usize, target: usize },

    #[error("Name exceeds 255 octets")]
    NameTooLong,

    #[error("Unsupported label type 0x{0:02x}")]
    BadLabel(u8),

    #[error("Malformed {rtype} RDATA: {reason}")]
    BadRdata {
        rtype: RecordType,
        reason: &'static str,
    },

    #[error("Record of query-only type {0}")]
    QueryOnlyRecord(RecordType),

    #[error("Invalid name: {0}")]
    InvalidName(#[from] DomainError),

    #[error("Header and questions need {0} bytes, more than one datagram")]
    MessageTooLarge(usize),
}
