mod rdata;
mod record;
mod record_type;

pub use rdata::{Hinfo, RData, Srv};
pub use record::ResourceRecord;
pub use record_type::RecordType;

/// The Internet class, the only one mDNS uses.
pub const CLASS_IN: u16 = 1;

/// Masks off the cache-flush (records) / unicast-response (questions) bit.
pub const CLASS_MASK: u16 = 0x7FFF;

/// Top bit of the class field.
pub const CLASS_FLAG: u16 = 0x8000;
