use compact_str::CompactString;
use mdnsd_domain::{to_key, RecordType, ResourceRecord};

/// Lowercase owner name, type and class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub name: CompactString,
    pub rtype: RecordType,
    pub class: u16,
}

impl CacheKey {
    #[inline]
    pub fn new(name: &str, rtype: RecordType, class: u16) -> Self {
        Self {
            name: CompactString::from(to_key(name)),
            rtype,
            class,
        }
    }

    #[inline]
    pub fn of(rr: &ResourceRecord) -> Self {
        Self::new(&rr.name, rr.record_type(), rr.class)
    }
}
