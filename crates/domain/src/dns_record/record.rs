use super::{RData, RecordType, CLASS_IN};
use crate::errors::DomainError;
use crate::name::{names_equal, normalize, validate_name};
use crate::question::Question;
use std::fmt;

/// A typed, named piece of DNS data. The type is derived from the payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRecord {
    pub name: String,
    pub class: u16,
    /// Marks the record as replacing, not accumulating with, prior
    /// records of the same name/type/class.
    pub cache_flush: bool,
    pub ttl: u32,
    pub rdata: RData,
}

impl ResourceRecord {
    /// Shared (non cache-flush) record of class IN.
    pub fn new(name: &str, ttl: u32, rdata: RData) -> Result<Self, DomainError> {
        validate_name(name)?;
        rdata.validate()?;
        Ok(Self {
            name: normalize(name).to_string(),
            class: CLASS_IN,
            cache_flush: false,
            ttl,
            rdata,
        })
    }

    /// Same record with the cache-flush flag set.
    pub fn unique(mut self) -> Self {
        self.cache_flush = true;
        self
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    #[inline]
    pub fn record_type(&self) -> RecordType {
        self.rdata.record_type()
    }

    pub fn is_goodbye(&self) -> bool {
        self.ttl == 0
    }

    /// Name equal, class equal, and type equal or the question asks for ANY.
    pub fn answers(&self, question: &Question) -> bool {
        question.qtype.matches(self.record_type())
            && self.class == question.qclass
            && names_equal(&self.name, &question.name)
    }

    /// Same key (name, type, class).
    pub fn same_key(&self, other: &ResourceRecord) -> bool {
        self.record_type() == other.record_type()
            && self.class == other.class
            && names_equal(&self.name, &other.name)
    }

    /// Same key and same payload. TTL and the cache-flush flag are ignored.
    pub fn same_data(&self, other: &ResourceRecord) -> bool {
        self.same_key(other) && self.rdata.same_data(&other.rdata)
    }

    /// Moves every reference to `old`, as owner or as embedded target, to
    /// `new`. Returns whether anything changed.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        let mut changed = false;
        if names_equal(&self.name, old) {
            self.name = new.to_string();
            changed = true;
        }
        if let Some(target) = self.rdata.target_mut() {
            if names_equal(target, old) {
                *target = new.to_string();
                changed = true;
            }
        }
        changed
    }

    /// The question that would be answered by this record.
    pub fn question(&self) -> Question {
        Question::new(&self.name, self.record_type())
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.name,
            self.ttl,
            self.record_type(),
            self.rdata
        )
    }
}
