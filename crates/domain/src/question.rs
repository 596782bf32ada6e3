use crate::dns_record::{RecordType, CLASS_IN};
use crate::name::normalize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Question {
    pub name: String,
    pub qtype: RecordType,
    pub qclass: u16,
    /// QU bit: the asker wants a unicast reply.
    pub unicast_response: bool,
}

impl Question {
    pub fn new(name: &str, qtype: RecordType) -> Self {
        Self {
            name: normalize(name).to_string(),
            qtype,
            qclass: CLASS_IN,
            unicast_response: false,
        }
    }

    pub fn with_unicast_response(mut self) -> Self {
        self.unicast_response = true;
        self
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.qtype)
    }
}
