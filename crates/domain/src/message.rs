use crate::dns_record::ResourceRecord;
use crate::question::Question;

pub const FLAGS_QR_RESPONSE: u16 = 0x8000;
pub const FLAGS_AA: u16 = 0x0400;
pub const FLAGS_TC: u16 = 0x0200;

/// Message header without the section counts; those are derived from the
/// section lists when encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub flags: u16,
}

impl Header {
    #[inline]
    pub fn is_response(&self) -> bool {
        self.flags & FLAGS_QR_RESPONSE != 0
    }

    #[inline]
    pub fn is_query(&self) -> bool {
        !self.is_response()
    }

    #[inline]
    pub fn is_authoritative(&self) -> bool {
        self.flags & FLAGS_AA != 0
    }

    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.flags & FLAGS_TC != 0
    }

    pub fn set_truncated(&mut self) {
        self.flags |= FLAGS_TC;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
}

impl Message {
    /// Empty multicast query (id 0, no flags).
    pub fn query() -> Self {
        Self::default()
    }

    /// Empty authoritative response (id 0, QR and AA set).
    pub fn response() -> Self {
        Self {
            header: Header {
                id: 0,
                flags: FLAGS_QR_RESPONSE | FLAGS_AA,
            },
            ..Self::default()
        }
    }

    pub fn with_question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }

    pub fn with_answer(mut self, rr: ResourceRecord) -> Self {
        self.answers.push(rr);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
            && self.answers.is_empty()
            && self.authorities.is_empty()
            && self.additionals.is_empty()
    }

    /// Whether any question carries the unicast-response bit.
    pub fn wants_unicast_response(&self) -> bool {
        self.questions.iter().any(|q| q.unicast_response)
    }

    /// Iterates answers then authority then additional records.
    pub fn records(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.answers
            .iter()
            .chain(self.authorities.iter())
            .chain(self.additionals.iter())
    }
}
