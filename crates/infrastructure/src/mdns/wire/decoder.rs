use super::{WireError, HEADER_LEN, MAX_WIRE_NAME_LEN};
use mdnsd_domain::name::push_label;
use mdnsd_domain::{
    Header, Hinfo, Message, Question, RData, RecordType, ResourceRecord, Srv, CLASS_FLAG,
    CLASS_IN, CLASS_MASK,
};
use std::net::Ipv4Addr;

const POINTER_TAG: u8 = 0xC0;

/// Parses one datagram.
///
/// Decoding stops at the declared counts; bytes after the last record are
/// ignored. Records of unknown type or of a class other than IN are skipped.
pub fn decode(buf: &[u8]) -> Result<Message, WireError> {
    if buf.len() < HEADER_LEN {
        return Err(WireError::Truncated);
    }
    let mut reader = Reader { buf, pos: 0 };

    let header = Header {
        id: reader.u16()?,
        flags: reader.u16()?,
    };
    let qdcount = reader.u16()?;
    let ancount = reader.u16()?;
    let nscount = reader.u16()?;
    let arcount = reader.u16()?;

    let mut msg = Message {
        header,
        ..Message::default()
    };

    for _ in 0..qdcount {
        if let Some(q) = reader.question()? {
            msg.questions.push(q);
        }
    }
    for (count, section) in [
        (ancount, &mut msg.answers),
        (nscount, &mut msg.authorities),
        (arcount, &mut msg.additionals),
    ] {
        for _ in 0..count {
            if let Some(rr) = reader.record()? {
                section.push(rr);
            }
        }
    }

    Ok(msg)
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn u8(&mut self) -> Result<u8, WireError> {
        let b = *self.buf.get(self.pos).ok_or(WireError::Truncated)?;
        self.pos += 1;
        Ok(b)
    }

    fn u16(&mut self) -> Result<u16, WireError> {
        let bytes = self.bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self) -> Result<u32, WireError> {
        let bytes = self.bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn bytes(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        let end = self.pos.checked_add(n).ok_or(WireError::Truncated)?;
        let slice = self.buf.get(self.pos..end).ok_or(WireError::Truncated)?;
        self.pos = end;
        Ok(slice)
    }

    /// Reads a possibly compressed name.
    ///
    /// Every pointer must target an offset below the start of the segment
    /// that contains it, so each jump strictly decreases the read position
    /// and a chain of pointers always terminates.
    fn name(&mut self) -> Result<String, WireError> {
        let mut name = String::new();
        let mut wire_len = 1;
        let mut cursor = self.pos;
        let mut segment_start = self.pos;
        let mut resume_at = None;

        loop {
            let len = *self.buf.get(cursor).ok_or(WireError::Truncated)?;
            match len & POINTER_TAG {
                0x00 => {
                    if len == 0 {
                        cursor += 1;
                        break;
                    }
                    let start = cursor + 1;
                    let end = start + len as usize;
                    let label = self.buf.get(start..end).ok_or(WireError::Truncated)?;
                    wire_len += len as usize + 1;
                    if wire_len > MAX_WIRE_NAME_LEN {
                        return Err(WireError::NameTooLong);
                    }
                    push_label(&mut name, label);
                    cursor = end;
                }
                POINTER_TAG => {
                    let low = *self.buf.get(cursor + 1).ok_or(WireError::Truncated)?;
                    let target = (((len & !POINTER_TAG) as usize) << 8) | low as usize;
                    if target >= segment_start {
                        return Err(WireError::BadPointer { at: cursor, target });
                    }
                    if resume_at.is_none() {
                        resume_at = Some(cursor + 2);
                    }
                    cursor = target;
                    segment_start = target;
                }
                _ => return Err(WireError::BadLabel(len)),
            }
        }

        self.pos = resume_at.unwrap_or(cursor);
        Ok(name)
    }

    fn character_string(&mut self) -> Result<String, WireError> {
        let len = self.u8()? as usize;
        let bytes = self.bytes(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn question(&mut self) -> Result<Option<Question>, WireError> {
        let name = self.name()?;
        let qtype = self.u16()?;
        let qclass = self.u16()?;

        let Some(qtype) = RecordType::from_u16(qtype) else {
            return Ok(None);
        };
        if qclass & CLASS_MASK != CLASS_IN {
            return Ok(None);
        }

        Ok(Some(Question {
            name,
            qtype,
            qclass: CLASS_IN,
            unicast_response: qclass & CLASS_FLAG != 0,
        }))
    }

    fn record(&mut self) -> Result<Option<ResourceRecord>, WireError> {
        let name = self.name()?;
        let rtype = self.u16()?;
        let class = self.u16()?;
        let ttl = self.u32()?;
        let rdlength = self.u16()? as usize;

        let end = self.pos + rdlength;
        if end > self.buf.len() {
            return Err(WireError::Truncated);
        }

        let rtype = match RecordType::from_u16(rtype) {
            Some(RecordType::ANY) => return Err(WireError::QueryOnlyRecord(RecordType::ANY)),
            Some(rtype) if class & CLASS_MASK == CLASS_IN => rtype,
            _ => {
                self.pos = end;
                return Ok(None);
            }
        };

        let rdata = self.rdata(rtype, end)?;
        if self.pos != end {
            return Err(WireError::BadRdata {
                rtype,
                reason: "length mismatch",
            });
        }

        Ok(Some(ResourceRecord {
            name,
            class: CLASS_IN,
            cache_flush: class & CLASS_FLAG != 0,
            ttl,
            rdata,
        }))
    }

    fn rdata(&mut self, rtype: RecordType, end: usize) -> Result<RData, WireError> {
        let rdata = match rtype {
            RecordType::A => {
                if end - self.pos != 4 {
                    return Err(WireError::BadRdata {
                        rtype,
                        reason: "address is not 4 bytes",
                    });
                }
                let b = self.bytes(4)?;
                RData::A(Ipv4Addr::new(b[0], b[1], b[2], b[3]))
            }
            RecordType::NS => RData::Ns(self.name()?),
            RecordType::CNAME => RData::Cname(self.name()?),
            RecordType::PTR => RData::Ptr(self.name()?),
            RecordType::TXT => {
                let mut strings = Vec::new();
                while self.pos < end {
                    strings.push(self.character_string()?);
                }
                if strings.len() == 1 && strings[0].is_empty() {
                    strings.clear();
                }
                RData::Txt(strings)
            }
            RecordType::SRV => RData::Srv(Srv {
                priority: self.u16()?,
                weight: self.u16()?,
                port: self.u16()?,
                target: self.name()?,
            }),
            RecordType::HINFO => RData::Hinfo(Hinfo {
                cpu: self.character_string()?,
                os: self.character_string()?,
            }),
            RecordType::ANY => return Err(WireError::QueryOnlyRecord(rtype)),
        };
        Ok(rdata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(qd: u16, an: u16) -> Vec<u8> {
        let mut buf = vec![0, 0, 0x84, 0];
        buf.extend_from_slice(&qd.to_be_bytes());
        buf.extend_from_slice(&an.to_be_bytes());
        buf.extend_from_slice(&[0, 0, 0, 0]);
        buf
    }

    #[test]
    fn test_short_header_is_truncated() {
        assert_eq!(decode(&[0; 11]), Err(WireError::Truncated));
    }

    #[test]
    fn test_forward_pointer_rejected() {
        let mut buf = header(1, 0);
        // Question name is a pointer to offset 20, past itself.
        buf.extend_from_slice(&[0xC0, 20, 0, 1, 0, 1]);
        buf.extend_from_slice(&[4, b'h', b'o', b's', b't', 0]);
        assert_eq!(
            decode(&buf),
            Err(WireError::BadPointer { at: 12, target: 20 })
        );
    }

    #[test]
    fn test_self_pointer_rejected() {
        let mut buf = header(1, 0);
        buf.extend_from_slice(&[0xC0, 12, 0, 1, 0, 1]);
        assert!(matches!(decode(&buf), Err(WireError::BadPointer { .. })));
    }

    #[test]
    fn test_pointer_loop_rejected() {
        let mut buf = header(2, 0);
        // q1: "a" then pointer back to q1's start (offset 12), which is inside
        // the segment being read.
        buf.extend_from_slice(&[1, b'a', 0xC0, 12, 0, 1, 0, 1]);
        assert!(matches!(decode(&buf), Err(WireError::BadPointer { .. })));
    }

    #[test]
    fn test_extended_label_type_rejected() {
        let mut buf = header(1, 0);
        buf.extend_from_slice(&[0x41, 0, 0, 1, 0, 1]);
        assert_eq!(decode(&buf), Err(WireError::BadLabel(0x41)));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut buf = header(1, 0);
        buf.extend_from_slice(&[1, b'x', 0, 0, 1, 0, 1]);
        buf.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        let msg = decode(&buf).unwrap();
        assert_eq!(msg.questions.len(), 1);
        assert_eq!(msg.questions[0].name, "x");
    }

    #[test]
    fn test_unicast_bit_on_question() {
        let mut buf = header(1, 0);
        buf.extend_from_slice(&[1, b'x', 0, 0, 1, 0x80, 1]);
        let msg = decode(&buf).unwrap();
        assert!(msg.questions[0].unicast_response);
        assert!(msg.wants_unicast_response());
    }

    #[test]
    fn test_a_record_with_wrong_length_rejected() {
        let mut buf = header(0, 1);
        buf.extend_from_slice(&[1, b'x', 0, 0, 1, 0, 1, 0, 0, 0, 60, 0, 3, 1, 2, 3]);
        assert!(matches!(decode(&buf), Err(WireError::BadRdata { .. })));
    }

    #[test]
    fn test_any_record_rejected() {
        let mut buf = header(0, 1);
        buf.extend_from_slice(&[1, b'x', 0, 0, 255, 0, 1, 0, 0, 0, 60, 0, 0]);
        assert_eq!(
            decode(&buf),
            Err(WireError::QueryOnlyRecord(RecordType::ANY))
        );
    }

    #[test]
    fn test_name_longer_than_255_octets() {
        let mut buf = header(1, 0);
        for _ in 0..5 {
            buf.push(63);
            buf.extend_from_slice(&[b'a'; 63]);
        }
        buf.extend_from_slice(&[0, 0, 1, 0, 1]);
        assert_eq!(decode(&buf), Err(WireError::NameTooLong));
    }
}
