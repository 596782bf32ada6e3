#![allow(dead_code)]
use mdnsd_domain::{Hinfo, RData, ResourceRecord, Srv};
use std::net::Ipv4Addr;

pub struct RecordBuilder {
    name: String,
    ttl: u32,
    rdata: RData,
    unique: bool,
}

impl RecordBuilder {
    pub fn a(name: &str, addr: [u8; 4]) -> Self {
        Self::with(name, RData::A(Ipv4Addr::from(addr)))
    }

    pub fn ptr(name: &str, target: &str) -> Self {
        Self::with(name, RData::Ptr(target.to_string()))
    }

    pub fn srv(name: &str, port: u16, target: &str) -> Self {
        Self::with(
            name,
            RData::Srv(Srv {
                priority: 0,
                weight: 0,
                port,
                target: target.to_string(),
            }),
        )
    }

    pub fn txt(name: &str, strings: &[&str]) -> Self {
        Self::with(
            name,
            RData::Txt(strings.iter().map(|s| s.to_string()).collect()),
        )
    }

    pub fn hinfo(name: &str, cpu: &str, os: &str) -> Self {
        Self::with(
            name,
            RData::Hinfo(Hinfo {
                cpu: cpu.to_string(),
                os: os.to_string(),
            }),
        )
    }

    fn with(name: &str, rdata: RData) -> Self {
        Self {
            name: name.to_string(),
            ttl: 120,
            rdata,
            unique: false,
        }
    }

    pub fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn build(self) -> ResourceRecord {
        let rr = ResourceRecord::new(&self.name, self.ttl, self.rdata).unwrap();
        if self.unique {
            rr.unique()
        } else {
            rr
        }
    }
}
