use crate::config::InterfaceConfig;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Down,
    Up,
}

/// What the interface-enumeration layer reports about one interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub name: String,
    pub index: u32,
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub peer: Option<Ipv4Addr>,
    pub mtu: u32,
    /// Informational only.
    pub baudrate: u64,
}

impl InterfaceInfo {
    pub fn new(name: impl Into<String>, address: Ipv4Addr, netmask: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            index: 0,
            address,
            netmask,
            peer: None,
            mtu: 1500,
            baudrate: 0,
        }
    }

    /// Whether `src` is on this interface's subnet or is its peer.
    pub fn contains(&self, src: Ipv4Addr) -> bool {
        if self.peer == Some(src) {
            return true;
        }
        let mask = u32::from(self.netmask);
        u32::from(self.address) & mask == u32::from(src) & mask
    }
}

impl From<&InterfaceConfig> for InterfaceInfo {
    fn from(cfg: &InterfaceConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            index: 0,
            address: cfg.address,
            netmask: cfg.netmask,
            peer: cfg.peer,
            mtu: cfg.mtu,
            baudrate: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_subnet_and_peer() {
        let mut info = InterfaceInfo::new(
            "eth0",
            Ipv4Addr::new(192, 168, 1, 10),
            Ipv4Addr::new(255, 255, 255, 0),
        );
        assert!(info.contains(Ipv4Addr::new(192, 168, 1, 200)));
        assert!(!info.contains(Ipv4Addr::new(192, 168, 2, 1)));

        info.peer = Some(Ipv4Addr::new(10, 0, 0, 1));
        assert!(info.contains(Ipv4Addr::new(10, 0, 0, 1)));
    }
}
