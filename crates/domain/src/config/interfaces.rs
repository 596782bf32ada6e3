use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// One `[[interfaces]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InterfaceConfig {
    pub name: String,

    pub address: Ipv4Addr,

    #[serde(default = "default_netmask")]
    pub netmask: Ipv4Addr,

    /// Remote end of a point-to-point link.
    #[serde(default)]
    pub peer: Option<Ipv4Addr>,

    #[serde(default = "default_mtu")]
    pub mtu: u32,
}

fn default_netmask() -> Ipv4Addr {
    Ipv4Addr::new(255, 255, 255, 0)
}

fn default_mtu() -> u32 {
    1500
}
