use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MdnsConfig {
    /// Published host name. When unset the daemon uses the system host name
    /// with `.local` appended.
    #[serde(default)]
    pub hostname: Option<String>,

    /// TTL of the A, PTR and HINFO host records.
    #[serde(default = "default_host_ttl")]
    pub host_ttl: u32,

    /// TTL of the PTR, SRV and TXT service records.
    #[serde(default = "default_service_ttl")]
    pub service_ttl: u32,

    /// How long a lookup waits for an answer before reporting not-found.
    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,

    #[serde(default = "default_hinfo_cpu")]
    pub hinfo_cpu: String,

    #[serde(default = "default_hinfo_os")]
    pub hinfo_os: String,

    #[serde(default = "default_true")]
    pub multicast_loop: bool,
}

impl Default for MdnsConfig {
    fn default() -> Self {
        Self {
            hostname: None,
            host_ttl: default_host_ttl(),
            service_ttl: default_service_ttl(),
            lookup_timeout_secs: default_lookup_timeout_secs(),
            hinfo_cpu: default_hinfo_cpu(),
            hinfo_os: default_hinfo_os(),
            multicast_loop: true,
        }
    }
}

fn default_host_ttl() -> u32 {
    120
}

fn default_service_ttl() -> u32 {
    4500
}

fn default_lookup_timeout_secs() -> u64 {
    3
}

fn default_hinfo_cpu() -> String {
    std::env::consts::ARCH.to_string()
}

fn default_hinfo_os() -> String {
    std::env::consts::OS.to_string()
}

fn default_true() -> bool {
    true
}
