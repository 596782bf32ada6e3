//! Records the daemon publishes from its configuration. Per-interface A and
//! reverse PTR records are added by the engine itself.

use mdnsd_domain::{Config, DomainError, Hinfo, RData, ResourceRecord, ServiceConfig, Srv};

/// DNS-SD service type enumeration name (RFC 6763 §9).
pub const SERVICES_ENUMERATION: &str = "_services._dns-sd._udp.local";

pub fn daemon_records(config: &Config, hostname: &str) -> Result<Vec<ResourceRecord>, DomainError> {
    let mut records = vec![host_info(config, hostname)?];
    for service in &config.services {
        for rr in service_records(service, hostname, config.mdns.service_ttl)? {
            if !records.contains(&rr) {
                records.push(rr);
            }
        }
    }
    Ok(records)
}

fn host_info(config: &Config, hostname: &str) -> Result<ResourceRecord, DomainError> {
    let hinfo = RData::Hinfo(Hinfo {
        cpu: config.mdns.hinfo_cpu.clone(),
        os: config.mdns.hinfo_os.clone(),
    });
    Ok(ResourceRecord::new(hostname, config.mdns.host_ttl, hinfo)?.unique())
}

/// PTR, SRV and TXT for one instance plus its enumeration PTR.
pub fn service_records(
    service: &ServiceConfig,
    hostname: &str,
    ttl: u32,
) -> Result<Vec<ResourceRecord>, DomainError> {
    let type_name = service.type_name();
    let instance = service.instance_name();

    let srv = RData::Srv(Srv {
        priority: service.priority,
        weight: service.weight,
        port: service.port,
        target: hostname.to_string(),
    });

    Ok(vec![
        ResourceRecord::new(&type_name, ttl, RData::Ptr(instance.clone()))?,
        ResourceRecord::new(&instance, ttl, srv)?.unique(),
        ResourceRecord::new(&instance, ttl, RData::Txt(service.txt.clone()))?.unique(),
        ResourceRecord::new(SERVICES_ENUMERATION, ttl, RData::Ptr(type_name))?,
    ])
}
