use crate::name::escape_label;
use serde::{Deserialize, Serialize};

/// One `[[services]]` entry, published as PTR, SRV and TXT records.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Instance label, e.g. `My Printer`.
    pub instance: String,

    /// Service type such as `_http._tcp`.
    pub service_type: String,

    pub port: u16,

    /// `key=value` strings.
    #[serde(default)]
    pub txt: Vec<String>,

    #[serde(default)]
    pub priority: u16,

    #[serde(default)]
    pub weight: u16,
}

impl ServiceConfig {
    /// `_http._tcp.local`
    pub fn type_name(&self) -> String {
        format!("{}.local", self.service_type)
    }

    /// `My Printer._http._tcp.local`. Dots in the instance label are
    /// escaped.
    pub fn instance_name(&self) -> String {
        format!("{}.{}", escape_label(&self.instance), self.type_name())
    }

    pub fn has_valid_type(&self) -> bool {
        let mut labels = self.service_type.split('.');
        match (labels.next(), labels.next(), labels.next()) {
            (Some(service), Some(proto), None) => {
                service.len() > 1
                    && service.starts_with('_')
                    && (proto == "_tcp" || proto == "_udp")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(service_type: &str) -> ServiceConfig {
        ServiceConfig {
            instance: "web".to_string(),
            service_type: service_type.to_string(),
            port: 80,
            txt: vec![],
            priority: 0,
            weight: 0,
        }
    }

    #[test]
    fn test_names() {
        let s = service("_http._tcp");
        assert_eq!(s.type_name(), "_http._tcp.local");
        assert_eq!(s.instance_name(), "web._http._tcp.local");

        let mut dotted = service("_http._tcp");
        dotted.instance = "My.Printer".to_string();
        assert_eq!(dotted.instance_name(), "My\\.Printer._http._tcp.local");
    }

    #[test]
    fn test_service_type_validation() {
        assert!(service("_http._tcp").has_valid_type());
        assert!(service("_ipp._udp").has_valid_type());
        assert!(!service("http._tcp").has_valid_type());
        assert!(!service("_http").has_valid_type());
        assert!(!service("_http._sctp").has_valid_type());
    }
}
