pub mod errors;
pub mod interfaces;
pub mod logging;
pub mod mdns;
pub mod root;
pub mod services;

pub use errors::ConfigError;
pub use interfaces::InterfaceConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use mdns::MdnsConfig;
pub use root::{CliOverrides, Config};
pub use services::ServiceConfig;
