pub mod records;

use anyhow::Context;
use mdnsd_domain::{validate_name, CliOverrides, Config, LogFormat};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, overrides)?;
    config.validate()?;
    Ok(config)
}

/// `RUST_LOG` wins over the configured level.
pub fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }

    if let Some(path) = Config::get_config_path() {
        info!(path = %path, "Configuration file found");
    }
}

/// Configured host name, or the system one reduced to its first label
/// under `.local`.
pub fn resolve_hostname(config: &Config) -> anyhow::Result<String> {
    if let Some(name) = &config.mdns.hostname {
        return Ok(name.clone());
    }

    let system = hostname::get().context("Failed to read the system host name")?;
    let system = system.to_string_lossy();
    let label = system.split('.').next().unwrap_or_default();
    let name = local_name(label);
    validate_name(&name).with_context(|| format!("System host name '{}' is unusable", system))?;
    Ok(name)
}

fn local_name(label: &str) -> String {
    format!("{}.local", label.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_hostname_wins() {
        let mut config = Config::default();
        config.mdns.hostname = Some("printer.local".to_string());
        assert_eq!(resolve_hostname(&config).unwrap(), "printer.local");
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("Workstation"), "workstation.local");
    }
}
