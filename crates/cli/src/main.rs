use clap::{Parser, Subcommand};
use mdnsd_domain::{CliOverrides, LookupOperation};
use tracing::info;

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "mdnsd")]
#[command(version)]
#[command(about = "mdnsd - Multicast DNS responder and resolver")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Published host name (default: system host name + .local)
    #[arg(short = 'n', long, global = true)]
    hostname: Option<String>,

    /// Seconds a lookup waits before reporting not-found
    #[arg(short = 't', long, global = true)]
    timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Publish the host and configured services (default)
    Run,

    /// Resolve once and print the answer
    Lookup {
        /// host, addr, hinfo, srv or txt
        operation: LookupOperation,
        /// Name, or dotted IPv4 address for `addr`
        target: String,
    },

    /// Print instances of a service type as they come and go
    Browse {
        /// Service type such as _http._tcp
        service_type: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        hostname: cli.hostname.clone(),
        lookup_timeout_secs: cli.timeout,
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config);

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            info!("Starting mdnsd v{}", env!("CARGO_PKG_VERSION"));
            let hostname = bootstrap::resolve_hostname(&config)?;
            server::run_daemon(&config, hostname).await?;
            info!("Responder shutdown complete");
        }
        Command::Lookup { operation, target } => {
            let found = server::run_lookup(&config, operation, &target).await?;
            if !found {
                std::process::exit(1);
            }
        }
        Command::Browse { service_type } => {
            server::run_browse(&config, &service_type).await?;
        }
    }

    Ok(())
}
