use mdnsd_application::use_cases::{BrowseUseCase, LookupUseCase, PublishRecordUseCase};
use mdnsd_domain::{Config, InterfaceInfo};
use mdnsd_infrastructure::mdns::{
    open_multicast_socket, spawn_reader, Engine, EngineConfig, EngineHandle, MulticastSink,
    Reactor,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const COMMAND_QUEUE: usize = 256;
const INBOUND_QUEUE: usize = 1024;

/// The running engine task, its socket readers and the use cases wired to it.
pub struct EngineServices {
    pub lookup: Arc<LookupUseCase>,
    pub browse: Arc<BrowseUseCase>,
    pub publish: Arc<PublishRecordUseCase>,
    shutdown: CancellationToken,
    reactor: JoinHandle<(Engine, MulticastSink)>,
    readers: Vec<JoinHandle<()>>,
}

impl EngineServices {
    /// Opens a socket per configured interface, starts the engine and
    /// brings the interfaces up. `hostname` is published on each of them.
    pub async fn start(config: &Config, hostname: Option<String>) -> anyhow::Result<Self> {
        let lookup_timeout = Duration::from_secs(config.mdns.lookup_timeout_secs);
        let engine = Engine::new(EngineConfig {
            hostname,
            host_ttl: config.mdns.host_ttl,
            lookup_timeout,
        });

        let shutdown = CancellationToken::new();
        let (in_tx, in_rx) = mpsc::channel(INBOUND_QUEUE);
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE);

        let mut sink = MulticastSink::new();
        let mut readers = Vec::new();
        let mut active: Vec<InterfaceInfo> = Vec::new();

        for iface in &config.interfaces {
            let info = InterfaceInfo::from(iface);
            match open_multicast_socket(&info, config.mdns.multicast_loop) {
                Ok(socket) => {
                    let socket = Arc::new(socket);
                    sink.insert(&info.name, socket.clone());
                    readers.push(spawn_reader(
                        &info.name,
                        socket,
                        in_tx.clone(),
                        shutdown.clone(),
                    ));
                    active.push(info);
                }
                Err(e) => warn!(iface = %info.name, error = %e, "Skipping interface"),
            }
        }

        if active.is_empty() {
            anyhow::bail!("No usable interfaces configured");
        }

        let reactor = Reactor::new(engine, sink, in_rx, cmd_rx, shutdown.clone());
        let reactor = tokio::spawn(reactor.run());

        let handle = EngineHandle::new(cmd_tx);
        for info in active {
            info!(iface = %info.name, address = %info.address, "Interface up");
            handle.interface_up(info).await?;
        }

        let engine: Arc<EngineHandle> = Arc::new(handle);
        Ok(Self {
            lookup: Arc::new(LookupUseCase::new(engine.clone(), lookup_timeout)),
            browse: Arc::new(BrowseUseCase::new(engine.clone())),
            publish: Arc::new(PublishRecordUseCase::new(engine)),
            shutdown,
            reactor,
            readers,
        })
    }

    /// Stops the engine, which sends goodbyes for everything it announced,
    /// then waits for the readers.
    pub async fn stop(self) {
        self.shutdown.cancel();

        match self.reactor.await {
            Ok((engine, _)) => info!(
                published = engine.publisher().sets().count(),
                "mDNS engine stopped"
            ),
            Err(e) => error!(error = %e, "mDNS engine task failed"),
        }

        for reader in self.readers {
            if let Err(e) = reader.await {
                error!(error = %e, "Reader task failed");
            }
        }
    }
}
