//! The engine task: one `select!` loop over datagrams, commands, timers and
//! shutdown.

use super::engine::{Engine, EngineCommand};
use super::transport::PacketSink;
use super::wire::MAX_PACKET_SIZE;
use bytes::Bytes;
use compact_str::CompactString;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A datagram as read off an interface socket.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub iface: CompactString,
    pub src: SocketAddr,
    pub bytes: Bytes,
}

pub struct Reactor<S: PacketSink> {
    engine: Engine,
    sink: S,
    inbound: mpsc::Receiver<Inbound>,
    commands: mpsc::Receiver<EngineCommand>,
    shutdown: CancellationToken,
}

impl<S: PacketSink> Reactor<S> {
    pub fn new(
        engine: Engine,
        sink: S,
        inbound: mpsc::Receiver<Inbound>,
        commands: mpsc::Receiver<EngineCommand>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            engine,
            sink,
            inbound,
            commands,
            shutdown,
        }
    }

    /// Runs until the token is cancelled, then sends goodbyes and hands the
    /// engine and sink back.
    pub async fn run(mut self) -> (Engine, S) {
        info!("mDNS engine running");

        loop {
            let deadline = self.engine.next_deadline();

            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => break,

                Some(cmd) = self.commands.recv() => {
                    self.engine.handle_command(cmd, now(), &mut self.sink);
                }

                Some(packet) = self.inbound.recv() => {
                    self.engine.handle_packet(
                        &packet.iface,
                        &packet.bytes,
                        packet.src,
                        now(),
                        &mut self.sink,
                    );
                }

                _ = sleep_until(Instant::from_std(deadline.unwrap_or_else(far_future))), if deadline.is_some() => {
                    self.engine.handle_timers(now(), &mut self.sink);
                }
            }
        }

        self.engine.shutdown(&mut self.sink);
        (self.engine, self.sink)
    }
}

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

fn far_future() -> std::time::Instant {
    now() + std::time::Duration::from_secs(86400)
}

/// Reads datagrams from `socket` into `tx` until cancelled. Readers never
/// touch engine state.
pub fn spawn_reader(
    iface: &str,
    socket: Arc<UdpSocket>,
    tx: mpsc::Sender<Inbound>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    let iface = CompactString::from(iface);

    tokio::spawn(async move {
        let mut buf = vec![0u8; MAX_PACKET_SIZE];
        loop {
            let (len, src) = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = socket.recv_from(&mut buf) => match result {
                    Ok(received) => received,
                    Err(e) => {
                        warn!(iface = %iface, error = %e, "Receive failed");
                        continue;
                    }
                },
            };

            let packet = Inbound {
                iface: iface.clone(),
                src,
                bytes: Bytes::copy_from_slice(&buf[..len]),
            };
            if tx.send(packet).await.is_err() {
                break;
            }
        }
        debug!(iface = %iface, "Reader stopped");
    })
}
