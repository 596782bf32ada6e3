//! Multicast DNS protocol engine.
//!
//! Everything below runs on a single task: [`reactor`] owns the [`Engine`]
//! and feeds it datagrams, commands and due timers. No state here is shared
//! across tasks, so none of it is locked.

pub mod cache;
pub mod engine;
pub mod handle;
pub mod interface;
pub mod publish;
pub mod query;
pub mod reactor;
pub mod scheduler;
pub mod transport;
pub mod wire;

pub use engine::{Engine, EngineCommand, EngineConfig};
pub use handle::EngineHandle;
pub use interface::{Interface, InterfaceManager};
pub use publish::{PublishEngine, PublishId, PublishState};
pub use query::{QueryEngine, QueryId};
pub use reactor::{spawn_reader, Inbound, Reactor};
pub use scheduler::{Scheduler, TimerId};
pub use transport::{open_multicast_socket, MulticastSink, PacketSink, TransportError};

use compact_str::CompactString;

/// Work attached to a scheduler deadline. Each variant names the entity
/// that owns the timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerTask {
    CacheRevision { iface: CompactString, record: u64 },
    Publish(PublishId),
    QueryRetransmit(QueryId),
    QueryDeadline(QueryId),
}
