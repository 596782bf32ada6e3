use async_trait::async_trait;
use mdnsd_domain::{BrowseEvent, LookupReply, Question, RecordType, RequestError, ResourceRecord};
use tokio::sync::mpsc;

/// A live browse: events arrive until the subscription is cancelled or
/// dropped.
#[derive(Debug)]
pub struct BrowseSubscription {
    pub id: u64,
    pub events: mpsc::UnboundedReceiver<BrowseEvent>,
}

impl BrowseSubscription {
    pub async fn next(&mut self) -> Option<BrowseEvent> {
        self.events.recv().await
    }
}

/// The running protocol engine as seen by local requesters.
#[async_trait]
pub trait MdnsEngine: Send + Sync {
    /// Resolves a question. The engine answers from its caches or the network
    /// and reports `NotFound` once its own deadline passes.
    async fn lookup(&self, question: Question) -> Result<LookupReply, RequestError>;

    async fn browse(&self, question: Question) -> Result<BrowseSubscription, RequestError>;

    async fn cancel_browse(&self, id: u64) -> Result<(), RequestError>;

    /// Adds a locally owned record on every active interface.
    async fn publish(&self, record: ResourceRecord) -> Result<(), RequestError>;

    /// Removes an owned record and sends its goodbye.
    async fn withdraw(&self, name: &str, rtype: RecordType) -> Result<(), RequestError>;
}
