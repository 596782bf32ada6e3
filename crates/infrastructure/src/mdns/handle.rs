use super::engine::EngineCommand;
use async_trait::async_trait;
use mdnsd_application::ports::{BrowseSubscription, MdnsEngine};
use mdnsd_domain::{
    InterfaceInfo, LookupReply, Question, RecordType, RequestError, ResourceRecord,
};
use tokio::sync::{mpsc, oneshot};

/// Cloneable front of the engine task. Every call is a command over the
/// reactor's channel; a closed channel means the engine is gone.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(commands: mpsc::Sender<EngineCommand>) -> Self {
        Self { commands }
    }

    async fn send(&self, cmd: EngineCommand) -> Result<(), RequestError> {
        self.commands
            .send(cmd)
            .await
            .map_err(|_| RequestError::NotConnected)
    }

    pub async fn interface_up(&self, info: InterfaceInfo) -> Result<(), RequestError> {
        self.send(EngineCommand::InterfaceUp(info)).await
    }

    pub async fn interface_down(&self, name: &str) -> Result<(), RequestError> {
        self.send(EngineCommand::InterfaceDown(name.to_string()))
            .await
    }
}

#[async_trait]
impl MdnsEngine for EngineHandle {
    async fn lookup(&self, question: Question) -> Result<LookupReply, RequestError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Lookup { question, reply }).await?;
        rx.await.map_err(|_| RequestError::NotConnected)
    }

    async fn browse(&self, question: Question) -> Result<BrowseSubscription, RequestError> {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Browse {
            question,
            events,
            reply,
        })
        .await?;
        let id = rx.await.map_err(|_| RequestError::NotConnected)?;
        Ok(BrowseSubscription {
            id,
            events: events_rx,
        })
    }

    async fn cancel_browse(&self, id: u64) -> Result<(), RequestError> {
        self.send(EngineCommand::CancelBrowse(id)).await
    }

    async fn publish(&self, record: ResourceRecord) -> Result<(), RequestError> {
        self.send(EngineCommand::Publish(record)).await
    }

    async fn withdraw(&self, name: &str, rtype: RecordType) -> Result<(), RequestError> {
        self.send(EngineCommand::Withdraw {
            name: name.to_string(),
            rtype,
        })
        .await
    }
}
