#![allow(dead_code)]

use async_trait::async_trait;
use mdnsd_application::ports::{BrowseSubscription, MdnsEngine};
use mdnsd_domain::{
    BrowseEvent, LookupReply, Question, RecordType, RequestError, ResourceRecord,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum EngineBehaviour {
    Answer,
    /// Never replies, as if the engine task had stalled.
    Hang,
    /// The command channel is gone.
    Disconnected,
}

pub struct MockMdnsEngine {
    replies: Mutex<HashMap<String, LookupReply>>,
    behaviour: Mutex<EngineBehaviour>,
    questions: Mutex<Vec<Question>>,
    browsers: Mutex<Vec<mpsc::UnboundedSender<BrowseEvent>>>,
    cancelled: Mutex<Vec<u64>>,
    published: Mutex<Vec<ResourceRecord>>,
    withdrawn: Mutex<Vec<(String, RecordType)>>,
}

impl MockMdnsEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(HashMap::new()),
            behaviour: Mutex::new(EngineBehaviour::Answer),
            questions: Mutex::new(Vec::new()),
            browsers: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
            published: Mutex::new(Vec::new()),
            withdrawn: Mutex::new(Vec::new()),
        })
    }

    pub fn set_reply(&self, name: &str, reply: LookupReply) {
        self.replies
            .lock()
            .unwrap()
            .insert(name.to_string(), reply);
    }

    pub fn set_behaviour(&self, behaviour: EngineBehaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    pub fn questions(&self) -> Vec<Question> {
        self.questions.lock().unwrap().clone()
    }

    pub fn push_browse_event(&self, event: BrowseEvent) {
        for tx in self.browsers.lock().unwrap().iter() {
            let _ = tx.send(event.clone());
        }
    }

    pub fn cancelled(&self) -> Vec<u64> {
        self.cancelled.lock().unwrap().clone()
    }

    pub fn published(&self) -> Vec<ResourceRecord> {
        self.published.lock().unwrap().clone()
    }

    pub fn withdrawn(&self) -> Vec<(String, RecordType)> {
        self.withdrawn.lock().unwrap().clone()
    }

    fn behaviour(&self) -> EngineBehaviour {
        *self.behaviour.lock().unwrap()
    }
}

#[async_trait]
impl MdnsEngine for MockMdnsEngine {
    async fn lookup(&self, question: Question) -> Result<LookupReply, RequestError> {
        self.questions.lock().unwrap().push(question.clone());
        match self.behaviour() {
            EngineBehaviour::Disconnected => Err(RequestError::NotConnected),
            EngineBehaviour::Hang => std::future::pending().await,
            EngineBehaviour::Answer => Ok(self
                .replies
                .lock()
                .unwrap()
                .get(&question.name)
                .cloned()
                .unwrap_or(LookupReply::NotFound)),
        }
    }

    async fn browse(&self, question: Question) -> Result<BrowseSubscription, RequestError> {
        if self.behaviour() == EngineBehaviour::Disconnected {
            return Err(RequestError::NotConnected);
        }
        self.questions.lock().unwrap().push(question);
        let (tx, rx) = mpsc::unbounded_channel();
        let mut browsers = self.browsers.lock().unwrap();
        browsers.push(tx);
        Ok(BrowseSubscription {
            id: browsers.len() as u64,
            events: rx,
        })
    }

    async fn cancel_browse(&self, id: u64) -> Result<(), RequestError> {
        self.cancelled.lock().unwrap().push(id);
        Ok(())
    }

    async fn publish(&self, record: ResourceRecord) -> Result<(), RequestError> {
        if self.behaviour() == EngineBehaviour::Disconnected {
            return Err(RequestError::NotConnected);
        }
        self.published.lock().unwrap().push(record);
        Ok(())
    }

    async fn withdraw(&self, name: &str, rtype: RecordType) -> Result<(), RequestError> {
        self.withdrawn
            .lock()
            .unwrap()
            .push((name.to_string(), rtype));
        Ok(())
    }
}
