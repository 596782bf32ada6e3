use crate::ports::MdnsEngine;
use mdnsd_domain::{
    check_question, LookupReply, LookupRequest, Question, RecordType, RequestError,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Slack on top of the engine's own deadline before the caller gives up.
const REPLY_GRACE: Duration = Duration::from_secs(1);

pub struct LookupUseCase {
    engine: Arc<dyn MdnsEngine>,
    lookup_timeout: Duration,
}

impl LookupUseCase {
    pub fn new(engine: Arc<dyn MdnsEngine>, lookup_timeout: Duration) -> Self {
        Self {
            engine,
            lookup_timeout,
        }
    }

    pub async fn execute(&self, request: &LookupRequest) -> Result<LookupReply, RequestError> {
        let question = request.question()?;
        self.run(question).await
    }

    /// Raw (name, type) lookup. Only A, HINFO, PTR, SRV and TXT are accepted.
    pub async fn resolve(&self, name: &str, rtype: RecordType) -> Result<LookupReply, RequestError> {
        let question = check_question(name, rtype)?;
        self.run(question).await
    }

    async fn run(&self, question: Question) -> Result<LookupReply, RequestError> {
        debug!(name = %question.name, qtype = %question.qtype, "Lookup requested");

        let wait = self.lookup_timeout + REPLY_GRACE;
        match tokio::time::timeout(wait, self.engine.lookup(question)).await {
            Ok(reply) => reply,
            Err(_) => {
                debug!(timeout_ms = wait.as_millis() as u64, "Lookup reply overdue");
                Ok(LookupReply::NotFound)
            }
        }
    }
}
