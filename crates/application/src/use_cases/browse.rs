use crate::ports::{BrowseSubscription, MdnsEngine};
use mdnsd_domain::{check_question, RecordType, RequestError};
use std::sync::Arc;
use tracing::debug;

pub struct BrowseUseCase {
    engine: Arc<dyn MdnsEngine>,
}

impl BrowseUseCase {
    pub fn new(engine: Arc<dyn MdnsEngine>) -> Self {
        Self { engine }
    }

    /// Browses PTR records of a service type such as `_http._tcp` or
    /// `_http._tcp.local`.
    pub async fn execute(&self, service_type: &str) -> Result<BrowseSubscription, RequestError> {
        let name = if service_type.ends_with(".local") || service_type.ends_with(".local.") {
            service_type.to_string()
        } else {
            format!("{}.local", service_type)
        };
        let question = check_question(&name, RecordType::PTR)?;

        debug!(name = %question.name, "Browse requested");
        self.engine.browse(question).await
    }

    pub async fn cancel(&self, subscription: BrowseSubscription) -> Result<(), RequestError> {
        self.engine.cancel_browse(subscription.id).await
    }
}
