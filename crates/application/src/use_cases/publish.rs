use crate::ports::MdnsEngine;
use mdnsd_domain::{check_question, RecordType, RequestError, ResourceRecord};
use std::sync::Arc;
use tracing::info;

pub struct PublishRecordUseCase {
    engine: Arc<dyn MdnsEngine>,
}

impl PublishRecordUseCase {
    pub fn new(engine: Arc<dyn MdnsEngine>) -> Self {
        Self { engine }
    }

    pub async fn publish(&self, record: ResourceRecord) -> Result<(), RequestError> {
        let rtype = record.record_type();
        if rtype.is_query_only() {
            return Err(RequestError::UnsupportedType(rtype));
        }
        info!(name = %record.name, rtype = %rtype, "Publishing record");
        self.engine.publish(record).await
    }

    pub async fn withdraw(&self, name: &str, rtype: RecordType) -> Result<(), RequestError> {
        let question = check_question(name, rtype)?;
        info!(name = %question.name, rtype = %rtype, "Withdrawing record");
        self.engine.withdraw(&question.name, rtype).await
    }
}
