//! Deletion-event payloads. The core only builds these; a collaborator
//! publishes them after the transaction commits.

use serde::{Deserialize, Serialize};

use crate::catalog::EndpointCatalog;
use crate::model::Record;

pub const RECORD_DELETION_TOPIC: &str = "record-events";
pub const RECORD_DELETION_EVENT: &str = "deleteRecord";

/// What downstream consumers need to clean up after one content record.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordDeletedPayload {
    pub org_id: String,
    pub record_id: String,
    pub version: u64,
    pub extension: Option<String>,
    pub mime_type: Option<String>,
    pub summary_document_id: Option<String>,
    pub virtual_record_id: Option<String>,
    pub signed_url_route: String,
}

/// One batch descriptor per delete operation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventBatch {
    pub event_type: String,
    pub topic: String,
    pub payloads: Vec<RecordDeletedPayload>,
}

/// Build the deletion batch for the content records of an inventory.
/// Folders carry no payload and are skipped.
pub fn deletion_batch(catalog: &EndpointCatalog, records: &[Record]) -> EventBatch {
    let mut payloads = Vec::new();
    for record in records {
        if record.is_container {
            continue;
        }
        payloads.push(RecordDeletedPayload {
            org_id: record.org_id.clone(),
            record_id: record.id.clone(),
            version: record.version,
            extension: record.extension.clone(),
            mime_type: record.mime_type.clone(),
            summary_document_id: record.summary_doc_id.clone(),
            virtual_record_id: record.virtual_record_id.clone(),
            signed_url_route: catalog.signed_record_url(&record.org_id, &record.id),
        });
    }
    EventBatch {
        event_type: RECORD_DELETION_EVENT.to_string(),
        topic: RECORD_DELETION_TOPIC.to_string(),
        payloads,
    }
}
