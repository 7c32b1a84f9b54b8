//! Endpoint catalog injected into the components that build outward-facing
//! URL strings. Kept explicit so nothing consults a global registry.

/// Storage endpoint lookup used when assembling deletion-event payloads.
#[derive(Clone, Debug)]
pub struct EndpointCatalog {
    storage_endpoint: String,
}

impl EndpointCatalog {
    pub fn new(storage_endpoint: impl Into<String>) -> Self {
        Self {
            storage_endpoint: storage_endpoint.into(),
        }
    }

    /// Signed download route for a record's stored payload.
    pub fn signed_record_url(&self, org_id: &str, record_id: &str) -> String {
        format!(
            "{}/api/v1/document/internal/{}/{}/download",
            self.storage_endpoint.trim_end_matches('/'),
            org_id,
            record_id
        )
    }
}

impl Default for EndpointCatalog {
    fn default() -> Self {
        Self::new("http://localhost:3000")
    }
}
