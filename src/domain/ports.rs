use crate::domain::model::{Location, Posting, Soldier, SoldierId, Status, VisitedLocation};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Lookups the record store offers. Every call reports transport failures
/// through `Err`; "nothing there" is `Ok(None)` or an empty list.
#[async_trait]
pub trait DataAccess: Send + Sync {
    async fn record_by_id(&self, id: SoldierId) -> Result<Option<Soldier>>;
    async fn status_by_id(&self, id: SoldierId) -> Result<Option<Status>>;
    async fn postings_for(&self, id: SoldierId) -> Result<Vec<Posting>>;
    async fn visits_for(&self, id: SoldierId) -> Result<Vec<VisitedLocation>>;
    async fn location_by_postal_code(&self, code: &str) -> Result<Option<Location>>;
    /// Raw document stored under the store's own key.
    async fn record_by_document_handle(&self, handle: &str) -> Result<Option<serde_json::Value>>;
}

#[async_trait]
impl<T: DataAccess + ?Sized> DataAccess for Arc<T> {
    async fn record_by_id(&self, id: SoldierId) -> Result<Option<Soldier>> {
        (**self).record_by_id(id).await
    }

    async fn status_by_id(&self, id: SoldierId) -> Result<Option<Status>> {
        (**self).status_by_id(id).await
    }

    async fn postings_for(&self, id: SoldierId) -> Result<Vec<Posting>> {
        (**self).postings_for(id).await
    }

    async fn visits_for(&self, id: SoldierId) -> Result<Vec<VisitedLocation>> {
        (**self).visits_for(id).await
    }

    async fn location_by_postal_code(&self, code: &str) -> Result<Option<Location>> {
        (**self).location_by_postal_code(code).await
    }

    async fn record_by_document_handle(&self, handle: &str) -> Result<Option<serde_json::Value>> {
        (**self).record_by_document_handle(handle).await
    }
}

/// Names of the store collections each lookup reads from.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Collections {
    pub soldiers: String,
    pub status: String,
    pub postings: String,
    pub visits: String,
    pub locations: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            soldiers: "soldiers".to_string(),
            status: "status".to_string(),
            postings: "postings".to_string(),
            visits: "visits".to_string(),
            locations: "locations".to_string(),
        }
    }
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn collections(&self) -> &Collections;
    fn request_timeout(&self) -> Option<Duration>;
    fn headers(&self) -> Option<&HashMap<String, String>>;
}
