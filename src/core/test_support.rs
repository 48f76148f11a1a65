use crate::domain::model::{Location, Posting, Soldier, SoldierId, Status, VisitedLocation};
use crate::domain::ports::DataAccess;
use crate::utils::error::{LookupError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory `DataAccess` that records every call it receives.
#[derive(Clone, Default)]
pub(crate) struct MockDataAccess {
    soldiers: HashMap<u64, Soldier>,
    status: HashMap<u64, Status>,
    postings: HashMap<u64, Vec<Posting>>,
    visits: HashMap<u64, Vec<VisitedLocation>>,
    locations: HashMap<String, Location>,
    documents: HashMap<String, serde_json::Value>,
    failing: HashSet<&'static str>,
    slow: HashMap<u64, Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockDataAccess {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_soldier(mut self, id: u64, postal_code: Option<&str>) -> Self {
        self.soldiers.insert(
            id,
            Soldier {
                id: SoldierId(id),
                name: format!("Soldier {}", id),
                rank: Some("Havildar".to_string()),
                unit: Some("12 Madras".to_string()),
                birth_postal_code: postal_code.map(str::to_string),
                extra: HashMap::new(),
            },
        );
        self
    }

    pub(crate) fn with_status(mut self, id: u64, status: &str) -> Self {
        self.status.insert(
            id,
            Status {
                soldier_id: SoldierId(id),
                status: status.to_string(),
                remarks: None,
                updated_at: None,
            },
        );
        self
    }

    pub(crate) fn with_postings(mut self, id: u64, count: usize) -> Self {
        let postings = (0..count)
            .map(|i| Posting {
                soldier_id: SoldierId(id),
                location: format!("Posting {}", i),
                unit: None,
                from: None,
                to: None,
            })
            .collect();
        self.postings.insert(id, postings);
        self
    }

    pub(crate) fn with_visits(mut self, id: u64, count: usize) -> Self {
        let visits = (0..count)
            .map(|i| VisitedLocation {
                soldier_id: SoldierId(id),
                place: format!("Place {}", i),
                visited_on: None,
            })
            .collect();
        self.visits.insert(id, visits);
        self
    }

    pub(crate) fn with_location(mut self, code: &str, place: &str) -> Self {
        self.locations.insert(
            code.to_string(),
            Location {
                postal_code: code.to_string(),
                place: Some(place.to_string()),
                district: None,
                state: None,
                country: Some("India".to_string()),
            },
        );
        self
    }

    pub(crate) fn with_document(mut self, handle: &str, document: serde_json::Value) -> Self {
        self.documents.insert(handle.to_string(), document);
        self
    }

    /// Makes the named lookup fail with a store error.
    pub(crate) fn failing(mut self, lookup: &'static str) -> Self {
        self.failing.insert(lookup);
        self
    }

    /// Delays the primary lookup for `id`.
    pub(crate) fn slow(mut self, id: u64, delay: Duration) -> Self {
        self.slow.insert(id, delay);
        self
    }

    pub(crate) fn visits_of(&self, id: u64) -> Vec<VisitedLocation> {
        self.visits.get(&id).cloned().unwrap_or_default()
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, lookup: &'static str, key: impl std::fmt::Display) -> Result<()> {
        self.calls.lock().unwrap().push(format!("{}:{}", lookup, key));
        if self.failing.contains(lookup) {
            return Err(LookupError::StoreStatusError {
                status: 503,
                url: format!("mock://{}/{}", lookup, key),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DataAccess for MockDataAccess {
    async fn record_by_id(&self, id: SoldierId) -> Result<Option<Soldier>> {
        self.record("record_by_id", id)?;
        if let Some(delay) = self.slow.get(&id.0) {
            tokio::time::sleep(*delay).await;
        }
        Ok(self.soldiers.get(&id.0).cloned())
    }

    async fn status_by_id(&self, id: SoldierId) -> Result<Option<Status>> {
        self.record("status_by_id", id)?;
        Ok(self.status.get(&id.0).cloned())
    }

    async fn postings_for(&self, id: SoldierId) -> Result<Vec<Posting>> {
        self.record("postings_for", id)?;
        Ok(self.postings.get(&id.0).cloned().unwrap_or_default())
    }

    async fn visits_for(&self, id: SoldierId) -> Result<Vec<VisitedLocation>> {
        self.record("visits_for", id)?;
        Ok(self.visits_of(id.0))
    }

    async fn location_by_postal_code(&self, code: &str) -> Result<Option<Location>> {
        self.record("location_by_postal_code", code)?;
        Ok(self.locations.get(code).cloned())
    }

    async fn record_by_document_handle(&self, handle: &str) -> Result<Option<serde_json::Value>> {
        self.record("record_by_document_handle", handle)?;
        Ok(self.documents.get(handle).cloned())
    }
}
