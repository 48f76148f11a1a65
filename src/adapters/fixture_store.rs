use crate::core::{DataAccess, Location, Posting, Soldier, SoldierId, Status, VisitedLocation};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Contents of a fixture file. Soldier documents are keyed by document
/// handle, the other collections are plain lists.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub soldiers: HashMap<String, serde_json::Value>,
    pub status: Vec<Status>,
    pub postings: Vec<Posting>,
    pub visits: Vec<VisitedLocation>,
    pub locations: Vec<Location>,
}

/// Serves lookups from a JSON fixture held in memory, for offline use.
#[derive(Debug, Clone)]
pub struct FixtureStore {
    fixture: Fixture,
}

impl FixtureStore {
    pub fn new(fixture: Fixture) -> Self {
        Self { fixture }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let fixture: Fixture = serde_json::from_str(content)?;
        tracing::debug!(
            "Loaded fixture with {} soldiers, {} postings, {} visits",
            fixture.soldiers.len(),
            fixture.postings.len(),
            fixture.visits.len()
        );
        Ok(Self::new(fixture))
    }
}

#[async_trait]
impl DataAccess for FixtureStore {
    async fn record_by_id(&self, id: SoldierId) -> Result<Option<Soldier>> {
        let document = self
            .fixture
            .soldiers
            .values()
            .find(|document| SoldierId::from_document(document).ok() == Some(id));

        match document {
            Some(document) => Ok(Some(serde_json::from_value(document.clone())?)),
            None => Ok(None),
        }
    }

    async fn status_by_id(&self, id: SoldierId) -> Result<Option<Status>> {
        Ok(self
            .fixture
            .status
            .iter()
            .find(|status| status.soldier_id == id)
            .cloned())
    }

    async fn postings_for(&self, id: SoldierId) -> Result<Vec<Posting>> {
        Ok(self
            .fixture
            .postings
            .iter()
            .filter(|posting| posting.soldier_id == id)
            .cloned()
            .collect())
    }

    async fn visits_for(&self, id: SoldierId) -> Result<Vec<VisitedLocation>> {
        Ok(self
            .fixture
            .visits
            .iter()
            .filter(|visit| visit.soldier_id == id)
            .cloned()
            .collect())
    }

    async fn location_by_postal_code(&self, code: &str) -> Result<Option<Location>> {
        Ok(self
            .fixture
            .locations
            .iter()
            .find(|location| location.postal_code == code)
            .cloned())
    }

    async fn record_by_document_handle(&self, handle: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.fixture.soldiers.get(handle).cloned())
    }
}
