use crate::core::sampler::VisitSampler;
use crate::domain::model::{Location, QueryPhase, ResultBundle, SoldierId};
use crate::domain::ports::DataAccess;
use crate::utils::error::{LookupError, Result};

/// Callback the façade reports phase transitions through.
pub type Progress<'a> = &'a (dyn Fn(QueryPhase) + Send + Sync);

fn no_progress(_: QueryPhase) {}

/// Aggregates one soldier record and everything hanging off it into a
/// [`ResultBundle`].
///
/// Only the primary lookup can fail a query. Status, postings, visits and
/// birth location degrade to empty when their lookups fail.
pub struct LookupFacade<D: DataAccess> {
    data: D,
    sampler: VisitSampler,
}

impl<D: DataAccess> LookupFacade<D> {
    pub fn new(data: D, sampler: VisitSampler) -> Self {
        Self { data, sampler }
    }

    /// Resolves user input such as `"42"`.
    pub async fn resolve(&self, input: &str) -> Result<ResultBundle> {
        self.resolve_with_progress(input, &no_progress).await
    }

    pub async fn resolve_with_progress(
        &self,
        input: &str,
        progress: Progress<'_>,
    ) -> Result<ResultBundle> {
        progress(QueryPhase::Validating);
        let id = input.parse::<SoldierId>().inspect_err(|_| {
            tracing::debug!(input, "Rejected identifier");
        })?;
        self.assemble(id, progress).await
    }

    pub async fn resolve_id(&self, id: SoldierId) -> Result<ResultBundle> {
        self.assemble(id, &no_progress).await
    }

    /// Resolves the store's document handle to a service number first, then
    /// assembles exactly as [`resolve_id`](Self::resolve_id) would.
    pub async fn resolve_handle(&self, handle: &str) -> Result<ResultBundle> {
        self.resolve_handle_with_progress(handle, &no_progress).await
    }

    pub async fn resolve_handle_with_progress(
        &self,
        handle: &str,
        progress: Progress<'_>,
    ) -> Result<ResultBundle> {
        progress(QueryPhase::Validating);
        let handle = handle.trim();
        if handle.is_empty() {
            return Err(LookupError::invalid_identifier());
        }

        progress(QueryPhase::Fetching);
        tracing::debug!(handle, "Resolving document handle");
        let document = self
            .data
            .record_by_document_handle(handle)
            .await?
            .ok_or_else(LookupError::record_not_found)?;
        let id = SoldierId::from_document(&document)?;

        self.assemble(id, progress).await
    }

    async fn assemble(&self, id: SoldierId, progress: Progress<'_>) -> Result<ResultBundle> {
        progress(QueryPhase::Fetching);
        tracing::debug!(soldier_id = %id, "Fetching primary record");

        let soldier = self
            .data
            .record_by_id(id)
            .await?
            .ok_or_else(LookupError::record_not_found)?;

        let (status, postings, visits, birth_location) = tokio::join!(
            self.data.status_by_id(id),
            self.data.postings_for(id),
            self.data.visits_for(id),
            self.birth_location(soldier.postal_code()),
        );

        progress(QueryPhase::Assembling);
        let visits = degrade(id, "visits", visits);
        let total_visits = visits.len();
        let bundle = ResultBundle {
            status: degrade(id, "status", status),
            postings: degrade(id, "postings", postings),
            visits: self.sampler.sample(visits),
            birth_location: degrade(id, "birth_location", birth_location),
            soldier: Some(soldier),
        };

        tracing::info!(
            soldier_id = %id,
            has_status = bundle.status.is_some(),
            postings = bundle.postings.len(),
            visits_shown = bundle.visits.len(),
            visits_total = total_visits,
            has_birth_location = bundle.birth_location.is_some(),
            "Assembled lookup result"
        );
        Ok(bundle)
    }

    async fn birth_location(&self, postal_code: Option<&str>) -> Result<Option<Location>> {
        match postal_code {
            Some(code) => self.data.location_by_postal_code(code).await,
            None => Ok(None),
        }
    }
}

/// Secondary fields never fail the query; a failed lookup shows as empty.
fn degrade<T: Default>(id: SoldierId, field: &'static str, result: Result<T>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(soldier_id = %id, field, error = %e, "Lookup failed, leaving field empty");
        T::default()
    })
}
