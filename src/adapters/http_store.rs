use crate::core::{
    Collections, ConfigProvider, DataAccess, Location, Posting, Soldier, SoldierId, Status,
    VisitedLocation,
};
use crate::utils::error::{LookupError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use url::Url;

const SOLDIER_KEY: &str = "id";
const OWNER_KEY: &str = "soldier_id";
const POSTAL_CODE_KEY: &str = "postal_code";

/// `DataAccess` over a REST document store.
///
/// Field queries are `GET {base}/{collection}?{field}={value}` answering a
/// JSON array of documents; a single document is `GET
/// {base}/{collection}/{handle}`, 404 when absent.
pub struct HttpDocumentStore {
    client: Client,
    base_url: Url,
    collections: Collections,
    headers: HashMap<String, String>,
}

impl HttpDocumentStore {
    pub fn new<C: ConfigProvider>(config: &C) -> Result<Self> {
        let base_url = Url::parse(config.base_url()).map_err(|e| {
            LookupError::InvalidConfigValueError {
                field: "store.base_url".to_string(),
                value: config.base_url().to_string(),
                reason: format!("Invalid URL format: {}", e),
            }
        })?;
        if base_url.cannot_be_a_base() {
            return Err(LookupError::InvalidConfigValueError {
                field: "store.base_url".to_string(),
                value: config.base_url().to_string(),
                reason: "URL cannot carry collection paths".to_string(),
            });
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            collections: config.collections().clone(),
            headers: config.headers().cloned().unwrap_or_default(),
        })
    }

    fn url_for(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // checked in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get(&self, url: Url) -> RequestBuilder {
        let mut request = self.client.get(url);
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }
        request
    }

    async fn query<T: DeserializeOwned>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>> {
        let url = self.url_for(&[collection]);
        tracing::debug!("Querying {} where {} = {}", url, field, value);

        let response = self.get(url.clone()).query(&[(field, value)]).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::StoreStatusError {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let documents: Vec<serde_json::Value> = response.json().await?;
        tracing::debug!("{} returned {} documents", collection, documents.len());

        documents
            .into_iter()
            .map(|document| serde_json::from_value(document).map_err(LookupError::from))
            .collect()
    }

    async fn query_one<T: DeserializeOwned>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<T>> {
        let mut documents = self.query::<T>(collection, field, value).await?;
        if documents.len() > 1 {
            tracing::warn!(
                "{} has {} documents for {} = {}, using the first",
                collection,
                documents.len(),
                field,
                value
            );
        }
        Ok(if documents.is_empty() {
            None
        } else {
            Some(documents.swap_remove(0))
        })
    }
}

#[async_trait]
impl DataAccess for HttpDocumentStore {
    async fn record_by_id(&self, id: SoldierId) -> Result<Option<Soldier>> {
        self.query_one(&self.collections.soldiers, SOLDIER_KEY, &id.to_string())
            .await
    }

    async fn status_by_id(&self, id: SoldierId) -> Result<Option<Status>> {
        self.query_one(&self.collections.status, OWNER_KEY, &id.to_string())
            .await
    }

    async fn postings_for(&self, id: SoldierId) -> Result<Vec<Posting>> {
        self.query(&self.collections.postings, OWNER_KEY, &id.to_string())
            .await
    }

    async fn visits_for(&self, id: SoldierId) -> Result<Vec<VisitedLocation>> {
        self.query(&self.collections.visits, OWNER_KEY, &id.to_string())
            .await
    }

    async fn location_by_postal_code(&self, code: &str) -> Result<Option<Location>> {
        self.query_one(&self.collections.locations, POSTAL_CODE_KEY, code)
            .await
    }

    async fn record_by_document_handle(&self, handle: &str) -> Result<Option<serde_json::Value>> {
        let url = self.url_for(&[self.collections.soldiers.as_str(), handle]);
        tracing::debug!("Fetching document {}", url);

        let response = self.get(url.clone()).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(LookupError::StoreStatusError {
                status: status.as_u16(),
                url: url.to_string(),
            }),
        }
    }
}
