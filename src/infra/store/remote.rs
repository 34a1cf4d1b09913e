use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::application::store::{CollectionStore, StoreError};

const PROJECT_HEADER: &str = "X-Project-Id";
const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, Clone)]
pub struct RemoteStoreConfig {
    pub endpoint: Url,
    pub project_id: String,
    pub database_id: String,
    pub api_key: String,
}

/// Collections kept in a hosted document database. Every collection is read
/// and replaced as one JSON array.
#[derive(Debug, Clone)]
pub struct RemoteCollectionStore {
    client: Client,
    config: RemoteStoreConfig,
}

impl RemoteCollectionStore {
    pub fn new(config: RemoteStoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(concat!("timberline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        Ok(Self { client, config })
    }

    fn documents_url(&self, name: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.config.endpoint.as_str().trim_end_matches('/'),
            self.config.database_id,
            name
        )
    }

    fn request(&self, method: reqwest::Method, name: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.documents_url(name))
            .header(PROJECT_HEADER, &self.config.project_id)
            .header(API_KEY_HEADER, &self.config.api_key)
    }
}

async fn backend_error(response: reqwest::Response) -> StoreError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    StoreError::Backend { status, message }
}

#[async_trait]
impl CollectionStore for RemoteCollectionStore {
    async fn load(&self, name: &str) -> Result<Option<Vec<Value>>, StoreError> {
        let response = self
            .request(reqwest::Method::GET, name)
            .send()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(
                    target = "timberline::store",
                    collection = name,
                    "remote collection missing"
                );
                Ok(None)
            }
            status if status.is_success() => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|err| StoreError::Transport(err.to_string()))?;
                let items =
                    serde_json::from_slice(&bytes).map_err(|err| StoreError::serialization(name, err))?;
                Ok(Some(items))
            }
            _ => Err(backend_error(response).await),
        }
    }

    async fn save(&self, name: &str, items: Vec<Value>) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::PUT, name)
            .json(&items)
            .send()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            return Err(backend_error(response).await);
        }
        debug!(
            target = "timberline::store",
            collection = name,
            documents = items.len(),
            "remote collection replaced"
        );
        Ok(())
    }
}
