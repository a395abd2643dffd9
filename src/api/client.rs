use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use tracing::{debug, trace, warn};
use url::Url;

use super::models::{DataSource, Job, Page, Script};
use crate::config::{
    AgentConfig, DATA_SOURCES_PATH, DATA_SOURCE_OBJECT_TYPE, JOBS_COMPLETED_AFTER, JOBS_PATH,
    SCRIPTS_PATH,
};
use crate::error::FetchError;

/// NetBox REST client for one agent run. Requests are issued one at a time.
pub struct NetboxClient {
    http: reqwest::Client,
    config: AgentConfig,
}

impl NetboxClient {
    pub fn new(config: AgentConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Token {}", config.token))
            .map_err(|_| FetchError::InvalidToken)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_cert)
            .build()
            .map_err(FetchError::Client)?;

        if !config.verify_cert {
            warn!("TLS certificate verification is disabled");
        }

        Ok(NetboxClient { http, config })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        trace!("GET {}", url);
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.json().await.map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Walk a list endpoint page by page, handing each page to `visit` until
    /// it returns `Some` or the pages run out. Every page is fetched at most
    /// once, so a `next` link back to an earlier page ends the walk.
    async fn walk_pages<T, R, F>(&self, first: Url, mut visit: F) -> Result<Option<R>, FetchError>
    where
        T: DeserializeOwned,
        F: FnMut(Vec<T>) -> Option<R>,
    {
        let mut visited = HashSet::new();
        let mut url = Some(first);
        while let Some(current) = url.take() {
            visited.insert(current.clone());
            let page: Page<T> = self.get_json(current.clone()).await?;
            debug!(
                "{}: {} result(s) on page, {} total",
                current.path(),
                page.results.len(),
                page.count.map_or_else(|| "?".to_string(), |c| c.to_string())
            );
            if let Some(found) = visit(page.results) {
                return Ok(Some(found));
            }

            url = match page.next {
                Some(next) => {
                    let next = Url::parse(&next)
                        .map_err(|source| FetchError::InvalidUrl { url: next, source })?;
                    if visited.contains(&next) {
                        warn!("{} links back to already fetched page {}, stopping", current, next);
                        None
                    } else {
                        Some(next)
                    }
                }
                None => None,
            };
        }
        Ok(None)
    }

    /// All results of a paginated list endpoint.
    pub async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, FetchError> {
        let mut all = Vec::new();
        self.walk_pages(self.config.endpoint(path)?, |results: Vec<T>| {
            all.extend(results);
            None::<()>
        })
        .await?;
        Ok(all)
    }

    pub async fn scripts(&self) -> Result<Vec<Script>, FetchError> {
        self.list(SCRIPTS_PATH).await
    }

    pub async fn data_sources(&self) -> Result<Vec<DataSource>, FetchError> {
        self.list(DATA_SOURCES_PATH).await
    }

    fn jobs_url(&self, object_id: u64, limit: Option<u32>) -> Result<Url, FetchError> {
        let mut url = self.config.endpoint(JOBS_PATH)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("object_id", &object_id.to_string())
                .append_pair("completed__after", JOBS_COMPLETED_AFTER)
                .append_pair("ordering", "-completed");
            if let Some(limit) = limit {
                query.append_pair("limit", &limit.to_string());
            }
        }
        Ok(url)
    }

    /// Most recently completed job of a script.
    pub async fn latest_job(&self, object_id: u64) -> Result<Option<Job>, FetchError> {
        let page: Page<Job> = self.get_json(self.jobs_url(object_id, Some(1))?).await?;
        Ok(page.results.into_iter().next())
    }

    /// Most recently completed sync job of a data source. The `object_id`
    /// filter spans all object types, so jobs of other objects with the same
    /// id are skipped.
    pub async fn latest_data_source_job(&self, object_id: u64) -> Result<Option<Job>, FetchError> {
        self.walk_pages(self.jobs_url(object_id, None)?, |jobs: Vec<Job>| {
            jobs.into_iter()
                .find(|job| job.object_type.as_deref() == Some(DATA_SOURCE_OBJECT_TYPE))
        })
        .await
    }
}
