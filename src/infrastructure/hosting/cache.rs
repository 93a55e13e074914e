use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;
use url::Url;

/// The hosting platform's page-cache invalidation primitive. One call per
/// logical path; the next request for that path re-renders it.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn invalidate(&self, path: &str) -> Result<()>;
}

/// Calls the frontend's revalidation endpoint over HTTP.
pub struct HttpCacheInvalidator {
    client: reqwest::Client,
    endpoint: Url,
    secret: Option<String>,
}

impl HttpCacheInvalidator {
    pub fn new(endpoint: Url, secret: Option<String>) -> Self {
        HttpCacheInvalidator {
            client: reqwest::Client::new(),
            endpoint,
            secret,
        }
    }
}

#[async_trait]
impl CacheInvalidator for HttpCacheInvalidator {
    async fn invalidate(&self, path: &str) -> Result<()> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("path", path);
        if let Some(secret) = &self.secret {
            url.query_pairs_mut().append_pair("secret", secret);
        }

        self.client.post(url).send().await?.error_for_status()?;
        Ok(())
    }
}

/// Logs instead of calling out. Used when no revalidation endpoint is
/// configured.
pub struct LogCacheInvalidator;

#[async_trait]
impl CacheInvalidator for LogCacheInvalidator {
    async fn invalidate(&self, path: &str) -> Result<()> {
        info!(%path, "would revalidate path");
        Ok(())
    }
}

/// Records invalidated paths for assertions; registered paths fail instead.
#[derive(Default)]
pub struct FakeCacheInvalidator {
    invalidated: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl FakeCacheInvalidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, path: impl Into<String>) {
        self.failing.lock().insert(path.into());
    }

    pub fn invalidated_paths(&self) -> Vec<String> {
        self.invalidated.lock().clone()
    }
}

#[async_trait]
impl CacheInvalidator for FakeCacheInvalidator {
    async fn invalidate(&self, path: &str) -> Result<()> {
        if self.failing.lock().contains(path) {
            return Err(anyhow::anyhow!("simulated revalidation failure for {path}"));
        }
        self.invalidated.lock().push(path.to_string());
        Ok(())
    }
}
