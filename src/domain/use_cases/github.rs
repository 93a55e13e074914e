use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tracing::warn;

use crate::{
    entities::github::GithubStats, errors::AppError, github::stats_provider::StatsProvider,
};

/// Cached view over the public GitHub profile numbers.
///
/// Refreshes at most once per TTL. When GitHub is unreachable the last good
/// snapshot keeps being served; only a cold cache surfaces the failure.
pub struct GithubStatsHandler {
    provider: Arc<dyn StatsProvider>,
    username: Option<String>,
    ttl: Duration,
    cache: RwLock<Option<GithubStats>>,
}

impl GithubStatsHandler {
    pub fn new(provider: Arc<dyn StatsProvider>, username: Option<String>, ttl: Duration) -> Self {
        GithubStatsHandler {
            provider,
            username,
            ttl,
            cache: RwLock::new(None),
        }
    }

    pub async fn stats(&self) -> Result<GithubStats, AppError> {
        self.stats_at(Utc::now()).await
    }

    pub async fn stats_at(&self, now: DateTime<Utc>) -> Result<GithubStats, AppError> {
        let Some(username) = self.username.as_deref() else {
            return Err(AppError::NotFound(
                "GitHub stats are not configured for this site.".to_string(),
            ));
        };

        if let Some(cached) = self.cache.read().as_ref() {
            if now.signed_duration_since(cached.fetched_at) < self.ttl {
                return Ok(cached.clone());
            }
        }

        match self.provider.fetch(username).await {
            Ok(fresh) => {
                *self.cache.write() = Some(fresh.clone());
                Ok(fresh)
            }
            Err(err) => match self.cache.read().as_ref() {
                Some(stale) => {
                    warn!(error = %err, "GitHub refresh failed; serving the previous snapshot");
                    Ok(stale.clone())
                }
                None => Err(AppError::UpstreamError(format!(
                    "GitHub stats fetch failed: {err}"
                ))),
            },
        }
    }
}
