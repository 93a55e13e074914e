use chrono::{DateTime, Utc};
use serde::Serialize;

/// Aggregated public GitHub profile numbers shown on the site.
#[derive(Debug, Clone, Serialize)]
pub struct GithubStats {
    pub username: String,
    pub public_repos: u32,
    pub followers: u32,
    pub total_stars: u32,
    pub fetched_at: DateTime<Utc>,
}
