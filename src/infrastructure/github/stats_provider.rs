use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde::Deserialize;

use crate::entities::github::GithubStats;

const GITHUB_API: &str = "https://api.github.com";

/// Read-only view of a public GitHub profile.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn fetch(&self, username: &str) -> Result<GithubStats>;
}

pub struct GithubApiProvider {
    client: reqwest::Client,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    public_repos: u32,
    followers: u32,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    stargazers_count: u32,
    #[serde(default)]
    fork: bool,
}

impl GithubApiProvider {
    pub fn new(token: Option<String>) -> Self {
        GithubApiProvider {
            client: reqwest::Client::new(),
            token,
        }
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        // GitHub rejects requests without a User-Agent.
        let mut request = self
            .client
            .get(url)
            .header(
                reqwest::header::USER_AGENT,
                concat!("portfolio-api/", env!("CARGO_PKG_VERSION")),
            )
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }
}

#[async_trait]
impl StatsProvider for GithubApiProvider {
    async fn fetch(&self, username: &str) -> Result<GithubStats> {
        let encoded = urlencoding::encode(username);

        let user: UserResponse = self
            .request(&format!("{GITHUB_API}/users/{encoded}"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let repos: Vec<RepoResponse> = self
            .request(&format!(
                "{GITHUB_API}/users/{encoded}/repos?per_page=100&type=owner"
            ))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // Stars on forks say nothing about this profile.
        let total_stars = repos
            .iter()
            .filter(|repo| !repo.fork)
            .map(|repo| repo.stargazers_count)
            .sum();

        Ok(GithubStats {
            username: username.to_string(),
            public_repos: user.public_repos,
            followers: user.followers,
            total_stars,
            fetched_at: Utc::now(),
        })
    }
}

/// Canned profile numbers for tests; counts calls and can simulate outages.
pub struct FakeStatsProvider {
    template: Mutex<GithubStats>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl FakeStatsProvider {
    pub fn returning(stats: GithubStats) -> Self {
        FakeStatsProvider {
            template: Mutex::new(stats),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn sample(username: &str) -> Self {
        Self::returning(GithubStats {
            username: username.to_string(),
            public_repos: 42,
            followers: 120,
            total_stars: 350,
            fetched_at: Utc::now(),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatsProvider for FakeStatsProvider {
    async fn fetch(&self, username: &str) -> Result<GithubStats> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("simulated GitHub outage"));
        }
        let mut stats = self.template.lock().clone();
        stats.username = username.to_string();
        stats.fetched_at = Utc::now();
        Ok(stats)
    }
}
