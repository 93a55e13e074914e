use std::sync::Arc;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, middlewares, repositories, routes};
pub use infrastructure::{email, github, hosting, limiter, utils};

use email::mailer::{LogMailer, Mailer, ResendMailer};
use email::templates::SiteContext;
use github::stats_provider::{GithubApiProvider, StatsProvider};
use hosting::cache::{CacheInvalidator, HttpCacheInvalidator, LogCacheInvalidator};
use hosting::deploy::{DeployHook, HttpDeployHook};
use limiter::rate_limiter::{FixedWindowLimiter, InMemoryRateLimitStore, LimiterConfig};
use repositories::leads::JsonLeadStore;
use settings::AppConfig;
use use_cases::contact::ContactHandler;
use use_cases::deploy::DeployRunner;
use use_cases::github::GithubStatsHandler;
use use_cases::revalidation::RevalidationRunner;
use use_cases::sequences::SequenceProcessor;

pub struct AppState {
    pub config: AppConfig,
    pub contact_handler: AppContactHandler,
    pub sequences: Arc<AppSequenceProcessor>,
    pub github_stats: GithubStatsHandler,
    pub revalidation: RevalidationRunner,
    pub deploy: DeployRunner,
    pub limiter: AppRateLimiter,
    pub mailer: Arc<dyn Mailer>,
}

pub type AppContactHandler = ContactHandler<JsonLeadStore>;
pub type AppSequenceProcessor = SequenceProcessor<JsonLeadStore>;
pub type AppRateLimiter = FixedWindowLimiter<InMemoryRateLimitStore>;

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        let site = SiteContext::from(config);

        let mailer: Arc<dyn Mailer> = match config
            .resend_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
        {
            Some(key) => Arc::new(ResendMailer::new(key, &config.email_from)),
            None => {
                tracing::warn!("No email API key configured; outbound email will only be logged");
                Arc::new(LogMailer)
            }
        };

        let store = JsonLeadStore::new(config.leads_path());
        let sequences = Arc::new(SequenceProcessor::new(
            store,
            mailer.clone(),
            site.clone(),
            config.follow_up_delay(),
            config.dedup_window(),
        ));

        let provider: Arc<dyn StatsProvider> =
            Arc::new(GithubApiProvider::new(config.github_token.clone()));
        let github_stats = GithubStatsHandler::new(
            provider,
            config.github_username.clone(),
            config.github_cache_ttl(),
        );

        let invalidator: Arc<dyn CacheInvalidator> = match &config.revalidate_url {
            Some(endpoint) => Arc::new(HttpCacheInvalidator::new(
                endpoint.clone(),
                config.revalidate_secret.clone(),
            )),
            None => {
                tracing::warn!("No revalidation endpoint configured; invalidations will only be logged");
                Arc::new(LogCacheInvalidator)
            }
        };
        let revalidation = RevalidationRunner::new(invalidator, config.revalidate_paths.clone());

        let deploy_hook = config
            .deploy_hook_url
            .as_ref()
            .map(|url| Arc::new(HttpDeployHook::new(url.clone())) as Arc<dyn DeployHook>);
        let deploy = DeployRunner::new(deploy_hook);

        let limiter = FixedWindowLimiter::new(
            InMemoryRateLimitStore::new(),
            LimiterConfig::from(config),
        );

        AppState {
            config: config.clone(),
            contact_handler: ContactHandler::new(sequences.clone(), mailer.clone(), site),
            sequences,
            github_stats,
            revalidation,
            deploy,
            limiter,
            mailer,
        }
    }
}
