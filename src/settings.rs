use config::{Config, ConfigError, Environment, File};
use dotenv::dotenv;
use serde::Deserialize;
use std::{
    env, fmt,
    path::PathBuf,
    str::FromStr,
};
use url::Url;

use crate::email::templates::SiteContext;
use crate::limiter::rate_limiter::LimiterConfig;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    /// Honor x-forwarded-for / x-real-ip when resolving client addresses.
    /// Leave on when running behind the hosting platform's proxy.
    #[serde(default = "default_trust_proxy_headers")]
    pub trust_proxy_headers: bool,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_site_url")]
    pub site_url: Url,

    #[serde(default = "default_owner_name")]
    pub owner_name: String,

    #[serde(default)]
    pub owner_email: String,

    #[serde(default = "default_email_from")]
    pub email_from: String,

    #[serde(default)]
    pub resend_api_key: Option<String>,

    #[serde(default)]
    pub cron_secret: String,

    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    #[serde(default = "default_rate_limit_sweep_secs")]
    pub rate_limit_sweep_secs: u64,

    #[serde(default = "default_follow_up_delay_hours")]
    pub follow_up_delay_hours: i64,

    #[serde(default = "default_dedup_window_hours")]
    pub dedup_window_hours: i64,

    #[serde(default)]
    pub github_username: Option<String>,

    #[serde(default)]
    pub github_token: Option<String>,

    #[serde(default = "default_github_cache_ttl_secs")]
    pub github_cache_ttl_secs: i64,

    #[serde(default)]
    pub revalidate_url: Option<Url>,

    #[serde(default)]
    pub revalidate_secret: Option<String>,

    #[serde(default = "default_revalidate_paths")]
    pub revalidate_paths: Vec<String>,

    #[serde(default)]
    pub deploy_hook_url: Option<Url>,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Portfolio-API".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_trust_proxy_headers() -> bool {
    true
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_site_url() -> Url {
    Url::parse("http://localhost:3000").expect("default site URL is valid")
}
fn default_owner_name() -> String {
    "Site Owner".to_string()
}
fn default_email_from() -> String {
    "Portfolio <onboarding@resend.dev>".to_string()
}
fn default_rate_limit_max_requests() -> u32 {
    3
}
fn default_rate_limit_window_secs() -> u64 {
    900
}
fn default_rate_limit_sweep_secs() -> u64 {
    60
}
fn default_follow_up_delay_hours() -> i64 {
    48
}
fn default_dedup_window_hours() -> i64 {
    24
}
fn default_github_cache_ttl_secs() -> i64 {
    3600
}
fn default_revalidate_paths() -> Vec<String> {
    vec!["/".to_string(), "/projects".to_string(), "/about".to_string()]
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(Environment::with_prefix("APP").ignore_empty(true));

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        // Inject critical env values if missing
        if config.cron_secret.trim().is_empty() {
            config.cron_secret = env::var("APP_CRON_SECRET").unwrap_or_default();
        }
        if config.resend_api_key.is_none() {
            config.resend_api_key = env::var("APP_RESEND_API_KEY").ok();
        }
        if config.github_token.is_none() {
            config.github_token = env::var("APP_GITHUB_TOKEN").ok();
        }
        if config.owner_email.trim().is_empty() {
            config.owner_email = env::var("APP_OWNER_EMAIL").unwrap_or_default();
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.rate_limit_max_requests == 0 {
            errors.push("RATE_LIMIT_MAX_REQUESTS must be at least 1");
        }
        if self.rate_limit_window_secs == 0 {
            errors.push("RATE_LIMIT_WINDOW_SECS must be at least 1");
        }
        if self.follow_up_delay_hours < 1 {
            errors.push("FOLLOW_UP_DELAY_HOURS must be at least 1");
        }
        if self.dedup_window_hours < 1 {
            errors.push("DEDUP_WINDOW_HOURS must be at least 1");
        }
        if self.is_production() {
            if self.cron_secret.len() < 16 {
                errors.push("CRON_SECRET must be at least 16 characters in production");
            }
            if self.owner_email.trim().is_empty() {
                errors.push("OWNER_EMAIL must be set in production");
            }
            if self
                .resend_api_key
                .as_deref()
                .is_none_or(|key| key.trim().is_empty())
            {
                errors.push("RESEND_API_KEY must be set in production");
            }
            if self.cors_origins().iter().any(|o| o == "*") {
                errors.push("Wildcard CORS (*) is not allowed in production");
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn leads_path(&self) -> PathBuf {
        self.data_dir.join(crate::constants::LEADS_FILE)
    }

    pub fn follow_up_delay(&self) -> chrono::Duration {
        chrono::Duration::hours(self.follow_up_delay_hours)
    }

    pub fn dedup_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.dedup_window_hours)
    }

    pub fn github_cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.github_cache_ttl_secs)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.rate_limit_sweep_secs.max(1))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            env: default_env(),
            name: default_name(),
            port: default_port(),
            host: default_host(),
            worker_count: default_worker_count(),
            cors_allowed_origins: default_cors_origins(),
            trust_proxy_headers: default_trust_proxy_headers(),
            data_dir: default_data_dir(),
            site_url: default_site_url(),
            owner_name: default_owner_name(),
            owner_email: String::new(),
            email_from: default_email_from(),
            resend_api_key: None,
            cron_secret: String::new(),
            rate_limit_max_requests: default_rate_limit_max_requests(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            rate_limit_sweep_secs: default_rate_limit_sweep_secs(),
            follow_up_delay_hours: default_follow_up_delay_hours(),
            dedup_window_hours: default_dedup_window_hours(),
            github_username: None,
            github_token: None,
            github_cache_ttl_secs: default_github_cache_ttl_secs(),
            revalidate_url: None,
            revalidate_secret: None,
            revalidate_paths: default_revalidate_paths(),
            deploy_hook_url: None,
        }
    }
}

impl From<&AppConfig> for SiteContext {
    fn from(config: &AppConfig) -> Self {
        SiteContext {
            owner_name: config.owner_name.clone(),
            owner_email: config.owner_email.clone(),
            site_url: config.site_url.clone(),
        }
    }
}

impl From<&AppConfig> for LimiterConfig {
    fn from(config: &AppConfig) -> Self {
        LimiterConfig {
            max_requests: config.rate_limit_max_requests,
            window: chrono::Duration::seconds(config.rate_limit_window_secs as i64),
        }
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else if self.len() < 16 {
            "[TOO_SHORT]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl Redact for Option<String> {
    fn redact(&self) -> &str {
        match self {
            Some(value) if !value.trim().is_empty() => "[REDACTED]",
            _ => "[MISSING]",
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("trust_proxy_headers", &self.trust_proxy_headers)
            .field("data_dir", &self.data_dir)
            .field("site_url", &self.site_url.as_str())
            .field("owner_name", &self.owner_name)
            .field("owner_email", &self.owner_email)
            .field("email_from", &self.email_from)
            .field("resend_api_key", &self.resend_api_key.redact())
            .field("cron_secret", &self.cron_secret.redact())
            .field("rate_limit_max_requests", &self.rate_limit_max_requests)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .field("rate_limit_sweep_secs", &self.rate_limit_sweep_secs)
            .field("follow_up_delay_hours", &self.follow_up_delay_hours)
            .field("dedup_window_hours", &self.dedup_window_hours)
            .field("github_username", &self.github_username)
            .field("github_token", &self.github_token.redact())
            .field("github_cache_ttl_secs", &self.github_cache_ttl_secs)
            .field("revalidate_url", &self.revalidate_url.as_ref().map(Url::as_str))
            .field("revalidate_secret", &self.revalidate_secret.redact())
            .field("revalidate_paths", &self.revalidate_paths)
            .field("deploy_hook_url", &self.deploy_hook_url.as_ref().map(Url::as_str))
            .finish()
    }
}
