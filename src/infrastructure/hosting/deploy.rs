use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;
use url::Url;

/// Kicks off a frontend rebuild via the hosting platform's deploy hook.
#[async_trait]
pub trait DeployHook: Send + Sync {
    async fn trigger(&self) -> Result<()>;
}

pub struct HttpDeployHook {
    client: reqwest::Client,
    hook_url: Url,
}

impl HttpDeployHook {
    pub fn new(hook_url: Url) -> Self {
        HttpDeployHook {
            client: reqwest::Client::new(),
            hook_url,
        }
    }
}

#[async_trait]
impl DeployHook for HttpDeployHook {
    async fn trigger(&self) -> Result<()> {
        self.client
            .post(self.hook_url.clone())
            .send()
            .await?
            .error_for_status()?;
        info!("deploy hook accepted");
        Ok(())
    }
}

/// Counts trigger calls for assertions; can simulate hook outages.
#[derive(Default)]
pub struct FakeDeployHook {
    triggered: AtomicUsize,
    failing: AtomicBool,
}

impl FakeDeployHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn trigger_count(&self) -> usize {
        self.triggered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeployHook for FakeDeployHook {
    async fn trigger(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("simulated deploy hook outage"));
        }
        self.triggered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
