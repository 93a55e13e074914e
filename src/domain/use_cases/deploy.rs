use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::{errors::AppError, hosting::deploy::DeployHook};

#[derive(Debug, Clone, Serialize)]
pub struct DeployAck {
    pub success: bool,
    pub message: String,
    pub triggered_at: DateTime<Utc>,
}

/// Forwards an authorized webhook call to the hosting platform's deploy
/// hook. Sites without a configured hook simply don't expose the capability.
pub struct DeployRunner {
    hook: Option<Arc<dyn DeployHook>>,
}

impl DeployRunner {
    pub fn new(hook: Option<Arc<dyn DeployHook>>) -> Self {
        DeployRunner { hook }
    }

    pub async fn trigger(&self) -> Result<DeployAck, AppError> {
        let hook = self.hook.as_ref().ok_or_else(|| {
            AppError::NotFound("No deploy hook is configured for this site.".to_string())
        })?;

        hook.trigger()
            .await
            .map_err(|err| AppError::UpstreamError(format!("deploy hook failed: {err}")))?;

        info!("deploy triggered");
        Ok(DeployAck {
            success: true,
            message: "Deploy triggered.".to_string(),
            triggered_at: Utc::now(),
        })
    }
}
