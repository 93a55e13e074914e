use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::hosting::cache::CacheInvalidator;

#[derive(Debug, Clone, Serialize)]
pub struct RevalidationReport {
    pub revalidated: Vec<String>,
    pub failed: Vec<String>,
}

/// Invalidates the standing page list plus any extra paths from the request,
/// deduplicated, reporting per-path success. Paths must be absolute ("/...");
/// anything else is refused without calling out.
pub struct RevalidationRunner {
    invalidator: Arc<dyn CacheInvalidator>,
    default_paths: Vec<String>,
}

impl RevalidationRunner {
    pub fn new(invalidator: Arc<dyn CacheInvalidator>, default_paths: Vec<String>) -> Self {
        RevalidationRunner {
            invalidator,
            default_paths,
        }
    }

    pub async fn run(&self, requested: &[String]) -> RevalidationReport {
        let mut seen = HashSet::new();
        let paths: Vec<String> = self
            .default_paths
            .iter()
            .chain(requested)
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty() && seen.insert(path.clone()))
            .collect();

        let attempts = paths.into_iter().map(|path| {
            let invalidator = self.invalidator.clone();
            async move {
                if !path.starts_with('/') {
                    warn!(%path, "refusing to revalidate a non-absolute path");
                    return (path, false);
                }
                match invalidator.invalidate(&path).await {
                    Ok(()) => (path, true),
                    Err(err) => {
                        warn!(%path, error = %err, "revalidation failed");
                        (path, false)
                    }
                }
            }
        });

        let mut revalidated = Vec::new();
        let mut failed = Vec::new();
        for (path, ok) in join_all(attempts).await {
            if ok {
                revalidated.push(path);
            } else {
                failed.push(path);
            }
        }

        info!(
            revalidated = revalidated.len(),
            failed = failed.len(),
            "revalidation run complete",
        );
        RevalidationReport {
            revalidated,
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosting::cache::FakeCacheInvalidator;

    fn runner(invalidator: Arc<FakeCacheInvalidator>) -> RevalidationRunner {
        RevalidationRunner::new(
            invalidator,
            vec!["/".to_string(), "/projects".to_string(), "/about".to_string()],
        )
    }

    #[tokio::test]
    async fn merges_defaults_with_requested_paths_without_duplicates() {
        let invalidator = Arc::new(FakeCacheInvalidator::new());
        let report = runner(invalidator.clone())
            .run(&["/projects".to_string(), "/blog".to_string()])
            .await;

        assert_eq!(report.revalidated, vec!["/", "/projects", "/about", "/blog"]);
        assert!(report.failed.is_empty());
        assert_eq!(invalidator.invalidated_paths().len(), 4);
    }

    #[tokio::test]
    async fn relative_paths_fail_without_reaching_the_invalidator() {
        let invalidator = Arc::new(FakeCacheInvalidator::new());
        let report = runner(invalidator.clone())
            .run(&["projects".to_string()])
            .await;

        assert_eq!(report.failed, vec!["projects"]);
        assert!(!invalidator.invalidated_paths().contains(&"projects".to_string()));
    }

    #[tokio::test]
    async fn a_failing_path_does_not_sink_the_rest() {
        let invalidator = Arc::new(FakeCacheInvalidator::new());
        invalidator.fail_for("/projects");

        let report = runner(invalidator).run(&[]).await;
        assert_eq!(report.revalidated, vec!["/", "/about"]);
        assert_eq!(report.failed, vec!["/projects"]);
    }

    #[tokio::test]
    async fn blank_requested_paths_are_ignored() {
        let invalidator = Arc::new(FakeCacheInvalidator::new());
        let report = runner(invalidator)
            .run(&["   ".to_string(), String::new()])
            .await;

        assert_eq!(report.revalidated, vec!["/", "/projects", "/about"]);
        assert!(report.failed.is_empty());
    }
}
