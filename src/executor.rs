use crate::config::CollectorConfig;
use crate::raw::{CollectorError, InternalError, RawCollector};
use crate::traits::RepoClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{info, instrument, warn};

/// Runs collectors with bounded concurrency and a per-collector time limit.
pub struct CollectorExecutor {
    semaphore: Arc<Semaphore>,
    timeout: Duration,
}

impl CollectorExecutor {
    pub fn new(config: &CollectorConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.concurrency.max(1))),
            timeout: config.timeout(),
        }
    }

    #[instrument(skip_all, fields(check = collector.check_name(), repo = client.repo_name()))]
    pub async fn execute<C>(
        &self,
        collector: &C,
        client: &dyn RepoClient,
    ) -> Result<C::Output, CollectorError>
    where
        C: RawCollector + ?Sized,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| InternalError::ExecutorClosed)?;

        info!("Starting collection");

        let result = match timeout(self.timeout, collector.collect(client)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "collector timed out");
                return Err(CollectorError::Timeout(self.timeout.as_secs()));
            }
        };

        match &result {
            Ok(_) => info!("Finished collection"),
            Err(e) => warn!(error = %e, kind = ?e.kind(), "collection failed"),
        }
        result
    }
}
