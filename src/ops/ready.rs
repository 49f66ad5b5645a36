use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use futures::future::try_join_all;
use tracing::{debug, info};
use url::Url;

use crate::compose::Compose;
use crate::error::EnvError;

const MAX_ATTEMPTS: usize = 30;
const MIN_DELAY: Duration = Duration::from_millis(500);
const MAX_DELAY: Duration = Duration::from_secs(5);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Block until every container is running (and healthy, where a healthcheck
/// exists) and the services answer their health endpoints. Attempts are
/// bounded; on exhaustion the last error is returned.
pub async fn wait_for_ready(compose: &Compose, probes: &[Url]) -> Result<(), EnvError> {
    info!("waiting for containers to reach a running state");
    (|| async { all_running(compose).await })
        .retry(backoff())
        .notify(|err: &EnvError, delay: Duration| {
            debug!(error = %err, "containers not ready, retrying in {delay:?}");
        })
        .await?;

    info!("waiting for services to answer health checks");
    let client = reqwest::Client::builder().timeout(PROBE_TIMEOUT).build()?;
    try_join_all(probes.iter().map(|url| probe_until_ready(&client, url))).await?;
    Ok(())
}

fn backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(MIN_DELAY)
        .with_max_delay(MAX_DELAY)
        .with_max_times(MAX_ATTEMPTS)
}

async fn all_running(compose: &Compose) -> Result<(), EnvError> {
    let services = compose.ps().await?;
    if services.is_empty() {
        return Err(EnvError::NoContainers);
    }
    match services.iter().find(|s| !s.is_running()) {
        Some(stopped) => Err(EnvError::ContainerNotRunning {
            name: stopped.name.clone(),
            state: stopped.state.clone(),
        }),
        None => Ok(()),
    }
}

async fn probe_until_ready(client: &reqwest::Client, url: &Url) -> Result<(), EnvError> {
    (|| async { probe(client, url).await })
        .retry(backoff())
        .notify(|err: &EnvError, delay: Duration| {
            debug!(url = %url, error = %err, "service not ready, retrying in {delay:?}");
        })
        .await
}

async fn probe(client: &reqwest::Client, url: &Url) -> Result<(), EnvError> {
    let response = client.get(url.clone()).send().await?;
    if response.status().is_success() {
        debug!(url = %url, "service answered");
        Ok(())
    } else {
        Err(EnvError::ServiceNotReady {
            url: url.clone(),
            reason: format!("HTTP {}", response.status()),
        })
    }
}
