//! Solr core admin client with bounded retries.

use std::time::Duration;

use async_trait::async_trait;

use super::IndexProvisioner;
use crate::error::ServiceError;

/// Pause between provisioning attempts.
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Config set new cores are created from.
const CONFIG_SET: &str = "_default";

/// Provisioner calling `GET http://{host}:{port}/solr/admin/cores?action=CREATE`.
///
/// Transport failures and 5xx responses are retried up to `retries`
/// extra times. A 4xx response (e.g. the core already exists with a
/// different config) is returned immediately.
#[derive(Debug, Clone)]
pub struct SolrProvisioner {
    client: reqwest::Client,
    port: u16,
    retries: u32,
}

impl SolrProvisioner {
    /// Creates a provisioner talking to Solr on `port`.
    #[must_use]
    pub fn new(client: reqwest::Client, port: u16, retries: u32) -> Self {
        Self {
            client,
            port,
            retries,
        }
    }

    fn admin_url(&self, host: &str) -> String {
        format!("http://{host}:{}/solr/admin/cores", self.port)
    }

    async fn attempt(&self, name: &str, host: &str) -> Result<(), Attempt> {
        let response = self
            .client
            .get(self.admin_url(host))
            .query(&[
                ("action", "CREATE"),
                ("name", name),
                ("configSet", CONFIG_SET),
                ("wt", "json"),
            ])
            .send()
            .await
            .map_err(|e| Attempt::Retry(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        let message = format!("solr returned {status}: {body}");
        if status.is_server_error() {
            Err(Attempt::Retry(message))
        } else {
            Err(Attempt::Fatal(message))
        }
    }
}

/// Outcome of a failed attempt.
#[derive(Debug)]
enum Attempt {
    Retry(String),
    Fatal(String),
}

#[async_trait]
impl IndexProvisioner for SolrProvisioner {
    async fn create_core(&self, name: &str, host: &str) -> Result<(), ServiceError> {
        let mut attempt_no: u32 = 0;
        loop {
            match self.attempt(name, host).await {
                Ok(()) => {
                    tracing::info!(core = name, host, "solr core created");
                    return Ok(());
                }
                Err(Attempt::Fatal(message)) => {
                    return Err(ServiceError::Provisioning(message));
                }
                Err(Attempt::Retry(message)) if attempt_no < self.retries => {
                    attempt_no += 1;
                    tracing::warn!(core = name, host, attempt = attempt_no, %message, "retrying core creation");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(Attempt::Retry(message)) => {
                    return Err(ServiceError::Provisioning(message));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_url_uses_port() {
        let p = SolrProvisioner::new(reqwest::Client::new(), 8983, 0);
        assert_eq!(p.admin_url("10.0.0.5"), "http://10.0.0.5:8983/solr/admin/cores");
    }

    #[tokio::test]
    async fn unreachable_host_surfaces_provisioning_error() {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap_or_default();
        // Port 9 (discard) on localhost is closed in test environments.
        let p = SolrProvisioner::new(client, 9, 0);
        let result = p.create_core("sidekick_test", "127.0.0.1").await;
        assert!(matches!(result, Err(ServiceError::Provisioning(_))));
    }
}
