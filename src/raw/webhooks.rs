use super::traits::{optional, CollectorError, RawCollector};
use crate::checker::{WebhookData, WebhooksData};
use crate::traits::RepoClient;
use async_trait::async_trait;
use tracing::{debug, instrument, warn};
use url::Url;

pub struct WebhooksCollector;

/// Path component of a hook URL. Scheme, host, credentials, query and
/// fragment are dropped so hook secrets in URLs are not reported.
fn webhook_path(raw: &str) -> Result<String, url::ParseError> {
    Url::parse(raw).map(|u| u.path().to_string())
}

#[async_trait]
impl RawCollector for WebhooksCollector {
    type Output = WebhooksData;

    fn check_name(&self) -> &'static str {
        "Webhooks"
    }

    #[instrument(skip_all, fields(repo = client.repo_name()))]
    async fn collect(&self, client: &dyn RepoClient) -> Result<WebhooksData, CollectorError> {
        let Some(hooks) = optional(client.list_webhooks().await)
            .map_err(|e| CollectorError::upstream("listing webhooks", e))?
        else {
            return Ok(WebhooksData::default());
        };

        debug!(count = hooks.len(), "listed webhooks");
        let webhooks = hooks
            .into_iter()
            .filter_map(|h| match webhook_path(&h.url) {
                Ok(path) => Some(WebhookData {
                    id: h.id,
                    path,
                    uses_auth_secret: h.uses_auth_secret,
                }),
                Err(e) => {
                    warn!(id = h.id, error = %e, "skipping webhook with unparsable URL");
                    None
                }
            })
            .collect();

        Ok(WebhooksData { webhooks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Webhook;
    use crate::testing::MockRepoClient;

    #[test]
    fn test_webhook_path() {
        assert_eq!(webhook_path("https://hooks.example.com/a/b?token=s3cret").unwrap(), "/a/b");
        assert_eq!(webhook_path("https://hooks.example.com").unwrap(), "/");
        assert_eq!(webhook_path("https://hooks.example.com?token=/s3cret").unwrap(), "/");
        assert_eq!(webhook_path("https://user:pw@hooks.example.com/h#frag").unwrap(), "/h");
        assert!(webhook_path("/relative").is_err());
    }

    #[tokio::test]
    async fn test_collects_webhooks() {
        let client = MockRepoClient {
            webhooks: Some(vec![Webhook {
                id: 12,
                url: "https://ci.example.com/hook".to_string(),
                uses_auth_secret: true,
            }]),
            ..Default::default()
        };

        let data = WebhooksCollector.collect(&client).await.unwrap();

        assert_eq!(
            data.webhooks,
            vec![WebhookData {
                id: 12,
                path: "/hook".to_string(),
                uses_auth_secret: true,
            }]
        );
    }

    #[tokio::test]
    async fn test_unparsable_urls_are_skipped() {
        let client = MockRepoClient {
            webhooks: Some(vec![
                Webhook {
                    id: 1,
                    url: "not a url".to_string(),
                    uses_auth_secret: false,
                },
                Webhook {
                    id: 2,
                    url: "https://hooks.example.com?token=/s3cret".to_string(),
                    uses_auth_secret: false,
                },
            ]),
            ..Default::default()
        };

        let data = WebhooksCollector.collect(&client).await.unwrap();

        assert_eq!(
            data.webhooks,
            vec![WebhookData {
                id: 2,
                path: "/".to_string(),
                uses_auth_secret: false,
            }]
        );
    }

    #[tokio::test]
    async fn test_unsupported_listing_is_empty() {
        let data = WebhooksCollector
            .collect(&MockRepoClient::default())
            .await
            .unwrap();
        assert!(data.webhooks.is_empty());
    }
}
