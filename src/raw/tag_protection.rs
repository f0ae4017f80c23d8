use super::traits::{optional, CollectorError, RawCollector};
use crate::checker::{ProtectedTagPattern, TagProtectionsData};
use crate::traits::RepoClient;
use async_trait::async_trait;
use tracing::{debug, info, instrument};

/// Collects protection settings for release tags.
///
/// Tag names come from the tag listing when the host has one, otherwise from
/// releases. Unlike other optional sources, a host that cannot answer
/// `get_tag` fails the collector: without it nothing about tag protection is
/// known.
pub struct TagProtectionCollector;

#[async_trait]
impl RawCollector for TagProtectionCollector {
    type Output = TagProtectionsData;

    fn check_name(&self) -> &'static str {
        "Tag-Protection"
    }

    #[instrument(skip_all, fields(repo = client.repo_name()))]
    async fn collect(&self, client: &dyn RepoClient) -> Result<TagProtectionsData, CollectorError> {
        let names: Vec<String> = match optional(client.list_tags().await)
            .map_err(|e| CollectorError::upstream("listing tags", e))?
        {
            Some(tags) => tags.into_iter().map(|t| t.name).collect(),
            None => {
                debug!("tag listing unsupported, using release tags");
                client
                    .list_releases()
                    .await
                    .map_err(|e| CollectorError::upstream("listing releases", e))?
                    .into_iter()
                    .map(|r| r.tag_name)
                    .collect()
            }
        };

        let mut tags = Vec::with_capacity(names.len());
        for name in &names {
            match client
                .get_tag(name)
                .await
                .map_err(|e| CollectorError::upstream(format!("getting tag {name}"), e))?
            {
                Some(tag) => tags.push(tag),
                None => debug!(tag = %name, "tag vanished between listing and lookup"),
            }
        }

        let mut protected_patterns = Vec::new();
        if let Some(provider) = client.tag_patterns() {
            let patterns = provider
                .get_protected_tag_patterns()
                .await
                .map_err(|e| CollectorError::upstream("listing protected tag patterns", e))?;
            for pattern in patterns {
                let minimum_access_level = provider
                    .get_minimum_access_level(&pattern)
                    .await
                    .map_err(|e| {
                        CollectorError::upstream(format!("getting access level for {pattern}"), e)
                    })?;
                protected_patterns.push(ProtectedTagPattern {
                    pattern,
                    minimum_access_level,
                });
            }
        }

        info!(
            tags = tags.len(),
            patterns = protected_patterns.len(),
            "collected tag protections"
        );
        Ok(TagProtectionsData {
            tags,
            protected_patterns,
        })
    }
}
