use super::freshness::compare;
use super::traits::{CollectorError, RawCollector};
use crate::checker::{DependencyFreshness, MTTUDependenciesData};
use crate::traits::{ClientError, PackageIndex, RepoClient};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const GO_MOD: &str = "go.mod";

/// A `require` entry from a `go.mod` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub module: String,
    pub version: String,
    pub indirect: bool,
}

fn parse_requirement(line: &str) -> Option<Requirement> {
    let (entry, comment) = match line.split_once("//") {
        Some((entry, comment)) => (entry, Some(comment)),
        None => (line, None),
    };
    let mut parts = entry.split_whitespace();
    let (Some(module), Some(version), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };

    Some(Requirement {
        module: module.trim_matches('"').to_string(),
        version: version.to_string(),
        indirect: comment.is_some_and(|c| c.trim() == "indirect"),
    })
}

/// Parses the `require` directives of a `go.mod`, in single-line and block
/// form. Malformed entries are skipped.
pub fn parse_go_mod(source: &str) -> Vec<Requirement> {
    let mut requirements = Vec::new();
    let mut in_block = false;

    for (i, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if in_block {
            if line == ")" {
                in_block = false;
                continue;
            }
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            match parse_requirement(line) {
                Some(req) => requirements.push(req),
                None => warn!(line = i + 1, "skipping malformed require entry"),
            }
            continue;
        }

        let Some(rest) = line.strip_prefix("require") else {
            continue;
        };
        let rest = rest.trim();
        if rest == "(" {
            in_block = true;
        } else if !rest.is_empty() {
            match parse_requirement(rest) {
                Some(req) => requirements.push(req),
                None => warn!(line = i + 1, "skipping malformed require directive"),
            }
        }
    }

    requirements
}

/// Measures how far behind each Go module requirement is.
pub struct DependencyFreshnessCollector {
    index: Arc<dyn PackageIndex>,
}

impl DependencyFreshnessCollector {
    pub fn new(index: Arc<dyn PackageIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl RawCollector for DependencyFreshnessCollector {
    type Output = MTTUDependenciesData;

    fn check_name(&self) -> &'static str {
        "Dependency-Update-Time"
    }

    #[instrument(skip_all, fields(repo = client.repo_name(), ecosystem = self.index.ecosystem_id()))]
    async fn collect(&self, client: &dyn RepoClient) -> Result<MTTUDependenciesData, CollectorError> {
        let content = match client.get_file_content(GO_MOD).await {
            Ok(content) => content,
            Err(ClientError::NotFound(_)) => {
                debug!("no go.mod in repository");
                return Ok(MTTUDependenciesData::default());
            }
            Err(e) => return Err(CollectorError::upstream("reading go.mod", e)),
        };
        let Ok(source) = String::from_utf8(content) else {
            warn!("skipping go.mod that is not UTF-8");
            return Ok(MTTUDependenciesData::default());
        };

        let mut dependencies = Vec::new();
        for req in parse_go_mod(&source) {
            let versions = self
                .index
                .list_versions(&req.module)
                .await
                .map_err(|e| CollectorError::upstream(format!("listing versions of {}", req.module), e))?;
            let freshness = compare(&req.version, &versions);

            dependencies.push(DependencyFreshness {
                ecosystem: self.index.ecosystem_id().to_string(),
                name: req.module,
                version: req.version,
                indirect: req.indirect,
                is_latest: freshness.is_latest,
                oldest_newer_published_at: freshness.oldest_newer_published_at,
            });
        }

        info!(
            dependencies = dependencies.len(),
            outdated = dependencies.iter().filter(|d| !d.is_latest).count(),
            "compared dependency versions"
        );
        Ok(MTTUDependenciesData { dependencies })
    }
}
