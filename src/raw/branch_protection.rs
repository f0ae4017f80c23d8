use super::traits::{optional, CollectorError, InternalError, RawCollector};
use crate::checker::BranchProtectionsData;
use crate::model::BranchRef;
use crate::traits::RepoClient;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info, instrument};

static COMMIT_SHA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{40}$").unwrap());

/// Collects protection settings for the default branch and every branch a
/// release was cut from.
pub struct BranchProtectionCollector;

/// Branch name a release commitish refers to, or `None` for commit SHAs.
fn release_branch_name(commitish: &str) -> Option<&str> {
    let name = commitish.strip_prefix("refs/heads/").unwrap_or(commitish);
    (!COMMIT_SHA.is_match(name)).then_some(name)
}

/// Looks `name` up, falling back from `master` to `main` for repositories
/// that renamed their default branch after cutting old releases.
async fn resolve_branch(
    client: &dyn RepoClient,
    name: &str,
) -> Result<Option<BranchRef>, CollectorError> {
    let found = client
        .get_branch(name)
        .await
        .map_err(|e| CollectorError::upstream(format!("getting branch {name}"), e))?;
    if found.is_some() || name != "master" {
        return Ok(found);
    }

    debug!("branch master not found, trying main");
    client
        .get_branch("main")
        .await
        .map_err(|e| CollectorError::upstream("getting branch main", e))
}

#[async_trait]
impl RawCollector for BranchProtectionCollector {
    type Output = BranchProtectionsData;

    fn check_name(&self) -> &'static str {
        "Branch-Protection"
    }

    #[instrument(skip_all, fields(repo = client.repo_name()))]
    async fn collect(
        &self,
        client: &dyn RepoClient,
    ) -> Result<BranchProtectionsData, CollectorError> {
        let default_branch = client
            .get_default_branch()
            .await
            .map_err(|e| CollectorError::upstream("getting default branch", e))?;

        let releases = client
            .list_releases()
            .await
            .map_err(|e| CollectorError::upstream("listing releases", e))?;

        let mut seen = HashSet::from([default_branch.name.clone()]);
        let mut branches = vec![default_branch];

        for release in &releases {
            if release.target_commitish.is_empty() {
                return Err(InternalError::CommitishNil {
                    release: release.tag_name.clone(),
                }
                .into());
            }
            let Some(name) = release_branch_name(&release.target_commitish) else {
                continue;
            };
            if seen.contains(name) {
                continue;
            }

            match resolve_branch(client, name).await? {
                Some(branch) => {
                    if seen.insert(branch.name.clone()) {
                        branches.push(branch);
                    }
                    seen.insert(name.to_string());
                }
                None => debug!(branch = name, "release branch no longer exists"),
            }
        }

        let codeowners_files = optional(client.list_code_owners().await)
            .map_err(|e| CollectorError::upstream("listing code owners", e))?
            .unwrap_or_default();

        info!(branches = branches.len(), "collected branch protections");
        Ok(BranchProtectionsData {
            branches,
            codeowners_files,
        })
    }
}
