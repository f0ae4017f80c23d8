use super::changeset::group_changesets;
use super::traits::{CollectorError, RawCollector};
use crate::checker::CodeReviewData;
use crate::traits::RepoClient;
use async_trait::async_trait;
use tracing::{info, instrument};

/// Groups recent default-branch commits into reviewed changesets.
pub struct CodeReviewCollector {
    commit_depth: usize,
}

impl CodeReviewCollector {
    pub fn new(commit_depth: usize) -> Self {
        Self { commit_depth }
    }
}

#[async_trait]
impl RawCollector for CodeReviewCollector {
    type Output = CodeReviewData;

    fn check_name(&self) -> &'static str {
        "Code-Review"
    }

    #[instrument(skip_all, fields(repo = client.repo_name()))]
    async fn collect(&self, client: &dyn RepoClient) -> Result<CodeReviewData, CollectorError> {
        let commits = client
            .list_commits(self.commit_depth)
            .await
            .map_err(|e| CollectorError::upstream("listing commits", e))?;

        let default_branch_changesets = group_changesets(&commits);
        info!(
            commits = commits.len(),
            changesets = default_branch_changesets.len(),
            "grouped commits into changesets"
        );

        Ok(CodeReviewData {
            default_branch_changesets,
        })
    }
}
