use super::traits::{optional, CollectorError, RawCollector};
use crate::checker::{CITestData, RevisionCIInfo};
use crate::traits::RepoClient;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{info, instrument};

/// Collects CI results for the head of every recently merged pull request.
pub struct CITestsCollector {
    commit_depth: usize,
}

impl CITestsCollector {
    pub fn new(commit_depth: usize) -> Self {
        Self { commit_depth }
    }
}

#[async_trait]
impl RawCollector for CITestsCollector {
    type Output = CITestData;

    fn check_name(&self) -> &'static str {
        "CI-Tests"
    }

    #[instrument(skip_all, fields(repo = client.repo_name()))]
    async fn collect(&self, client: &dyn RepoClient) -> Result<CITestData, CollectorError> {
        let commits = client
            .list_commits(self.commit_depth)
            .await
            .map_err(|e| CollectorError::upstream("listing commits", e))?;

        let mut seen = HashSet::new();
        let mut ci_info = Vec::new();

        for mr in commits.iter().filter_map(|c| c.associated_merge_request.as_ref()) {
            if !mr.is_merged() || !seen.insert(mr.number) {
                continue;
            }

            let check_runs = optional(client.list_check_runs_for_ref(&mr.head_sha).await)
                .map_err(|e| CollectorError::upstream("listing check runs", e))?
                .unwrap_or_default();
            let statuses = optional(client.list_statuses(&mr.head_sha).await)
                .map_err(|e| CollectorError::upstream("listing statuses", e))?
                .unwrap_or_default();

            ci_info.push(RevisionCIInfo {
                pull_request_number: mr.number,
                head_sha: mr.head_sha.clone(),
                merged_at: mr.merged_at,
                check_runs,
                statuses,
            });
        }

        info!(merged_requests = ci_info.len(), "collected CI results");
        Ok(CITestData { ci_info })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CheckRun, Status};
    use crate::testing::{commit, merged_pr, MockRepoClient};
    use std::collections::HashMap;

    fn check_run(name: &str) -> CheckRun {
        CheckRun {
            name: name.to_string(),
            status: "completed".to_string(),
            conclusion: "success".to_string(),
            url: String::new(),
            app_slug: "github-actions".to_string(),
        }
    }

    #[tokio::test]
    async fn test_merged_requests_get_ci_results() {
        let mut unmerged = merged_pr(2);
        unmerged.merged_at = None;

        let client = MockRepoClient {
            commits: vec![
                commit("a", "x").with_pr(merged_pr(1)),
                commit("b", "y").with_pr(merged_pr(1)),
                commit("c", "z").with_pr(unmerged),
                commit("d", "no pr"),
            ],
            check_runs: Some(HashMap::from([(
                "head1".to_string(),
                vec![check_run("build")],
            )])),
            statuses: HashMap::from([(
                "head1".to_string(),
                vec![Status {
                    state: "success".to_string(),
                    context: "ci/travis".to_string(),
                    url: String::new(),
                    target_url: String::new(),
                }],
            )]),
            ..Default::default()
        };

        let data = CITestsCollector::new(30).collect(&client).await.unwrap();

        assert_eq!(data.ci_info.len(), 1);
        let info = &data.ci_info[0];
        assert_eq!(info.pull_request_number, 1);
        assert_eq!(info.head_sha, "head1");
        assert_eq!(info.check_runs, vec![check_run("build")]);
        assert_eq!(info.statuses.len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_check_runs_are_empty() {
        let client = MockRepoClient {
            commits: vec![commit("a", "x").with_pr(merged_pr(4))],
            check_runs: None,
            ..Default::default()
        };

        let data = CITestsCollector::new(30).collect(&client).await.unwrap();

        assert_eq!(data.ci_info.len(), 1);
        assert!(data.ci_info[0].check_runs.is_empty());
    }
}
