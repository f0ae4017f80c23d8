//! In-memory clients for collector tests.

use crate::model::{
    AccessLevel, BranchRef, CheckRun, Commit, License, PublishedVersion, PullRequest, Release,
    Review, Status, TagRef, User, Webhook,
};
use crate::traits::{ClientError, ClientResult, PackageIndex, RepoClient, TagPatternProvider};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::{BTreeMap, HashMap};

pub fn commit(sha: &str, message: &str) -> Commit {
    Commit {
        sha: sha.to_string(),
        message: message.to_string(),
        committer: User::new("committer"),
        committed_date: None,
        associated_merge_request: None,
    }
}

pub fn merged_pr(number: u64) -> PullRequest {
    PullRequest {
        number,
        merged_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        head_sha: format!("head{number}"),
        author: User::new(format!("author{number}")),
        labels: Vec::new(),
        reviews: vec![Review {
            state: "APPROVED".to_string(),
            author: User::new("reviewer"),
        }],
    }
}

pub fn release(tag: &str, commitish: &str) -> Release {
    Release {
        tag_name: tag.to_string(),
        url: format!("https://example.com/releases/{tag}"),
        target_commitish: commitish.to_string(),
        assets: Vec::new(),
    }
}

pub fn branch(name: &str) -> BranchRef {
    BranchRef {
        name: name.to_string(),
        protected: Some(true),
        ..Default::default()
    }
}

impl Commit {
    pub fn with_pr(mut self, pr: PullRequest) -> Self {
        self.associated_merge_request = Some(pr);
        self
    }
}

/// Optional sources are `None` when the mock should answer `Unsupported`.
#[derive(Default)]
pub struct MockRepoClient {
    pub repo: String,
    pub commits: Vec<Commit>,
    pub fail_commits: Option<ClientError>,
    pub default_branch: String,
    pub branches: Vec<BranchRef>,
    pub releases: Vec<Release>,
    pub files: BTreeMap<String, Vec<u8>>,
    pub tags: Option<Vec<TagRef>>,
    pub get_tag_supported: bool,
    pub webhooks: Option<Vec<Webhook>>,
    pub licenses: Option<Vec<License>>,
    pub code_owners: Option<Vec<String>>,
    pub check_runs: Option<HashMap<String, Vec<CheckRun>>>,
    pub statuses: HashMap<String, Vec<Status>>,
    pub tag_patterns: Option<MockTagPatterns>,
}

impl MockRepoClient {
    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files
            .insert(path.to_string(), content.as_bytes().to_vec());
        self
    }
}

#[async_trait]
impl RepoClient for MockRepoClient {
    fn repo_name(&self) -> &str {
        &self.repo
    }

    async fn list_commits(&self, depth: usize) -> ClientResult<Vec<Commit>> {
        if let Some(e) = &self.fail_commits {
            return Err(e.clone());
        }
        Ok(self.commits.iter().take(depth).cloned().collect())
    }

    async fn get_default_branch(&self) -> ClientResult<BranchRef> {
        self.branches
            .iter()
            .find(|b| b.name == self.default_branch)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(self.default_branch.clone()))
    }

    async fn get_branch(&self, name: &str) -> ClientResult<Option<BranchRef>> {
        Ok(self.branches.iter().find(|b| b.name == name).cloned())
    }

    async fn list_releases(&self) -> ClientResult<Vec<Release>> {
        Ok(self.releases.clone())
    }

    async fn list_files(&self) -> ClientResult<Vec<String>> {
        Ok(self.files.keys().cloned().collect())
    }

    async fn get_file_content(&self, path: &str) -> ClientResult<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(path.to_string()))
    }

    async fn list_branches(&self) -> ClientResult<Vec<BranchRef>> {
        Ok(self.branches.clone())
    }

    async fn get_tag(&self, name: &str) -> ClientResult<Option<TagRef>> {
        if !self.get_tag_supported {
            return Err(ClientError::unsupported("get_tag"));
        }
        let tag = self
            .tags
            .iter()
            .flatten()
            .find(|t| t.name == name)
            .cloned()
            .unwrap_or_else(|| TagRef {
                name: name.to_string(),
                ..Default::default()
            });
        Ok(Some(tag))
    }

    async fn list_tags(&self) -> ClientResult<Vec<TagRef>> {
        self.tags
            .clone()
            .ok_or(ClientError::unsupported("list_tags"))
    }

    async fn list_webhooks(&self) -> ClientResult<Vec<Webhook>> {
        self.webhooks
            .clone()
            .ok_or(ClientError::unsupported("list_webhooks"))
    }

    async fn list_code_owners(&self) -> ClientResult<Vec<String>> {
        self.code_owners
            .clone()
            .ok_or(ClientError::unsupported("list_code_owners"))
    }

    async fn list_licenses(&self) -> ClientResult<Vec<License>> {
        self.licenses
            .clone()
            .ok_or(ClientError::unsupported("list_licenses"))
    }

    async fn list_check_runs_for_ref(&self, git_ref: &str) -> ClientResult<Vec<CheckRun>> {
        let runs = self
            .check_runs
            .as_ref()
            .ok_or(ClientError::unsupported("list_check_runs_for_ref"))?;
        Ok(runs.get(git_ref).cloned().unwrap_or_default())
    }

    async fn list_statuses(&self, git_ref: &str) -> ClientResult<Vec<Status>> {
        Ok(self.statuses.get(git_ref).cloned().unwrap_or_default())
    }

    fn tag_patterns(&self) -> Option<&dyn TagPatternProvider> {
        self.tag_patterns
            .as_ref()
            .map(|p| p as &dyn TagPatternProvider)
    }
}

#[derive(Default)]
pub struct MockTagPatterns {
    pub patterns: Vec<(String, AccessLevel)>,
}

#[async_trait]
impl TagPatternProvider for MockTagPatterns {
    async fn get_protected_tag_patterns(&self) -> ClientResult<Vec<String>> {
        Ok(self.patterns.iter().map(|(p, _)| p.clone()).collect())
    }

    async fn get_minimum_access_level(&self, pattern: &str) -> ClientResult<AccessLevel> {
        self.patterns
            .iter()
            .find(|(p, _)| p == pattern)
            .map(|(_, level)| *level)
            .ok_or_else(|| ClientError::NotFound(pattern.to_string()))
    }
}

#[derive(Default)]
pub struct MockPackageIndex {
    pub versions: HashMap<String, Vec<PublishedVersion>>,
    pub fail: Option<ClientError>,
}

#[async_trait]
impl PackageIndex for MockPackageIndex {
    fn ecosystem_id(&self) -> &str {
        "Go"
    }

    async fn list_versions(&self, name: &str) -> ClientResult<Vec<PublishedVersion>> {
        if let Some(e) = &self.fail {
            return Err(e.clone());
        }
        Ok(self.versions.get(name).cloned().unwrap_or_default())
    }
}
