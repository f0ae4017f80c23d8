use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

impl User {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub message: String,
    pub committer: User,
    pub committed_date: Option<DateTime<Utc>>,
    /// Merge/pull request that brought this commit in, if the host knows one.
    pub associated_merge_request: Option<PullRequest>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    /// `None` means the request was never merged.
    pub merged_at: Option<DateTime<Utc>>,
    pub head_sha: String,
    pub author: User,
    pub labels: Vec<Label>,
    pub reviews: Vec<Review>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Host-reported state, e.g. `APPROVED` or `CHANGES_REQUESTED`.
    pub state: String,
    pub author: User,
}

/// Branch record as reported by the host.
///
/// Every protection field is optional: hosts only report what the calling
/// token is allowed to see, and "unknown" must stay distinct from "off".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRef {
    pub name: String,
    pub protected: Option<bool>,
    pub protection_rule: BranchProtectionRule,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchProtectionRule {
    pub allow_deletions: Option<bool>,
    pub allow_force_pushes: Option<bool>,
    pub require_linear_history: Option<bool>,
    pub enforce_admins: Option<bool>,
    pub required_pull_request_reviews: PullRequestReviewRule,
    pub check_rules: StatusChecksRule,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestReviewRule {
    pub required: Option<bool>,
    pub required_approving_review_count: Option<u32>,
    pub dismiss_stale_reviews: Option<bool>,
    pub require_code_owner_reviews: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChecksRule {
    pub require_branches_up_to_date: Option<bool>,
    pub contexts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub url: String,
    /// Branch or commit the release was cut from. Hosts may leave it empty.
    pub target_commitish: String,
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub name: String,
    pub commit_sha: String,
    pub protected: Option<bool>,
    pub allow_deletions: Option<bool>,
    pub allow_force_pushes: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: i64,
    pub url: String,
    pub uses_auth_secret: bool,
}

/// License as detected by the host itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub key: String,
    pub name: String,
    pub spdx_id: String,
    pub path: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub user: User,
    pub companies: Vec<String>,
    pub organizations: Vec<String>,
    pub num_contributions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRun {
    pub name: String,
    pub status: String,
    pub conclusion: String,
    pub url: String,
    pub app_slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub state: String,
    pub context: String,
    pub url: String,
    pub target_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub path: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub hits: u64,
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub path: String,
}

/// Lowest role allowed to push protected tags on GitLab-style hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccessLevel {
    NoOne,
    Developer,
    Maintainer,
    Owner,
}

/// A published version of a package as reported by a registry.
///
/// `published_at` is kept raw so one malformed record does not sink the
/// whole listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedVersion {
    pub version: String,
    pub published_at: String,
}

impl PublishedVersion {
    pub fn new(version: impl Into<String>, published_at: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            published_at: published_at.into(),
        }
    }
}
