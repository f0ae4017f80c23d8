//! Result structures handed to the scoring layer, one per check.
//!
//! These are flat values with no behavior; serialization shape is part of
//! the contract with downstream consumers.

use crate::model::{AccessLevel, BranchRef, CheckRun, Commit, Review, Status, TagRef, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review system that accepted a changeset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewPlatform {
    GitHub,
    Gerrit,
    Phabricator,
    Prow,
    Piper,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changeset {
    pub review_platform: ReviewPlatform,
    /// PR number, Gerrit change SHA, Phabricator `D123`, Piper CL number.
    pub revision_id: String,
    pub commits: Vec<Commit>,
    /// Only populated for GitHub changesets.
    pub reviews: Vec<Review>,
    /// Only populated for GitHub changesets.
    pub authors: Vec<User>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeReviewData {
    pub default_branch_changesets: Vec<Changeset>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchProtectionsData {
    pub branches: Vec<BranchRef>,
    pub codeowners_files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedTagPattern {
    pub pattern: String,
    pub minimum_access_level: AccessLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagProtectionsData {
    pub tags: Vec<TagRef>,
    pub protected_patterns: Vec<ProtectedTagPattern>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionCIInfo {
    pub pull_request_number: u64,
    pub head_sha: String,
    pub merged_at: Option<DateTime<Utc>>,
    pub check_runs: Vec<CheckRun>,
    pub statuses: Vec<Status>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CITestData {
    pub ci_info: Vec<RevisionCIInfo>,
}

/// Where in a repository file a finding was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLocation {
    pub path: String,
    /// 1-based line, when the snippet could be located.
    pub line: Option<usize>,
    pub snippet: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DangerousWorkflowKind {
    UntrustedCheckout,
    ScriptInjection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DangerousWorkflow {
    pub kind: DangerousWorkflowKind,
    pub location: FileLocation,
    pub job: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DangerousWorkflowData {
    pub workflows: Vec<DangerousWorkflow>,
    pub num_workflows: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyUseKind {
    GitHubAction,
    DockerImage,
    DownloadThenRun,
    PipCommand,
    NpmCommand,
    GoCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationText {
    pub text: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedDependency {
    pub kind: DependencyUseKind,
    pub location: FileLocation,
    pub name: Option<String>,
    pub pinned: bool,
    pub remediation: Option<RemediationText>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinningDependenciesData {
    pub dependencies: Vec<PinnedDependency>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LicenseAttribution {
    /// Reported by the hosting API's own detection.
    HostApi,
    /// Found by scanning repository filenames.
    FileScan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseFile {
    pub path: String,
    pub spdx_id: Option<String>,
    pub name: Option<String>,
    pub attribution: LicenseAttribution,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseData {
    pub licenses: Vec<LicenseFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookData {
    pub id: i64,
    pub path: String,
    pub uses_auth_secret: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhooksData {
    pub webhooks: Vec<WebhookData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyFreshness {
    pub ecosystem: String,
    pub name: String,
    pub version: String,
    pub indirect: bool,
    pub is_latest: bool,
    /// Publish time of the oldest release newer than `version`.
    pub oldest_newer_published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MTTUDependenciesData {
    pub dependencies: Vec<DependencyFreshness>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_platform_serialization() {
        let json = serde_json::to_string(&ReviewPlatform::Phabricator).unwrap();
        assert_eq!(json, "\"Phabricator\"");

        let back: ReviewPlatform = serde_json::from_str("\"Prow\"").unwrap();
        assert_eq!(back, ReviewPlatform::Prow);
    }

    #[test]
    fn test_freshness_timestamp_is_rfc3339() {
        let dep = DependencyFreshness {
            ecosystem: "Go".to_string(),
            name: "golang.org/x/text".to_string(),
            version: "v0.3.0".to_string(),
            indirect: false,
            is_latest: false,
            oldest_newer_published_at: Some(
                DateTime::parse_from_rfc3339("2021-01-02T03:04:05Z")
                    .unwrap()
                    .with_timezone(&Utc),
            ),
        };

        let value = serde_json::to_value(&dep).unwrap();
        assert_eq!(value["oldest_newer_published_at"], "2021-01-02T03:04:05Z");
    }
}
