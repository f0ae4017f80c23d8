use crate::model::{
    AccessLevel, BranchRef, CheckRun, Commit, Contributor, License, PublishedVersion, Release,
    SearchRequest, SearchResponse, Status, TagRef, Webhook,
};
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The client does not implement this operation for its platform.
    #[error("operation not supported by this client: {operation}")]
    Unsupported { operation: &'static str },
    #[error("not found: {0}")]
    NotFound(String),
    /// Network, auth or rate-limit failure reported by the host.
    #[error("{operation} failed: {message}")]
    Api {
        operation: &'static str,
        message: String,
    },
}

impl ClientError {
    pub fn unsupported(operation: &'static str) -> Self {
        ClientError::Unsupported { operation }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, ClientError::Unsupported { .. })
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Narrow view of a source-control host used by every collector.
///
/// The required methods are what every host offers. The rest default to
/// [`ClientError::Unsupported`] so platform clients only implement what
/// they actually have.
#[async_trait]
pub trait RepoClient: Send + Sync {
    /// Returns `owner/name` (or the host's equivalent path).
    fn repo_name(&self) -> &str;

    /// Most recent commits on the default branch, newest first, at most `depth`.
    async fn list_commits(&self, depth: usize) -> ClientResult<Vec<Commit>>;

    async fn get_default_branch(&self) -> ClientResult<BranchRef>;

    /// Returns `Ok(None)` when no branch has that name.
    async fn get_branch(&self, name: &str) -> ClientResult<Option<BranchRef>>;

    async fn list_releases(&self) -> ClientResult<Vec<Release>>;

    /// Paths of every file in the default branch tree.
    async fn list_files(&self) -> ClientResult<Vec<String>>;

    async fn get_file_content(&self, path: &str) -> ClientResult<Vec<u8>>;

    async fn list_branches(&self) -> ClientResult<Vec<BranchRef>> {
        Err(ClientError::unsupported("list_branches"))
    }

    async fn get_tag(&self, _name: &str) -> ClientResult<Option<TagRef>> {
        Err(ClientError::unsupported("get_tag"))
    }

    async fn list_tags(&self) -> ClientResult<Vec<TagRef>> {
        Err(ClientError::unsupported("list_tags"))
    }

    async fn list_webhooks(&self) -> ClientResult<Vec<Webhook>> {
        Err(ClientError::unsupported("list_webhooks"))
    }

    async fn list_contributors(&self) -> ClientResult<Vec<Contributor>> {
        Err(ClientError::unsupported("list_contributors"))
    }

    /// Paths of CODEOWNERS files the host recognises.
    async fn list_code_owners(&self) -> ClientResult<Vec<String>> {
        Err(ClientError::unsupported("list_code_owners"))
    }

    async fn list_licenses(&self) -> ClientResult<Vec<License>> {
        Err(ClientError::unsupported("list_licenses"))
    }

    async fn list_check_runs_for_ref(&self, _git_ref: &str) -> ClientResult<Vec<CheckRun>> {
        Err(ClientError::unsupported("list_check_runs_for_ref"))
    }

    async fn list_statuses(&self, _git_ref: &str) -> ClientResult<Vec<Status>> {
        Err(ClientError::unsupported("list_statuses"))
    }

    async fn search(&self, _request: &SearchRequest) -> ClientResult<SearchResponse> {
        Err(ClientError::unsupported("search"))
    }

    /// Checkout on disk, for clients backed by a local clone.
    fn local_path(&self) -> Option<PathBuf> {
        None
    }

    /// Capability probe for hosts with protected tag patterns (GitLab).
    fn tag_patterns(&self) -> Option<&dyn TagPatternProvider> {
        None
    }
}

/// GitLab-style protected tag configuration.
#[async_trait]
pub trait TagPatternProvider: Send + Sync {
    /// Wildcard patterns such as `v*` that the host protects.
    async fn get_protected_tag_patterns(&self) -> ClientResult<Vec<String>>;

    /// Lowest role allowed to create tags matching `pattern`.
    async fn get_minimum_access_level(&self, pattern: &str) -> ClientResult<AccessLevel>;
}

/// Package registry lookup used by the dependency freshness collector.
#[async_trait]
pub trait PackageIndex: Send + Sync {
    /// Returns the registry's ecosystem ID (e.g. "Go", "npm").
    fn ecosystem_id(&self) -> &str;

    /// All known published versions of `name`, in no particular order.
    async fn list_versions(&self, name: &str) -> ClientResult<Vec<PublishedVersion>>;
}
