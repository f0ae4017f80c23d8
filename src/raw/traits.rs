//! Collector trait and the error types every collector returns.
//!
//! Errors come in a closed set of kinds (see [`ErrorKind`]) so callers can
//! decide between skipping and aborting with a `match` instead of comparing
//! messages.

use crate::traits::{ClientError, RepoClient};
use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// Collector Trait
// ============================================================================

/// A raw data collector for one check.
///
/// Collectors are stateless apart from injected lookup tables, so one value
/// can be run against any number of repositories.
#[async_trait]
pub trait RawCollector: Send + Sync {
    /// Flat result handed to the scoring layer.
    type Output: Send;

    /// Name of the check this collector feeds, used in logs.
    fn check_name(&self) -> &'static str;

    /// Queries `client` and normalizes the answers.
    ///
    /// # Errors
    ///
    /// Upstream failures abort with [`CollectorError::Upstream`]. Malformed
    /// individual records are skipped and never surface here.
    async fn collect(&self, client: &dyn RepoClient) -> Result<Self::Output, CollectorError>;
}

// ============================================================================
// Error Types
// ============================================================================

/// Closed classification of [`CollectorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Upstream,
    Unsupported,
    Internal,
    Timeout,
}

#[derive(Error, Debug)]
pub enum CollectorError {
    /// The hosting API or package registry failed.
    #[error("{context}: {source}")]
    Upstream {
        context: String,
        #[source]
        source: ClientError,
    },

    /// A required operation is not available on this platform.
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("internal error: {0}")]
    Internal(#[from] InternalError),

    #[error("collector timed out after {0}s")]
    Timeout(u64),
}

impl CollectorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CollectorError::Upstream { .. } => ErrorKind::Upstream,
            CollectorError::Unsupported(_) => ErrorKind::Unsupported,
            CollectorError::Internal(_) => ErrorKind::Internal,
            CollectorError::Timeout(_) => ErrorKind::Timeout,
        }
    }

    pub fn upstream(context: impl Into<String>, source: ClientError) -> Self {
        match source {
            ClientError::Unsupported { operation } => {
                CollectorError::Unsupported(format!("{}: {}", context.into(), operation))
            }
            source => CollectorError::Upstream {
                context: context.into(),
                source,
            },
        }
    }
}

impl From<ClientError> for CollectorError {
    fn from(e: ClientError) -> Self {
        CollectorError::upstream("repo client", e)
    }
}

/// Broken invariants, in host data or in the run itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InternalError {
    #[error("commitish nil for release {release}")]
    CommitishNil { release: String },

    #[error("executor shut down")]
    ExecutorClosed,
}

/// Turns an `Unsupported` client answer into `None` and keeps every other
/// error.
///
/// Optional data sources go through this so a missing capability skips the
/// source instead of failing the collector.
pub fn optional<T>(result: Result<T, ClientError>) -> Result<Option<T>, ClientError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_unsupported() => {
            tracing::debug!(error = %e, "optional data source skipped");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_client_error_keeps_kind() {
        let err = CollectorError::upstream("listing tags", ClientError::unsupported("list_tags"));
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert!(err.to_string().contains("list_tags"));
    }

    #[test]
    fn test_api_error_is_upstream() {
        let err: CollectorError = ClientError::Api {
            operation: "list_commits",
            message: "rate limited".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn test_internal_error_kind() {
        let err: CollectorError = InternalError::CommitishNil {
            release: "v1.0.0".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.to_string(), "internal error: commitish nil for release v1.0.0");
    }

    #[test]
    fn test_optional_swallows_only_unsupported() {
        let skipped: Result<Vec<u8>, _> = Err(ClientError::unsupported("list_webhooks"));
        assert_eq!(optional(skipped).unwrap(), None);

        let failed: Result<Vec<u8>, _> = Err(ClientError::NotFound("x".to_string()));
        assert!(optional(failed).is_err());

        assert_eq!(optional(Ok::<_, ClientError>(3)).unwrap(), Some(3));
    }
}
