//! Raw data collectors - one per check, turning repository client answers
//! into flat results for the scoring layer.
//!
//! - **Traits**: [`RawCollector`] and the [`CollectorError`] kinds
//! - **Changesets**: commit grouping by review platform via [`group_changesets`]
//! - **Freshness**: version comparison via [`compare`]
//! - **Collectors**: code review, branch and tag protection, CI tests,
//!   dangerous workflows, pinned dependencies, license, webhooks and
//!   dependency update time

pub mod branch_protection;
pub mod changeset;
pub mod ci_tests;
pub mod code_review;
pub mod dangerous_workflow;
pub mod dependency_freshness;
pub mod freshness;
pub mod license;
pub mod pinned_dependencies;
pub mod remediation;
pub mod tag_protection;
pub mod traits;
pub mod webhooks;
pub mod workflow;

// Re-export commonly used types
pub use traits::{optional, CollectorError, ErrorKind, InternalError, RawCollector};

pub use changeset::{classify, group_changesets, Revision};
pub use freshness::{compare, is_pseudo_version, normalize_version, Freshness};

pub use branch_protection::BranchProtectionCollector;
pub use ci_tests::CITestsCollector;
pub use code_review::CodeReviewCollector;
pub use dangerous_workflow::DangerousWorkflowCollector;
pub use dependency_freshness::DependencyFreshnessCollector;
pub use license::{LicenseCollector, LicenseTable};
pub use pinned_dependencies::PinnedDependenciesCollector;
pub use tag_protection::TagProtectionCollector;
pub use webhooks::WebhooksCollector;
