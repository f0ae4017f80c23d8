//! Commit classification and changeset grouping.
//!
//! A changeset is the set of commits that one review unit (a pull request,
//! a Gerrit change, a Phabricator differential...) brought into the default
//! branch. Each commit is classified independently, then commits sharing a
//! `(platform, revision)` key are folded together.

use crate::checker::{Changeset, ReviewPlatform};
use crate::model::Commit;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static PHABRICATOR_URL_REVISION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Differential Revision:\s*\S*/(D\d+)").unwrap());

static PHABRICATOR_REVISION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Differential Revision:\s*(\w+)").unwrap());

static PIPER_REVISION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"PiperOrigin-RevId:\s*(\d{3,})").unwrap());

/// Labels that mark a Prow-approved pull request.
const PROW_APPROVAL_LABELS: &[&str] = &["lgtm", "approved"];

/// Result of classifying one commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision {
    pub platform: ReviewPlatform,
    pub id: String,
}

impl Revision {
    fn new(platform: ReviewPlatform, id: impl Into<String>) -> Self {
        Self {
            platform,
            id: id.into(),
        }
    }
}

fn prow_revision(commit: &Commit) -> Option<Revision> {
    let mr = commit.associated_merge_request.as_ref()?;
    if !mr.is_merged() {
        return None;
    }
    PROW_APPROVAL_LABELS
        .iter()
        .any(|label| mr.has_label(label))
        .then(|| Revision::new(ReviewPlatform::Prow, mr.number.to_string()))
}

fn github_revision(commit: &Commit) -> Option<Revision> {
    let mr = commit.associated_merge_request.as_ref()?;
    (mr.is_merged() && mr.number != 0)
        .then(|| Revision::new(ReviewPlatform::GitHub, mr.number.to_string()))
}

fn phabricator_revision(commit: &Commit) -> Option<Revision> {
    // The URL form must win, otherwise `\w+` captures the scheme.
    let captures = PHABRICATOR_URL_REVISION
        .captures(&commit.message)
        .or_else(|| PHABRICATOR_REVISION.captures(&commit.message))?;
    Some(Revision::new(ReviewPlatform::Phabricator, &captures[1]))
}

fn gerrit_revision(commit: &Commit) -> Option<Revision> {
    (commit.message.contains("Reviewed-on:") && commit.message.contains("Reviewed-by:"))
        .then(|| Revision::new(ReviewPlatform::Gerrit, commit.sha.clone()))
}

fn piper_revision(commit: &Commit) -> Option<Revision> {
    let captures = PIPER_REVISION.captures(&commit.message)?;
    Some(Revision::new(ReviewPlatform::Piper, &captures[1]))
}

/// Detects which review platform accepted `commit`.
///
/// Heuristics are tried in a fixed order and the first hit wins:
/// Prow, GitHub, Phabricator, Gerrit, Piper. A Prow-labelled pull request
/// whose message also carries Gerrit trailers is therefore Prow.
pub fn classify(commit: &Commit) -> Option<Revision> {
    prow_revision(commit)
        .or_else(|| github_revision(commit))
        .or_else(|| phabricator_revision(commit))
        .or_else(|| gerrit_revision(commit))
        .or_else(|| piper_revision(commit))
}

/// Folds `commits` into changesets.
///
/// Changesets appear in the order their first commit appears, and commits
/// keep input order inside a changeset. Commits with no detectable platform
/// each become their own changeset.
pub fn group_changesets(commits: &[Commit]) -> Vec<Changeset> {
    let mut changesets: Vec<Changeset> = Vec::new();
    let mut index: HashMap<Revision, usize> = HashMap::new();

    for commit in commits {
        let Some(revision) = classify(commit) else {
            changesets.push(Changeset {
                review_platform: ReviewPlatform::Unknown,
                revision_id: String::new(),
                commits: vec![commit.clone()],
                reviews: Vec::new(),
                authors: Vec::new(),
            });
            continue;
        };

        match index.get(&revision) {
            Some(&i) => changesets[i].commits.push(commit.clone()),
            None => {
                index.insert(revision.clone(), changesets.len());
                changesets.push(Changeset {
                    review_platform: revision.platform,
                    revision_id: revision.id,
                    commits: vec![commit.clone()],
                    reviews: Vec::new(),
                    authors: Vec::new(),
                });
            }
        }
    }

    for changeset in &mut changesets {
        if changeset.review_platform != ReviewPlatform::GitHub {
            continue;
        }
        if let Some(mr) = changeset
            .commits
            .first()
            .and_then(|c| c.associated_merge_request.as_ref())
        {
            changeset.reviews = mr.reviews.clone();
            changeset.authors = vec![mr.author.clone()];
        }
    }

    changesets
}
