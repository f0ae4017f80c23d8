//! Version freshness comparison.
//!
//! Given the version a project pins and everything a registry has published
//! for that package, decide whether the pin is the newest tagged release and,
//! if not, when the first newer release came out. The oldest newer release
//! (not the newest) anchors "how long has this been updatable".

use crate::model::PublishedVersion;
use chrono::{DateTime, Utc};
use regex::Regex;
use semver::Version;
use std::cmp::Ordering;
use std::sync::LazyLock;
use tracing::debug;

/// Go pseudo-versions: `vX.Y.Z-[pre.]0.yyyymmddhhmmss-abcdef123456`.
static PSEUDO_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v\d+\.\d+\.\d+-(?:[^+]*[.-])?\d{14}-[0-9A-Za-z]+(?:\+[0-9A-Za-z.-]+)?$").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Freshness {
    pub is_latest: bool,
    pub oldest_newer_published_at: Option<DateTime<Utc>>,
}

impl Freshness {
    fn latest() -> Self {
        Self {
            is_latest: true,
            oldest_newer_published_at: None,
        }
    }

    fn stale(oldest_newer_published_at: Option<DateTime<Utc>>) -> Self {
        Self {
            is_latest: false,
            oldest_newer_published_at,
        }
    }
}

/// Prefixes `v` unless already present.
pub fn normalize_version(version: &str) -> String {
    let version = version.trim();
    if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{version}")
    }
}

/// Whether `version` names an untagged Go commit rather than a release.
pub fn is_pseudo_version(version: &str) -> bool {
    PSEUDO_VERSION.is_match(&normalize_version(version))
}

/// Parses a `v`-prefixed version the way Go's semver does, accepting the
/// `v1` and `v1.2` shorthands.
fn parse_semver(normalized: &str) -> Option<Version> {
    let bare = normalized.strip_prefix('v')?;
    if let Ok(v) = Version::parse(bare) {
        return Some(v);
    }

    let core_end = bare.find(['-', '+']).unwrap_or(bare.len());
    let (core, rest) = bare.split_at(core_end);
    let padded = match core.split('.').count() {
        1 => format!("{core}.0.0{rest}"),
        2 => format!("{core}.0{rest}"),
        _ => return None,
    };
    Version::parse(&padded).ok()
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            debug!(published_at = raw, error = %e, "skipping malformed publish time");
            None
        }
    }
}

struct Candidate {
    normalized: String,
    semver: Option<Version>,
    published_at: DateTime<Utc>,
}

/// Compares `current` against the published `versions` of its package.
pub fn compare(current: &str, versions: &[PublishedVersion]) -> Freshness {
    let current_normalized = normalize_version(current);
    let current_semver = parse_semver(&current_normalized);

    let candidates: Vec<Candidate> = versions
        .iter()
        .filter_map(|v| {
            let normalized = normalize_version(&v.version);
            if PSEUDO_VERSION.is_match(&normalized) {
                return None;
            }
            Some(Candidate {
                semver: parse_semver(&normalized),
                published_at: parse_timestamp(&v.published_at)?,
                normalized,
            })
        })
        .collect();

    if let Some(current_semver) = &current_semver {
        if let Some(freshness) = compare_semver(current_semver, &candidates) {
            return freshness;
        }
    }

    compare_timestamps(&current_normalized, &candidates)
}

/// Returns `None` when no candidate is valid semver.
fn compare_semver(current: &Version, candidates: &[Candidate]) -> Option<Freshness> {
    let mut latest: Option<&Version> = None;
    let mut oldest_newer: Option<(&Version, DateTime<Utc>)> = None;

    for candidate in candidates {
        let Some(version) = &candidate.semver else {
            continue;
        };

        if latest.map_or(true, |l| version.cmp_precedence(l) == Ordering::Greater) {
            latest = Some(version);
        }
        if version.cmp_precedence(current) == Ordering::Greater
            && oldest_newer.map_or(true, |(o, _)| version.cmp_precedence(o) == Ordering::Less)
        {
            oldest_newer = Some((version, candidate.published_at));
        }
    }

    // Build metadata carries no precedence.
    let latest = latest?;
    if latest.cmp_precedence(current) == Ordering::Equal {
        return Some(Freshness::latest());
    }
    Some(Freshness::stale(oldest_newer.map(|(_, ts)| ts)))
}

fn compare_timestamps(current_normalized: &str, candidates: &[Candidate]) -> Freshness {
    let Some(current_published) = candidates
        .iter()
        .find(|c| c.normalized == current_normalized)
        .map(|c| c.published_at)
    else {
        return Freshness::stale(None);
    };

    let oldest_later = candidates
        .iter()
        .map(|c| c.published_at)
        .filter(|ts| *ts > current_published)
        .min();

    match oldest_later {
        None => Freshness::latest(),
        Some(ts) => Freshness::stale(Some(ts)),
    }
}
