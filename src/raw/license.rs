//! License detection.
//!
//! The host's own license detection is preferred. Hosts without one fall
//! back to a filename scan, where SPDX identifiers embedded in names such as
//! `LICENSE-APACHE-2.0.txt` or `LICENSES/MIT.txt` are resolved through a
//! [`LicenseTable`].

use super::traits::{optional, CollectorError, RawCollector};
use crate::checker::{LicenseAttribution, LicenseData, LicenseFile};
use crate::traits::RepoClient;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, instrument};

static LICENSE_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:(?P<pre>[-0-9a-z.]+)[-_])?(?:LICEN[SC]E|COPYING|COPYRIGHT)(?:[-_](?P<post>[-0-9a-z.]+?))?(?:\.(?P<ext>md|markdown|txt|rst|html))?$",
    )
    .unwrap()
});

/// REUSE-style `LICENSES/<SPDX-ID>.<ext>` files.
static REUSE_LICENSE_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^LICENSES/(?P<spdx>[-0-9a-z.+]+?)(?:\.(?:md|markdown|txt|rst|html))?$")
        .unwrap()
});

const BUILTIN_LICENSES: &[(&str, &str)] = &[
    ("0BSD", "BSD Zero Clause License"),
    ("AGPL-3.0", "GNU Affero General Public License v3.0"),
    ("Apache-2.0", "Apache License 2.0"),
    ("BSD-2-Clause", "BSD 2-Clause \"Simplified\" License"),
    ("BSD-3-Clause", "BSD 3-Clause \"New\" or \"Revised\" License"),
    ("BSL-1.0", "Boost Software License 1.0"),
    ("CC0-1.0", "Creative Commons Zero v1.0 Universal"),
    ("EPL-2.0", "Eclipse Public License 2.0"),
    ("GPL-2.0", "GNU General Public License v2.0"),
    ("GPL-3.0", "GNU General Public License v3.0"),
    ("ISC", "ISC License"),
    ("LGPL-2.1", "GNU Lesser General Public License v2.1"),
    ("LGPL-3.0", "GNU Lesser General Public License v3.0"),
    ("MIT", "MIT License"),
    ("MPL-2.0", "Mozilla Public License 2.0"),
    ("Unlicense", "The Unlicense"),
    ("Zlib", "zlib License"),
];

/// Case-insensitive SPDX lookup, built once and shared read-only.
#[derive(Debug, Clone)]
pub struct LicenseTable {
    by_upper_id: HashMap<String, (String, String)>,
}

impl LicenseTable {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let by_upper_id = entries
            .into_iter()
            .map(|(id, name)| {
                let id = id.into();
                (id.to_uppercase(), (id, name.into()))
            })
            .collect();
        Self { by_upper_id }
    }

    /// Table of commonly used SPDX licenses.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_LICENSES.iter().copied())
    }

    /// Returns the canonical SPDX ID and full name.
    pub fn lookup(&self, spdx_id: &str) -> Option<(&str, &str)> {
        self.by_upper_id
            .get(&spdx_id.to_uppercase())
            .map(|(id, name)| (id.as_str(), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.by_upper_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_upper_id.is_empty()
    }
}

/// Matches `path` against license file naming conventions.
///
/// Returns `Some(spdx)` for a license file, where `spdx` is the embedded
/// identifier if one could be read from the name.
pub fn license_filename_spdx(path: &str) -> Option<Option<&str>> {
    if let Some(captures) = REUSE_LICENSE_FILE.captures(path) {
        return Some(captures.name("spdx").map(|m| m.as_str()));
    }
    if path.contains('/') {
        return None;
    }
    let captures = LICENSE_FILENAME.captures(path)?;
    Some(
        captures
            .name("post")
            .or_else(|| captures.name("pre"))
            .map(|m| m.as_str()),
    )
}

pub struct LicenseCollector {
    table: Arc<LicenseTable>,
}

impl LicenseCollector {
    pub fn new(table: Arc<LicenseTable>) -> Self {
        Self { table }
    }

    fn scan_files(&self, files: &[String]) -> Vec<LicenseFile> {
        files
            .iter()
            .filter_map(|path| {
                let embedded = license_filename_spdx(path)?;
                let known = embedded.and_then(|id| self.table.lookup(id));
                if embedded.is_some() && known.is_none() {
                    debug!(path = %path, "license file names an unknown SPDX identifier");
                }
                Some(LicenseFile {
                    path: path.clone(),
                    spdx_id: known.map(|(id, _)| id.to_string()),
                    name: known.map(|(_, name)| name.to_string()),
                    attribution: LicenseAttribution::FileScan,
                })
            })
            .collect()
    }
}

#[async_trait]
impl RawCollector for LicenseCollector {
    type Output = LicenseData;

    fn check_name(&self) -> &'static str {
        "License"
    }

    #[instrument(skip_all, fields(repo = client.repo_name()))]
    async fn collect(&self, client: &dyn RepoClient) -> Result<LicenseData, CollectorError> {
        if let Some(licenses) = optional(client.list_licenses().await)
            .map_err(|e| CollectorError::upstream("listing licenses", e))?
        {
            let licenses = licenses
                .into_iter()
                .map(|l| LicenseFile {
                    spdx_id: (!l.spdx_id.is_empty()).then_some(l.spdx_id),
                    name: (!l.name.is_empty()).then_some(l.name),
                    path: l.path,
                    attribution: LicenseAttribution::HostApi,
                })
                .collect();
            return Ok(LicenseData { licenses });
        }

        let files = client
            .list_files()
            .await
            .map_err(|e| CollectorError::upstream("listing files", e))?;
        let licenses = self.scan_files(&files);
        info!(found = licenses.len(), "scanned filenames for licenses");

        Ok(LicenseData { licenses })
    }
}
