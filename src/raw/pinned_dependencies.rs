//! Detection of dependencies fetched without a fixed hash.
//!
//! Three file kinds are read: workflows (`uses:` and `run:`), Dockerfiles
//! (`FROM` and `RUN`) and shell scripts. Shell content is scanned one logical
//! line at a time for package manager and download commands.

use super::remediation::Remediation;
use super::traits::{CollectorError, RawCollector};
use super::workflow::{is_workflow_path, LineLocator, Workflow};
use crate::checker::{
    DependencyUseKind, FileLocation, PinnedDependency, PinningDependenciesData, RemediationText,
};
use crate::traits::RepoClient;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info, instrument, warn};

static FULL_COMMIT_SHA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{40}$").unwrap());

static DOWNLOAD_THEN_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\b(?:curl|wget)\b[^|;&]*\|\s*(?:sudo\s+)?(?:ba|z|k|da)?sh\b",
        r"|\b(?:ba|z)?sh\s+(?:-c\s+)?.?\$\(\s*(?:curl|wget)\b",
        r"|<\(\s*(?:curl|wget)\b",
    ))
    .unwrap()
});

static PIP_INSTALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:sudo\s+)?(?:python[\d.]*\s+-m\s+)?pip[\d.]*\s+install\b(.*)$").unwrap()
});

static NPM_INSTALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:sudo\s+)?npm\s+(install|i|ci)\b(.*)$").unwrap());

static GO_INSTALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:sudo\s+)?go\s+(?:install|get)\b(.*)$").unwrap());

static COMMAND_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&&|\|\||;").unwrap());

/// A dependency use found in a shell snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellDependency {
    pub kind: DependencyUseKind,
    pub name: Option<String>,
    pub pinned: bool,
    /// 0-based line within the scanned script.
    pub line: usize,
    pub snippet: String,
}

/// Whether a `uses:` reference is pinned to a full commit SHA.
pub fn is_action_pinned(uses: &str) -> bool {
    uses.rsplit_once('@')
        .is_some_and(|(_, git_ref)| FULL_COMMIT_SHA.is_match(git_ref))
}

/// Whether an image reference carries a content digest.
pub fn is_image_pinned(image: &str) -> bool {
    image.contains("@sha256:")
}

pub fn is_download_then_run(command: &str) -> bool {
    DOWNLOAD_THEN_RUN.is_match(command)
}

fn positional_args(args: &str) -> impl Iterator<Item = &str> {
    args.split_whitespace().filter(|a| !a.starts_with('-'))
}

fn is_local_path(arg: &str) -> bool {
    arg == "." || arg.starts_with("./") || arg.starts_with('/') || arg.starts_with("..")
}

fn pip_dependency(command: &str) -> Option<(Option<String>, bool)> {
    let args = PIP_INSTALL.captures(command)?.get(1)?.as_str();
    let positional: Vec<&str> = positional_args(args).collect();
    if !positional.is_empty() && positional.iter().all(|a| is_local_path(a)) {
        return None;
    }
    let name = positional
        .iter()
        .find(|a| !is_local_path(a))
        .map(|a| a.to_string());
    Some((name, args.contains("--require-hashes")))
}

fn npm_dependency(command: &str) -> Option<(Option<String>, bool)> {
    let captures = NPM_INSTALL.captures(command)?;
    let pinned = &captures[1] == "ci";
    let name = positional_args(&captures[2]).next().map(str::to_string);
    Some((name, pinned))
}

fn go_dependency(command: &str) -> Option<(Option<String>, bool)> {
    let args = GO_INSTALL.captures(command)?.get(1)?.as_str();
    let target = positional_args(args).next()?;
    if is_local_path(target) {
        return None;
    }
    let pinned = target
        .rsplit_once('@')
        .is_some_and(|(_, version)| FULL_COMMIT_SHA.is_match(version));
    Some((Some(target.to_string()), pinned))
}

/// Joins backslash continuations, yielding `(first_line_index, text)`.
fn logical_lines(script: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (i, line) in script.lines().enumerate() {
        let (start, mut text) = current.take().unwrap_or((i, String::new()));
        let trimmed = line.trim_end();
        match trimmed.strip_suffix('\\') {
            Some(head) => {
                text.push_str(head);
                text.push(' ');
                current = Some((start, text));
            }
            None => {
                text.push_str(trimmed);
                out.push((start, text));
            }
        }
    }
    out.extend(current);
    out
}

/// Scans a shell script for unpinned package installs and piped downloads.
pub fn scan_shell(script: &str) -> Vec<ShellDependency> {
    let mut found = Vec::new();

    for (line, text) in logical_lines(script) {
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        if is_download_then_run(text) {
            found.push(ShellDependency {
                kind: DependencyUseKind::DownloadThenRun,
                name: None,
                pinned: false,
                line,
                snippet: text.to_string(),
            });
        }

        for command in COMMAND_SEPARATOR.split(text).map(str::trim) {
            let detected = pip_dependency(command)
                .map(|d| (DependencyUseKind::PipCommand, d))
                .or_else(|| npm_dependency(command).map(|d| (DependencyUseKind::NpmCommand, d)))
                .or_else(|| go_dependency(command).map(|d| (DependencyUseKind::GoCommand, d)));
            if let Some((kind, (name, pinned))) = detected {
                found.push(ShellDependency {
                    kind,
                    name,
                    pinned,
                    line,
                    snippet: command.to_string(),
                });
            }
        }
    }

    found
}

pub fn is_dockerfile_path(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path).to_ascii_lowercase();
    name == "dockerfile" || name.starts_with("dockerfile.") || name.ends_with(".dockerfile")
}

fn is_shell_script_path(path: &str) -> bool {
    path.ends_with(".sh") || path.ends_with(".bash")
}

fn shell_remediation(kind: DependencyUseKind, remediation: &Remediation) -> Option<RemediationText> {
    let hint = match kind {
        DependencyUseKind::PipCommand => "pin pip installs with --require-hashes and a hashed requirements file",
        DependencyUseKind::NpmCommand => "use `npm ci` against a committed lockfile",
        DependencyUseKind::GoCommand => "install Go tools at a full commit hash",
        DependencyUseKind::DownloadThenRun => "download the script, verify its checksum, then run it",
        DependencyUseKind::GitHubAction | DependencyUseKind::DockerImage => return None,
    };
    Some(remediation.for_command(hint))
}

fn shell_dependencies(
    path: &str,
    script: &str,
    first_line: usize,
    remediation: &Remediation,
) -> Vec<PinnedDependency> {
    scan_shell(script)
        .into_iter()
        .map(|d| PinnedDependency {
            kind: d.kind,
            location: FileLocation {
                path: path.to_string(),
                line: Some(first_line + d.line),
                snippet: d.snippet,
            },
            name: d.name,
            pinned: d.pinned,
            remediation: (!d.pinned)
                .then(|| shell_remediation(d.kind, remediation))
                .flatten(),
        })
        .collect()
}

/// Scans a workflow's `uses:` references and `run:` bodies.
pub fn scan_workflow(
    path: &str,
    source: &str,
    workflow: &Workflow,
    remediation: &Remediation,
) -> Vec<PinnedDependency> {
    let mut locator = LineLocator::new(source);
    let mut found = Vec::new();

    for job in &workflow.jobs {
        let step_uses = job.steps.iter().map(|s| (s.uses.as_deref(), s.run.as_deref()));
        for (uses, run) in std::iter::once((job.uses.as_deref(), None)).chain(step_uses) {
            if let Some(uses) = uses.filter(|u| !u.starts_with("./")) {
                let line = locator.locate(uses);
                let (kind, pinned, remediation_text) = match uses.strip_prefix("docker://") {
                    Some(image) => (
                        DependencyUseKind::DockerImage,
                        is_image_pinned(image),
                        remediation.for_docker_image(image),
                    ),
                    None => (
                        DependencyUseKind::GitHubAction,
                        is_action_pinned(uses),
                        remediation.for_workflow(path, "pin"),
                    ),
                };
                found.push(PinnedDependency {
                    kind,
                    location: FileLocation {
                        path: path.to_string(),
                        line,
                        snippet: uses.to_string(),
                    },
                    name: Some(uses.split('@').next().unwrap_or(uses).to_string()),
                    pinned,
                    remediation: (!pinned).then_some(remediation_text),
                });
            }

            if let Some(run) = run {
                let Some(line) = locator.locate(run) else {
                    debug!(path, "could not locate run body");
                    continue;
                };
                let leading_blank = run.lines().take_while(|l| l.trim().is_empty()).count();
                let body: String = run.lines().skip(leading_blank).collect::<Vec<_>>().join("\n");
                found.extend(shell_dependencies(path, &body, line, remediation));
            }
        }
    }

    found
}

/// Scans `FROM` images and `RUN` commands of a Dockerfile.
pub fn scan_dockerfile(path: &str, source: &str, remediation: &Remediation) -> Vec<PinnedDependency> {
    let mut stages: HashSet<String> = HashSet::new();
    let mut found = Vec::new();

    for (line, text) in logical_lines(source) {
        let text = text.trim();
        let Some((instruction, rest)) = text.split_once(char::is_whitespace) else {
            continue;
        };

        if instruction.eq_ignore_ascii_case("FROM") {
            let mut tokens = rest.split_whitespace().filter(|t| !t.starts_with("--"));
            let Some(image) = tokens.next() else {
                continue;
            };
            let alias = match (tokens.next(), tokens.next()) {
                (Some(kw), Some(alias)) if kw.eq_ignore_ascii_case("as") => Some(alias),
                _ => None,
            };

            let is_stage = stages.contains(&image.to_ascii_lowercase());
            if let Some(alias) = alias {
                stages.insert(alias.to_ascii_lowercase());
            }
            if image.eq_ignore_ascii_case("scratch") || is_stage {
                continue;
            }

            let pinned = is_image_pinned(image);
            found.push(PinnedDependency {
                kind: DependencyUseKind::DockerImage,
                location: FileLocation {
                    path: path.to_string(),
                    line: Some(line + 1),
                    snippet: text.to_string(),
                },
                name: Some(image.to_string()),
                pinned,
                remediation: (!pinned).then(|| remediation.for_docker_image(image)),
            });
        } else if instruction.eq_ignore_ascii_case("RUN") {
            found.extend(shell_dependencies(path, rest, line + 1, remediation));
        }
    }

    found
}

pub struct PinnedDependenciesCollector;

#[async_trait]
impl RawCollector for PinnedDependenciesCollector {
    type Output = PinningDependenciesData;

    fn check_name(&self) -> &'static str {
        "Pinned-Dependencies"
    }

    #[instrument(skip_all, fields(repo = client.repo_name()))]
    async fn collect(&self, client: &dyn RepoClient) -> Result<PinningDependenciesData, CollectorError> {
        let default_branch = client
            .get_default_branch()
            .await
            .map_err(|e| CollectorError::upstream("getting default branch", e))?;
        let remediation = Remediation::new(client.repo_name(), default_branch.name);

        let files = client
            .list_files()
            .await
            .map_err(|e| CollectorError::upstream("listing files", e))?;

        let mut dependencies = Vec::new();
        for path in &files {
            let workflow = is_workflow_path(path);
            let dockerfile = is_dockerfile_path(path);
            if !workflow && !dockerfile && !is_shell_script_path(path) {
                continue;
            }

            let content = client
                .get_file_content(path)
                .await
                .map_err(|e| CollectorError::upstream(format!("reading {path}"), e))?;
            let Ok(source) = String::from_utf8(content) else {
                warn!(path = %path, "skipping file that is not UTF-8");
                continue;
            };

            if workflow {
                match Workflow::parse(&source) {
                    Ok(wf) => dependencies.extend(scan_workflow(path, &source, &wf, &remediation)),
                    Err(e) => warn!(path = %path, error = %e, "skipping unparsable workflow"),
                }
            } else if dockerfile {
                dependencies.extend(scan_dockerfile(path, &source, &remediation));
            } else {
                dependencies.extend(shell_dependencies(path, &source, 1, &remediation));
            }
        }

        info!(
            found = dependencies.len(),
            unpinned = dependencies.iter().filter(|d| !d.pinned).count(),
            "scanned dependency pinning"
        );
        Ok(PinningDependenciesData { dependencies })
    }
}
