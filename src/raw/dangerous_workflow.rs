//! Detection of dangerous GitHub Actions patterns.
//!
//! Two patterns are reported: checking out untrusted pull request code in a
//! privileged trigger, and interpolating attacker-controlled context into a
//! script.

use super::traits::{CollectorError, RawCollector};
use super::workflow::{is_workflow_path, LineLocator, Step, Workflow};
use crate::checker::{DangerousWorkflow, DangerousWorkflowData, DangerousWorkflowKind, FileLocation};
use crate::traits::RepoClient;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{info, instrument, warn};

static EXPRESSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{\{\s*(.*?)\s*\}\}").unwrap());

static UNTRUSTED_CONTEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"github\.event\.issue\.title|github\.event\.issue\.body",
        r"|github\.event\.pull_request\.title|github\.event\.pull_request\.body",
        r"|github\.event\.comment\.body|github\.event\.review\.body",
        r"|github\.event\.review_comment\.body|github\.event\.pages.*\.page_name",
        r"|github\.event\.commits.*\.message|github\.event\.head_commit\.message",
        r"|github\.event\.head_commit\.author\.(?:email|name)",
        r"|github\.event\.commits.*\.author\.(?:email|name)",
        r"|github\.event\.pull_request\.head\.(?:ref|label|repo\.default_branch)",
        r"|github\.event\.workflow_run\.head_branch|github\.head_ref",
        r"|\.body\b",
    ))
    .unwrap()
});

static UNTRUSTED_CHECKOUT_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"github\.event\.pull_request|github\.event\.workflow_run|github\.head_ref").unwrap()
});

/// Triggers that run with repository secrets on behalf of forks.
const PRIVILEGED_TRIGGERS: &[&str] = &["pull_request_target", "workflow_run"];

/// Whether an `${{ }}` expression reads attacker-controlled context.
pub fn is_untrusted_expression(expression: &str) -> bool {
    UNTRUSTED_CONTEXT.is_match(expression)
}

/// Whether a checkout `ref:` points at code from the triggering fork.
pub fn is_untrusted_checkout_ref(git_ref: &str) -> bool {
    UNTRUSTED_CHECKOUT_REF.is_match(git_ref)
}

fn is_checkout(step: &Step) -> bool {
    step.uses
        .as_deref()
        .is_some_and(|u| u.starts_with("actions/checkout@") || u == "actions/checkout")
}

fn is_github_script(step: &Step) -> bool {
    step.uses
        .as_deref()
        .is_some_and(|u| u.starts_with("actions/github-script@"))
}

/// `${{ }}` expressions in `script` that read untrusted context.
pub fn untrusted_expressions(script: &str) -> Vec<&str> {
    EXPRESSION
        .captures_iter(script)
        .filter(|c| is_untrusted_expression(&c[1]))
        .filter_map(|c| c.get(0).map(|m| m.as_str()))
        .collect()
}

fn finding(
    kind: DangerousWorkflowKind,
    path: &str,
    snippet: &str,
    job: &str,
    locator: &mut LineLocator<'_>,
) -> DangerousWorkflow {
    DangerousWorkflow {
        kind,
        location: FileLocation {
            path: path.to_string(),
            line: locator.locate(snippet),
            snippet: snippet.to_string(),
        },
        job: Some(job.to_string()),
    }
}

/// Runs both detections over one workflow file.
pub fn scan_workflow(path: &str, source: &str, workflow: &Workflow) -> Vec<DangerousWorkflow> {
    let privileged = PRIVILEGED_TRIGGERS.iter().any(|t| workflow.has_trigger(t));
    let mut locator = LineLocator::new(source);
    let mut findings = Vec::new();

    for job in &workflow.jobs {
        for step in &job.steps {
            if privileged && is_checkout(step) {
                if let Some(git_ref) = step.input("ref").filter(|r| is_untrusted_checkout_ref(r)) {
                    findings.push(finding(
                        DangerousWorkflowKind::UntrustedCheckout,
                        path,
                        git_ref,
                        &job.id,
                        &mut locator,
                    ));
                }
            }

            let script = match (&step.run, is_github_script(step)) {
                (Some(run), _) => Some(run.as_str()),
                (None, true) => step.input("script"),
                (None, false) => None,
            };
            for expression in script.map(untrusted_expressions).unwrap_or_default() {
                findings.push(finding(
                    DangerousWorkflowKind::ScriptInjection,
                    path,
                    expression,
                    &job.id,
                    &mut locator,
                ));
            }
        }
    }

    findings
}

pub struct DangerousWorkflowCollector;

#[async_trait]
impl RawCollector for DangerousWorkflowCollector {
    type Output = DangerousWorkflowData;

    fn check_name(&self) -> &'static str {
        "Dangerous-Workflow"
    }

    #[instrument(skip_all, fields(repo = client.repo_name()))]
    async fn collect(&self, client: &dyn RepoClient) -> Result<DangerousWorkflowData, CollectorError> {
        let files = client
            .list_files()
            .await
            .map_err(|e| CollectorError::upstream("listing files", e))?;

        let mut data = DangerousWorkflowData::default();
        for path in files.iter().filter(|p| is_workflow_path(p)) {
            let content = client
                .get_file_content(path)
                .await
                .map_err(|e| CollectorError::upstream(format!("reading {path}"), e))?;
            let Ok(source) = String::from_utf8(content) else {
                warn!(path = %path, "skipping workflow that is not UTF-8");
                continue;
            };
            let workflow = match Workflow::parse(&source) {
                Ok(workflow) => workflow,
                Err(e) => {
                    warn!(path = %path, error = %e, "skipping unparsable workflow");
                    continue;
                }
            };

            data.num_workflows += 1;
            data.workflows.extend(scan_workflow(path, &source, &workflow));
        }

        info!(
            workflows = data.num_workflows,
            findings = data.workflows.len(),
            "scanned workflows"
        );
        Ok(data)
    }
}
