use crate::checker::RemediationText;

const WORKFLOW_PIN_SERVICE: &str = "https://app.stepsecurity.io/secureworkflow";

/// Remediation text for one repository.
///
/// Built per collector run from the repository name and default branch, so
/// nothing about the repository lives in process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remediation {
    repo: String,
    branch: String,
}

impl Remediation {
    pub fn new(repo: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            branch: branch.into(),
        }
    }

    /// Link to the hosted service that rewrites `uses:` lines to SHAs.
    pub fn for_workflow(&self, workflow_path: &str, action: &str) -> RemediationText {
        let file = workflow_path.rsplit('/').next().unwrap_or(workflow_path);
        RemediationText {
            text: format!("update {workflow_path} to pin dependencies by commit SHA"),
            url: Some(format!(
                "{WORKFLOW_PIN_SERVICE}/{}/{}/{}?enable={action}",
                self.repo, file, self.branch
            )),
        }
    }

    pub fn for_docker_image(&self, image: &str) -> RemediationText {
        RemediationText {
            text: format!("pin your Docker image by updating {image} to {image}@sha256:<digest>"),
            url: None,
        }
    }

    pub fn for_command(&self, hint: &str) -> RemediationText {
        RemediationText {
            text: hint.to_string(),
            url: None,
        }
    }
}
