//! Minimal GitHub Actions workflow model.
//!
//! Only what the workflow collectors inspect is extracted: triggers, and per
//! job the `uses:`/`run:`/`with:` of each step. Everything else in the file
//! is ignored.

use serde_yaml::{Mapping, Value};

const WORKFLOW_DIR: &str = ".github/workflows/";

/// Whether `path` is a workflow definition GitHub would load.
pub fn is_workflow_path(path: &str) -> bool {
    path.strip_prefix(WORKFLOW_DIR)
        .is_some_and(|name| !name.contains('/') && (name.ends_with(".yml") || name.ends_with(".yaml")))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Step {
    pub name: Option<String>,
    pub uses: Option<String>,
    pub run: Option<String>,
    pub with: Mapping,
}

impl Step {
    /// String value of `with.<key>`, if present.
    pub fn input(&self, key: &str) -> Option<&str> {
        self.with.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Job {
    pub id: String,
    /// Reusable workflow reference for `jobs.<id>.uses`.
    pub uses: Option<String>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workflow {
    pub triggers: Vec<String>,
    pub jobs: Vec<Job>,
}

impl Workflow {
    pub fn parse(source: &str) -> Result<Self, serde_yaml::Error> {
        let doc: Value = serde_yaml::from_str(source)?;

        // YAML 1.1 readers turn a bare `on` key into `true`.
        let on = doc
            .get("on")
            .or_else(|| doc.as_mapping().and_then(|m| m.get(Value::Bool(true))));
        let triggers = match on {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Sequence(seq)) => seq
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::Mapping(m)) => m
                .keys()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        let jobs = doc
            .get("jobs")
            .and_then(Value::as_mapping)
            .map(|jobs| {
                jobs.iter()
                    .filter_map(|(id, job)| Some(parse_job(id.as_str()?, job)))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self { triggers, jobs })
    }

    pub fn has_trigger(&self, name: &str) -> bool {
        self.triggers.iter().any(|t| t == name)
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn parse_job(id: &str, job: &Value) -> Job {
    let steps = job
        .get("steps")
        .and_then(Value::as_sequence)
        .map(|steps| {
            steps
                .iter()
                .map(|step| Step {
                    name: string_field(step, "name"),
                    uses: string_field(step, "uses"),
                    run: string_field(step, "run"),
                    with: step
                        .get("with")
                        .and_then(Value::as_mapping)
                        .cloned()
                        .unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    Job {
        id: id.to_string(),
        uses: string_field(job, "uses"),
        steps,
    }
}

/// Maps snippets back to 1-based line numbers.
///
/// Each search starts at the previous hit, so lookups made in document order
/// do not resolve to an earlier duplicate.
pub struct LineLocator<'a> {
    lines: Vec<&'a str>,
    cursor: usize,
}

impl<'a> LineLocator<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().collect(),
            cursor: 0,
        }
    }

    pub fn locate(&mut self, snippet: &str) -> Option<usize> {
        let needle = snippet.lines().find(|l| !l.trim().is_empty())?.trim();
        let offset = self.lines[self.cursor..]
            .iter()
            .position(|line| line.contains(needle))?;
        let index = self.cursor + offset;
        self.cursor = index;
        Some(index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKFLOW: &str = r#"
name: ci
on:
  pull_request_target:
  push:
    branches: [main]
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
        with:
          ref: ${{ github.event.pull_request.head.sha }}
      - name: test
        run: |
          make test
  release:
    uses: org/repo/.github/workflows/release.yml@main
"#;

    #[test]
    fn test_workflow_paths() {
        assert!(is_workflow_path(".github/workflows/ci.yml"));
        assert!(is_workflow_path(".github/workflows/ci.yaml"));
        assert!(!is_workflow_path(".github/workflows/nested/ci.yml"));
        assert!(!is_workflow_path(".github/workflows/README.md"));
        assert!(!is_workflow_path("ci.yml"));
    }

    #[test]
    fn test_parse_workflow() {
        let wf = Workflow::parse(WORKFLOW).unwrap();

        assert_eq!(wf.triggers, ["pull_request_target", "push"]);
        assert!(wf.has_trigger("push"));
        assert_eq!(wf.jobs.len(), 2);

        let build = &wf.jobs[0];
        assert_eq!(build.id, "build");
        assert_eq!(build.steps[0].uses.as_deref(), Some("actions/checkout@v4"));
        assert_eq!(
            build.steps[0].input("ref"),
            Some("${{ github.event.pull_request.head.sha }}")
        );
        assert_eq!(build.steps[1].run.as_deref(), Some("make test\n"));

        assert_eq!(
            wf.jobs[1].uses.as_deref(),
            Some("org/repo/.github/workflows/release.yml@main")
        );
    }

    #[test]
    fn test_scalar_and_sequence_triggers() {
        assert_eq!(Workflow::parse("on: push").unwrap().triggers, ["push"]);
        assert_eq!(
            Workflow::parse("on: [push, workflow_run]").unwrap().triggers,
            ["push", "workflow_run"]
        );
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(Workflow::parse("jobs: [unclosed").is_err());
    }

    #[test]
    fn test_line_locator_moves_forward() {
        let source = "a: x\nb: y\nc: x\n";
        let mut locator = LineLocator::new(source);
        assert_eq!(locator.locate("x"), Some(1));
        assert_eq!(locator.locate("y"), Some(2));
        assert_eq!(locator.locate("x"), Some(3));
        assert_eq!(locator.locate("missing"), None);
    }
}
