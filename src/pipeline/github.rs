//! GitHub Actions workflow rendering

use super::schedule::CronSchedule;
use super::toolchain::Toolchain;
use super::{PipelineError, PipelineSpec, TRIGGER_BRANCHES};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct Workflow {
    name: String,
    on: Triggers,
    jobs: Jobs,
}

#[derive(Serialize)]
struct Triggers {
    #[serde(skip_serializing_if = "Option::is_none")]
    push: Option<BranchFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pull_request: Option<BranchFilter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    schedule: Vec<CronTrigger>,
    #[serde(skip_serializing_if = "Option::is_none")]
    workflow_dispatch: Option<BTreeMap<String, String>>,
}

#[derive(Serialize)]
struct BranchFilter {
    branches: &'static [&'static str],
}

#[derive(Serialize)]
struct CronTrigger {
    cron: String,
}

#[derive(Serialize)]
struct Jobs {
    test: Job,
}

#[derive(Serialize)]
struct Job {
    #[serde(rename = "runs-on")]
    runs_on: &'static str,
    steps: Vec<Step>,
}

#[derive(Serialize, Default)]
struct Step {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'static str>,
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    condition: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uses: Option<&'static str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    with: BTreeMap<&'static str, &'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run: Option<String>,
}

impl Step {
    fn uses(name: &'static str, action: &'static str) -> Self {
        Self {
            name: Some(name),
            uses: Some(action),
            ..Self::default()
        }
    }

    fn run(name: &'static str, commands: &[&str]) -> Self {
        Self {
            name: Some(name),
            run: Some(commands.join("\n")),
            ..Self::default()
        }
    }
}

fn triggers(spec: &PipelineSpec, schedule: Option<&CronSchedule>) -> Triggers {
    let branches = || BranchFilter {
        branches: TRIGGER_BRANCHES,
    };
    let mut triggers = Triggers {
        push: spec.on_push.then(branches),
        pull_request: spec.on_pull_request.then(branches),
        schedule: schedule
            .map(|cron| CronTrigger {
                cron: cron.to_string(),
            })
            .into_iter()
            .collect(),
        workflow_dispatch: None,
    };

    if triggers.push.is_none() && triggers.pull_request.is_none() && triggers.schedule.is_empty()
    {
        triggers.workflow_dispatch = Some(BTreeMap::new());
    }
    triggers
}

fn steps(toolchain: &Toolchain) -> Vec<Step> {
    let mut steps = vec![Step {
        uses: Some("actions/checkout@v4"),
        ..Step::default()
    }];

    let (setup_name, setup_action, inputs) = toolchain.runtime.github_setup();
    let mut setup = Step::uses(setup_name, setup_action);
    setup.with = inputs.iter().copied().collect();
    steps.push(setup);

    if toolchain.needs_chrome() {
        steps.push(Step::uses("Set up Chrome", "browser-actions/setup-chrome@v1"));
    }

    steps.push(Step::run("Install dependencies", toolchain.install));
    steps.push(Step::run("Run tests", toolchain.test));

    let mut upload = Step::uses("Upload test results", "actions/upload-artifact@v4");
    upload.condition = Some("always()");
    upload.with = BTreeMap::from([("name", "test-results"), ("path", toolchain.artifact)]);
    steps.push(upload);

    steps
}

pub fn render(
    spec: &PipelineSpec,
    toolchain: &Toolchain,
    schedule: Option<&CronSchedule>,
) -> Result<String, PipelineError> {
    let workflow = Workflow {
        name: toolchain.workflow_name(),
        on: triggers(spec, schedule),
        jobs: Jobs {
            test: Job {
                runs_on: "ubuntu-latest",
                steps: steps(toolchain),
            },
        },
    };

    Ok(serde_yaml::to_string(&workflow)?)
}
