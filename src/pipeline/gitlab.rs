//! GitLab CI rendering

use super::schedule::CronSchedule;
use super::toolchain::Toolchain;
use super::{PipelineError, PipelineSpec, TRIGGER_BRANCHES};
use serde::Serialize;
use std::collections::BTreeMap;

const CHROME_SERVICE: &str = "selenium/standalone-chrome:latest";
const CHROME_REMOTE_URL: &str = "http://selenium__standalone-chrome:4444/wd/hub";

#[derive(Serialize)]
struct Document {
    image: &'static str,
    stages: [&'static str; 1],
    workflow: Workflow,
    test: Job,
}

#[derive(Serialize)]
struct Workflow {
    rules: Vec<Rule>,
}

#[derive(Serialize)]
struct Rule {
    #[serde(rename = "if")]
    condition: String,
}

#[derive(Serialize)]
struct Job {
    stage: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    services: Vec<&'static str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    variables: BTreeMap<&'static str, &'static str>,
    before_script: &'static [&'static str],
    script: &'static [&'static str],
    artifacts: Artifacts,
}

#[derive(Serialize)]
struct Artifacts {
    when: &'static str,
    paths: [&'static str; 1],
    expire_in: &'static str,
}

fn rules(spec: &PipelineSpec, schedule: Option<&CronSchedule>) -> Vec<Rule> {
    let branches = TRIGGER_BRANCHES.join("|");
    let mut conditions = Vec::new();

    if spec.on_push {
        conditions.push(format!(
            "$CI_PIPELINE_SOURCE == \"push\" && $CI_COMMIT_BRANCH =~ /^({branches})$/"
        ));
    }
    if spec.on_pull_request {
        conditions.push(format!(
            "$CI_PIPELINE_SOURCE == \"merge_request_event\" && $CI_MERGE_REQUEST_TARGET_BRANCH_NAME =~ /^({branches})$/"
        ));
    }
    if schedule.is_some() {
        conditions.push("$CI_PIPELINE_SOURCE == \"schedule\"".to_string());
    }
    if conditions.is_empty() {
        conditions.push("$CI_PIPELINE_SOURCE == \"web\"".to_string());
    }

    conditions
        .into_iter()
        .map(|condition| Rule { condition })
        .collect()
}

fn header(schedule: Option<&CronSchedule>) -> String {
    schedule.map_or_else(String::new, |cron| {
        format!(
            "# Scheduled runs: create a pipeline schedule with cron \"{cron}\"\n\
             # under Build > Pipeline schedules in the project settings.\n"
        )
    })
}

pub fn render(
    spec: &PipelineSpec,
    toolchain: &Toolchain,
    schedule: Option<&CronSchedule>,
) -> Result<String, PipelineError> {
    let mut job = Job {
        stage: "test",
        services: Vec::new(),
        variables: BTreeMap::new(),
        before_script: toolchain.install,
        script: toolchain.test,
        artifacts: Artifacts {
            when: "always",
            paths: [toolchain.artifact],
            expire_in: "30 days",
        },
    };
    if toolchain.needs_chrome() {
        job.services.push(CHROME_SERVICE);
        job.variables.insert("SELENIUM_REMOTE_URL", CHROME_REMOTE_URL);
    }

    let document = Document {
        image: toolchain.runtime.gitlab_image(),
        stages: ["test"],
        workflow: Workflow {
            rules: rules(spec, schedule),
        },
        test: job,
    };

    let body = serde_yaml::to_string(&document)?;
    Ok(header(schedule) + &body)
}
