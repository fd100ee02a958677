//! CI pipeline rendering
//!
//! [`render_pipeline`] turns a [`PipelineSpec`] into the workflow file for
//! GitHub Actions or GitLab CI. Rendering is pure: the same spec always
//! produces byte-identical output.

mod github;
mod gitlab;
mod schedule;
mod toolchain;

pub use schedule::{CronSchedule, ScheduleError};
pub use toolchain::{Runtime, Toolchain};

use crate::log_debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Branches that push and pull-request triggers are limited to
pub(crate) const TRIGGER_BRANCHES: &[&str] = &["main", "master"];

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid cron schedule '{expression}': {reason}")]
    InvalidSchedule {
        expression: String,
        reason: ScheduleError,
    },
    #[error("No pipeline template for framework '{framework}' with language '{language}'")]
    UnsupportedCombination { framework: String, language: String },
    #[error("Unsupported CI provider '{0}' (expected one of: {list})", list = CiProvider::all_names().join(", "))]
    UnsupportedCiProvider(String),
    #[error("Failed to serialize pipeline: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Supported CI systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CiProvider {
    #[default]
    GithubActions,
    GitlabCi,
}

impl CiProvider {
    pub const ALL: &'static [CiProvider] = &[CiProvider::GithubActions, CiProvider::GitlabCi];

    pub const fn name(&self) -> &'static str {
        match self {
            Self::GithubActions => "github_actions",
            Self::GitlabCi => "gitlab_ci",
        }
    }

    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::GithubActions => "GitHub Actions",
            Self::GitlabCi => "GitLab CI",
        }
    }

    /// Repository-relative path the CI system reads its configuration from
    pub const fn config_path(&self) -> &'static str {
        match self {
            Self::GithubActions => ".github/workflows/tests.yml",
            Self::GitlabCi => ".gitlab-ci.yml",
        }
    }

    pub fn all_names() -> Vec<&'static str> {
        Self::ALL.iter().map(CiProvider::name).collect()
    }
}

impl FromStr for CiProvider {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "github_actions" | "github" | "gha" => Ok(Self::GithubActions),
            "gitlab_ci" | "gitlab" => Ok(Self::GitlabCi),
            _ => Err(PipelineError::UnsupportedCiProvider(s.to_string())),
        }
    }
}

impl fmt::Display for CiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What to render. Framework and language are free-form names so callers can
/// pass user input straight through; unknown names fail at render time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub ci_provider: CiProvider,
    pub framework: String,
    pub language: String,
    #[serde(default = "enabled")]
    pub on_push: bool,
    #[serde(default = "enabled")]
    pub on_pull_request: bool,
    /// Five-field cron expression, empty for no schedule
    #[serde(default)]
    pub cron_schedule: String,
}

const fn enabled() -> bool {
    true
}

impl PipelineSpec {
    pub fn new(
        ci_provider: CiProvider,
        framework: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            ci_provider,
            framework: framework.into(),
            language: language.into(),
            on_push: true,
            on_pull_request: true,
            cron_schedule: String::new(),
        }
    }

    #[must_use]
    pub fn with_push(mut self, enabled: bool) -> Self {
        self.on_push = enabled;
        self
    }

    #[must_use]
    pub fn with_pull_request(mut self, enabled: bool) -> Self {
        self.on_pull_request = enabled;
        self
    }

    #[must_use]
    pub fn with_cron(mut self, expression: impl Into<String>) -> Self {
        self.cron_schedule = expression.into();
        self
    }

    /// The validated schedule, `None` when no cron expression was given
    pub fn schedule(&self) -> Result<Option<CronSchedule>, PipelineError> {
        let expression = self.cron_schedule.trim();
        if expression.is_empty() {
            return Ok(None);
        }
        CronSchedule::parse(expression)
            .map(Some)
            .map_err(|reason| PipelineError::InvalidSchedule {
                expression: expression.to_string(),
                reason,
            })
    }
}

/// A rendered CI configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDocument {
    /// Repository-relative path
    pub path: String,
    pub content: String,
}

impl PipelineDocument {
    /// Where the document lands when the repository root is `root`
    pub fn target_path(&self, root: &Path) -> PathBuf {
        root.join(&self.path)
    }
}

/// Render the CI configuration described by `spec`
pub fn render_pipeline(spec: &PipelineSpec) -> Result<PipelineDocument, PipelineError> {
    let toolchain = Toolchain::resolve(&spec.framework, &spec.language)?;
    let schedule = spec.schedule()?;

    let content = match spec.ci_provider {
        CiProvider::GithubActions => github::render(spec, &toolchain, schedule.as_ref())?,
        CiProvider::GitlabCi => gitlab::render(spec, &toolchain, schedule.as_ref())?,
    };

    log_debug!(
        "Rendered {} pipeline for {}/{} ({} bytes)",
        spec.ci_provider.display_name(),
        toolchain.framework,
        toolchain.language,
        content.len()
    );

    Ok(PipelineDocument {
        path: spec.ci_provider.config_path().to_string(),
        content,
    })
}
