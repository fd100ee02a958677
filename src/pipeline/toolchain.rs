//! Per-target install, test and artifact steps

use super::PipelineError;
use crate::types::{Framework, Language};

/// `with:` inputs of a GitHub Actions step
pub type ActionInputs = &'static [(&'static str, &'static str)];

/// Language runtime a job has to provision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    Python,
    Node,
    Java,
    Dotnet,
}

impl Runtime {
    /// Step name, action and `with:` inputs for GitHub Actions
    pub const fn github_setup(self) -> (&'static str, &'static str, ActionInputs) {
        match self {
            Self::Python => (
                "Set up Python",
                "actions/setup-python@v5",
                &[("python-version", "3.11")],
            ),
            Self::Node => (
                "Set up Node.js",
                "actions/setup-node@v4",
                &[("node-version", "20")],
            ),
            Self::Java => (
                "Set up JDK",
                "actions/setup-java@v4",
                &[("distribution", "temurin"), ("java-version", "17")],
            ),
            Self::Dotnet => (
                "Set up .NET",
                "actions/setup-dotnet@v4",
                &[("dotnet-version", "8.0.x")],
            ),
        }
    }

    /// Container image for GitLab CI
    pub const fn gitlab_image(self) -> &'static str {
        match self {
            Self::Python => "python:3.11",
            Self::Node => "node:20",
            Self::Java => "maven:3.9-eclipse-temurin-17",
            Self::Dotnet => "mcr.microsoft.com/dotnet/sdk:8.0",
        }
    }
}

const PYTEST: &[&str] = &["pytest tests/ --html=report.html --self-contained-html"];
const MAVEN_TEST: &[&str] = &["mvn -B test"];
const PIP_UPGRADE: &str = "python -m pip install --upgrade pip";

/// Everything a CI job needs to run one {framework, language} target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub framework: Framework,
    pub language: Language,
    pub runtime: Runtime,
    pub install: &'static [&'static str],
    pub test: &'static [&'static str],
    /// Report path uploaded whether or not the tests pass
    pub artifact: &'static str,
}

impl Toolchain {
    pub const fn for_target(framework: Framework, language: Language) -> Self {
        let (runtime, install, test, artifact): (
            Runtime,
            &'static [&'static str],
            &'static [&'static str],
            &'static str,
        ) = match (framework, language) {
            (Framework::Playwright, Language::Python) => (
                Runtime::Python,
                &[
                    PIP_UPGRADE,
                    "pip install playwright pytest-playwright pytest-html",
                    "playwright install --with-deps",
                ],
                PYTEST,
                "report.html",
            ),
            (Framework::Playwright, Language::JavaScript | Language::TypeScript) => (
                Runtime::Node,
                &["npm ci", "npx playwright install --with-deps"],
                &["npx playwright test"],
                "playwright-report/",
            ),
            (Framework::Playwright, Language::Java) => (
                Runtime::Java,
                &[
                    "mvn -B -q dependency:resolve",
                    "mvn -B exec:java -e -D exec.mainClass=com.microsoft.playwright.CLI -D exec.args=\"install --with-deps\"",
                ],
                MAVEN_TEST,
                "target/surefire-reports/",
            ),
            (Framework::Playwright, Language::CSharp) => (
                Runtime::Dotnet,
                &[
                    "dotnet build",
                    "pwsh bin/Debug/net8.0/playwright.ps1 install --with-deps",
                ],
                &["dotnet test --no-build --logger trx --results-directory TestResults"],
                "TestResults/",
            ),
            (Framework::Selenium, Language::Python) => (
                Runtime::Python,
                &[
                    PIP_UPGRADE,
                    "pip install selenium pytest pytest-html webdriver-manager",
                ],
                PYTEST,
                "report.html",
            ),
            (Framework::Selenium, Language::JavaScript | Language::TypeScript) => (
                Runtime::Node,
                &["npm ci"],
                &["npm test"],
                "test-results/",
            ),
            (Framework::Selenium, Language::Java) => (
                Runtime::Java,
                &["mvn -B -q dependency:resolve"],
                MAVEN_TEST,
                "target/surefire-reports/",
            ),
            (Framework::Selenium, Language::CSharp) => (
                Runtime::Dotnet,
                &["dotnet restore"],
                &["dotnet test --logger trx --results-directory TestResults"],
                "TestResults/",
            ),
        };

        Self {
            framework,
            language,
            runtime,
            install,
            test,
            artifact,
        }
    }

    /// Resolve user-supplied names, rejecting anything outside the supported matrix
    pub fn resolve(framework: &str, language: &str) -> Result<Self, PipelineError> {
        let unsupported = || PipelineError::UnsupportedCombination {
            framework: framework.to_string(),
            language: language.to_string(),
        };
        let parsed_framework: Framework = framework.trim().parse().map_err(|_| unsupported())?;
        let parsed_language: Language = language.trim().parse().map_err(|_| unsupported())?;
        Ok(Self::for_target(parsed_framework, parsed_language))
    }

    /// Selenium drives a system Chrome; Playwright ships its own browsers
    pub const fn needs_chrome(&self) -> bool {
        matches!(self.framework, Framework::Selenium)
    }

    pub fn workflow_name(&self) -> String {
        format!("{} Tests", self.framework.display_name())
    }
}
