use serde_yaml::Value;
use strum::IntoEnumIterator;
use testforge::{CiProvider, Framework, Language, PipelineError, PipelineSpec, render_pipeline};

fn parse(content: &str) -> Value {
    serde_yaml::from_str(content).expect("rendered pipeline must be valid YAML")
}

#[test]
fn test_every_combination_renders_valid_yaml() {
    for ci in CiProvider::ALL {
        for framework in Framework::iter() {
            for language in Language::iter() {
                let spec = PipelineSpec::new(*ci, framework.to_string(), language.to_string())
                    .with_cron("0 2 * * 1-5");
                let document = render_pipeline(&spec).unwrap_or_else(|e| {
                    panic!("{ci} {framework}/{language} failed to render: {e}")
                });
                assert_eq!(document.path, ci.config_path());

                let yaml = parse(&document.content);
                match ci {
                    CiProvider::GithubActions => {
                        let steps = yaml["jobs"]["test"]["steps"]
                            .as_sequence()
                            .expect("steps");
                        assert!(steps.len() >= 5, "{framework}/{language}");
                    }
                    CiProvider::GitlabCi => {
                        assert!(yaml["test"]["script"].as_sequence().is_some());
                        assert!(yaml["image"].as_str().is_some());
                    }
                }
            }
        }
    }
}

#[test]
fn test_rendering_is_deterministic() {
    let spec = PipelineSpec::new(CiProvider::GitlabCi, "selenium", "java").with_cron("30 6 * * *");
    let first = render_pipeline(&spec).expect("first");
    let second = render_pipeline(&spec).expect("second");
    assert_eq!(first, second);
}

#[test]
fn test_github_push_only() {
    let spec = PipelineSpec::new(CiProvider::GithubActions, "playwright", "python")
        .with_pull_request(false);
    let document = render_pipeline(&spec).expect("render");
    let yaml = parse(&document.content);

    let on = &yaml["on"];
    assert_eq!(on["push"]["branches"][0], "main");
    assert!(on.get("pull_request").is_none());
    assert!(on.get("schedule").is_none());
    assert!(on.get("workflow_dispatch").is_none());
    assert_eq!(yaml["name"], "Playwright Tests");
}

#[test]
fn test_github_schedule_and_artifacts() {
    let spec = PipelineSpec::new(CiProvider::GithubActions, "Playwright", "TypeScript")
        .with_push(false)
        .with_pull_request(false)
        .with_cron("  0   0 * * *  ");
    let document = render_pipeline(&spec).expect("render");
    let yaml = parse(&document.content);

    assert_eq!(yaml["on"]["schedule"][0]["cron"], "0 0 * * *");
    assert!(yaml["on"].get("push").is_none());
    assert!(document.content.contains("npx playwright install --with-deps"));
    assert!(document.content.contains("actions/upload-artifact@v4"));
    assert!(document.content.contains("if: always()"));
}

#[test]
fn test_github_without_triggers_allows_manual_runs() {
    let spec = PipelineSpec::new(CiProvider::GithubActions, "selenium", "csharp")
        .with_push(false)
        .with_pull_request(false);
    let yaml = parse(&render_pipeline(&spec).expect("render").content);
    assert!(yaml["on"].get("workflow_dispatch").is_some());
}

#[test]
fn test_gitlab_selenium_uses_chrome_service() {
    let spec = PipelineSpec::new(CiProvider::GitlabCi, "selenium", "python").with_cron("0 0 * * *");
    let document = render_pipeline(&spec).expect("render");
    assert!(document.content.starts_with("# Scheduled runs"));

    let yaml = parse(&document.content);
    assert_eq!(yaml["image"], "python:3.11");
    assert_eq!(yaml["test"]["services"][0], "selenium/standalone-chrome:latest");
    assert_eq!(yaml["test"]["artifacts"]["when"], "always");

    let rules = yaml["workflow"]["rules"].as_sequence().expect("rules");
    assert_eq!(rules.len(), 3);
    assert!(
        rules
            .iter()
            .any(|rule| rule["if"].as_str().is_some_and(|s| s.contains("\"schedule\"")))
    );
}

#[test]
fn test_malformed_cron_is_rejected() {
    for expression in [
        "0 0 * *",
        "61 0 * * *",
        "*/0 * * * *",
        "0 0 * * funday",
        "5-2 * * * *",
        "+5 +1 * * *",
    ] {
        let spec =
            PipelineSpec::new(CiProvider::GithubActions, "playwright", "python").with_cron(expression);
        match render_pipeline(&spec) {
            Err(PipelineError::InvalidSchedule { expression: e, .. }) => {
                assert_eq!(e, expression);
            }
            other => panic!("'{expression}' should be rejected, got {other:?}"),
        }
    }
}

#[test]
fn test_unknown_target_is_unsupported() {
    let spec = PipelineSpec::new(CiProvider::GitlabCi, "cypress", "javascript");
    assert!(matches!(
        render_pipeline(&spec),
        Err(PipelineError::UnsupportedCombination { framework, .. }) if framework == "cypress"
    ));
}

#[test]
fn test_unknown_ci_provider_name() {
    let err = "jenkins".parse::<CiProvider>().expect_err("unknown");
    assert!(matches!(err, PipelineError::UnsupportedCiProvider(ref name) if name == "jenkins"));
    assert!(err.to_string().contains("github_actions"));
}
