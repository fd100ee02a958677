//! Prompt construction for test generation
//!
//! Prompts are pure functions of their inputs. The closing instruction asks
//! for a single fenced block tagged with the target language, which is the
//! format [`crate::extractor`] looks for.

use crate::generation::{GenerationOptions, TargetContext};
use crate::types::{Framework, Language};
use std::fmt::Write;

/// Builds the user prompt for one scenario
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(
        &self,
        scenario: &str,
        framework: Framework,
        language: Language,
        options: &GenerationOptions,
        target: &TargetContext,
    ) -> String {
        let mut prompt = format!(
            "Generate a complete, executable {} test in {} for the following scenario.\n\n",
            framework.display_name(),
            language.display_name()
        );

        if let Some(website) = target.website_url.as_deref() {
            let _ = writeln!(prompt, "Website: {website}");
        }
        if let Some(base_url) = target.base_url.as_deref() {
            let _ = writeln!(prompt, "Base URL: {base_url}");
        }
        let _ = writeln!(prompt, "Scenario: {scenario}");

        prompt.push_str("\nRequirements:\n");
        let _ = writeln!(prompt, "- Framework: {}", framework.display_name());
        let _ = writeln!(prompt, "- Language: {}", language.display_name());
        for directive in option_directives(options) {
            let _ = writeln!(prompt, "- {directive}");
        }

        prompt.push_str(
            "\nGenerate only the test code with proper imports, test logic, and assertions.\n\
             Include brief comments for clarity and follow the framework's best practices.\n",
        );
        let _ = write!(
            prompt,
            "Return the complete test as exactly one fenced code block starting with ```{} \
             and ending with ```. Do not add explanations before or after the code block.\n",
            language.fence_tag()
        );

        prompt
    }
}

/// Human-readable directives, one per option, in a fixed order
fn option_directives(options: &GenerationOptions) -> Vec<String> {
    let mut directives = Vec::with_capacity(5);

    directives.push(if options.include_setup {
        "Include setup: start the browser and open the page under test before each test".to_string()
    } else {
        "Do not include a separate setup section".to_string()
    });
    directives.push(if options.include_teardown {
        "Include teardown: close the browser after each test".to_string()
    } else {
        "Do not include a separate teardown section".to_string()
    });
    directives.push(if options.headless {
        "Run the browser headless".to_string()
    } else {
        "Run the browser headed (visible window)".to_string()
    });
    directives.push(format!("Use browser: {}", options.browser));
    directives.push(format!("Default timeout: {} ms", options.timeout_ms));

    directives
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Browser;

    fn build(options: &GenerationOptions) -> String {
        PromptBuilder::new().build(
            "User logs in with valid credentials",
            Framework::Playwright,
            Language::TypeScript,
            options,
            &TargetContext::default(),
        )
    }

    #[test]
    fn test_prompt_contains_inputs() {
        let prompt = build(&GenerationOptions::default());
        assert!(prompt.contains("Scenario: User logs in with valid credentials"));
        assert!(prompt.contains("- Framework: Playwright"));
        assert!(prompt.contains("- Language: TypeScript"));
        assert!(prompt.contains("Include setup"));
        assert!(prompt.contains("Include teardown"));
        assert!(prompt.contains("Run the browser headless"));
        assert!(prompt.contains("Use browser: chromium"));
        assert!(prompt.contains("Default timeout: 30000 ms"));
        assert!(prompt.contains("```typescript"));
    }

    #[test]
    fn test_prompt_reflects_disabled_options() {
        let options = GenerationOptions {
            include_setup: false,
            include_teardown: false,
            headless: false,
            browser: Browser::Firefox,
            timeout_ms: 5000,
            ..GenerationOptions::default()
        };
        let prompt = build(&options);
        assert!(prompt.contains("Do not include a separate setup section"));
        assert!(prompt.contains("Do not include a separate teardown section"));
        assert!(prompt.contains("headed"));
        assert!(prompt.contains("Use browser: firefox"));
        assert!(prompt.contains("Default timeout: 5000 ms"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let options = GenerationOptions::default();
        assert_eq!(build(&options), build(&options));
    }

    #[test]
    fn test_target_context_lines() {
        let target = TargetContext {
            website_url: Some("https://shop.example.com".to_string()),
            base_url: Some("https://staging.example.com:8443".to_string()),
        };
        let prompt = PromptBuilder::new().build(
            "Checkout",
            Framework::Selenium,
            Language::Java,
            &GenerationOptions::default(),
            &target,
        );
        assert!(prompt.contains("Website: https://shop.example.com\n"));
        assert!(prompt.contains("Base URL: https://staging.example.com:8443\n"));
        assert!(!build(&GenerationOptions::default()).contains("Website:"));
    }
}
