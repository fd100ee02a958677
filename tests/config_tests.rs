use std::fs;
use tempfile::TempDir;
use testforge::common::CommonParams;
use testforge::config::Config;
use testforge::{Browser, Framework, Language, Provider};

fn config_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("testforge").join("config.toml")
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = TempDir::new().expect("Failed to create temporary directory");
    let config = Config::load_from(&config_path(&dir)).expect("defaults");

    assert_eq!(config.default_provider, "openai");
    assert_eq!(config.providers.len(), Provider::ALL.len());
    assert_eq!(config.generation.framework, Framework::Playwright);
    assert_eq!(config.generation.concurrency, 1);
    assert_eq!(config.generation.max_retries, 0);
    assert!(!config.retry_policy().is_enabled());
}

#[test]
fn test_save_and_reload() {
    let dir = TempDir::new().expect("Failed to create temporary directory");
    let path = config_path(&dir);

    let mut config = Config::default();
    config
        .update(
            Some("anthropic".to_string()),
            Some("sk-ant-123".to_string()),
            Some("claude-haiku".to_string()),
            None,
        )
        .expect("update");
    config.generation.language = Language::TypeScript;
    config.generation.browser = Browser::Firefox;
    config.generation.max_retries = 2;
    config.save_to(&path).expect("save");
    assert!(path.exists());

    let loaded = Config::load_from(&path).expect("reload");
    assert_eq!(loaded.default_provider, "anthropic");
    let settings = loaded
        .get_provider_settings(Provider::Anthropic)
        .expect("anthropic settings");
    assert_eq!(settings.api_key, "sk-ant-123");
    assert_eq!(settings.model, "claude-haiku");
    assert_eq!(loaded.generation.language, Language::TypeScript);
    assert_eq!(loaded.generation.browser, Browser::Firefox);
    assert_eq!(loaded.retry_policy().max_attempts, 3);
}

#[test]
fn test_aliases_are_normalized_on_load() {
    let dir = TempDir::new().expect("Failed to create temporary directory");
    let path = config_path(&dir);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(
        &path,
        r#"
default_provider = "claude"

[providers.claude]
api_key = "from-alias"
model = "claude-opus"

[providers.local]
model = "mistral"
endpoint = "http://gpu-box:11434"

[generation]
framework = "selenium"
language = "java"
"#,
    )
    .expect("write config");

    let config = Config::load_from(&path).expect("load");
    assert_eq!(config.default_provider, "anthropic");
    assert!(config.providers.contains_key("anthropic"));
    assert!(!config.providers.contains_key("claude"));
    assert!(config.providers.contains_key("ollama"));
    assert_eq!(config.generation.framework, Framework::Selenium);
    assert_eq!(config.generation.timeout_ms, 30_000);

    let ollama = config.provider_config(Some("ollama")).expect("ollama");
    assert_eq!(ollama.model, "mistral");
    assert_eq!(ollama.endpoint, "http://gpu-box:11434");
    assert!(ollama.validate().is_ok());
}

#[test]
fn test_invalid_toml_is_reported() {
    let dir = TempDir::new().expect("Failed to create temporary directory");
    let path = dir.path().join("config.toml");
    fs::write(&path, "default_provider = [").expect("write config");

    let err = Config::load_from(&path).expect_err("broken file");
    assert!(format!("{err:#}").contains("Invalid config file format"));
}

#[test]
fn test_provider_config_uses_stored_settings() {
    let mut config = Config::default();
    config
        .update(
            Some("gemini".to_string()),
            Some("g-key".to_string()),
            None,
            Some("https://proxy.example.com/v1beta".to_string()),
        )
        .expect("update");
    if let Some(settings) = config.providers.get_mut("google") {
        settings.max_tokens = Some(4096);
    }

    let provider = config.provider_config(None).expect("provider config");
    assert_eq!(provider.provider, Provider::Google);
    assert_eq!(provider.api_key.expose(), "g-key");
    assert_eq!(provider.endpoint, "https://proxy.example.com/v1beta");
    assert_eq!(provider.model, "gemini-2.5-flash");
    assert_eq!(provider.max_tokens, 4096);
}

#[test]
fn test_unknown_provider_is_rejected() {
    let mut config = Config::default();
    assert!(config.update(Some("watsonx".to_string()), None, None, None).is_err());
    assert!(config.provider_config(Some("watsonx")).is_err());
}

#[test]
fn test_common_params_override_config() {
    let config = Config::default();
    let common = CommonParams {
        provider: Some("ollama".to_string()),
        model: Some("codellama".to_string()),
        endpoint: None,
    };

    let provider = common.provider_config(&config).expect("provider config");
    assert_eq!(provider.provider, Provider::Ollama);
    assert_eq!(provider.model, "codellama");
    assert_eq!(provider.endpoint, "http://localhost:11434");
}

#[test]
fn test_generation_options_follow_defaults() {
    let mut config = Config::default();
    config.generation.headless = false;
    config.generation.timeout_ms = 10_000;

    let options = config.generation_options();
    assert!(!options.headless);
    assert_eq!(options.timeout_ms, 10_000);
    assert!(options.include_setup);
}
