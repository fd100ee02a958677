use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Browser automation framework the generated test targets
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Framework {
    #[default]
    Playwright,
    Selenium,
}

impl Framework {
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Playwright => "Playwright",
            Self::Selenium => "Selenium",
        }
    }
}

/// Programming language of the generated test
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Language {
    #[default]
    Python,
    JavaScript,
    TypeScript,
    Java,
    #[strum(to_string = "csharp", serialize = "c#", serialize = "cs")]
    #[serde(rename = "csharp", alias = "c#")]
    CSharp,
}

impl Language {
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Python => "Python",
            Self::JavaScript => "JavaScript",
            Self::TypeScript => "TypeScript",
            Self::Java => "Java",
            Self::CSharp => "C#",
        }
    }

    /// Source file extension, including the leading dot
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Python => ".py",
            Self::JavaScript => ".js",
            Self::TypeScript => ".ts",
            Self::Java => ".java",
            Self::CSharp => ".cs",
        }
    }

    /// Info string used on fenced code blocks
    pub const fn fence_tag(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Java => "java",
            Self::CSharp => "csharp",
        }
    }
}

/// Browser the generated test should drive
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_language_parsing() {
        assert_eq!("python".parse::<Language>().ok(), Some(Language::Python));
        assert_eq!(
            "TypeScript".parse::<Language>().ok(),
            Some(Language::TypeScript)
        );
        assert_eq!("c#".parse::<Language>().ok(), Some(Language::CSharp));
        assert_eq!(Language::CSharp.to_string(), "csharp");
        assert_eq!(Language::JavaScript.to_string(), "javascript");
        assert!("rust".parse::<Language>().is_err());
    }

    #[test]
    fn test_extensions() {
        let extensions: Vec<&str> = Language::iter().map(Language::extension).collect();
        assert_eq!(extensions, vec![".py", ".js", ".ts", ".java", ".cs"]);
    }

    #[test]
    fn test_framework_and_browser_parsing() {
        assert_eq!(
            "Selenium".parse::<Framework>().ok(),
            Some(Framework::Selenium)
        );
        assert!("cypress".parse::<Framework>().is_err());
        assert_eq!("webkit".parse::<Browser>().ok(), Some(Browser::Webkit));
        assert_eq!(Browser::Firefox.to_string(), "firefox");
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Language::CSharp).expect("serialize language");
        assert_eq!(json, "\"csharp\"");
        let parsed: Language = serde_json::from_str("\"javascript\"").expect("parse language");
        assert_eq!(parsed, Language::JavaScript);
    }
}
