use std::fmt;

pub const SUPPORTED_LANGUAGE_CODES: &[&str] = &["en", "nl", "fr", "es", "ru"];

/// Language requested at submission: either automatic detection or one of
/// the supported ISO codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageHint {
    Auto,
    Code(String),
}

impl LanguageHint {
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim().to_lowercase();
        if s.is_empty() || s == "auto" {
            return Ok(LanguageHint::Auto);
        }
        if SUPPORTED_LANGUAGE_CODES.contains(&s.as_str()) {
            Ok(LanguageHint::Code(s))
        } else {
            Err(format!("Unsupported language code: {}", s))
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            LanguageHint::Auto => None,
            LanguageHint::Code(c) => Some(c),
        }
    }

    /// Language recorded on the finished transcript. Auto detection is
    /// logged as "en", matching what providers report for untagged audio.
    pub fn resolved(&self) -> &str {
        self.code().unwrap_or("en")
    }
}

impl fmt::Display for LanguageHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageHint::Auto => write!(f, "auto"),
            LanguageHint::Code(c) => write!(f, "{}", c),
        }
    }
}
