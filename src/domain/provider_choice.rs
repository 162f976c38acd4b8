use std::fmt;
use std::str::FromStr;

/// Closed set of transcription backends. Adding a backend means adding a
/// variant and an adapter; the dispatcher never matches on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderChoice {
    AssemblyAi,
    Whisper,
    Gpt4o,
    Gemini,
}

impl ProviderChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderChoice::AssemblyAi => "assemblyai",
            ProviderChoice::Whisper => "whisper",
            ProviderChoice::Gpt4o => "gpt4o",
            ProviderChoice::Gemini => "gemini",
        }
    }

    pub fn all() -> &'static [ProviderChoice] {
        &[
            ProviderChoice::AssemblyAi,
            ProviderChoice::Whisper,
            ProviderChoice::Gpt4o,
            ProviderChoice::Gemini,
        ]
    }
}

impl FromStr for ProviderChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "assemblyai" => Ok(ProviderChoice::AssemblyAi),
            "whisper" => Ok(ProviderChoice::Whisper),
            "gpt4o" => Ok(ProviderChoice::Gpt4o),
            "gemini" => Ok(ProviderChoice::Gemini),
            other => Err(format!("Invalid API choice: {}", other)),
        }
    }
}

impl fmt::Display for ProviderChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
