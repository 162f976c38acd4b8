use std::str::FromStr;

use serde::Deserialize;

use super::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub segmenter: SegmenterSettings,
    pub providers: ProvidersSettings,
    pub jobs: JobSettings,
    pub defaults: DefaultsSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_mb: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SegmenterSettings {
    pub max_chunk_ms: u64,
    pub min_silence_ms: u64,
    pub silence_threshold: f32,
    pub lookback_ms: u64,
    pub boundary_guard_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobSettings {
    pub max_active_jobs: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsSettings {
    pub api_choice: String,
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub concurrency: usize,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    pub request_timeout_secs: u64,
    pub max_context_len: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersSettings {
    pub assemblyai: ProviderSettings,
    pub whisper: ProviderSettings,
    pub gpt4o: ProviderSettings,
    pub gemini: ProviderSettings,
}

impl Settings {
    /// Reads everything from the environment with production-sensible
    /// defaults; only `APP_ENV` can fail, on an unknown environment name.
    pub fn from_env() -> Result<(Self, Environment), String> {
        let environment =
            Environment::try_from(std::env::var("APP_ENV").unwrap_or_else(|_| "local".to_string()))?;

        let settings = Self {
            server: ServerSettings {
                host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env_parse("SERVER_PORT", 3000),
                max_upload_mb: env_parse("MAX_UPLOAD_MB", 512),
            },
            segmenter: SegmenterSettings {
                max_chunk_ms: env_parse("CHUNK_LENGTH_MS", 10 * 60 * 1000),
                min_silence_ms: env_parse("MIN_SILENCE_MS", 600),
                silence_threshold: env_parse("SILENCE_THRESHOLD", 0.015),
                lookback_ms: env_parse("CUT_LOOKBACK_MS", 20_000),
                boundary_guard_ms: env_parse("BOUNDARY_GUARD_MS", 300),
            },
            providers: ProvidersSettings {
                assemblyai: ProviderSettings::from_env("ASSEMBLYAI", "ASSEMBLYAI_API_KEY", 4, 0),
                whisper: ProviderSettings::from_env("WHISPER", "OPENAI_API_KEY", 4, 896),
                gpt4o: ProviderSettings::from_env("GPT4O", "OPENAI_API_KEY", 4, 896),
                gemini: ProviderSettings::from_env("GEMINI", "GEMINI_API_KEY", 3, 2000),
            },
            jobs: JobSettings {
                max_active_jobs: env_parse("MAX_ACTIVE_JOBS", 10),
            },
            defaults: DefaultsSettings {
                api_choice: std::env::var("DEFAULT_TRANSCRIBE_API")
                    .unwrap_or_else(|_| "gpt4o".to_string()),
                language: std::env::var("DEFAULT_LANGUAGE").unwrap_or_else(|_| "auto".to_string()),
            },
            logging: LoggingSettings {
                level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                enable_json: std::env::var("LOG_FORMAT")
                    .map(|v| v.to_lowercase() == "json")
                    .unwrap_or(false),
            },
        };

        Ok((settings, environment))
    }
}

impl ProviderSettings {
    fn from_env(
        prefix: &str,
        api_key_var: &str,
        default_concurrency: usize,
        default_context_len: usize,
    ) -> Self {
        Self {
            api_key: std::env::var(api_key_var).unwrap_or_default(),
            base_url: std::env::var(format!("{}_BASE_URL", prefix)).ok(),
            model: std::env::var(format!("{}_MODEL", prefix)).ok(),
            concurrency: env_parse(&format!("{}_MAX_CONCURRENCY", prefix), default_concurrency),
            max_attempts: env_parse(&format!("{}_MAX_ATTEMPTS", prefix), 3),
            backoff_base_ms: env_parse(&format!("{}_BACKOFF_BASE_MS", prefix), 500),
            backoff_cap_ms: env_parse(&format!("{}_BACKOFF_CAP_MS", prefix), 8_000),
            request_timeout_secs: env_parse(&format!("{}_REQUEST_TIMEOUT_SECS", prefix), 300),
            max_context_len: env_parse(&format!("{}_MAX_CONTEXT_LEN", prefix), default_context_len),
        }
    }
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
