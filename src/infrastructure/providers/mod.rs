mod assemblyai;
mod classify;
mod gemini;
mod openai_gpt4o;
mod openai_whisper;
mod provider_factory;

pub use assemblyai::AssemblyAiProvider;
pub use classify::{classify_request_error, classify_status};
pub use gemini::GeminiProvider;
pub use openai_gpt4o::OpenAiGpt4oProvider;
pub use openai_whisper::OpenAiWhisperProvider;
pub use provider_factory::{ProviderConfig, ProviderFactory};
