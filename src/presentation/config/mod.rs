mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    DefaultsSettings, JobSettings, LoggingSettings, ProviderSettings, ProvidersSettings,
    SegmenterSettings, ServerSettings, Settings,
};
