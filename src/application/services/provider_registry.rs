use std::collections::HashMap;
use std::sync::Arc;

use crate::application::ports::TranscriptionProvider;
use crate::domain::ProviderChoice;

use super::dispatcher::ProviderPool;

/// Closed map from provider choice to its adapter and its process-wide
/// pool. Built once at startup; the pool instance is shared by every job
/// that selects the provider.
pub struct ProviderRegistry {
    entries: HashMap<ProviderChoice, (Arc<dyn TranscriptionProvider>, Arc<ProviderPool>)>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        choice: ProviderChoice,
        provider: Arc<dyn TranscriptionProvider>,
        pool: Arc<ProviderPool>,
    ) {
        self.entries.insert(choice, (provider, pool));
    }

    pub fn get(
        &self,
        choice: ProviderChoice,
    ) -> Option<(Arc<dyn TranscriptionProvider>, Arc<ProviderPool>)> {
        self.entries
            .get(&choice)
            .map(|(p, pool)| (Arc::clone(p), Arc::clone(pool)))
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
