use std::sync::Arc;
use std::time::Instant;

use kaleido_core::{Config, QueryCache, QueryOrchestrator};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: QueryOrchestrator,
    started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, orchestrator: QueryOrchestrator) -> Self {
        Self {
            config,
            orchestrator,
            started_at: Instant::now(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &QueryOrchestrator {
        &self.orchestrator
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        self.orchestrator.cache()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
