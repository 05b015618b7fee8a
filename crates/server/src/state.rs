use popcorn_core::{Config, SanitizedConfig, SessionHandle};

/// Shared application state
pub struct AppState {
    config: Config,
    session: SessionHandle,
}

impl AppState {
    pub fn new(config: Config, session: SessionHandle) -> Self {
        Self { config, session }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }
}
