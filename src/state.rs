use std::sync::Arc;

use crate::config::Config;
use crate::database::RegistrationStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn RegistrationStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn RegistrationStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}
