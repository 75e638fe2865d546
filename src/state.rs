use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::availability::AvailabilityBackend;
use crate::services::messaging::MessagingProvider;
use crate::services::session::SessionStore;

pub struct AppState {
    pub config: AppConfig,
    pub sessions: SessionStore,
    pub availability: Arc<dyn AvailabilityBackend>,
    pub messaging: Box<dyn MessagingProvider>,
}
