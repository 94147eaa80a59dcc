use crate::config::AppConfig;
use crate::service::DocumentService;

#[derive(Clone)]
pub struct AppState {
    pub service: DocumentService,
    pub config: AppConfig,
}
