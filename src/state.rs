use std::sync::Arc;

use crate::{
    auth::jwt::JwtService,
    config::AppConfig,
    lifecycle::{
        audit::AuditRecorder, distribution::DistributionRuleResolver,
        notification::NotificationDispatcher, DocumentLifecycleEngine,
    },
    store::MemoryStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtService,
    pub store: Arc<MemoryStore>,
    pub engine: Arc<DocumentLifecycleEngine>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<MemoryStore>, jwt: JwtService) -> Self {
        let resolver =
            DistributionRuleResolver::new(store.clone(), config.notify_document_owner);
        let dispatcher = NotificationDispatcher::new(store.clone(), store.clone());
        let audit = AuditRecorder::new(store.clone());
        let engine = Arc::new(DocumentLifecycleEngine::new(
            store.clone(),
            resolver,
            dispatcher,
            audit,
        ));

        Self {
            config: Arc::new(config),
            jwt,
            store,
            engine,
        }
    }
}
