use std::sync::Arc;

use crate::application::ports::FileStore;
use crate::application::services::{
    ConversationService, FileService, RetrievalService, SummaryService,
};
use crate::infrastructure::persistence::Repositories;

#[derive(Clone)]
pub struct AppState {
    pub conversation_service: Arc<ConversationService>,
    pub summary_service: Arc<SummaryService>,
    pub file_service: Arc<FileService>,
    pub retrieval_service: Arc<RetrievalService>,
}

impl AppState {
    pub fn new(repositories: Repositories, file_store: Arc<dyn FileStore>) -> Self {
        let summary_service = SummaryService::new(Arc::clone(&repositories.conversations));
        let conversation_service = Arc::new(ConversationService::new(
            Arc::clone(&repositories.conversations),
            summary_service.clone(),
        ));
        let file_service = Arc::new(FileService::new(
            Arc::clone(&repositories.files),
            file_store,
        ));
        let retrieval_service = Arc::new(RetrievalService::new(Arc::clone(&file_service)));

        Self {
            conversation_service,
            summary_service: Arc::new(summary_service),
            file_service,
            retrieval_service,
        }
    }
}
