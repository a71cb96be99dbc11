//! Prompt template lookup.

use super::{RecordStore, StoreError};
use crate::models::{PromptTemplate, RecordId};
use std::sync::Arc;
use tracing::debug;

/// Reads prompt templates by id. Every call goes to the store; nothing is cached.
#[derive(Clone)]
pub struct PromptResolver {
    store: Arc<dyn RecordStore>,
}

impl PromptResolver {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, prompt_id: RecordId) -> Result<PromptTemplate, StoreError> {
        let prompt = self.store.read_prompt(prompt_id).await?;
        debug!("Resolved prompt {}", prompt);
        Ok(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_resolve_reads_through_on_every_call() {
        let store = Arc::new(MemoryStore::new());
        let resolver = PromptResolver::new(store.clone());

        let err = resolver.resolve(1).await.unwrap_err();
        assert!(err.is_not_found());

        let id = store.insert_prompt("Summary", "Summarize.", "").await;
        assert_eq!(resolver.resolve(id).await.unwrap().text, "Summarize.");

        store.remove_prompt(id).await;
        assert!(resolver.resolve(id).await.unwrap_err().is_not_found());
    }
}
