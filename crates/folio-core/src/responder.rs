use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ResponseError;
use crate::knowledge::KnowledgeBase;

pub const DEFAULT_RESPONSE_DELAY: Duration = Duration::from_millis(1000);

/// Source of assistant replies for plain queries.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, query: &str) -> Result<String, ResponseError>;
}

/// Answers from the local knowledge base after a fixed delay that stands in
/// for a remote call.
#[derive(Clone)]
pub struct ResponseEngine {
    knowledge: Arc<KnowledgeBase>,
    delay: Duration,
}

impl ResponseEngine {
    pub fn new(knowledge: KnowledgeBase) -> Self {
        Self {
            knowledge: Arc::new(knowledge),
            delay: DEFAULT_RESPONSE_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }
}

#[async_trait]
impl Responder for ResponseEngine {
    async fn respond(&self, query: &str) -> Result<String, ResponseError> {
        tokio::time::sleep(self.delay).await;
        let response = self.knowledge.lookup(query);
        debug!(query_len = query.len(), "knowledge base lookup complete");
        Ok(response.to_string())
    }
}
