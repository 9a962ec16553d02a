use async_trait::async_trait;

use crate::cores::errors::AnalyzeError;
use crate::cores::schemas::ChatMessage;

// A hosted chat/vision completion service: messages in, free text out.
#[async_trait]
pub trait VisionCompletions: Send + Sync {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AnalyzeError>;

    fn model_name(&self) -> &str;
}
