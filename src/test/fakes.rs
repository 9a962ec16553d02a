use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::cores::errors::AnalyzeError;
use crate::cores::schemas::ChatMessage;
use crate::cores::vision_models::vision_controller::VisionCompletions;

// Replays canned answers in order and records every request it receives.
pub struct ScriptedModel {
    answers: Mutex<VecDeque<Result<String, AnalyzeError>>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    pub fn new(answers: Vec<Result<String, AnalyzeError>>) -> Self {
        ScriptedModel {
            answers: Mutex::new(answers.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionCompletions for ScriptedModel {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AnalyzeError> {
        self.calls.lock().unwrap().push(messages);
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AnalyzeError::Upstream("no scripted answer left".into())))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
