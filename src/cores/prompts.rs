use crate::configs::settings::PromptOverrides;
use crate::cores::schemas::ChatMessage;

pub const SYSTEM_PROMPT: &str = "You are a morphological feature analysis model. You only analyze anatomical traits and describe patterns \
observed in the image using population-level morphological data. You avoid cultural, political, or identity-based assumptions.";

pub const USER_PROMPT: &str = "Use a scientific and anatomical approach to describe the visible facial features in the image. \
Consider traits such as craniofacial proportions, skin pigmentation, eye morphology, and hair texture. \
Describe how these traits may be similar to those observed in specific regional morphological clusters \
based on population-level trait datasets, without making assumptions about identity, race, or origin. \
Do not use nationality or cultural terms. Frame your reasoning as pattern-based classification, not sociological interpretation.";

pub const TRAIT_EXTRACTION_PROMPT: &str = "List the visible facial traits in the image as short anatomical phrases, \
one per line (for example: broad nasal base, deep-set eyes, high cheekbones). \
Describe only what is observable. Do not speculate about identity, nationality, or culture.";

pub const CLASSIFICATION_PROMPT: &str = "The following anatomical traits were observed in a photograph:\n\n{traits}\n\n\
Using population-level morphological trait datasets, describe which regional morphological clusters these traits \
are most commonly observed in. Frame the answer as pattern-based classification, not sociological interpretation.";

// Prompt text for one analysis; defaults can be replaced from config.
#[derive(Debug, Clone)]
pub struct AnalysisPrompts {
    pub system: String,
    pub user: String,
    pub trait_extraction: String,
    pub classification: String,
}

impl Default for AnalysisPrompts {
    fn default() -> Self {
        AnalysisPrompts {
            system: SYSTEM_PROMPT.to_string(),
            user: USER_PROMPT.to_string(),
            trait_extraction: TRAIT_EXTRACTION_PROMPT.to_string(),
            classification: CLASSIFICATION_PROMPT.to_string(),
        }
    }
}

impl From<&PromptOverrides> for AnalysisPrompts {
    fn from(overrides: &PromptOverrides) -> Self {
        let defaults = AnalysisPrompts::default();
        AnalysisPrompts {
            system: overrides.system.clone().unwrap_or(defaults.system),
            user: overrides.user.clone().unwrap_or(defaults.user),
            trait_extraction: overrides.trait_extraction.clone().unwrap_or(defaults.trait_extraction),
            classification: overrides.classification.clone().unwrap_or(defaults.classification),
        }
    }
}

impl AnalysisPrompts {
    // Single-step analysis: system instruction plus the user instruction with the image attached.
    pub fn build_image_messages(&self, data_url: String, detail: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user_with_image(self.user.clone(), data_url, detail),
        ]
    }

    pub fn build_trait_extraction_messages(&self, data_url: String, detail: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user_with_image(self.trait_extraction.clone(), data_url, detail),
        ]
    }

    pub fn build_classification_messages(&self, traits: &str) -> Vec<ChatMessage> {
        let prompt = if self.classification.contains("{traits}") {
            self.classification.replace("{traits}", traits.trim())
        } else {
            format!("{}\n\n{}", self.classification, traits.trim())
        };
        vec![ChatMessage::system(self.system.clone()), ChatMessage::user(prompt)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cores::schemas::{ContentPart, MessageContent};

    #[test]
    fn image_messages_carry_system_text_and_image() {
        let prompts = AnalysisPrompts::default();
        let messages = prompts.build_image_messages("data:image/jpeg;base64,AA==".into(), "high");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, MessageContent::Text(SYSTEM_PROMPT.to_string()));
        match &messages[1].content {
            MessageContent::Parts(parts) => {
                assert_eq!(parts[0], ContentPart::Text { text: USER_PROMPT.to_string() });
                match &parts[1] {
                    ContentPart::ImageUrl { image_url } => {
                        assert_eq!(image_url.url, "data:image/jpeg;base64,AA==");
                        assert_eq!(image_url.detail, "high");
                    }
                    other => panic!("unexpected part {:?}", other),
                }
            }
            other => panic!("unexpected content {:?}", other),
        }
    }

    #[test]
    fn classification_inlines_traits() {
        let prompts = AnalysisPrompts::default();
        let messages = prompts.build_classification_messages("  broad nasal base\ndeep-set eyes\n");

        match &messages[1].content {
            MessageContent::Text(text) => {
                assert!(text.contains("broad nasal base\ndeep-set eyes"));
                assert!(!text.contains("{traits}"));
            }
            other => panic!("unexpected content {:?}", other),
        }
    }

    #[test]
    fn overrides_replace_only_given_prompts() {
        let overrides = PromptOverrides {
            user: Some("What is in this image?".into()),
            classification: Some("Classify:".into()),
            ..Default::default()
        };
        let prompts = AnalysisPrompts::from(&overrides);
        assert_eq!(prompts.user, "What is in this image?");
        assert_eq!(prompts.system, SYSTEM_PROMPT);

        let messages = prompts.build_classification_messages("hooded eyelids");
        assert_eq!(messages[1].content, MessageContent::Text("Classify:\n\nhooded eyelids".into()));
    }
}
