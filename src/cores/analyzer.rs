use log::debug;
use std::sync::Arc;

use crate::configs::settings::PromptMode;
use crate::cores::errors::AnalyzeError;
use crate::cores::image::ImagePayload;
use crate::cores::prompts::AnalysisPrompts;
use crate::cores::regions::matcher::RegionMatcher;
use crate::cores::vision_models::vision_controller::VisionCompletions;

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub text: String,
    pub regions: Option<Vec<String>>,
}

// Image -> prompt(s) -> completion(s) -> optional region ranking.
pub struct Analyzer {
    model: Arc<dyn VisionCompletions>,
    prompts: AnalysisPrompts,
    matcher: Option<RegionMatcher>,
    mode: PromptMode,
    detail: String,
}

impl Analyzer {
    pub fn new(
        model: Arc<dyn VisionCompletions>,
        prompts: AnalysisPrompts,
        matcher: Option<RegionMatcher>,
        mode: PromptMode,
        detail: impl Into<String>,
    ) -> Self {
        Analyzer {
            model,
            prompts,
            matcher,
            mode,
            detail: detail.into(),
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub async fn analyze(&self, image: &ImagePayload) -> Result<Analysis, AnalyzeError> {
        let data_url = image.data_url();

        let (text, searchable) = match self.mode {
            PromptMode::Single => {
                let messages = self.prompts.build_image_messages(data_url, &self.detail);
                let text = self.model.complete(messages).await?;
                (text.clone(), text)
            }
            PromptMode::Chain => {
                let messages = self.prompts.build_trait_extraction_messages(data_url, &self.detail);
                let traits = self.model.complete(messages).await?;
                debug!("extracted traits: {}", traits);

                let messages = self.prompts.build_classification_messages(&traits);
                let text = self.model.complete(messages).await?;
                let searchable = format!("{}\n{}", traits, text);
                (text, searchable)
            }
        };

        let regions = self.matcher.as_ref().map(|matcher| matcher.top_regions(&searchable));
        Ok(Analysis { text, regions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cores::regions::table::TraitTable;
    use crate::cores::schemas::MessageContent;
    use crate::test::fakes::ScriptedModel;

    fn matcher(top_n: usize) -> RegionMatcher {
        RegionMatcher::new(Arc::new(TraitTable::builtin().unwrap()), top_n, 0.6, None)
    }

    fn image() -> ImagePayload {
        ImagePayload::new(vec![0xff, 0xd8, 0xff], None, "image/jpeg")
    }

    #[actix_rt::test]
    async fn single_mode_sends_one_image_request() {
        let model = Arc::new(ScriptedModel::new(vec![Ok("Broad nasal base and deep-set eyes.".into())]));
        let analyzer = Analyzer::new(model.clone(), AnalysisPrompts::default(), Some(matcher(1)), PromptMode::Single, "high");

        let analysis = analyzer.analyze(&image()).await.unwrap();
        assert_eq!(analysis.text, "Broad nasal base and deep-set eyes.");
        assert_eq!(analysis.regions, Some(vec!["Congo Basin".to_string()]));

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        let body = serde_json::to_string(&calls[0]).unwrap();
        assert!(body.contains("data:image/jpeg;base64,/9j/"));
    }

    #[actix_rt::test]
    async fn without_matcher_regions_are_absent() {
        let model = Arc::new(ScriptedModel::new(vec![Ok("deep-set eyes".into())]));
        let analyzer = Analyzer::new(model, AnalysisPrompts::default(), None, PromptMode::Single, "low");

        let analysis = analyzer.analyze(&image()).await.unwrap();
        assert_eq!(analysis.regions, None);
    }

    #[actix_rt::test]
    async fn chain_mode_classifies_extracted_traits() {
        let model = Arc::new(ScriptedModel::new(vec![
            Ok("high cheekbones\nepicanthic fold".into()),
            Ok("These traits are common in several clusters.".into()),
        ]));
        let analyzer = Analyzer::new(model.clone(), AnalysisPrompts::default(), Some(matcher(2)), PromptMode::Chain, "high");

        let analysis = analyzer.analyze(&image()).await.unwrap();
        assert_eq!(analysis.text, "These traits are common in several clusters.");
        assert_eq!(analysis.regions, Some(vec!["East Asia".to_string(), "Central Asia".to_string()]));

        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        match &calls[1][1].content {
            MessageContent::Text(prompt) => assert!(prompt.contains("high cheekbones\nepicanthic fold")),
            other => panic!("classification step should be text only, got {:?}", other),
        }
    }

    #[actix_rt::test]
    async fn upstream_error_stops_the_chain() {
        let model = Arc::new(ScriptedModel::new(vec![Err(AnalyzeError::Upstream("Rate limit reached".into()))]));
        let analyzer = Analyzer::new(model.clone(), AnalysisPrompts::default(), Some(matcher(3)), PromptMode::Chain, "high");

        let err = analyzer.analyze(&image()).await.unwrap_err();
        assert_eq!(err.to_string(), "Rate limit reached");
        assert_eq!(model.calls().len(), 1);
    }
}
