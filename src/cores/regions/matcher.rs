use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::configs::settings::AnalysisConfig;
use crate::cores::regions::similarity::sequence_ratio;
use crate::cores::regions::table::{TraitEntry, TraitTable};

static CLAUSE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)[.,;:!?\n]+|\band\b").unwrap());

#[derive(Debug, Clone)]
pub struct RegionMatcher {
    table: Arc<TraitTable>,
    top_n: usize,
    fuzzy_threshold: f64,
    default_region: Option<String>,
}

impl RegionMatcher {
    pub fn new(table: Arc<TraitTable>, top_n: usize, fuzzy_threshold: f64, default_region: Option<String>) -> Self {
        RegionMatcher {
            table,
            top_n: top_n.max(1),
            fuzzy_threshold,
            default_region,
        }
    }

    pub fn from_config(table: Arc<TraitTable>, config: &AnalysisConfig) -> Self {
        Self::new(table, config.top_n, config.fuzzy_threshold, config.default_region.clone())
    }

    // Entries whose phrase occurs in `text` as whole words, in table order.
    pub fn match_phrases(&self, text: &str) -> Vec<&TraitEntry> {
        self.table
            .traits()
            .iter()
            .filter(|t| t.pattern.is_match(text))
            .map(|t| &t.entry)
            .collect()
    }

    // Best phrase by similarity against word runs of each clause, if it clears the threshold.
    pub fn best_fuzzy(&self, text: &str) -> Option<(&TraitEntry, f64)> {
        let lowered = text.to_lowercase();
        let clauses: Vec<Vec<&str>> = CLAUSE_SPLIT
            .split(&lowered)
            .map(|clause| clause.split_whitespace().collect::<Vec<_>>())
            .filter(|words| !words.is_empty())
            .collect();

        let mut best: Option<(&TraitEntry, f64)> = None;
        for compiled in self.table.traits() {
            let phrase_words = compiled.phrase_lower.split_whitespace().count();
            for words in &clauses {
                for window in phrase_windows(words, phrase_words) {
                    let score = sequence_ratio(&window, &compiled.phrase_lower);
                    if best.map_or(true, |(_, top)| score > top) {
                        best = Some((&compiled.entry, score));
                    }
                }
            }
        }
        best.filter(|(_, score)| *score >= self.fuzzy_threshold)
    }

    // Most associated regions for `text`, most frequent first.
    pub fn top_regions(&self, text: &str) -> Vec<String> {
        let matched = self.match_phrases(text);
        if matched.is_empty() {
            return match self.best_fuzzy(text) {
                Some((entry, _)) => entry.regions.iter().take(1).cloned().collect(),
                None => self.default_region.iter().cloned().collect(),
            };
        }

        // Count per region, remembering first appearance for ties.
        let mut counts: Vec<(&str, usize)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for entry in matched {
            for region in &entry.regions {
                match index.get(region.as_str()).copied() {
                    Some(i) => counts[i].1 += 1,
                    None => {
                        index.insert(region.as_str(), counts.len());
                        counts.push((region.as_str(), 1));
                    }
                }
            }
        }

        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.into_iter().take(self.top_n).map(|(region, _)| region.to_string()).collect()
    }
}

// Runs of consecutive words sized like the phrase: one word shorter (but never a single
// word for a multi-word phrase) up to one word longer. A clause shorter than a run is taken whole.
fn phrase_windows(words: &[&str], phrase_words: usize) -> Vec<String> {
    let smallest = phrase_words.saturating_sub(1).max(phrase_words.min(2));
    let mut windows = Vec::new();
    for size in smallest..=phrase_words + 1 {
        if words.len() <= size {
            windows.push(words.join(" "));
            break;
        }
        windows.extend(words.windows(size).map(|run| run.join(" ")));
    }
    windows
}
