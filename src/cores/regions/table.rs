use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::fs;

use crate::cores::errors::AnalyzeError;

// Phrase -> candidate regions, in table order.
const BUILTIN_TRAITS: &[(&str, &[&str])] = &[
    ("broad nasal base", &["Congo Basin", "Eastern India", "Philippines", "West Africa"]),
    ("deep-set eyes", &["Northern Europe", "Caucasus"]),
    ("narrow nasal bridge", &["Northern Europe", "Horn of Africa", "Arabian Peninsula"]),
    ("high nasal bridge", &["Caucasus", "Mediterranean", "Northern India"]),
    ("low nasal bridge", &["East Asia", "Southeast Asia", "Arctic"]),
    ("aquiline nose", &["Mediterranean", "Arabian Peninsula", "Caucasus"]),
    ("wide nostrils", &["West Africa", "Congo Basin", "Melanesia"]),
    ("epicanthic fold", &["East Asia", "Central Asia", "Arctic"]),
    ("monolid", &["East Asia", "Central Asia"]),
    ("almond-shaped eyes", &["South Asia", "Middle East", "Central Asia"]),
    ("hooded eyelids", &["Central Asia", "Northern Europe", "East Asia"]),
    ("light-colored eyes", &["Northern Europe", "Baltic", "Caucasus"]),
    ("dark brown eyes", &["South Asia", "West Africa", "East Asia", "Mediterranean"]),
    ("high cheekbones", &["Central Asia", "East Asia", "Andes", "Arctic"]),
    ("prominent cheekbones", &["Central Asia", "Andes", "Eastern Europe"]),
    ("flat midface", &["East Asia", "Arctic"]),
    ("projecting midface", &["Horn of Africa", "West Africa"]),
    ("strong brow ridge", &["Australia", "Melanesia", "Northern Europe"]),
    ("prominent brow ridge", &["Australia", "Melanesia", "Caucasus"]),
    ("long narrow face", &["Horn of Africa", "Northern Europe", "Arabian Peninsula"]),
    ("broad face", &["Central Asia", "East Asia", "Andes"]),
    ("square jaw", &["Eastern Europe", "Northern Europe", "Balkans"]),
    ("narrow jaw", &["Horn of Africa", "South Asia"]),
    ("rounded face", &["Southeast Asia", "Polynesia", "East Asia"]),
    ("full lips", &["West Africa", "Congo Basin", "Melanesia"]),
    ("thin lips", &["Northern Europe", "Baltic", "East Asia"]),
    ("dolichocephalic", &["Horn of Africa", "Northern Europe", "South Asia"]),
    ("brachycephalic", &["Central Europe", "Central Asia", "Balkans"]),
    ("olive skin", &["Mediterranean", "Middle East", "North Africa"]),
    ("fair skin", &["Northern Europe", "Baltic", "Eastern Europe"]),
    ("light skin", &["Northern Europe", "East Asia", "Eastern Europe"]),
    ("medium brown skin", &["South Asia", "Southeast Asia", "Andes", "North Africa"]),
    ("dark skin", &["West Africa", "Congo Basin", "Southern India", "Melanesia"]),
    ("high melanin", &["West Africa", "Horn of Africa", "Southern India", "Melanesia"]),
    ("straight black hair", &["East Asia", "Southeast Asia", "Andes", "Arctic"]),
    ("coarse straight hair", &["East Asia", "Central Asia", "Andes"]),
    ("wavy hair", &["Mediterranean", "Middle East", "South Asia"]),
    ("tightly coiled hair", &["West Africa", "Congo Basin", "Horn of Africa", "Melanesia"]),
    ("curly hair", &["Mediterranean", "Middle East", "Melanesia"]),
    ("light hair", &["Northern Europe", "Baltic"]),
    ("red hair", &["Northern Europe", "British Isles"]),
    ("sparse facial hair", &["East Asia", "Andes", "Arctic"]),
    ("dense facial hair", &["Middle East", "Mediterranean", "Caucasus", "South Asia"]),
    ("prognathism", &["West Africa", "Congo Basin", "Melanesia"]),
    ("shovel-shaped incisors", &["East Asia", "Arctic", "Andes"]),
    ("double eyelids", &["Southeast Asia", "South Asia", "Mediterranean"]),
    ("wide-set eyes", &["East Asia", "Southeast Asia", "Arctic"]),
    ("close-set eyes", &["Northern Europe", "Mediterranean"]),
    ("narrow eyes", &["East Asia", "Central Asia", "Arctic"]),
    ("large round eyes", &["South Asia", "Middle East", "West Africa"]),
    ("blue eyes", &["Northern Europe", "Baltic", "Eastern Europe"]),
    ("green eyes", &["Caucasus", "British Isles", "Northern Europe"]),
    ("hazel eyes", &["Mediterranean", "Middle East", "Central Europe"]),
    ("upturned eyes", &["East Asia", "Central Asia"]),
    ("button nose", &["Southeast Asia", "Polynesia", "East Asia"]),
    ("upturned nose", &["Northern Europe", "British Isles"]),
    ("hooked nose", &["Middle East", "Arabian Peninsula", "Caucasus"]),
    ("straight nose", &["Mediterranean", "Northern Europe", "South Asia"]),
    ("bulbous nasal tip", &["Eastern Europe", "Central Asia", "Melanesia"]),
    ("long philtrum", &["Northern Europe", "Eastern Europe"]),
    ("everted lips", &["West Africa", "Congo Basin", "Melanesia"]),
    ("cupid's bow", &["Mediterranean", "South Asia"]),
    ("pointed chin", &["Horn of Africa", "South Asia", "Southeast Asia"]),
    ("cleft chin", &["Northern Europe", "Central Europe", "Balkans"]),
    ("receding chin", &["East Asia", "Southeast Asia"]),
    ("prominent chin", &["Northern Europe", "Baltic", "Balkans"]),
    ("strong jawline", &["Balkans", "Eastern Europe", "Polynesia"]),
    ("attached earlobes", &["East Asia", "Central Asia"]),
    ("detached earlobes", &["Northern Europe", "West Africa"]),
    ("large ears", &["Central Asia", "Arctic"]),
    ("protruding ears", &["Northern Europe", "Eastern Europe"]),
    ("heart-shaped face", &["South Asia", "Southeast Asia", "Mediterranean"]),
    ("oval face", &["Mediterranean", "Middle East", "South Asia"]),
    ("diamond-shaped face", &["Central Asia", "Andes"]),
    ("sloping forehead", &["Australia", "Melanesia"]),
    ("high forehead", &["Northern Europe", "Horn of Africa"]),
    ("sunken cheeks", &["Horn of Africa", "Northern Europe"]),
    ("freckles", &["British Isles", "Northern Europe"]),
    ("ruddy complexion", &["British Isles", "Northern Europe", "Eastern Europe"]),
    ("golden-brown skin", &["Southeast Asia", "Polynesia", "Andes"]),
    ("deep brown skin", &["West Africa", "Southern India", "Melanesia"]),
    ("thick wavy hair", &["Middle East", "South Asia", "Mediterranean"]),
    ("fine blond hair", &["Northern Europe", "Baltic"]),
    ("kinky hair", &["West Africa", "Congo Basin", "Melanesia"]),
];

// `\b` only where the phrase edge is a word character, so "(x)" style phrases still match.
fn word_bounded(phrase: &str) -> String {
    let is_word = |c: Option<char>| c.map_or(false, |c| c.is_alphanumeric() || c == '_');
    let start = if is_word(phrase.chars().next()) { r"\b" } else { "" };
    let end = if is_word(phrase.chars().last()) { r"\b" } else { "" };
    format!("{}{}{}", start, regex::escape(phrase), end)
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TraitEntry {
    pub phrase: String,
    pub regions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CompiledTrait {
    pub entry: TraitEntry,
    pub pattern: Regex,
    pub phrase_lower: String,
}

// Read-only after construction; shared across requests.
#[derive(Debug, Clone)]
pub struct TraitTable {
    traits: Vec<CompiledTrait>,
}

impl TraitTable {
    pub fn from_entries(entries: Vec<TraitEntry>) -> Result<TraitTable, regex::Error> {
        let mut traits = Vec::with_capacity(entries.len());
        for entry in entries {
            let phrase = entry.phrase.trim();
            if phrase.is_empty() || entry.regions.is_empty() {
                continue;
            }
            let pattern = RegexBuilder::new(&word_bounded(phrase))
                .case_insensitive(true)
                .build()?;
            let phrase_lower = phrase.to_lowercase();
            traits.push(CompiledTrait { entry, pattern, phrase_lower });
        }
        Ok(TraitTable { traits })
    }

    pub fn builtin() -> Result<TraitTable, regex::Error> {
        let entries = BUILTIN_TRAITS
            .iter()
            .map(|(phrase, regions)| TraitEntry {
                phrase: phrase.to_string(),
                regions: regions.iter().map(|r| r.to_string()).collect(),
            })
            .collect();
        Self::from_entries(entries)
    }

    pub fn from_yaml(contents: &str) -> Result<TraitTable, AnalyzeError> {
        let entries: Vec<TraitEntry> = serde_yaml::from_str(contents)
            .map_err(|err| AnalyzeError::Config(format!("Failed to parse trait table: {}", err)))?;
        Self::from_entries(entries)
            .map_err(|err| AnalyzeError::Config(format!("Failed to compile trait table: {}", err)))
    }

    pub fn from_yaml_file(path: &str) -> Result<TraitTable, AnalyzeError> {
        let contents = fs::read_to_string(path)
            .map_err(|err| AnalyzeError::Config(format!("Failed to read trait table {}: {}", path, err)))?;
        Self::from_yaml(&contents)
    }

    pub fn traits(&self) -> &[CompiledTrait] {
        &self.traits
    }

    pub fn len(&self) -> usize {
        self.traits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_compiles_every_entry() {
        let table = TraitTable::builtin().unwrap();
        assert_eq!(table.len(), BUILTIN_TRAITS.len());
        assert!(table.len() >= 80, "only {} built-in traits", table.len());
        assert_eq!(table.traits()[0].entry.phrase, "broad nasal base");
    }

    #[test]
    fn yaml_table_keeps_order_and_skips_blank_entries() {
        let table = TraitTable::from_yaml(
            "- phrase: hooded eyelids\n  regions: [Central Asia]\n\
             - phrase: \"  \"\n  regions: [Nowhere]\n\
             - phrase: a+b (test)\n  regions: [Somewhere]\n\
             - phrase: no regions\n  regions: []\n",
        )
        .unwrap();

        let phrases: Vec<&str> = table.traits().iter().map(|t| t.entry.phrase.as_str()).collect();
        assert_eq!(phrases, vec!["hooded eyelids", "a+b (test)"]);
        assert!(table.traits()[1].pattern.is_match("has A+B (test) here"));
        assert!(!table.traits()[1].pattern.is_match("has aab (test) here"));
    }

    #[test]
    fn phrases_match_on_word_boundaries_only() {
        let table = TraitTable::from_entries(vec![TraitEntry {
            phrase: "monolid".into(),
            regions: vec!["East Asia".into()],
        }])
        .unwrap();
        let pattern = &table.traits()[0].pattern;
        assert!(pattern.is_match("A Monolid, with"));
        assert!(!pattern.is_match("monolids"));
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let err = TraitTable::from_yaml("phrase: [").unwrap_err();
        assert!(matches!(err, AnalyzeError::Config(_)));
    }
}
