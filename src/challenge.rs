//! Challenge data: target words, level-scoped rule context and the precomputed hint store.
//!
//! Everything here is loaded once before a run and then only read, so it can be shared
//! between workers behind an `Arc` without synchronisation.

use std::{collections::HashMap, fs, path::Path, sync::Arc};

use anyhow::{bail, Context};
use tracing::{info, instrument};

use crate::rules::RuleBook;

/// A target word and the taboo words its hints must not reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeWord {
    /// The word the guesser has to find.
    pub target: String,
    /// Words the hint must not contain.
    pub taboo: Vec<String>,
}

impl ChallengeWord {
    /// Creates a challenge word.
    pub fn new(target: impl Into<String>, taboo: Vec<String>) -> Self {
        Self {
            target: target.into(),
            taboo,
        }
    }
}

/// Parses a word list where each line reads `target:taboo_1:taboo_2:...`.
///
/// Every word is trimmed and lowercased. Blank lines and empty taboo entries are skipped.
pub fn parse_word_list(text: &str) -> anyhow::Result<Vec<ChallengeWord>> {
    let mut words = vec![];
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.split(':').map(|w| w.trim().to_lowercase());
        let target = parts.next().unwrap_or_default();
        if target.is_empty() {
            bail!("Line {}: missing target word", i + 1);
        }
        let taboo = parts.filter(|w| !w.is_empty()).collect();
        words.push(ChallengeWord { target, taboo });
    }
    Ok(words)
}

/// Parses the level 3 admissible hints, one literal hint per line.
pub fn parse_hint_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Translation dictionary used at level 2, keyed by the capitalized target word.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translations(HashMap<String, String>);

impl Translations {
    /// Parses a JSON object mapping capitalized words to their translation.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let map: HashMap<String, String> =
            serde_json::from_str(json).context("translations must be a JSON object of strings")?;
        Ok(Self(map))
    }

    /// The translation stored under the capitalized form of `word` (`"medico"` -> `"Medico"`).
    pub fn get_capitalized(&self, word: &str) -> Option<&str> {
        self.0.get(&capitalize(word)).map(String::as_str)
    }

    /// The translation stored under `word` itself, falling back to its capitalized form.
    pub fn lookup(&self, word: &str) -> Option<&str> {
        self.0
            .get(word)
            .map(String::as_str)
            .or_else(|| self.get_capitalized(word))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, String>> for Translations {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

fn capitalize(word: &str) -> String {
    let lowered = word.to_lowercase();
    let mut chars = lowered.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Precomputed hint embeddings, searched by agents at level 3.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingStore(HashMap<String, Vec<f32>>);

impl EmbeddingStore {
    /// Parses a JSON object mapping hint texts to their embedding vector.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let map: HashMap<String, Vec<f32>> = serde_json::from_str(json)
            .context("embedding store must be a JSON object of float arrays")?;
        Ok(Self(map))
    }

    /// The `k` hints closest to `query` by cosine similarity, best first.
    pub fn nearest(&self, query: &[f32], k: usize) -> Vec<String> {
        let mut scored = self
            .0
            .iter()
            .map(|(hint, embedding)| (hint, cosine_similarity(query, embedding)))
            .collect::<Vec<_>>();
        // ties broken by text so results do not depend on map order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        scored
            .into_iter()
            .take(k)
            .map(|(hint, _)| hint.clone())
            .collect()
    }

    /// Number of stored hints.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the store holds no hint.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, Vec<f32>>> for EmbeddingStore {
    fn from(map: HashMap<String, Vec<f32>>) -> Self {
        Self(map)
    }
}

/// Cosine similarity of two vectors, 0 when either has no magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// All the data shared by a run.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Challenge words, evaluated in this order at each level.
    pub words: Vec<ChallengeWord>,
    /// Level-scoped rule context.
    pub rules: RuleBook,
    /// Precomputed hint embeddings handed to agents.
    pub hints_db: Arc<EmbeddingStore>,
}

impl Dataset {
    /// Loads the four data files of a run.
    #[instrument]
    pub fn load(
        words_path: &Path,
        hints_path: &Path,
        translations_path: &Path,
        hints_db_path: &Path,
    ) -> anyhow::Result<Dataset> {
        let words = parse_word_list(&read(words_path)?)
            .with_context(|| format!("invalid word list {}", words_path.display()))?;
        let hints = parse_hint_list(&read(hints_path)?);
        let translations = Translations::from_json(&read(translations_path)?)
            .with_context(|| format!("invalid translations {}", translations_path.display()))?;
        let hints_db = EmbeddingStore::from_json(&read(hints_db_path)?)
            .with_context(|| format!("invalid hints db {}", hints_db_path.display()))?;

        info!(
            words = words.len(),
            hints = hints.len(),
            translations = translations.len(),
            embeddings = hints_db.len(),
            "dataset loaded"
        );

        Ok(Dataset {
            words,
            rules: RuleBook::new(hints, translations),
            hints_db: Arc::new(hints_db),
        })
    }
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_list_is_normalized() {
        let words = parse_word_list("Medico: Ospedale :CURA\n\npane:forno::\n").unwrap();
        assert_eq!(
            words,
            vec![
                ChallengeWord::new("medico", vec!["ospedale".into(), "cura".into()]),
                ChallengeWord::new("pane", vec!["forno".into()]),
            ]
        );
    }

    #[test]
    fn word_list_rejects_missing_target() {
        let err = parse_word_list("medico:cura\n :forno").unwrap_err();
        assert!(err.to_string().contains("Line 2"));
    }

    #[test]
    fn hint_list_skips_blank_lines() {
        assert_eq!(
            parse_hint_list("  camice bianco \n\nlavora in corsia\n"),
            vec!["camice bianco", "lavora in corsia"]
        );
    }

    #[test]
    fn translations_lookup_forms() {
        let t = Translations::from_json(r#"{"Medico": "docteur", "pane": "pain"}"#).unwrap();
        assert_eq!(t.get_capitalized("MEDICO"), Some("docteur"));
        assert_eq!(t.get_capitalized("pane"), None);
        assert_eq!(t.lookup("pane"), Some("pain"));
        assert_eq!(t.lookup("medico"), Some("docteur"));
        assert!(Translations::from_json("[1, 2]").is_err());
    }

    #[test]
    fn nearest_ranks_by_cosine() {
        let store = EmbeddingStore::from_json(
            r#"{"north": [0.0, 1.0], "east": [1.0, 0.0], "north-east": [1.0, 1.0]}"#,
        )
        .unwrap();
        assert_eq!(store.nearest(&[0.1, 1.0], 2), vec!["north", "north-east"]);
        assert_eq!(store.nearest(&[1.0, 0.0], 1), vec!["east"]);
        assert_eq!(store.nearest(&[1.0, 0.0], 10).len(), 3);
    }

    #[test]
    fn cosine_of_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert!((cosine_similarity(&[2.0, 0.0], &[5.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
