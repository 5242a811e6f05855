use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Default number of tropes returned per description
pub const DEFAULT_MAX_TROPES: usize = 5;

/// Trope categories, used for vocabulary files and stats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TropeCategory {
    Romance,
    Setting,
    Creature,
    Genre,
    General,
}

impl TropeCategory {
    fn from_header(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "romance" => Self::Romance,
            "setting" => Self::Setting,
            "creature" | "creatures" => Self::Creature,
            "genre" | "genres" => Self::Genre,
            _ => Self::General,
        }
    }
}

#[derive(Debug, Clone)]
struct TropeEntry {
    phrase: String,
    /// Lower-cased phrase used for matching
    needle: String,
    category: TropeCategory,
}

/// Ordered trope vocabulary with a result cap
#[derive(Debug, Clone)]
pub struct TropeDictionary {
    entries: Vec<TropeEntry>,
    /// `None` returns every match
    max_tropes: Option<usize>,
}

impl TropeDictionary {
    /// Create a dictionary with the built-in vocabulary and default cap
    pub fn new() -> Self {
        let mut dictionary = Self {
            entries: Vec::new(),
            max_tropes: Some(DEFAULT_MAX_TROPES),
        };

        dictionary.load_default_tropes();
        dictionary
    }

    /// Create an empty dictionary, to be filled with [`Self::add_trope`]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            max_tropes: Some(DEFAULT_MAX_TROPES),
        }
    }

    /// Load a vocabulary file, replacing the built-in phrases.
    ///
    /// One phrase per line; `#` starts a comment and `[category]` headers
    /// assign the category of the lines that follow.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        let mut dictionary = Self::empty();
        dictionary.parse_vocabulary(&content)?;

        if dictionary.entries.is_empty() {
            return Err(anyhow!(
                "Trope vocabulary file contains no phrases: {}",
                path.as_ref().display()
            ));
        }

        info!("📚 Loaded {} tropes from: {}", dictionary.len(), path.as_ref().display());
        Ok(dictionary)
    }

    /// Set the result cap; 0 means unbounded
    pub fn with_max_tropes(mut self, max_tropes: usize) -> Self {
        self.max_tropes = (max_tropes > 0).then_some(max_tropes);
        self
    }

    pub fn max_tropes(&self) -> Option<usize> {
        self.max_tropes
    }

    /// Add a phrase at the end of the vocabulary.
    /// Blank phrases and case-insensitive duplicates are skipped.
    pub fn add_trope(&mut self, category: TropeCategory, phrase: &str) -> bool {
        let phrase = phrase.trim();
        if phrase.is_empty() {
            return false;
        }

        let needle = phrase.to_lowercase();
        if self.entries.iter().any(|e| e.needle == needle) {
            debug!("Skipping duplicate trope: {}", phrase);
            return false;
        }

        self.entries.push(TropeEntry {
            phrase: phrase.to_string(),
            needle,
            category,
        });
        true
    }

    /// Tropes found in `description`, in vocabulary order, capped
    pub fn extract(&self, description: &str) -> Vec<String> {
        if description.is_empty() {
            return Vec::new();
        }

        let haystack = description.to_lowercase();
        let limit = self.max_tropes.unwrap_or(usize::MAX);

        self.entries
            .iter()
            .filter(|entry| haystack.contains(&entry.needle))
            .take(limit)
            .map(|entry| entry.phrase.clone())
            .collect()
    }

    pub fn contains_trope(&self, phrase: &str) -> bool {
        let needle = phrase.trim().to_lowercase();
        self.entries.iter().any(|e| e.needle == needle)
    }

    pub fn get_tropes(&self, category: TropeCategory) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.category == category)
            .map(|e| e.phrase.clone())
            .collect()
    }

    pub fn get_all_tropes(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.phrase.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn load_default_tropes(&mut self) {
        let romance = [
            "enemies to lovers", "friends to lovers", "slow burn", "instalove",
            "love triangle", "second chance", "fake dating", "forced proximity",
            "workplace romance", "forbidden love", "age gap", "single parent",
        ];
        let setting_and_dynamics = [
            "small town", "opposites attract", "grumpy sunshine", "found family",
            "chosen one", "magic school",
        ];
        let creatures = ["vampire", "werewolf", "fae", "dragon"];
        let genres = ["dystopian", "fantasy", "sci-fi", "contemporary", "historical"];
        let general = ["dark academia", "royal", "mafia", "billionaire", "cowboy"];

        for phrase in romance {
            self.add_trope(TropeCategory::Romance, phrase);
        }
        for phrase in setting_and_dynamics {
            self.add_trope(TropeCategory::Setting, phrase);
        }
        for phrase in creatures {
            self.add_trope(TropeCategory::Creature, phrase);
        }
        for phrase in genres {
            self.add_trope(TropeCategory::Genre, phrase);
        }
        for phrase in general {
            self.add_trope(TropeCategory::General, phrase);
        }
    }

    fn parse_vocabulary(&mut self, content: &str) -> Result<()> {
        let mut current_category = TropeCategory::General;

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') {
                if !line.ends_with(']') {
                    return Err(anyhow!("Unterminated category header on line {}: {}", number + 1, line));
                }
                current_category = TropeCategory::from_header(&line[1..line.len() - 1]);
                continue;
            }

            self.add_trope(current_category, line);
        }

        Ok(())
    }

    pub fn get_stats(&self) -> TropeDictionaryStats {
        let mut category_counts = HashMap::new();
        for entry in &self.entries {
            *category_counts.entry(entry.category).or_insert(0) += 1;
        }

        TropeDictionaryStats {
            total_tropes: self.entries.len(),
            max_tropes: self.max_tropes,
            category_counts,
        }
    }
}

impl Default for TropeDictionary {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the trope vocabulary
#[derive(Debug, Clone)]
pub struct TropeDictionaryStats {
    pub total_tropes: usize,
    pub max_tropes: Option<usize>,
    pub category_counts: HashMap<TropeCategory, usize>,
}

impl TropeDictionaryStats {
    pub fn summary(&self) -> String {
        format!(
            "Trope Dictionary Stats:\n\
            - Total tropes: {}\n\
            - Max per book: {}\n\
            - Categories: {:?}",
            self.total_tropes,
            self.max_tropes.map(|n| n.to_string()).unwrap_or_else(|| "unbounded".to_string()),
            self.category_counts
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vocabulary() {
        let dict = TropeDictionary::new();
        let stats = dict.get_stats();

        assert_eq!(stats.total_tropes, 32);
        assert_eq!(stats.max_tropes, Some(DEFAULT_MAX_TROPES));
        assert!(dict.contains_trope("Enemies To Lovers"));
        assert!(dict.contains_trope("cowboy"));
        assert!(!dict.contains_trope("space opera"));
    }

    #[test]
    fn test_extract_case_insensitive_in_vocabulary_order() {
        let dict = TropeDictionary::new();
        let tropes = dict.extract("A SMALL TOWN story where Slow Burn meets Enemies to Lovers.");

        assert_eq!(tropes, vec!["enemies to lovers", "slow burn", "small town"]);
    }

    #[test]
    fn test_extract_reports_each_phrase_once() {
        let dict = TropeDictionary::new();
        let tropes = dict.extract("vampire, vampire and another vampire");

        assert_eq!(tropes, vec!["vampire"]);
    }

    #[test]
    fn test_extract_respects_cap() {
        let dict = TropeDictionary::new();
        let text = "enemies to lovers friends to lovers slow burn instalove love triangle second chance fake dating";

        assert_eq!(dict.extract(text).len(), DEFAULT_MAX_TROPES);

        let unbounded = TropeDictionary::new().with_max_tropes(0);
        assert_eq!(unbounded.extract(text).len(), 7);

        let two = TropeDictionary::new().with_max_tropes(2);
        assert_eq!(two.extract(text), vec!["enemies to lovers", "friends to lovers"]);
    }

    #[test]
    fn test_extract_matches_inside_words() {
        let dict = TropeDictionary::new();
        assert_eq!(dict.extract("heir to the royalty of the realm"), vec!["royal"]);
    }

    #[test]
    fn test_extract_empty_description() {
        let dict = TropeDictionary::new();
        assert!(dict.extract("").is_empty());
        assert!(dict.extract("A quiet book about nothing at all.").is_empty());
    }

    #[test]
    fn test_add_trope_rejects_blank_and_duplicates() {
        let mut dict = TropeDictionary::empty();

        assert!(dict.add_trope(TropeCategory::Romance, "Fake Dating"));
        assert!(!dict.add_trope(TropeCategory::Romance, "fake dating"));
        assert!(!dict.add_trope(TropeCategory::General, "   "));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_parse_vocabulary_categories() {
        let mut dict = TropeDictionary::empty();
        dict.parse_vocabulary("# custom list\n[romance]\nmarriage of convenience\n\n[creature]\nmermaid\n")
            .unwrap();

        assert_eq!(dict.get_tropes(TropeCategory::Romance), vec!["marriage of convenience"]);
        assert_eq!(dict.get_tropes(TropeCategory::Creature), vec!["mermaid"]);
        assert!(dict.parse_vocabulary("[broken\n").is_err());
    }

    #[tokio::test]
    async fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tropes.txt");
        tokio::fs::write(&path, "[genre]\ncozy mystery\nheist\n").await.unwrap();

        let dict = TropeDictionary::from_file(&path).await.unwrap();
        assert_eq!(dict.get_all_tropes(), vec!["cozy mystery", "heist"]);

        let empty = dir.path().join("empty.txt");
        tokio::fs::write(&empty, "# nothing\n").await.unwrap();
        assert!(TropeDictionary::from_file(&empty).await.is_err());
    }
}
