/// Trope detection over free-text book descriptions
///
/// Tropes are found by case-insensitive substring search against a fixed,
/// ordered vocabulary. There is no word-boundary check, so "royal" also
/// matches "royalty".

pub mod dictionary;

pub use dictionary::{TropeCategory, TropeDictionary, TropeDictionaryStats, DEFAULT_MAX_TROPES};
