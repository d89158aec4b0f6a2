#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use regex::Regex;

use crate::error::ConfigError;

/// Default extraction rule: the first decimal with exactly two fraction
/// digits.
pub const DEFAULT_EXTRACT_PATTERN: &str = r"\d+\.\d{2}";

/// Reduces raw program output to the value that is compared.
///
/// The same extractor is applied to expected and actual output.
pub trait Extractor {
    /// Returns the comparable value found in `text`, if any.
    fn extract(&self, text: &str) -> Option<String>;
}

/// Extracts the first match of a regular expression from the trimmed,
/// lowercased text.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    /// compiled rule
    regex: Regex,
}

impl PatternExtractor {
    /// Compiles `pattern` into an extractor.
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            name: "extraction rule".to_string(),
            source,
        })?;
        Ok(Self { regex })
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_EXTRACT_PATTERN).expect("default extraction pattern is valid")
    }
}

impl Extractor for PatternExtractor {
    fn extract(&self, text: &str) -> Option<String> {
        let normalized = text.trim().to_lowercase();
        self.regex
            .find(&normalized)
            .map(|m| m.as_str().to_string())
    }
}

impl<E: Extractor + ?Sized> Extractor for Box<E> {
    fn extract(&self, text: &str) -> Option<String> {
        (**self).extract(text)
    }
}
