#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Shallow lexical analysis of submissions.
//!
//! Every rule is a regular expression counted over the raw source text, so
//! code that does not compile is still scored.

use std::{collections::BTreeMap, path::Path};

use regex::Regex;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{MapAccess, Visitor},
};

use crate::error::ConfigError;

/// Built-in rules, in reporting order.
const DEFAULT_RULES: &[(&str, &str)] = &[
    ("for_loops", r"\bfor\s*\([^)]+\)"),
    ("while_loops", r"\bwhile\s*\([^)]+\)"),
    ("if_statements", r"\bif\s*\([^)]+\)"),
    ("variable_declarations", r"\b(int|float|double)\s+\w+"),
    ("proper_datatype_usage", r"\b(int|float|double)\s+\w+"),
    ("while_syntax", r"\bwhile\s*\(\s*\w+\s*(==|!=|<|>|<=|>=)\s*\w+\s*\)"),
    ("if_syntax", r"\bif\s*\(\s*\w+\s*(==|!=|<|>|<=|>=)\s*\w+\s*\)"),
];

/// A named lexical pattern counted in every submission.
#[derive(Debug, Clone)]
pub struct PatternRule {
    /// unique rule name, used as the key in [`Analysis`]
    name:  String,
    /// compiled pattern
    regex: Regex,
}

impl PatternRule {
    /// Compiles `pattern` into a rule called `name`.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, ConfigError> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            name: name.clone(),
            source,
        })?;
        Ok(Self { name, regex })
    }

    /// Returns the rule name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Counts non-overlapping matches in `source`.
    pub fn count(&self, source: &str) -> usize {
        self.regex.find_iter(source).count()
    }
}

/// The fixed set of rules every submission is scored against.
#[derive(Debug, Clone)]
pub struct PatternSet {
    /// rules in configuration order, names unique
    rules: Vec<PatternRule>,
}

impl Default for PatternSet {
    fn default() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .map(|(name, pattern)| PatternRule::new(*name, pattern))
            .collect::<Result<Vec<_>, _>>()
            .expect("built-in pattern rules are valid");
        Self { rules }
    }
}

impl PatternSet {
    /// Builds a set from `rules`, rejecting duplicate names.
    pub fn new(rules: Vec<PatternRule>) -> Result<Self, ConfigError> {
        for (i, rule) in rules.iter().enumerate() {
            if rules[..i].iter().any(|r| r.name == rule.name) {
                return Err(ConfigError::DuplicatePattern(rule.name.clone()));
            }
        }
        Ok(Self { rules })
    }

    /// Loads rules from a JSON object mapping rule name to pattern.
    ///
    /// Rules keep their file order, and a name repeated in the file is a
    /// [`ConfigError::DuplicatePattern`].
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let file_error = |reason: String| ConfigError::PatternFile {
            path: path.to_path_buf(),
            reason,
        };

        let text = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
        let RuleEntries(entries) =
            serde_json::from_str(&text).map_err(|e| file_error(e.to_string()))?;

        let mut rules = Vec::with_capacity(entries.len());
        for (name, pattern) in entries {
            let pattern = pattern
                .as_str()
                .ok_or_else(|| file_error(format!("pattern `{name}` is not a string")))?;
            rules.push(PatternRule::new(name, pattern)?);
        }
        Self::new(rules)
    }

    /// Returns the rules in configuration order.
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Counts every rule in `source`.
    pub fn analyze(&self, source: &str) -> Analysis {
        Analysis {
            counts: self
                .rules
                .iter()
                .map(|rule| (rule.name.clone(), rule.count(source)))
                .collect(),
        }
    }

    /// An analysis with every rule present and counted as zero.
    pub fn zeroed(&self) -> Analysis {
        Analysis {
            counts: self.rules.iter().map(|r| (r.name.clone(), 0)).collect(),
        }
    }
}

/// Entries of a rule file in file order, repeated names included.
struct RuleEntries(Vec<(String, serde_json::Value)>);

impl<'de> Deserialize<'de> for RuleEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        /// Collects map entries without merging keys.
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RuleEntries;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a JSON object of rule name to pattern")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RuleEntries, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                Ok(RuleEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Occurrence counts per pattern rule for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Analysis {
    /// rule name -> non-overlapping match count
    counts: BTreeMap<String, usize>,
}

impl Analysis {
    /// Returns the count for `rule`, if the rule was part of the analysis.
    pub fn get(&self, rule: &str) -> Option<usize> {
        self.counts.get(rule).copied()
    }

    /// Iterates over `(rule, count)` pairs ordered by rule name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of rules covered.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no rules were covered.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl std::fmt::Display for Analysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let body = self
            .iter()
            .map(|(name, count)| format!("{name}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{{{body}}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_loop_and_branch_idioms() {
        let analysis = PatternSet::default().analyze("for(int i=0;i<n;i++) if(i==0) ...");
        assert_eq!(analysis.get("for_loops"), Some(1));
        assert_eq!(analysis.get("if_statements"), Some(1));
        assert_eq!(analysis.get("variable_declarations"), Some(1));
        assert_eq!(analysis.get("while_loops"), Some(0));
        assert_eq!(analysis.get("if_syntax"), Some(1));
    }

    #[test]
    fn every_rule_is_reported_for_garbage_input() {
        let set = PatternSet::default();
        let analysis = set.analyze("}}}{{ not c++ at all \u{1F600}");
        assert_eq!(analysis.len(), set.rules().len());
        assert!(analysis.iter().all(|(_, count)| count == 0));
    }

    #[test]
    fn analysis_is_deterministic() {
        let set = PatternSet::default();
        let src = "int main() { double x; while (x < 3) { x++; } }";
        assert_eq!(set.analyze(src), set.analyze(src));
        assert_eq!(set.analyze(src).get("while_syntax"), Some(1));
    }

    #[test]
    fn duplicate_rule_names_are_rejected() {
        let rules = vec![
            PatternRule::new("loops", r"for").unwrap(),
            PatternRule::new("loops", r"while").unwrap(),
        ];
        assert!(matches!(
            PatternSet::new(rules),
            Err(ConfigError::DuplicatePattern(name)) if name == "loops"
        ));
    }

    #[test]
    fn invalid_regex_is_a_config_error() {
        assert!(matches!(
            PatternRule::new("broken", "(unclosed"),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    /// Writes `contents` to a fresh file and loads it as a pattern set.
    fn load(contents: &str) -> Result<PatternSet, ConfigError> {
        let path =
            std::env::temp_dir().join(format!("codejudge-rules-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).expect("write rule file");
        let result = PatternSet::from_json_file(&path);
        let _ = std::fs::remove_file(path);
        result
    }

    #[test]
    fn rule_file_replaces_builtin_rules() {
        let set = load(r#"{"returns": "\\breturn\\b", "couts": "std::cout"}"#).expect("load");
        assert_eq!(set.rules().len(), 2);

        let analysis = set.analyze("std::cout << 1; return 0; return 1;");
        assert_eq!(analysis.get("returns"), Some(2));
        assert_eq!(analysis.get("couts"), Some(1));
        assert_eq!(analysis.get("for_loops"), None);
    }

    #[test]
    fn rule_file_must_be_an_object_of_strings() {
        assert!(matches!(
            load(r#"["for", "while"]"#),
            Err(ConfigError::PatternFile { reason, .. }) if reason.contains("JSON object")
        ));
        assert!(matches!(
            load(r#"{"loops": 3}"#),
            Err(ConfigError::PatternFile { reason, .. }) if reason.contains("`loops`")
        ));
        assert!(matches!(load("{not json"), Err(ConfigError::PatternFile { .. })));
    }

    #[test]
    fn rule_file_with_invalid_regex_names_the_rule() {
        assert!(matches!(
            load(r#"{"ok": "for", "broken": "(unclosed"}"#),
            Err(ConfigError::InvalidPattern { name, .. }) if name == "broken"
        ));
    }

    #[test]
    fn rule_file_with_repeated_name_is_rejected() {
        assert!(matches!(
            load(r#"{"loops": "for", "loops": "while"}"#),
            Err(ConfigError::DuplicatePattern(name)) if name == "loops"
        ));
    }

    #[test]
    fn missing_rule_file_is_a_config_error() {
        let missing = std::env::temp_dir().join(format!("codejudge-{}.json", uuid::Uuid::new_v4()));
        assert!(matches!(
            PatternSet::from_json_file(&missing),
            Err(ConfigError::PatternFile { .. })
        ));
    }
}
