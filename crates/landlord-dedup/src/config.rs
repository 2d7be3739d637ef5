//! Configuration for landlord-dedup
//!
//! A detector is configured once at construction time. Partial overrides
//! are substituted field by field onto the defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default duplicate threshold for names
pub const DEFAULT_THRESHOLD: f64 = 0.85;
/// Threshold used when collapsing address variants
pub const ADDRESS_THRESHOLD: f64 = 0.90;
/// Threshold used when collapsing business-name variants during a merge
pub const BUSINESS_NAME_THRESHOLD: f64 = 0.85;

/// Duplicate detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Minimum composite score for two strings to count as duplicates
    pub threshold: f64,
    /// Similarity sub-algorithms and their relative weights
    pub algorithms: AlgorithmWeights,
    /// Normalization pipeline toggles
    pub normalization: NormalizationConfig,
    /// Pre-filter restricting which pairs are compared
    pub blocking: BlockingStrategy,
    /// Refuse a match when the tokens carrying digits differ, whatever the
    /// score (house numbers, unit numbers, zip codes)
    pub match_numbers: bool,
    /// What `find_duplicates` includes in its report
    pub output: OutputConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            algorithms: AlgorithmWeights::default(),
            normalization: NormalizationConfig::default(),
            blocking: BlockingStrategy::None,
            match_numbers: false,
            output: OutputConfig::default(),
        }
    }
}

/// Enable flag and relative weight for one similarity algorithm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmConfig {
    pub enabled: bool,
    pub weight: f64,
}

impl AlgorithmConfig {
    pub fn enabled(weight: f64) -> Self {
        Self {
            enabled: true,
            weight,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            weight: 0.0,
        }
    }

    /// Weight contributed to the composite, zero when disabled
    pub(crate) fn effective_weight(&self) -> f64 {
        if self.enabled {
            self.weight
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlgorithmWeights {
    /// Bigram overlap (Dice coefficient)
    pub dice: AlgorithmConfig,
    /// Normalized Levenshtein similarity
    pub levenshtein: AlgorithmConfig,
    /// Token-set Jaccard similarity
    pub tokens: AlgorithmConfig,
}

impl Default for AlgorithmWeights {
    fn default() -> Self {
        Self {
            dice: AlgorithmConfig::enabled(1.0),
            levenshtein: AlgorithmConfig::enabled(1.0),
            tokens: AlgorithmConfig::enabled(1.0),
        }
    }
}

/// How business suffixes (LLC, INC, CORP, ...) are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuffixMode {
    /// Collapse spelling variants to one short form
    Normalize,
    /// Drop suffixes entirely
    Remove,
    /// Leave suffixes untouched
    Keep,
}

/// Normalization pipeline toggles, applied in declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// Strip one layer of surrounding straight quotes
    pub strip_quotes: bool,
    pub lowercase: bool,
    /// Fold accented letters to their ASCII base (off: pass through)
    pub remove_diacritics: bool,
    /// Whole-word replacements, matched case-insensitively
    pub replacements: BTreeMap<String, String>,
    pub suffix_mode: SuffixMode,
    /// Replace number and ordinal words with digits
    pub number_words: bool,
    /// Whole-word tokens to remove
    pub stopwords: Vec<String>,
    /// Turn ASCII punctuation into spaces
    pub strip_punctuation: bool,
    pub collapse_whitespace: bool,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            strip_quotes: true,
            lowercase: true,
            remove_diacritics: false,
            replacements: BTreeMap::new(),
            suffix_mode: SuffixMode::Normalize,
            number_words: true,
            stopwords: vec!["the".to_string(), "of".to_string(), "and".to_string()],
            strip_punctuation: true,
            collapse_whitespace: true,
        }
    }
}

/// Pre-filter limiting which pairs are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingStrategy {
    /// Compare every pair
    None,
    /// Only compare strings sharing their first normalized word
    FirstWord,
    /// Only compare strings sharing their first N normalized characters
    FirstNChars(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Emit every above-threshold pair with its similarity breakdown
    pub include_pairs: bool,
    /// Emit normalized forms alongside originals in clusters
    pub include_normalized: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            include_pairs: false,
            include_normalized: true,
        }
    }
}

/// Partial configuration; every `Some` field replaces the default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorOverrides {
    pub threshold: Option<f64>,
    pub dice: Option<AlgorithmConfig>,
    pub levenshtein: Option<AlgorithmConfig>,
    pub tokens: Option<AlgorithmConfig>,
    pub strip_quotes: Option<bool>,
    pub lowercase: Option<bool>,
    pub remove_diacritics: Option<bool>,
    pub replacements: Option<BTreeMap<String, String>>,
    pub suffix_mode: Option<SuffixMode>,
    pub number_words: Option<bool>,
    pub stopwords: Option<Vec<String>>,
    pub strip_punctuation: Option<bool>,
    pub collapse_whitespace: Option<bool>,
    pub blocking: Option<BlockingStrategy>,
    pub match_numbers: Option<bool>,
    pub include_pairs: Option<bool>,
    pub include_normalized: Option<bool>,
}

impl DetectorConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with a different duplicate threshold
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// Substitute every field set in `overrides`
    pub fn with_overrides(mut self, overrides: DetectorOverrides) -> Self {
        if let Some(threshold) = overrides.threshold {
            self.threshold = threshold;
        }
        if let Some(dice) = overrides.dice {
            self.algorithms.dice = dice;
        }
        if let Some(levenshtein) = overrides.levenshtein {
            self.algorithms.levenshtein = levenshtein;
        }
        if let Some(tokens) = overrides.tokens {
            self.algorithms.tokens = tokens;
        }

        let norm = &mut self.normalization;
        if let Some(strip_quotes) = overrides.strip_quotes {
            norm.strip_quotes = strip_quotes;
        }
        if let Some(lowercase) = overrides.lowercase {
            norm.lowercase = lowercase;
        }
        if let Some(remove_diacritics) = overrides.remove_diacritics {
            norm.remove_diacritics = remove_diacritics;
        }
        if let Some(replacements) = overrides.replacements {
            norm.replacements = replacements;
        }
        if let Some(suffix_mode) = overrides.suffix_mode {
            norm.suffix_mode = suffix_mode;
        }
        if let Some(number_words) = overrides.number_words {
            norm.number_words = number_words;
        }
        if let Some(stopwords) = overrides.stopwords {
            norm.stopwords = stopwords;
        }
        if let Some(strip_punctuation) = overrides.strip_punctuation {
            norm.strip_punctuation = strip_punctuation;
        }
        if let Some(collapse_whitespace) = overrides.collapse_whitespace {
            norm.collapse_whitespace = collapse_whitespace;
        }

        if let Some(blocking) = overrides.blocking {
            self.blocking = blocking;
        }
        if let Some(match_numbers) = overrides.match_numbers {
            self.match_numbers = match_numbers;
        }
        if let Some(include_pairs) = overrides.include_pairs {
            self.output.include_pairs = include_pairs;
        }
        if let Some(include_normalized) = overrides.include_normalized {
            self.output.include_normalized = include_normalized;
        }
        self
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load configuration from a TOML string
    #[cfg(feature = "toml-config")]
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML
    #[cfg(feature = "toml-config")]
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_threshold("threshold", self.threshold)?;

        let algorithms = [
            ("dice", &self.algorithms.dice),
            ("levenshtein", &self.algorithms.levenshtein),
            ("tokens", &self.algorithms.tokens),
        ];
        for (name, algorithm) in algorithms {
            if !algorithm.weight.is_finite() || algorithm.weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    algorithm: name.to_string(),
                    weight: algorithm.weight,
                });
            }
        }

        let total: f64 = algorithms.iter().map(|(_, a)| a.effective_weight()).sum();
        if total <= 0.0 {
            return Err(ConfigError::NoAlgorithmsEnabled);
        }

        if let BlockingStrategy::FirstNChars(0) = self.blocking {
            return Err(ConfigError::InvalidBlocking(
                "first_n_chars needs at least one character".to_string(),
            ));
        }

        Ok(())
    }
}

/// Contact merge pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Threshold for clustering owner and business names
    pub name_threshold: f64,
    /// Threshold for collapsing address variants
    pub address_threshold: f64,
    /// Threshold for collapsing business-name variants inside a merge
    pub business_name_threshold: f64,
    /// Agencies whose sub-datasets share one identity space
    pub shared_identity_agencies: Vec<String>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            name_threshold: DEFAULT_THRESHOLD,
            address_threshold: ADDRESS_THRESHOLD,
            business_name_threshold: BUSINESS_NAME_THRESHOLD,
            shared_identity_agencies: vec!["dob".to_string()],
        }
    }
}

impl MergeConfig {
    /// Defaults with a different name threshold
    pub fn with_name_threshold(name_threshold: f64) -> Self {
        Self {
            name_threshold,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_threshold("name_threshold", self.name_threshold)?;
        validate_threshold("address_threshold", self.address_threshold)?;
        validate_threshold("business_name_threshold", self.business_name_threshold)
    }
}

fn validate_threshold(name: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfRange(format!(
            "{} must be between 0.0 and 1.0, got {}",
            name, value
        )));
    }
    Ok(())
}
