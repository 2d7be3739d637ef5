//! Text normalization for deduplication comparison
//!
//! A normalizer is a fixed list of `&str -> String` stages built once from
//! a [`NormalizationConfig`]. Stages run in this order, each one optional:
//!
//! 1. strip one layer of surrounding quotes
//! 2. lowercase
//! 3. fold diacritics
//! 4. underscores to spaces (with punctuation stripping), so the word
//!    stages below see `the_company` as two words
//! 5. custom whole-word replacements
//! 6. business suffixes (normalize or remove)
//! 7. number and ordinal words to digits
//! 8. stopword removal
//! 9. punctuation to spaces
//! 10. whitespace collapse and trim

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use unicode_normalization::UnicodeNormalization;

use crate::config::{NormalizationConfig, SuffixMode};
use crate::error::ConfigError;

lazy_static! {
    static ref SUFFIX_PATTERN: Regex = Regex::new(
        r"(?i)\b(p\.?l\.?l\.?c|l\.?l\.?c|l\.?p|p\.?c|inc(?:orporated)?|corp(?:oration)?|ltd|limited|co(?:mpany)?)\b"
    )
    .unwrap();
    static ref NUMBER_WORDS: HashMap<&'static str, &'static str> = {
        let pairs = [
            ("zero", "0"), ("one", "1"), ("two", "2"), ("three", "3"), ("four", "4"),
            ("five", "5"), ("six", "6"), ("seven", "7"), ("eight", "8"), ("nine", "9"),
            ("ten", "10"), ("eleven", "11"), ("twelve", "12"), ("thirteen", "13"),
            ("fourteen", "14"), ("fifteen", "15"), ("sixteen", "16"), ("seventeen", "17"),
            ("eighteen", "18"), ("nineteen", "19"), ("twenty", "20"), ("thirty", "30"),
            ("forty", "40"), ("fifty", "50"), ("sixty", "60"), ("seventy", "70"),
            ("eighty", "80"), ("ninety", "90"),
            ("first", "1st"), ("second", "2nd"), ("third", "3rd"), ("fourth", "4th"),
            ("fifth", "5th"), ("sixth", "6th"), ("seventh", "7th"), ("eighth", "8th"),
            ("ninth", "9th"), ("tenth", "10th"), ("eleventh", "11th"), ("twelfth", "12th"),
            ("thirteenth", "13th"), ("fourteenth", "14th"), ("fifteenth", "15th"),
            ("sixteenth", "16th"), ("seventeenth", "17th"), ("eighteenth", "18th"),
            ("nineteenth", "19th"), ("twentieth", "20th"), ("thirtieth", "30th"),
            ("fortieth", "40th"), ("fiftieth", "50th"), ("sixtieth", "60th"),
            ("seventieth", "70th"), ("eightieth", "80th"), ("ninetieth", "90th"),
        ];
        pairs.into_iter().collect()
    };
    static ref NUMBER_PATTERN: Regex = Regex::new(&word_alternation(
        NUMBER_WORDS.keys().map(|word| word.to_string())
    ))
    .unwrap();
}

/// One stage of the normalization pipeline
#[derive(Debug)]
enum Stage {
    StripQuotes,
    Lowercase,
    FoldDiacritics,
    SplitUnderscores,
    Replace {
        pattern: Regex,
        table: HashMap<String, String>,
    },
    Suffixes {
        mode: SuffixMode,
        uppercase: bool,
    },
    NumberWords,
    Stopwords(Regex),
    Punctuation,
    Whitespace,
}

impl Stage {
    fn apply(&self, text: &str) -> String {
        match self {
            Stage::StripQuotes => strip_quotes(text),
            Stage::Lowercase => text.to_lowercase(),
            Stage::FoldDiacritics => fold_diacritics(text),
            Stage::SplitUnderscores => text.replace('_', " "),
            Stage::Replace { pattern, table } => pattern
                .replace_all(text, |caps: &Captures| {
                    let matched = &caps[0];
                    table
                        .get(&matched.to_lowercase())
                        .cloned()
                        .unwrap_or_else(|| matched.to_string())
                })
                .into_owned(),
            Stage::Suffixes { mode, uppercase } => collapse_suffixes(text, *mode, *uppercase),
            Stage::NumberWords => replace_number_words(text),
            Stage::Stopwords(pattern) => pattern.replace_all(text, " ").into_owned(),
            Stage::Punctuation => strip_punctuation(text),
            Stage::Whitespace => collapse_whitespace(text),
        }
    }
}

/// Turns raw names into a canonical comparable form
#[derive(Debug)]
pub struct Normalizer {
    stages: Vec<Stage>,
}

impl Normalizer {
    /// Build the stage list for `config`.
    ///
    /// Fails only if a configured replacement or stopword table cannot be
    /// compiled into a pattern.
    pub fn new(config: &NormalizationConfig) -> Result<Self, ConfigError> {
        let mut stages = Vec::new();

        if config.strip_quotes {
            stages.push(Stage::StripQuotes);
        }
        if config.lowercase {
            stages.push(Stage::Lowercase);
        }
        if config.remove_diacritics {
            stages.push(Stage::FoldDiacritics);
        }
        // `_` is a regex word character; split it before any `\b` stage
        if config.strip_punctuation {
            stages.push(Stage::SplitUnderscores);
        }

        let table: HashMap<String, String> = config
            .replacements
            .iter()
            .filter(|(from, _)| !from.trim().is_empty())
            .map(|(from, to)| (from.to_lowercase(), to.clone()))
            .collect();
        if !table.is_empty() {
            let pattern = Regex::new(&word_alternation(table.keys().cloned()))?;
            stages.push(Stage::Replace { pattern, table });
        }

        if config.suffix_mode != SuffixMode::Keep {
            stages.push(Stage::Suffixes {
                mode: config.suffix_mode,
                uppercase: !config.lowercase,
            });
        }
        if config.number_words {
            stages.push(Stage::NumberWords);
        }

        let stopwords: Vec<String> = config
            .stopwords
            .iter()
            .map(|word| word.trim().to_lowercase())
            .filter(|word| !word.is_empty())
            .collect();
        if !stopwords.is_empty() {
            stages.push(Stage::Stopwords(Regex::new(&word_alternation(
                stopwords.into_iter(),
            ))?));
        }

        if config.strip_punctuation {
            stages.push(Stage::Punctuation);
        }
        if config.collapse_whitespace {
            stages.push(Stage::Whitespace);
        }

        Ok(Self { stages })
    }

    /// Run every enabled stage in order
    pub fn normalize(&self, text: &str) -> String {
        self.stages
            .iter()
            .fold(text.to_string(), |acc, stage| stage.apply(&acc))
    }
}

/// Case-insensitive whole-word alternation, longest words first
fn word_alternation(words: impl Iterator<Item = String>) -> String {
    let mut words: Vec<String> = words.collect();
    words.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    words.dedup();
    let escaped: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    format!(r"(?i)\b(?:{})\b", escaped.join("|"))
}

/// Strip one layer of matching straight quotes around the trimmed text
pub(crate) fn strip_quotes(text: &str) -> String {
    let trimmed = text.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}

/// Decompose and drop combining marks (é -> e)
pub(crate) fn fold_diacritics(text: &str) -> String {
    text.nfkd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect()
}

/// Normalize or remove LLC/INC/CORP/LTD/CO/LP/PC/PLLC and their variants
pub(crate) fn collapse_suffixes(text: &str, mode: SuffixMode, uppercase: bool) -> String {
    if mode == SuffixMode::Keep {
        return text.to_string();
    }

    SUFFIX_PATTERN
        .replace_all(text, |caps: &Captures| {
            if mode == SuffixMode::Remove {
                return " ".to_string();
            }
            let key = caps[1].to_lowercase().replace('.', "");
            let canonical = match key.as_str() {
                "incorporated" => "inc",
                "corporation" => "corp",
                "limited" => "ltd",
                "company" => "co",
                other => other,
            };
            if uppercase {
                canonical.to_uppercase()
            } else {
                canonical.to_string()
            }
        })
        .into_owned()
}

/// Replace number and ordinal words with digit forms (one -> 1, first -> 1st)
pub(crate) fn replace_number_words(text: &str) -> String {
    NUMBER_PATTERN
        .replace_all(text, |caps: &Captures| {
            let word = caps[0].to_lowercase();
            NUMBER_WORDS
                .get(word.as_str())
                .map(|digits| digits.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// ASCII punctuation becomes a space; other characters pass through
pub(crate) fn strip_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_punctuation() { ' ' } else { c })
        .collect()
}

/// Collapse runs of whitespace into single spaces and trim
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn normalize(text: &str) -> String {
        Normalizer::new(&NormalizationConfig::default())
            .unwrap()
            .normalize(text)
    }

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("  ABC   Corp  "), "abc corp");
        assert_eq!(normalize("John Doe"), "john doe");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \t\n "), "");
    }

    #[test]
    fn test_strip_quotes_one_layer() {
        assert_eq!(strip_quotes("\"ABC\""), "ABC");
        assert_eq!(strip_quotes("'ABC'"), "ABC");
        assert_eq!(strip_quotes("\"\"ABC\"\""), "\"ABC\"");
        assert_eq!(strip_quotes("\"ABC'"), "\"ABC'");
        assert_eq!(strip_quotes("\""), "\"");
    }

    #[test]
    fn test_suffix_variants_normalize() {
        assert_eq!(normalize("ABC L.L.C."), "abc llc");
        assert_eq!(normalize("ABC LLC"), "abc llc");
        assert_eq!(normalize("ABC Incorporated"), "abc inc");
        assert_eq!(normalize("ABC Inc."), "abc inc");
        assert_eq!(normalize("ABC Corporation"), "abc corp");
        assert_eq!(normalize("ABC Limited"), "abc ltd");
        assert_eq!(normalize("ABC Company"), "abc co");
        assert_eq!(normalize("Smith P.L.L.C."), "smith pllc");
        assert_eq!(normalize("Smith P.C."), "smith pc");
        assert_eq!(normalize("Smith L.P."), "smith lp");
    }

    #[test]
    fn test_suffix_removal() {
        let config = NormalizationConfig {
            suffix_mode: SuffixMode::Remove,
            ..Default::default()
        };
        let normalizer = Normalizer::new(&config).unwrap();
        assert_eq!(normalizer.normalize("ABC Realty L.L.C."), "abc realty");
        assert_eq!(normalizer.normalize("ABC Inc"), normalizer.normalize("ABC"));
        assert_eq!(
            collapse_suffixes("ABC Corp", SuffixMode::Normalize, true),
            "ABC CORP"
        );
        assert_eq!(
            collapse_suffixes("ABC Corp", SuffixMode::Keep, false),
            "ABC Corp"
        );
    }

    #[test]
    fn test_suffix_not_inside_words() {
        assert_eq!(normalize("Coco Incline"), "coco incline");
        assert_eq!(normalize("Corpus Realty"), "corpus realty");
    }

    #[test]
    fn test_number_words() {
        assert_eq!(replace_number_words("one fifth avenue"), "1 5th avenue");
        assert_eq!(replace_number_words("Seventeen Seventh St"), "17 7th St");
        assert_eq!(replace_number_words("someone"), "someone");
        assert_eq!(normalize("First Avenue"), normalize("1st Avenue"));
    }

    #[test]
    fn test_stopwords_whole_words_only() {
        assert_eq!(normalize("The Bank of New York"), "bank new york");
        assert_eq!(normalize("Theodore Andrews"), "theodore andrews");
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(normalize("SMITH-JONES_REALTY.NYC"), "smith jones realty nyc");
        assert_eq!(strip_punctuation("a,b"), "a b");
    }

    #[test]
    fn test_non_ascii_passes_through() {
        assert_eq!(normalize("Café Müller"), "café müller");
        assert_eq!(normalize("北京 Holdings"), "北京 holdings");
    }

    #[test]
    fn test_fold_diacritics_toggle() {
        let config = NormalizationConfig {
            remove_diacritics: true,
            ..Default::default()
        };
        let normalizer = Normalizer::new(&config).unwrap();
        assert_eq!(normalizer.normalize("Café Müller"), "cafe muller");
    }

    #[test]
    fn test_custom_replacements() {
        let mut replacements = BTreeMap::new();
        replacements.insert("mgmt".to_string(), "management".to_string());
        replacements.insert("st".to_string(), "street".to_string());
        let config = NormalizationConfig {
            replacements,
            ..Default::default()
        };
        let normalizer = Normalizer::new(&config).unwrap();
        assert_eq!(
            normalizer.normalize("ABC Mgmt, 10 Main St"),
            "abc management 10 main street"
        );
        assert_eq!(normalizer.normalize("Stmgmt"), "stmgmt");
    }

    #[test]
    fn test_stages_toggle_off() {
        let config = NormalizationConfig {
            lowercase: false,
            strip_punctuation: false,
            stopwords: Vec::new(),
            suffix_mode: SuffixMode::Keep,
            number_words: false,
            ..Default::default()
        };
        let normalizer = Normalizer::new(&config).unwrap();
        assert_eq!(normalizer.normalize("The  A.B.C. Corp."), "The A.B.C. Corp.");
    }

    #[test]
    fn test_underscores_separate_words() {
        assert_eq!(normalize("the_company"), "co");
        assert_eq!(normalize("one_two"), "1 2");
        assert_eq!(normalize("ACME_Realty_L.L.C."), "acme realty llc");
    }

    #[test]
    fn test_idempotent_on_samples() {
        for sample in [
            "\"The First National Bank of N.Y., Inc.\"",
            "the-company",
            "'ONE TWENTY-ONE REALTY L.L.C.'",
            "  Smith &  Sons Co. ",
            "the_company",
            "one_two__l.l.c",
        ] {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }
}
