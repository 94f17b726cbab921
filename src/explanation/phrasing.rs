//! Natural-language rendering of explanation conditions
//!
//! A small tokenizer splits a condition such as `"55.00 < humidity <= 78.00"`
//! into feature / comparator / number tokens, and a per-language phrase table
//! turns the token pattern into words. Adding a language or renaming a
//! feature is a table edit.

use crate::error::{AdvisorError, AdvisorResult};
use crate::explanation::types::Direction;
use crate::features::{Feature, NUM_FEATURES};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    French,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::French];

    /// Key used in localised note maps ("English", "French")
    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::French => "French",
        }
    }

    pub fn phrases(&self) -> &'static PhraseTable {
        match self {
            Language::English => &ENGLISH,
            Language::French => &FRENCH,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = AdvisorError;

    fn from_str(s: &str) -> AdvisorResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "french" | "français" | "francais" | "fr" => Ok(Language::French),
            other => Err(AdvisorError::configuration(format!("unsupported language '{}'", other))),
        }
    }
}

/// Comparison operator found in a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl Comparator {
    fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(Comparator::Lt),
            "<=" | "≤" => Some(Comparator::Le),
            ">" => Some(Comparator::Gt),
            ">=" | "≥" => Some(Comparator::Ge),
            "=" | "==" => Some(Comparator::Eq),
            _ => None,
        }
    }

    /// Operator seen from the other side: `a < x` is `x > a`
    pub fn flip(self) -> Self {
        match self {
            Comparator::Lt => Comparator::Gt,
            Comparator::Le => Comparator::Ge,
            Comparator::Gt => Comparator::Lt,
            Comparator::Ge => Comparator::Le,
            Comparator::Eq => Comparator::Eq,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'a> {
    Feature(Feature),
    Comparator(Comparator),
    /// Parsed value plus its source spelling (keeps "105.00" as written)
    Number(f64, &'a str),
    Word(&'a str),
}

/// Per-language wording
#[derive(Debug)]
pub struct PhraseTable {
    /// Display names in `Feature::ALL` order
    pub feature_names: [&'static str; NUM_FEATURES],
    /// Indexed by `Comparator` discriminant: <, <=, >, >=, =
    pub comparators: [&'static str; 5],
    /// `{feature}`, `{low}`, `{high}` placeholders
    pub between: &'static str,
    pub supports: &'static str,
    pub opposes: &'static str,
}

impl PhraseTable {
    pub fn feature_name(&self, feature: Feature) -> &'static str {
        self.feature_names[feature.index()]
    }

    pub fn comparator(&self, comparator: Comparator) -> &'static str {
        self.comparators[comparator.slot()]
    }

    pub fn verb(&self, direction: Direction) -> &'static str {
        match direction {
            Direction::Supports => self.supports,
            Direction::Opposes => self.opposes,
        }
    }
}

static ENGLISH: PhraseTable = PhraseTable {
    feature_names: [
        "Nitrogen",
        "Phosphorus",
        "Potassium",
        "Temperature",
        "Humidity",
        "pH",
        "Rainfall",
    ],
    comparators: ["below", "at most", "above", "at least", "at"],
    between: "{feature} between {low} and {high}",
    supports: "helps this crop",
    opposes: "hinders this crop",
};

static FRENCH: PhraseTable = PhraseTable {
    feature_names: [
        "Azote",
        "Phosphore",
        "Potassium",
        "Température",
        "Humidité",
        "pH",
        "Précipitations",
    ],
    comparators: ["inférieur à", "au plus", "supérieur à", "au moins", "à"],
    between: "{feature} entre {low} et {high}",
    supports: "favorise cette culture",
    opposes: "défavorise cette culture",
};

fn is_comparator_char(c: char) -> bool {
    matches!(c, '<' | '>' | '=' | '≤' | '≥')
}

/// Split a condition into tokens
///
/// Whitespace is optional: `"rainfall>105"` and `"rainfall > 105"` give the
/// same tokens.
pub fn tokenize(condition: &str) -> SmallVec<[Token<'_>; 5]> {
    let mut tokens = SmallVec::new();
    let mut chars = condition.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut end = start;
        if is_comparator_char(c) {
            while let Some(&(i, ch)) = chars.peek() {
                if !is_comparator_char(ch) {
                    break;
                }
                end = i + ch.len_utf8();
                chars.next();
            }
        } else {
            while let Some(&(i, ch)) = chars.peek() {
                if ch.is_whitespace() || is_comparator_char(ch) {
                    break;
                }
                end = i + ch.len_utf8();
                chars.next();
            }
        }

        let text = &condition[start..end];
        let token = if let Some(cmp) = Comparator::parse(text) {
            Token::Comparator(cmp)
        } else if let Ok(value) = text.parse::<f64>() {
            Token::Number(value, text)
        } else if let Some(feature) = Feature::from_code(text) {
            Token::Feature(feature)
        } else {
            Token::Word(text)
        };
        tokens.push(token);
    }

    tokens
}

/// Render a condition string in `language`
///
/// Recognised shapes: `f op n`, `n op f`, `lo < f <= hi`, bare `f`.
/// Anything else is translated token by token.
pub fn translate_condition(condition: &str, language: Language) -> String {
    let table = language.phrases();
    let tokens = tokenize(condition);

    match tokens.as_slice() {
        [Token::Feature(f), Token::Comparator(c), Token::Number(_, n)] => {
            format!("{} {} {}", table.feature_name(*f), table.comparator(*c), n)
        }
        [Token::Number(_, n), Token::Comparator(c), Token::Feature(f)] => {
            format!("{} {} {}", table.feature_name(*f), table.comparator(c.flip()), n)
        }
        [Token::Number(_, low), Token::Comparator(c1), Token::Feature(f), Token::Comparator(c2), Token::Number(_, high)]
            if is_lower_bound(*c1) && is_lower_bound(*c2) =>
        {
            table
                .between
                .replace("{feature}", table.feature_name(*f))
                .replace("{low}", low)
                .replace("{high}", high)
        }
        [Token::Feature(f)] => table.feature_name(*f).to_string(),
        _ => tokens
            .iter()
            .map(|token| match token {
                Token::Feature(f) => table.feature_name(*f).to_string(),
                Token::Comparator(c) => table.comparator(*c).to_string(),
                Token::Number(_, text) | Token::Word(text) => text.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn is_lower_bound(c: Comparator) -> bool {
    matches!(c, Comparator::Lt | Comparator::Le)
}

/// Full sentence: "Rainfall above 105.00 helps this crop."
pub fn influence_sentence(description: &str, direction: Direction, language: Language) -> String {
    format!("{} {}.", description, language.phrases().verb(direction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_spaced_and_compact() {
        let spaced = tokenize("rainfall > 105.00");
        let compact = tokenize("rainfall>105.00");
        assert_eq!(spaced.as_slice(), compact.as_slice());
        assert_eq!(spaced[0], Token::Feature(Feature::Rainfall));
        assert_eq!(spaced[1], Token::Comparator(Comparator::Gt));
        assert_eq!(spaced[2], Token::Number(105.0, "105.00"));
    }

    #[test]
    fn test_tokenize_range_and_unicode() {
        let tokens = tokenize("55.00 < humidity ≤ 78.00");
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[3], Token::Comparator(Comparator::Le));
        assert!(!tokens.spilled());
    }

    #[test]
    fn test_translate_english() {
        assert_eq!(translate_condition("rainfall > 105.00", Language::English), "Rainfall above 105.00");
        assert_eq!(translate_condition("N <= 40.00", Language::English), "Nitrogen at most 40.00");
        assert_eq!(
            translate_condition("55.00 < humidity <= 78.00", Language::English),
            "Humidity between 55.00 and 78.00"
        );
        assert_eq!(translate_condition("ph = 6.50", Language::English), "pH at 6.50");
        assert_eq!(translate_condition("K", Language::English), "Potassium");
    }

    #[test]
    fn test_translate_flipped_and_french() {
        assert_eq!(translate_condition("20.00 < temperature", Language::English), "Temperature above 20.00");
        assert_eq!(
            translate_condition("rainfall > 105.00", Language::French),
            "Précipitations supérieur à 105.00"
        );
        assert_eq!(
            translate_condition("55.00 < humidity <= 78.00", Language::French),
            "Humidité entre 55.00 et 78.00"
        );
    }

    #[test]
    fn test_unrecognised_shape_falls_back_to_token_translation() {
        assert_eq!(
            translate_condition("P > 10 and K < 5", Language::English),
            "Phosphorus above 10 and Potassium below 5"
        );
    }

    #[test]
    fn test_sentence_and_language_parsing() {
        assert_eq!(
            influence_sentence("Rainfall above 105.00", Direction::Supports, Language::English),
            "Rainfall above 105.00 helps this crop."
        );
        assert_eq!("Français".parse::<Language>().unwrap(), Language::French);
        assert!("klingon".parse::<Language>().is_err());
    }
}
