//! Local explanation of a single prediction
//!
//! - `surrogate`: neighbourhood sampling + weighted ridge fit (the explainer)
//! - `discretize`: quartile bins and threshold conditions
//! - `phrasing`: tokenizer and per-language phrase tables
//! - `formatters`: Markdown / JSON rendering of a full recommendation

pub mod types;
pub mod discretize;
pub mod phrasing;
pub mod surrogate;
pub mod formatters;

pub use types::{Direction, Explanation, FeatureInfluence};
pub use discretize::{Condition, QuartileDiscretizer};
pub use phrasing::{influence_sentence, tokenize, translate_condition, Comparator, Language, PhraseTable, Token};
pub use surrogate::{weighted_ridge, Explainer, LinearFit};
pub use formatters::{JsonFormatter, MarkdownFormatter};
