//! # Feature Extraction
//!
//! Turns tokenized documents into one feature dictionary per token.
//!
//! Token features look at a single [`HtmlToken`] (and, through it, at the
//! other tokens of its text block and at the tree). Global features run
//! afterwards and see the whole document with every token's features
//! computed so far, so they can combine neighbouring features or match
//! multi-token phrases.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use webstruct_core::features::{HtmlFeatureExtractor, ParentTag, TokenFeatureRef, TokenLower};
//! use webstruct_core::html::{Dom, HtmlTokenizer, HtmlTokenizerConfig};
//!
//! let tokenizer = HtmlTokenizer::new(HtmlTokenizerConfig::default()).unwrap();
//! let (tokens, _) = tokenizer.tokenize_single(&Dom::parse_fragment("<p>Hello <b>World</b></p>")).unwrap();
//!
//! let token_features: Vec<TokenFeatureRef> = vec![Arc::new(ParentTag), Arc::new(TokenLower)];
//! let extractor = HtmlFeatureExtractor::new(token_features);
//! let features = extractor.transform_single(&tokens);
//! assert_eq!(features[1].get("parent_tag").unwrap().to_string(), "b");
//! assert_eq!(features[1].get("lower").unwrap().to_string(), "world");
//! ```

pub mod block;
pub mod data;
pub mod datetime;
pub mod extractor;
pub mod gazetteer;
pub mod global;
pub mod token;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::html::HtmlToken;

pub use block::{BlockLength, Borders, InsideTag, ParentTag};
pub use data::{
    LooksLikeDatePattern, LooksLikeDayOrdinal, LooksLikeEmail, LooksLikeMonth, LooksLikeRange,
    LooksLikeStreetPart, LooksLikeTime, LooksLikeWeekday, LooksLikeYear, NumberLooksLikeDay,
    NumberLooksLikeMonth,
};
pub use extractor::HtmlFeatureExtractor;
pub use gazetteer::LongestMatch;
pub use global::{DocumentBorders, LongestMatchFeature, Pattern};
pub use token::{
    EndsWithColon, EndsWithDot, FirstUpper, HasCopyright, NumberPattern, NumberPattern2,
    PrefixFeatures, PrefixesAndSuffixes, SuffixFeatures, TokenIdentity, TokenLower, TokenShape,
};

/// Entity types annotated in contact-information corpora.
pub const DEFAULT_TAGSET: &[&str] = &[
    "ORG", "PER", "SUBJ", "STREET", "CITY", "STATE", "COUNTRY", "ZIPCODE", "EMAIL", "TEL", "FAX",
    "FUNC", "HOURS",
];

/// Entity types annotated in opening-hours corpora.
pub const OPEN_HOURS_TAGSET: &[&str] = &["HOURS"];

/// A single feature value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Bool(v) => write!(f, "{v}"),
            FeatureValue::Int(v) => write!(f, "{v}"),
            FeatureValue::Float(v) => write!(f, "{v}"),
            FeatureValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<bool> for FeatureValue {
    fn from(v: bool) -> Self {
        FeatureValue::Bool(v)
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        FeatureValue::Int(v)
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Float(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Str(v.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(v: String) -> Self {
        FeatureValue::Str(v)
    }
}

/// Features of one token: unique names mapped to values.
///
/// There is deliberately no public way to remove a key; feature functions
/// only add or overwrite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureDict(BTreeMap<String, FeatureValue>);

impl FeatureDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a feature.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FeatureValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FeatureValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Merge `other` into `self`; keys from `other` win.
    pub fn merge(&mut self, other: FeatureDict) {
        self.0.extend(other.0);
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&str, &FeatureValue) -> bool) {
        self.0.retain(|k, v| keep(k, v));
    }
}

impl<K, V> FromIterator<(K, V)> for FeatureDict
where
    K: Into<String>,
    V: Into<FeatureValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for FeatureDict {
    type Item = (String, FeatureValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, FeatureValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A feature function of a single token.
///
/// Closures `Fn(&HtmlToken) -> FeatureDict` implement this trait too.
pub trait TokenFeature: Send + Sync {
    fn extract(&self, token: &HtmlToken) -> FeatureDict;
}

impl<F> TokenFeature for F
where
    F: Fn(&HtmlToken) -> FeatureDict + Send + Sync,
{
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        self(token)
    }
}

/// A feature function of a whole document.
///
/// `features[i]` belongs to `tokens[i]`. Implementations add or overwrite
/// entries in place.
pub trait GlobalFeature: Send + Sync {
    fn apply(&self, tokens: &[HtmlToken], features: &mut [FeatureDict]);
}

impl<F> GlobalFeature for F
where
    F: Fn(&[HtmlToken], &mut [FeatureDict]) + Send + Sync,
{
    fn apply(&self, tokens: &[HtmlToken], features: &mut [FeatureDict]) {
        self(tokens, features)
    }
}

/// Shared handle to a token feature, as stored by the extractor.
pub type TokenFeatureRef = Arc<dyn TokenFeature>;

/// Shared handle to a global feature, as stored by the extractor.
pub type GlobalFeatureRef = Arc<dyn GlobalFeature>;

/// Token features for contact information pages.
pub fn default_token_features() -> Result<Vec<TokenFeatureRef>> {
    let features: Vec<TokenFeatureRef> = vec![
        Arc::new(ParentTag),
        Arc::new(Borders),
        Arc::new(BlockLength),
        Arc::new(InsideTag::new("a")),
        Arc::new(InsideTag::new("strong")),
        Arc::new(TokenIdentity),
        Arc::new(TokenLower),
        Arc::new(TokenShape::new()?),
        Arc::new(EndsWithColon),
        Arc::new(EndsWithDot),
        Arc::new(HasCopyright),
        Arc::new(NumberPattern),
        Arc::new(PrefixesAndSuffixes),
        Arc::new(LooksLikeYear),
        Arc::new(LooksLikeMonth),
        Arc::new(LooksLikeEmail::new()?),
        Arc::new(LooksLikeStreetPart),
    ];
    Ok(features)
}

/// Token features for opening hours.
pub fn open_hours_token_features() -> Result<Vec<TokenFeatureRef>> {
    let features: Vec<TokenFeatureRef> = vec![
        Arc::new(ParentTag),
        Arc::new(Borders),
        Arc::new(BlockLength),
        Arc::new(TokenIdentity),
        Arc::new(TokenLower),
        Arc::new(TokenShape::new()?),
        Arc::new(EndsWithColon),
        Arc::new(EndsWithDot),
        Arc::new(HasCopyright),
        Arc::new(NumberPattern),
        Arc::new(PrefixesAndSuffixes),
        Arc::new(LooksLikeEmail::new()?),
        Arc::new(LooksLikeYear),
        Arc::new(LooksLikeTime::new()?),
        Arc::new(LooksLikeMonth),
        Arc::new(LooksLikeWeekday),
        Arc::new(LooksLikeRange),
    ];
    Ok(features)
}

#[cfg(test)]
pub(crate) mod test_util {
    use crate::html::{Dom, HtmlToken, HtmlTokenizer, HtmlTokenizerConfig};

    /// Tokenize an HTML fragment with the default configuration.
    pub fn tokens(html: &str) -> Vec<HtmlToken> {
        let tokenizer = HtmlTokenizer::new(HtmlTokenizerConfig::default()).unwrap();
        tokenizer
            .tokenize_single(&Dom::parse_fragment(html))
            .unwrap()
            .0
    }

    /// Tokens of a single text block.
    pub fn token(html: &str, index: usize) -> HtmlToken {
        tokens(html).swap_remove(index)
    }
}
