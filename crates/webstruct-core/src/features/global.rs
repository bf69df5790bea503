//! Features computed over a whole document.

use std::sync::Arc;

use super::gazetteer::LongestMatch;
use super::{FeatureDict, GlobalFeature};
use crate::html::HtmlToken;

/// Combines features of neighbouring tokens into one n-gram feature.
///
/// Each lookup is `(offset, key)`. The feature name joins `key` (offset 0),
/// `key[-1]`, `key[+2]`, ... with the separator; the value joins the looked
/// up values the same way.
///
/// A token gets no pattern value when every looked up value equals the out
/// value, including real feature values that render as the out value.
///
/// ```
/// use webstruct_core::features::Pattern;
///
/// let pattern = Pattern::new(&[(-1, "lower"), (0, "lower")]);
/// assert_eq!(pattern.name(), "lower[-1]/lower");
/// ```
#[derive(Debug, Clone)]
pub struct Pattern {
    lookups: Vec<(isize, String)>,
    name: String,
    separator: String,
    out_value: String,
    missing_value: String,
}

impl Pattern {
    pub fn new(lookups: &[(isize, &str)]) -> Self {
        let mut pattern = Self {
            lookups: lookups
                .iter()
                .map(|&(offset, key)| (offset, key.to_string()))
                .collect(),
            name: String::new(),
            separator: "/".to_string(),
            out_value: "?".to_string(),
            missing_value: "_NA_".to_string(),
        };
        pattern.name = pattern.build_name();
        pattern
    }

    /// Separator between keys in the name and between values.
    pub fn with_separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self.name = self.build_name();
        self
    }

    /// Value used for positions before the first or after the last token.
    pub fn with_out_value(mut self, value: &str) -> Self {
        self.out_value = value.to_string();
        self
    }

    /// Value used when the looked up token lacks the key.
    pub fn with_missing_value(mut self, value: &str) -> Self {
        self.missing_value = value.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn build_name(&self) -> String {
        self.lookups
            .iter()
            .map(|(offset, key)| match *offset {
                0 => key.clone(),
                _ => format!("{key}[{offset:+}]"),
            })
            .collect::<Vec<_>>()
            .join(&self.separator)
    }
}

impl GlobalFeature for Pattern {
    fn apply(&self, _tokens: &[HtmlToken], features: &mut [FeatureDict]) {
        let values: Vec<Option<String>> = (0..features.len())
            .map(|i| {
                let parts: Vec<String> = self
                    .lookups
                    .iter()
                    .map(|(offset, key)| {
                        match i.checked_add_signed(*offset).filter(|&j| j < features.len()) {
                            Some(j) => features[j]
                                .get(key)
                                .map_or_else(|| self.missing_value.clone(), ToString::to_string),
                            None => self.out_value.clone(),
                        }
                    })
                    .collect();
                let all_out = parts.iter().all(|part| *part == self.out_value);
                (!all_out).then(|| parts.join(&self.separator))
            })
            .collect();

        for (dict, value) in features.iter_mut().zip(values) {
            if let Some(value) = value {
                dict.insert(self.name.as_str(), value);
            }
        }
    }
}

/// Marks gazetteer matches: `B-<name>` on the first token of a match,
/// `I-<name>` on the others and `<name>` on all of them.
#[derive(Debug, Clone)]
pub struct LongestMatchFeature {
    lexicon: Arc<LongestMatch>,
    name: String,
    lower: bool,
}

impl LongestMatchFeature {
    /// Tokens are lowercased before lookup, so the lexicon should hold
    /// lowercase phrases unless [`with_lower`](Self::with_lower) disables it.
    pub fn new(lexicon: Arc<LongestMatch>, name: &str) -> Self {
        Self {
            lexicon,
            name: name.to_string(),
            lower: true,
        }
    }

    pub fn with_lower(mut self, lower: bool) -> Self {
        self.lower = lower;
        self
    }
}

impl GlobalFeature for LongestMatchFeature {
    fn apply(&self, tokens: &[HtmlToken], features: &mut [FeatureDict]) {
        let words: Vec<String> = tokens
            .iter()
            .map(|t| {
                if self.lower {
                    t.token().to_lowercase()
                } else {
                    t.token().to_string()
                }
            })
            .collect();

        for (start, end, _) in self.lexicon.find_ranges(&words) {
            for (i, dict) in features[start..end].iter_mut().enumerate() {
                let prefix = if i == 0 { "B" } else { "I" };
                dict.insert(format!("{prefix}-{}", self.name), true);
                dict.insert(self.name.as_str(), true);
            }
        }
    }
}

/// `BOS` on the first token of the document and `EOS` on the last.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentBorders;

impl GlobalFeature for DocumentBorders {
    fn apply(&self, _tokens: &[HtmlToken], features: &mut [FeatureDict]) {
        if let Some(first) = features.first_mut() {
            first.insert("BOS", true);
        }
        if let Some(last) = features.last_mut() {
            last.insert("EOS", true);
        }
    }
}
