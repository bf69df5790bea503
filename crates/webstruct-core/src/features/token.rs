//! Features of the token text itself.

use regex::Regex;

use super::{FeatureDict, TokenFeature};
use crate::error::Result;
use crate::html::HtmlToken;

/// `token`: the token text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenIdentity;

impl TokenFeature for TokenIdentity {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        [("token", token.token())].into_iter().collect()
    }
}

/// `lower`: the lowercased token text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenLower;

impl TokenFeature for TokenLower {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        [("lower", token.token().to_lowercase())].into_iter().collect()
    }
}

/// `shape`: one of `number`, `punct`, `upcase`, `caps`, `downcase`,
/// `mixedcase` or `other`.
#[derive(Debug, Clone)]
pub struct TokenShape {
    shapes: Vec<(Regex, &'static str)>,
}

impl TokenShape {
    pub fn new() -> Result<Self> {
        let shapes = [
            (r"^(?:[-+]?[0-9]+(?:\.[0-9]*)?|[0-9]*\.[0-9]+$)", "number"),
            (r"^\W+$", "punct"),
            (r"^[A-Z][a-z'`]+$", "upcase"),
            (r"^[A-Z][A-Z'`]+$", "caps"),
            (r"^[a-z]+$", "downcase"),
            (r"^\w+$", "mixedcase"),
        ];
        let shapes = shapes
            .into_iter()
            .map(|(pattern, name)| Ok((Regex::new(pattern)?, name)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { shapes })
    }

    /// Shape of a single string.
    pub fn shape(&self, text: &str) -> &'static str {
        self.shapes
            .iter()
            .find(|(re, _)| re.is_match(text))
            .map_or("other", |(_, name)| *name)
    }
}

impl TokenFeature for TokenShape {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        [("shape", self.shape(token.token()))].into_iter().collect()
    }
}

/// `first_upper`: the token has cased letters and all of them are
/// uppercase (`ACME`, `D02`), not merely a capitalized first letter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstUpper;

impl TokenFeature for FirstUpper {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        let mut cased = token
            .token()
            .chars()
            .filter(|c| c.is_uppercase() || c.is_lowercase())
            .peekable();
        let upper = cased.peek().is_some() && cased.all(char::is_uppercase);
        [("first_upper", upper)].into_iter().collect()
    }
}

/// `endswith_dot`: the token ends with `.` and is not just `.`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndsWithDot;

impl TokenFeature for EndsWithDot {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        let t = token.token();
        [("endswith_dot", t.ends_with('.') && t != ".")].into_iter().collect()
    }
}

/// `endswith_colon`: the token ends with `:` and is not just `:`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndsWithColon;

impl TokenFeature for EndsWithColon {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        let t = token.token();
        [("endswith_colon", t.ends_with(':') && t != ":")].into_iter().collect()
    }
}

/// `has_copyright`: the token contains `©`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HasCopyright;

impl TokenFeature for HasCopyright {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        [("has_copyright", token.token().contains('©'))].into_iter().collect()
    }
}

/// Digit masks only apply to tokens that are at least 30% digits.
fn digit_mask(text: &str) -> Option<String> {
    let total = text.chars().count();
    if total == 0 {
        return None;
    }
    let digits = text.chars().filter(char::is_ascii_digit).count();
    if digits * 10 < total * 3 {
        return None;
    }
    Some(
        text.chars()
            .map(|c| if c.is_ascii_digit() { 'X' } else { c })
            .collect(),
    )
}

/// `num_pattern`: digits replaced by `X`, e.g. `XXX-XXXX`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberPattern;

impl TokenFeature for NumberPattern {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        digit_mask(token.token())
            .map(|mask| ("num_pattern", mask))
            .into_iter()
            .collect()
    }
}

/// `num_pattern2`: like `num_pattern`, with other word characters
/// replaced by `C`, e.g. `CXXX-XX`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberPattern2;

impl TokenFeature for NumberPattern2 {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        digit_mask(token.token())
            .map(|mask| {
                let mask: String = mask
                    .chars()
                    .map(|c| {
                        if c != 'X' && (c.is_alphanumeric() || c == '_') {
                            'C'
                        } else {
                            c
                        }
                    })
                    .collect();
                ("num_pattern2", mask)
            })
            .into_iter()
            .collect()
    }
}

fn char_prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

fn char_suffix(text: &str, n: usize) -> &str {
    let len = text.chars().count();
    if len <= n {
        return text;
    }
    text.char_indices()
        .nth(len - n)
        .map_or(text, |(start, _)| &text[start..])
}

/// `<name><n>`: the first `n` characters of the token, for every `n` in
/// `lengths`.
#[derive(Debug, Clone)]
pub struct PrefixFeatures {
    lengths: Vec<usize>,
    name: String,
    lower: bool,
}

impl PrefixFeatures {
    pub fn new(lengths: &[usize], name: &str, lower: bool) -> Self {
        Self {
            lengths: lengths.to_vec(),
            name: name.to_string(),
            lower,
        }
    }
}

impl Default for PrefixFeatures {
    fn default() -> Self {
        Self::new(&[2, 3, 4], "prefix", true)
    }
}

impl TokenFeature for PrefixFeatures {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        let text = if self.lower {
            token.token().to_lowercase()
        } else {
            token.token().to_string()
        };
        self.lengths
            .iter()
            .map(|&n| (format!("{}{n}", self.name), char_prefix(&text, n)))
            .collect()
    }
}

/// `<name><n>`: the last `n` characters of the token, for every `n` in
/// `lengths`.
#[derive(Debug, Clone)]
pub struct SuffixFeatures {
    lengths: Vec<usize>,
    name: String,
    lower: bool,
}

impl SuffixFeatures {
    pub fn new(lengths: &[usize], name: &str, lower: bool) -> Self {
        Self {
            lengths: lengths.to_vec(),
            name: name.to_string(),
            lower,
        }
    }
}

impl Default for SuffixFeatures {
    fn default() -> Self {
        Self::new(&[2, 3, 4], "suffix", true)
    }
}

impl TokenFeature for SuffixFeatures {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        let text = if self.lower {
            token.token().to_lowercase()
        } else {
            token.token().to_string()
        };
        self.lengths
            .iter()
            .map(|&n| (format!("{}{n}", self.name), char_suffix(&text, n)))
            .collect()
    }
}

/// `prefix2..4` and `suffix2..4` of the lowercased token.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixesAndSuffixes;

impl TokenFeature for PrefixesAndSuffixes {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        let mut features = PrefixFeatures::default().extract(token);
        features.merge(SuffixFeatures::default().extract(token));
        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_util::token;

    fn value(feature: &dyn TokenFeature, html: &str, key: &str) -> Option<String> {
        feature
            .extract(&token(html, 0))
            .get(key)
            .map(ToString::to_string)
    }

    #[test]
    fn test_identity_and_lower() {
        assert_eq!(value(&TokenIdentity, "<p>Hello</p>", "token").unwrap(), "Hello");
        assert_eq!(value(&TokenLower, "<p>HeLLo</p>", "lower").unwrap(), "hello");
    }

    #[test]
    fn test_token_shape() {
        let shape = TokenShape::new().unwrap();
        assert_eq!(shape.shape("123"), "number");
        assert_eq!(shape.shape("3.88"), "number");
        assert_eq!(shape.shape(".5"), "number");
        assert_eq!(shape.shape("--"), "punct");
        assert_eq!(shape.shape("John"), "upcase");
        assert_eq!(shape.shape("USA"), "caps");
        assert_eq!(shape.shape("street"), "downcase");
        assert_eq!(shape.shape("iPhone"), "mixedcase");
        assert_eq!(shape.shape("e-mail"), "other");
        assert_eq!(value(&shape, "<p>Dublin</p>", "shape").unwrap(), "upcase");
    }

    #[test]
    fn test_first_upper() {
        let upper = |html: &str| value(&FirstUpper, html, "first_upper").unwrap();
        assert_eq!(upper("<p>Hello</p>"), "false");
        assert_eq!(upper("<p>ACME</p>"), "true");
        assert_eq!(upper("<p>D02</p>"), "true");
        assert_eq!(upper("<p>123</p>"), "false");
        assert_eq!(upper("<p>hello</p>"), "false");
    }

    #[test]
    fn test_punctuation_endings() {
        assert_eq!(value(&EndsWithDot, "<p>St. x</p>", "endswith_dot").unwrap(), "true");
        assert_eq!(value(&EndsWithColon, "<p>Phone: x</p>", "endswith_colon").unwrap(), "true");
        assert_eq!(value(&EndsWithColon, "<p>Phone x</p>", "endswith_colon").unwrap(), "false");
        assert_eq!(value(&HasCopyright, "<p>©2013</p>", "has_copyright").unwrap(), "true");
    }

    #[test]
    fn test_number_patterns() {
        assert_eq!(value(&NumberPattern, "<p>555-1234</p>", "num_pattern").unwrap(), "XXX-XXXX");
        assert_eq!(value(&NumberPattern, "<p>hello</p>", "num_pattern"), None);
        // 2 digits out of 7 chars is below 30%
        assert_eq!(value(&NumberPattern, "<p>abcde12</p>", "num_pattern"), None);
        assert_eq!(value(&NumberPattern2, "<p>D02-X123</p>", "num_pattern2").unwrap(), "CXX-XXXX");
        assert_eq!(value(&NumberPattern2, "<p>Ab12</p>", "num_pattern2").unwrap(), "CCXX");
    }

    #[test]
    fn test_prefixes_and_suffixes() {
        let features = PrefixesAndSuffixes.extract(&token("<p>Dublin</p>", 0));
        let get = |k: &str| features.get(k).unwrap().to_string();
        assert_eq!(get("prefix2"), "du");
        assert_eq!(get("prefix4"), "dubl");
        assert_eq!(get("suffix3"), "lin");
        assert_eq!(features.len(), 6);

        let short = SuffixFeatures::new(&[3], "end", false).extract(&token("<p>Ab</p>", 0));
        assert_eq!(short.get("end3").unwrap().to_string(), "Ab");
        let unicode = PrefixFeatures::new(&[2], "p", true).extract(&token("<p>Ärger</p>", 0));
        assert_eq!(unicode.get("p2").unwrap().to_string(), "är");
    }
}
