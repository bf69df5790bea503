//! # Word Tokenizer
//!
//! Splits a block of text into word tokens for sequence labeling.
//! Every token remembers where it came from in the source text so that
//! annotations can later be spliced back at the right place.
//!
//! Positions and lengths are counted in characters, not bytes.

use std::borrow::Cow;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A token extracted from a text block with positional information.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextToken {
    /// The token text (may be a normalized form, e.g. `` ` `` `` for `"`)
    pub chars: String,
    /// Start position in the source text, in characters
    pub position: usize,
    /// Length of the source span, in characters
    pub length: usize,
}

impl TextToken {
    /// Create a new token.
    pub fn new(chars: impl Into<String>, position: usize, length: usize) -> Self {
        Self {
            chars: chars.into(),
            position,
            length,
        }
    }
}

/// Something that can split a text block into positioned tokens.
///
/// The returned iterator is lazy and finite; calling `tokenize` again on the
/// same text restarts the sequence from the beginning.
pub trait TextTokenizer: Send + Sync {
    /// Tokenize `text`.
    fn tokenize<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = TextToken> + 'a>;
}

#[derive(Debug, Clone, Copy)]
enum RuleAction {
    /// Separator that produces no token (whitespace).
    Skip,
    /// Boundary that produces its own token, optionally normalized.
    Emit(Option<&'static str>),
}

/// A scanning rule. Group 1 of the pattern is what gets consumed; anything
/// matched after it only acts as look-ahead context.
#[derive(Debug, Clone)]
struct Rule {
    pattern: Regex,
    action: RuleAction,
}

/// Treebank-style word tokenizer that keeps `@` and `:` inside tokens,
/// so e-mail addresses and labels like `Phone:` stay atomic.
///
/// ```
/// use webstruct_core::text::WordTokenizer;
///
/// let tokenizer = WordTokenizer::new().unwrap();
/// let words: Vec<_> = tokenizer
///     .segment_words("Email: muffins@gmail.com")
///     .map(|t| t.chars)
///     .collect();
/// assert_eq!(words, ["Email:", "muffins@gmail.com"]);
/// ```
#[derive(Debug, Clone)]
pub struct WordTokenizer {
    rules: Vec<Rule>,
    open_quotes: Regex,
}

impl WordTokenizer {
    /// Constructs a new `WordTokenizer` with pre-compiled scanning rules.
    ///
    /// # Errors
    ///
    /// Returns `WebstructError::RegexError` if a pattern fails to compile
    /// (should never happen with the static patterns defined here).
    pub fn new() -> Result<Self> {
        let rule = |pattern: &str, action: RuleAction| -> Result<Rule> {
            Ok(Rule {
                pattern: Regex::new(pattern)?,
                action,
            })
        };

        Ok(Self {
            rules: vec![
                rule(r"^(\s+)", RuleAction::Skip)?,
                rule(r"^(“)", RuleAction::Emit(Some("``")))?,
                rule(r#"^(["”])"#, RuleAction::Emit(Some("''")))?,
                rule(r"^(``)", RuleAction::Emit(None))?,
                rule(r"^(\.\.\.|…)", RuleAction::Emit(Some("...")))?,
                rule(r"^(--)", RuleAction::Emit(None))?,
                // commas inside numbers ("100,000") are not separators
                rule(r"^(,)(?:\D|$)", RuleAction::Emit(None))?,
                rule(r#"^(\.)[\])}>"'”]*\s*$"#, RuleAction::Emit(None))?,
                rule(r"^([;#$£%&|!?\[\](){}<>])", RuleAction::Emit(None))?,
                rule(r"^('')", RuleAction::Emit(None))?,
                rule(r"^(')(?:\s|$)", RuleAction::Emit(None))?,
            ],
            open_quotes: Regex::new(r#"(^|[\s(\[{<])""#)?,
        })
    }

    /// Lazily split `text` into positioned word tokens.
    ///
    /// # Examples
    /// ```
    /// use webstruct_core::text::WordTokenizer;
    ///
    /// let tokenizer = WordTokenizer::new().unwrap();
    /// let tokens: Vec<_> = tokenizer.segment_words("Shelbourne Road,").collect();
    /// assert_eq!(tokens.len(), 3);
    /// assert_eq!(tokens[2].chars, ",");
    /// assert_eq!(tokens[2].position, 15);
    /// ```
    pub fn segment_words<'a>(&'a self, text: &'a str) -> WordSegments<'a> {
        // Opening quotes are only recognizable by what precedes them, so they
        // are rewritten up front. `“` has the same char length as `"`, which
        // keeps every offset valid.
        let text = self.open_quotes.replace_all(text, "${1}“");
        WordSegments {
            text,
            rules: &self.rules,
            byte_pos: 0,
            char_pos: 0,
            start_byte: 0,
            start_char: 0,
            pending: None,
            finished: false,
        }
    }
}

impl TextTokenizer for WordTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = TextToken> + 'a> {
        Box::new(self.segment_words(text))
    }
}

/// Iterator over the tokens of one text block.
#[derive(Debug)]
pub struct WordSegments<'a> {
    text: Cow<'a, str>,
    rules: &'a [Rule],
    byte_pos: usize,
    char_pos: usize,
    start_byte: usize,
    start_char: usize,
    pending: Option<TextToken>,
    finished: bool,
}

impl WordSegments<'_> {
    /// Take the text accumulated since the last boundary as a token.
    fn flush(&mut self) -> Option<TextToken> {
        let token = (self.byte_pos > self.start_byte).then(|| {
            TextToken::new(
                &self.text[self.start_byte..self.byte_pos],
                self.start_char,
                self.char_pos - self.start_char,
            )
        });
        self.start_byte = self.byte_pos;
        self.start_char = self.char_pos;
        token
    }
}

impl Iterator for WordSegments<'_> {
    type Item = TextToken;

    fn next(&mut self) -> Option<TextToken> {
        if let Some(token) = self.pending.take() {
            return Some(token);
        }

        while !self.finished {
            if self.byte_pos >= self.text.len() {
                self.finished = true;
                return self.flush();
            }

            let rest = &self.text[self.byte_pos..];
            let matched = self.rules.iter().find_map(|rule| {
                let consumed = rule.pattern.captures(rest)?.get(1)?;
                let source = &rest[..consumed.end()];
                Some((rule.action, source.to_string(), source.chars().count()))
            });

            let Some((action, source, consumed_chars)) = matched else {
                let step = rest.chars().next().map_or(1, char::len_utf8);
                self.byte_pos += step;
                self.char_pos += 1;
                continue;
            };

            let word = self.flush();
            let boundary = match action {
                RuleAction::Skip => None,
                RuleAction::Emit(replacement) => Some(TextToken::new(
                    replacement.map_or(source.clone(), str::to_string),
                    self.char_pos,
                    consumed_chars,
                )),
            };

            self.byte_pos += source.len();
            self.char_pos += consumed_chars;
            self.start_byte = self.byte_pos;
            self.start_char = self.char_pos;

            match (word, boundary) {
                (Some(word), boundary) => {
                    self.pending = boundary;
                    return Some(word);
                }
                (None, Some(boundary)) => return Some(boundary),
                (None, None) => continue,
            }
        }

        None
    }
}

/// The tokenizer used by default in the HTML pipeline: a [`WordTokenizer`]
/// that drops standalone `,` and `;` tokens.
///
/// Isolated commas tend to break entity continuity in annotated data
/// ("Shelbourne Road, Dublin"), so they are removed at the cost of losing
/// them as a feature signal.
#[derive(Debug, Clone)]
pub struct DefaultTokenizer {
    inner: WordTokenizer,
}

impl DefaultTokenizer {
    /// Create a new default tokenizer.
    pub fn new() -> Result<Self> {
        Ok(Self {
            inner: WordTokenizer::new()?,
        })
    }

    /// Tokenize into a vector.
    pub fn tokenize_to_vec(&self, text: &str) -> Vec<TextToken> {
        self.tokenize(text).collect()
    }
}

impl TextTokenizer for DefaultTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = TextToken> + 'a> {
        Box::new(
            self.inner
                .segment_words(text)
                .filter(|t| t.chars != "," && t.chars != ";"),
        )
    }
}
