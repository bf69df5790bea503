//! # Sequence Encoder
//!
//! Converts token streams with embedded `__START_<TYPE>__` / `__END_<TYPE>__`
//! markers into per-token IOB2 or BILOU tags, and groups tagged data back
//! into spans.
//!
//! The encoder itself holds no mutable state. The "currently open span"
//! lives in an [`EncoderState`] value owned by the caller, one per document,
//! so concurrent documents never interfere.

use std::borrow::Borrow;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tags::Tag;
use crate::error::{Result, WebstructError};

/// Tagging scheme produced by the encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// `O`, `B-X`, `I-X`
    #[default]
    Iob2,
    /// IOB2 plus `L-X` and `U-X`
    Bilou,
}

/// How a single input token is interpreted by the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenClass<'a> {
    /// `__START_<TYPE>__`, with the type uppercased
    Start(String),
    /// `__END_<TYPE>__`, with the type uppercased
    End(String),
    /// Any other token
    Plain(&'a str),
}

/// Recognizes annotation marker tokens.
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    pattern: Regex,
}

impl MarkerClassifier {
    /// Creates a classifier matching `__START_<TYPE>__` / `__END_<TYPE>__`
    /// case-insensitively.
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(r"(?i)^__(START|END)_(\w+?)__$")?,
        })
    }

    /// Classify a token.
    pub fn classify<'a>(&self, token: &'a str) -> TokenClass<'a> {
        let Some(caps) = self.pattern.captures(token) else {
            return TokenClass::Plain(token);
        };
        let entity_type = caps[2].to_uppercase();
        if caps[1].eq_ignore_ascii_case("start") {
            TokenClass::Start(entity_type)
        } else {
            TokenClass::End(entity_type)
        }
    }

    /// Check if a token is a start or end marker.
    pub fn is_marker(&self, token: &str) -> bool {
        self.pattern.is_match(token)
    }

    /// Entity type named by a marker token, if it is one.
    pub fn marker_type(&self, token: &str) -> Option<String> {
        match self.classify(token) {
            TokenClass::Start(t) | TokenClass::End(t) => Some(t),
            TokenClass::Plain(_) => None,
        }
    }
}

/// The encoder's finite state: which span (if any) is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EncoderState {
    /// No span is open.
    #[default]
    Outside,
    /// A span was just opened; the next plain token gets `B-`.
    Begin(String),
    /// A span is open and has at least one token.
    Inside(String),
}

impl EncoderState {
    /// Return to `Outside`. Must be called between documents when a state is
    /// reused.
    pub fn reset(&mut self) {
        *self = EncoderState::Outside;
    }

    /// Entity type of the open span.
    pub fn open_type(&self) -> Option<&str> {
        match self {
            EncoderState::Outside => None,
            EncoderState::Begin(t) | EncoderState::Inside(t) => Some(t),
        }
    }

    /// Advance the machine by one token. Returns the next state and the tag
    /// to emit, if the token is a plain one.
    pub fn transition(self, class: TokenClass<'_>) -> Result<(EncoderState, Option<Tag>)> {
        match (self, class) {
            (EncoderState::Outside, TokenClass::Start(t)) => Ok((EncoderState::Begin(t), None)),
            (EncoderState::Begin(open) | EncoderState::Inside(open), TokenClass::Start(start)) => {
                Err(WebstructError::NestedMarker { open, start })
            }
            (EncoderState::Begin(open) | EncoderState::Inside(open), TokenClass::End(close))
                if open == close =>
            {
                Ok((EncoderState::Outside, None))
            }
            (state, TokenClass::End(close)) => Err(WebstructError::MalformedMarkerSequence {
                open: state.open_type().map(str::to_string),
                close,
            }),
            (EncoderState::Outside, TokenClass::Plain(_)) => {
                Ok((EncoderState::Outside, Some(Tag::Outside)))
            }
            (EncoderState::Begin(t), TokenClass::Plain(_)) => {
                let tag = Tag::Begin(t.clone());
                Ok((EncoderState::Inside(t), Some(tag)))
            }
            (EncoderState::Inside(t), TokenClass::Plain(_)) => {
                let tag = Tag::Inside(t.clone());
                Ok((EncoderState::Inside(t), Some(tag)))
            }
        }
    }
}

/// Encodes marker-annotated token streams into tag sequences.
///
/// ```
/// use webstruct_core::encoding::{SequenceEncoder, Scheme};
///
/// let encoder = SequenceEncoder::new(Scheme::Iob2).unwrap();
/// let tokens = ["hello", "__START_PER__", "John", "Doe", "__END_PER__", "said"];
/// let tags: Vec<String> = encoder
///     .encode(&tokens)
///     .unwrap()
///     .into_iter()
///     .map(|(_, tag)| tag.to_string())
///     .collect();
/// assert_eq!(tags, ["O", "B-PER", "I-PER", "O"]);
/// ```
#[derive(Debug, Clone)]
pub struct SequenceEncoder {
    classifier: MarkerClassifier,
    scheme: Scheme,
}

impl SequenceEncoder {
    /// Create an encoder for `scheme`.
    pub fn new(scheme: Scheme) -> Result<Self> {
        Ok(Self {
            classifier: MarkerClassifier::new()?,
            scheme,
        })
    }

    /// The tagging scheme.
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// The marker classifier used by this encoder.
    pub fn classifier(&self) -> &MarkerClassifier {
        &self.classifier
    }

    /// Encode part of a stream, continuing from `state`.
    ///
    /// Output is always IOB2: `(index into tokens, tag)` for every plain
    /// token. Spans may cross calls; e.g. an element's text and its child's
    /// text are encoded with the same state. Apply [`SequenceEncoder::finish`]
    /// to the whole document afterwards.
    pub fn encode_partial<S: AsRef<str>>(
        &self,
        state: &mut EncoderState,
        tokens: &[S],
    ) -> Result<Vec<(usize, Tag)>> {
        let mut out = Vec::with_capacity(tokens.len());
        for (index, token) in tokens.iter().enumerate() {
            let class = self.classifier.classify(token.as_ref());
            let (next, tag) = std::mem::take(state).transition(class)?;
            *state = next;
            if let Some(tag) = tag {
                out.push((index, tag));
            }
        }
        Ok(out)
    }

    /// Encode a complete stream from a fresh state, in this encoder's scheme.
    pub fn encode<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<(usize, Tag)>> {
        let mut state = EncoderState::default();
        let encoded = self.encode_partial(&mut state, tokens)?;
        let (indices, mut tags): (Vec<usize>, Vec<Tag>) = encoded.into_iter().unzip();
        self.finish(&mut tags);
        Ok(indices.into_iter().zip(tags).collect())
    }

    /// Convert a complete IOB2 document into this encoder's scheme.
    pub fn finish(&self, tags: &mut [Tag]) {
        if self.scheme == Scheme::Bilou {
            to_bilou(tags);
        }
    }
}

/// Rewrite IOB2 tags in place as BILOU: the final tag of every span becomes
/// `L-` (or `U-` for single-token spans).
pub fn to_bilou(tags: &mut [Tag]) {
    for i in 0..tags.len() {
        let continued = match (&tags[i], tags.get(i + 1)) {
            (Tag::Begin(t) | Tag::Inside(t), Some(Tag::Inside(next))) => t == next,
            _ => false,
        };
        if continued {
            continue;
        }
        let replacement = match &tags[i] {
            Tag::Begin(t) => Tag::Unit(t.clone()),
            Tag::Inside(t) => Tag::Last(t.clone()),
            _ => continue,
        };
        tags[i] = replacement;
    }
}

/// Convert BILOU tags back to IOB2 (`U-` to `B-`, `L-` to `I-`).
pub fn to_iob2(tags: &mut [Tag]) {
    for tag in tags.iter_mut() {
        let replacement = match tag {
            Tag::Unit(t) => Tag::Begin(std::mem::take(t)),
            Tag::Last(t) => Tag::Inside(std::mem::take(t)),
            _ => continue,
        };
        *tag = replacement;
    }
}

/// Fix orphaned `I-`/`L-` tags by promoting them to `B-`/`U-`.
///
/// With `strict` the first orphan is returned as an
/// [`WebstructError::InvalidTagTransition`] instead.
pub fn repair(tags: &[Tag], strict: bool) -> Result<Vec<Tag>> {
    let mut out: Vec<Tag> = Vec::with_capacity(tags.len());
    for (position, tag) in tags.iter().enumerate() {
        if Tag::is_valid_transition(out.last(), tag) {
            out.push(tag.clone());
            continue;
        }
        if strict {
            return Err(WebstructError::InvalidTagTransition {
                tag: tag.to_string(),
                position,
            });
        }
        let fixed = match tag {
            Tag::Inside(t) => Tag::Begin(t.clone()),
            Tag::Last(t) => Tag::Unit(t.clone()),
            other => other.clone(),
        };
        debug!(%tag, %fixed, position, "repaired orphan tag");
        out.push(fixed);
    }
    Ok(out)
}

/// A run of items sharing one entity type (or `O`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<T> {
    /// Grouped payloads, in input order
    pub items: Vec<T>,
    /// Entity type, `None` for a run of `O` items
    pub entity_type: Option<String>,
}

impl<T> Group<T> {
    /// Check if this group is an entity (not `O`).
    pub fn is_entity(&self) -> bool {
        self.entity_type.is_some()
    }
}

/// Group tagged data into spans.
///
/// `B-`/`U-` tags always open a new span; `I-`/`L-` tags extend the current
/// span when the type matches. An `I-`/`L-` tag of another type is treated as
/// a span start, or fails with `strict`. Consecutive `O` items form one group.
///
/// ```
/// use webstruct_core::encoding::{group, Tag};
///
/// let data = vec![
///     ("hello", Tag::Outside),
///     ("John", Tag::begin("PER")),
///     ("Doe", Tag::inside("PER")),
///     ("Mary", Tag::begin("PER")),
/// ];
/// let groups = group(data, false).unwrap();
/// assert_eq!(groups.len(), 3);
/// assert_eq!(groups[1].items, ["John", "Doe"]);
/// ```
pub fn group<T, B, I>(data: I, strict: bool) -> Result<Vec<Group<T>>>
where
    B: Borrow<Tag>,
    I: IntoIterator<Item = (T, B)>,
{
    let mut groups = Vec::new();
    let mut buf: Vec<T> = Vec::new();
    let mut current: Option<String> = None;

    for (position, (item, tag)) in data.into_iter().enumerate() {
        let tag: &Tag = tag.borrow();
        let starts_new = match tag {
            Tag::Outside => current.is_some(),
            Tag::Begin(_) | Tag::Unit(_) => true,
            Tag::Inside(t) | Tag::Last(t) => {
                let orphan = current.as_deref() != Some(t.as_str());
                if orphan {
                    if strict {
                        return Err(WebstructError::InvalidTagTransition {
                            tag: tag.to_string(),
                            position,
                        });
                    }
                    debug!(%tag, position, "orphan tag starts a new span");
                }
                orphan
            }
        };

        if starts_new && !buf.is_empty() {
            groups.push(Group {
                items: std::mem::take(&mut buf),
                entity_type: current.take(),
            });
        }
        current = tag.entity_type().map(str::to_string);
        buf.push(item);
    }

    if !buf.is_empty() {
        groups.push(Group {
            items: buf,
            entity_type: current,
        });
    }
    Ok(groups)
}

/// Token index ranges `(start, end_exclusive, type)` of every entity span.
pub fn entity_spans(tags: &[Tag]) -> Result<Vec<(usize, usize, String)>> {
    let mut spans = Vec::new();
    let mut pos = 0;
    for g in group(tags.iter().map(|t| ((), t)), false)? {
        let len = g.items.len();
        if let Some(entity_type) = g.entity_type {
            spans.push((pos, pos + len, entity_type));
        }
        pos += len;
    }
    Ok(spans)
}
