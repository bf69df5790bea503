//! # IOB2 / BILOU Tags
//!
//! Defines the tag vocabulary for sequence labeling of HTML tokens.
//! `O`, `B-<TYPE>` and `I-<TYPE>` form the IOB2 scheme; BILOU adds
//! `L-<TYPE>` (last token of a multi-token span) and `U-<TYPE>` (unit span).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WebstructError};

/// A per-token sequence label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Tag {
    /// Token is outside any entity.
    Outside,
    /// First token of an entity.
    Begin(String),
    /// Continuation token of an entity.
    Inside(String),
    /// Last token of a multi-token entity (BILOU only).
    Last(String),
    /// Single-token entity (BILOU only).
    Unit(String),
}

impl Tag {
    /// `B-<entity_type>`
    pub fn begin(entity_type: impl Into<String>) -> Self {
        Tag::Begin(entity_type.into())
    }

    /// `I-<entity_type>`
    pub fn inside(entity_type: impl Into<String>) -> Self {
        Tag::Inside(entity_type.into())
    }

    /// `L-<entity_type>`
    pub fn last(entity_type: impl Into<String>) -> Self {
        Tag::Last(entity_type.into())
    }

    /// `U-<entity_type>`
    pub fn unit(entity_type: impl Into<String>) -> Self {
        Tag::Unit(entity_type.into())
    }

    /// Get the entity type for this tag (`None` for `O`).
    pub fn entity_type(&self) -> Option<&str> {
        match self {
            Tag::Outside => None,
            Tag::Begin(t) | Tag::Inside(t) | Tag::Last(t) | Tag::Unit(t) => Some(t),
        }
    }

    /// Check if this is the `O` tag.
    pub fn is_outside(&self) -> bool {
        matches!(self, Tag::Outside)
    }

    /// Check if this tag opens a span (`B-` or `U-`).
    pub fn starts_span(&self) -> bool {
        matches!(self, Tag::Begin(_) | Tag::Unit(_))
    }

    /// Check if this tag must continue an open span (`I-` or `L-`).
    pub fn continues_span(&self) -> bool {
        matches!(self, Tag::Inside(_) | Tag::Last(_))
    }

    /// Check if a span can still be extended after this tag (`B-` or `I-`).
    pub fn is_open(&self) -> bool {
        matches!(self, Tag::Begin(_) | Tag::Inside(_))
    }

    /// Check if transitioning from `from` tag to `to` tag is valid.
    ///
    /// `I-X` / `L-X` may only follow `B-X` or `I-X`; everything else is allowed.
    pub fn is_valid_transition(from: Option<&Tag>, to: &Tag) -> bool {
        if !to.continues_span() {
            return true;
        }
        match from {
            Some(prev) if prev.is_open() => prev.entity_type() == to.entity_type(),
            _ => false,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Outside => write!(f, "O"),
            Tag::Begin(t) => write!(f, "B-{t}"),
            Tag::Inside(t) => write!(f, "I-{t}"),
            Tag::Last(t) => write!(f, "L-{t}"),
            Tag::Unit(t) => write!(f, "U-{t}"),
        }
    }
}

impl FromStr for Tag {
    type Err = WebstructError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "O" {
            return Ok(Tag::Outside);
        }

        let invalid = || WebstructError::InvalidTag(s.to_string());
        let (prefix, entity_type) = s.split_once('-').ok_or_else(invalid)?;
        if entity_type.is_empty() {
            return Err(invalid());
        }

        let entity_type = entity_type.to_string();
        match prefix {
            "B" => Ok(Tag::Begin(entity_type)),
            "I" => Ok(Tag::Inside(entity_type)),
            "L" => Ok(Tag::Last(entity_type)),
            "U" => Ok(Tag::Unit(entity_type)),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Tag {
    type Error = WebstructError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.to_string()
    }
}

/// Parse a list of tag strings, e.g. `["O", "B-PER", "I-PER"]`.
pub fn parse_tags<S: AsRef<str>>(tags: &[S]) -> Result<Vec<Tag>> {
    tags.iter().map(|t| t.as_ref().parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_string_roundtrip() {
        for s in ["O", "B-PER", "I-PER", "L-STREET", "U-CITY"] {
            let tag: Tag = s.parse().unwrap();
            assert_eq!(tag.to_string(), s);
        }
    }

    #[test]
    fn test_invalid_tags() {
        for s in ["", "o", "B-", "X-PER", "BPER", "B_PER"] {
            assert!(s.parse::<Tag>().is_err(), "{s:?} should not parse");
        }
    }

    #[test]
    fn test_entity_type() {
        assert_eq!(Tag::begin("PER").entity_type(), Some("PER"));
        assert_eq!(Tag::unit("CITY").entity_type(), Some("CITY"));
        assert_eq!(Tag::Outside.entity_type(), None);
        // entity types may contain dashes
        let tag: Tag = "B-US-STATE".parse().unwrap();
        assert_eq!(tag.entity_type(), Some("US-STATE"));
    }

    #[test]
    fn test_valid_transitions() {
        let b = Tag::begin("PER");
        let i = Tag::inside("PER");
        assert!(Tag::is_valid_transition(Some(&b), &i));
        assert!(Tag::is_valid_transition(Some(&i), &Tag::last("PER")));
        assert!(Tag::is_valid_transition(None, &b));
        assert!(Tag::is_valid_transition(Some(&Tag::Outside), &Tag::unit("PER")));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!Tag::is_valid_transition(None, &Tag::inside("PER")));
        assert!(!Tag::is_valid_transition(
            Some(&Tag::Outside),
            &Tag::inside("PER")
        ));
        assert!(!Tag::is_valid_transition(
            Some(&Tag::begin("ORG")),
            &Tag::inside("PER")
        ));
        assert!(!Tag::is_valid_transition(
            Some(&Tag::last("PER")),
            &Tag::last("PER")
        ));
    }

    #[test]
    fn test_serde_as_string() {
        let tags = vec![Tag::Outside, Tag::begin("PER"), Tag::inside("PER")];
        let json = serde_json::to_string(&tags).unwrap();
        assert_eq!(json, r#"["O","B-PER","I-PER"]"#);
        let back: Vec<Tag> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tags);
        assert!(serde_json::from_str::<Tag>(r#""Z-PER""#).is_err());
    }
}
