//! Features of the text block and tree position a token belongs to.

use super::{FeatureDict, TokenFeature};
use crate::html::HtmlToken;

/// `parent_tag`: name of the element the token text is inside of.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParentTag;

impl TokenFeature for ParentTag {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        let name = token.dom().tag_name(token.parent()).unwrap_or_default();
        [("parent_tag", name)].into_iter().collect()
    }
}

/// `inside_tag_<name>`: whether the element owning the token's text block
/// ([`HtmlToken::elem`]) is a `<name>` element or is nested in one. Tail
/// tokens count as inside the element they follow.
#[derive(Debug, Clone)]
pub struct InsideTag {
    tag_name: String,
    key: String,
}

impl InsideTag {
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_string(),
            key: format!("inside_tag_{tag_name}"),
        }
    }
}

impl TokenFeature for InsideTag {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        let dom = token.dom();
        let elem = token.elem();
        let inside = std::iter::once(elem)
            .chain(dom.ancestors(elem))
            .any(|id| dom.tag_name(id) == Some(self.tag_name.as_str()));
        [(self.key.as_str(), inside)].into_iter().collect()
    }
}

/// `border_at_left` / `border_at_right`: first / last token of its block.
#[derive(Debug, Clone, Copy, Default)]
pub struct Borders;

impl TokenFeature for Borders {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        [
            ("border_at_left", token.index == 0),
            ("border_at_right", token.index + 1 == token.tokens.len()),
        ]
        .into_iter()
        .collect()
    }
}

/// `block_length`: size bucket of the token's text block:
/// `1`, `short` (up to 10), `medium` (up to 20) or `large`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockLength;

impl TokenFeature for BlockLength {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        let bucket = match token.tokens.len() {
            0 | 1 => "1",
            2..=10 => "short",
            11..=20 => "medium",
            _ => "large",
        };
        [("block_length", bucket)].into_iter().collect()
    }
}
