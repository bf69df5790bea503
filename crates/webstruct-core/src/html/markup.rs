//! Annotation markup in raw HTML and text.
//!
//! Annotated pages mark entities either with literal pseudo-tags
//! (`<PER>John</PER>`) or with whitespace-delimited marker tokens
//! (`__START_PER__ John __END_PER__`). Pseudo-tags are rewritten to markers
//! before parsing; markers can be stripped again to recover plain text.

use regex::{Captures, Regex};

use crate::error::Result;

/// Rewrites `<TYPE>` / `</TYPE>` pseudo-tags for a known set of entity types
/// into ` __START_TYPE__ ` / ` __END_TYPE__ `.
///
/// ```
/// use webstruct_core::html::EntityTagRewriter;
///
/// let rewriter = EntityTagRewriter::new(&["PER"]).unwrap();
/// assert_eq!(
///     rewriter.rewrite("<p><per>John</per></p>"),
///     "<p> __START_PER__ John __END_PER__ </p>"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct EntityTagRewriter {
    pattern: Option<Regex>,
}

impl EntityTagRewriter {
    /// Create a rewriter for `known_types` (matched case-insensitively).
    pub fn new<S: AsRef<str>>(known_types: &[S]) -> Result<Self> {
        if known_types.is_empty() {
            return Ok(Self { pattern: None });
        }
        let alternatives: Vec<String> = known_types
            .iter()
            .map(|t| regex::escape(t.as_ref()))
            .collect();
        let pattern = Regex::new(&format!(r"(?i)<(/?)({})\s*>", alternatives.join("|")))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// Rewrite all known pseudo-tags in `html`.
    pub fn rewrite(&self, html: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return html.to_string();
        };
        pattern
            .replace_all(html, |caps: &Captures<'_>| {
                let kind = if caps[1].is_empty() { "START" } else { "END" };
                format!(" __{kind}_{}__ ", caps[2].to_uppercase())
            })
            .into_owned()
    }
}

/// Convenience wrapper around [`EntityTagRewriter`].
pub fn rewrite_entity_tags<S: AsRef<str>>(html: &str, known_types: &[S]) -> Result<String> {
    Ok(EntityTagRewriter::new(known_types)?.rewrite(html))
}

/// Removes marker tokens from text.
#[derive(Debug, Clone)]
pub struct MarkerStripper {
    pattern: Regex,
}

impl MarkerStripper {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(r"(?i)__(?:START|END)_\w+__")?,
        })
    }

    /// Remove every whitespace-delimited marker together with one adjacent
    /// whitespace character on each side. Words that would touch after the
    /// removal are kept apart by a single space.
    ///
    /// ```
    /// use webstruct_core::html::MarkerStripper;
    ///
    /// let stripper = MarkerStripper::new().unwrap();
    /// assert_eq!(stripper.strip("hello  __START_PER__ John __END_PER__  said"), "hello John said");
    /// assert_eq!(stripper.strip("a __END_X__ __START_Y__ b"), "a b");
    /// ```
    pub fn strip(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut copied = 0;

        for m in self.pattern.find_iter(text) {
            let delimited_before = text[..m.start()]
                .chars()
                .next_back()
                .is_none_or(char::is_whitespace);
            let delimited_after = text[m.end()..]
                .chars()
                .next()
                .is_none_or(char::is_whitespace);
            if !delimited_before || !delimited_after || m.start() < copied {
                continue;
            }

            let mut start = m.start();
            if let Some(ch) = text[copied..start].chars().next_back() {
                start -= ch.len_utf8();
            }
            let mut end = m.end();
            if let Some(ch) = text[end..].chars().next() {
                end += ch.len_utf8();
            }

            out.push_str(&text[copied..start]);
            let glued = out.chars().next_back().is_some_and(|c| !c.is_whitespace())
                && text[end..].chars().next().is_some_and(|c| !c.is_whitespace());
            if glued {
                out.push(' ');
            }
            copied = end;
        }

        out.push_str(&text[copied..]);
        out
    }

    /// Check if `text` contains any marker.
    pub fn has_markers(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Convenience wrapper around [`MarkerStripper::strip`].
pub fn strip_markers(text: &str) -> Result<String> {
    Ok(MarkerStripper::new()?.strip(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_entity_tags() {
        let html = "<p>hello, <PER>John <b>Doe</b></PER> <br> <PER>Mary</PER> said</p>";
        let rewritten = rewrite_entity_tags(html, &["PER"]).unwrap();
        assert_eq!(
            rewritten,
            "<p>hello,  __START_PER__ John <b>Doe</b> __END_PER__  <br>  __START_PER__ Mary __END_PER__  said</p>"
        );
    }

    #[test]
    fn test_rewrite_ignores_unknown_and_html_tags() {
        let html = "<ORG>Acme</ORG> <b>bold</b> <p>text</p>";
        assert_eq!(rewrite_entity_tags(html, &["PER"]).unwrap(), html);
        assert_eq!(rewrite_entity_tags(html, &[] as &[&str]).unwrap(), html);
        // "p" must not match inside "<per>" or vice versa
        let rewritten = rewrite_entity_tags("<p><per>x</per></p>", &["P"]).unwrap();
        assert_eq!(rewritten, " __START_P__ <per>x</per> __END_P__ ");
    }

    #[test]
    fn test_strip_markers() {
        let stripper = MarkerStripper::new().unwrap();
        assert_eq!(stripper.strip("no markers here"), "no markers here");
        assert_eq!(stripper.strip(" __START_PER__ John"), "John");
        assert_eq!(stripper.strip("Doe __END_PER__ "), "Doe");
        assert_eq!(stripper.strip("John __END_PER__said"), "John __END_PER__said");
        assert_eq!(stripper.strip("x__START_PER__ y"), "x__START_PER__ y");
        assert_eq!(stripper.strip("a __START_ZIP_CODE__ 1 __END_ZIP_CODE__ b"), "a 1 b");
        assert_eq!(strip_markers("__START_ORG__ Acme __END_ORG__").unwrap(), "Acme");
    }

    #[test]
    fn test_has_markers() {
        let stripper = MarkerStripper::new().unwrap();
        assert!(stripper.has_markers("x __END_ORG__"));
        assert!(!stripper.has_markers("__ENDORG__"));
    }
}
