//! # HTML Tokenizer
//!
//! Walks an HTML tree in document order, tokenizes every text block and
//! encodes annotation markers into tags. Each resulting [`HtmlToken`]
//! remembers which text block it came from and where, so that predicted
//! tags can be spliced back into the tree ([`HtmlTokenizer::detokenize_single`]).

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::dom::{Dom, NodeId, TextSlot};
use super::markup::MarkerStripper;
use crate::encoding::{EncoderState, Scheme, SequenceEncoder, Tag, group};
use crate::error::{Result, WebstructError};
use crate::text::{DefaultTokenizer, TextToken, TextTokenizer};

/// A token together with its place in the HTML tree.
#[derive(Clone)]
pub struct HtmlToken {
    /// Index of this token in `tokens`
    pub index: usize,
    /// All tokens of the same text block
    pub tokens: Arc<[String]>,
    /// The text block (element text or tail) the token came from
    pub slot: TextSlot,
    /// Start of the token in the text block, in characters
    pub position: usize,
    /// Length of the token in the text block, in characters
    pub length: usize,
    /// The private tree shared by all tokens of one document
    pub dom: Arc<Dom>,
}

impl HtmlToken {
    /// The token text.
    pub fn token(&self) -> &str {
        &self.tokens[self.index]
    }

    /// The node owning the text block. For tail tokens this is the element
    /// *before* the text; most features want [`HtmlToken::parent`] instead.
    pub fn elem(&self) -> NodeId {
        self.slot.node()
    }

    /// Check if the token comes from the tail of [`HtmlToken::elem`].
    pub fn is_tail(&self) -> bool {
        self.slot.is_tail()
    }

    /// The element the token text is directly inside of.
    pub fn parent(&self) -> NodeId {
        match self.slot {
            TextSlot::Text(id) => id,
            TextSlot::Tail(id) => self.dom.parent(id).unwrap_or(id),
        }
    }

    /// The tree this token belongs to.
    pub fn dom(&self) -> &Dom {
        &self.dom
    }
}

impl fmt::Debug for HtmlToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlToken")
            .field("token", &self.token())
            .field("parent", &self.dom.tag_name(self.parent()))
            .field("index", &self.index)
            .field("position", &self.position)
            .field("length", &self.length)
            .finish()
    }
}

/// Configuration for [`HtmlTokenizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlTokenizerConfig {
    /// Entity types to keep; markers of other types are treated as absent.
    /// `None` keeps every type.
    pub tagset: Option<HashSet<String>>,
    /// Tagging scheme of the produced tags
    pub scheme: Scheme,
    /// Elements removed before tokenization (their content is kept)
    pub kill_tags: HashSet<String>,
    /// Element renames applied before tokenization
    pub replace_tags: HashMap<String, String>,
    /// Elements that produce no tokens but stay in the tree, together with
    /// their tail text. Comments are always ignored.
    pub ignore_tags: HashSet<String>,
}

impl Default for HtmlTokenizerConfig {
    fn default() -> Self {
        Self {
            tagset: None,
            scheme: Scheme::Iob2,
            kill_tags: HashSet::new(),
            replace_tags: HashMap::new(),
            ignore_tags: ["script", "style"].into_iter().map(String::from).collect(),
        }
    }
}

impl HtmlTokenizerConfig {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| WebstructError::Config(e.to_string()))
    }

    /// Keep only these entity types.
    pub fn with_tagset<I, S>(mut self, tagset: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tagset = Some(tagset.into_iter().map(Into::into).collect());
        self
    }

    /// Set the tagging scheme.
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Set elements to remove before tokenization.
    pub fn with_kill_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kill_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set element renames (`old -> new`).
    pub fn with_replace_tags<I, K, V>(mut self, mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.replace_tags = mapping
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Set elements that produce no tokens.
    pub fn with_ignore_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

enum Step {
    Enter(NodeId),
    Tail(NodeId),
}

/// Converts HTML trees into aligned token and tag sequences, and back.
///
/// ```
/// use webstruct_core::html::{Dom, HtmlTokenizer, HtmlTokenizerConfig, rewrite_entity_tags};
///
/// let html = rewrite_entity_tags("<p>Call <PER>John Doe</PER> now</p>", &["PER"]).unwrap();
/// let tokenizer = HtmlTokenizer::new(HtmlTokenizerConfig::default()).unwrap();
/// let (tokens, tags) = tokenizer.tokenize_single(&Dom::parse_fragment(&html)).unwrap();
///
/// let words: Vec<_> = tokens.iter().map(|t| t.token()).collect();
/// let tags: Vec<_> = tags.iter().map(|t| t.to_string()).collect();
/// assert_eq!(words, ["Call", "John", "Doe", "now"]);
/// assert_eq!(tags, ["O", "B-PER", "I-PER", "O"]);
/// ```
#[derive(Clone)]
pub struct HtmlTokenizer {
    config: HtmlTokenizerConfig,
    tagset: Option<HashSet<String>>,
    encoder: SequenceEncoder,
    stripper: MarkerStripper,
    text_tokenizer: Arc<dyn TextTokenizer>,
}

impl fmt::Debug for HtmlTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlTokenizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HtmlTokenizer {
    /// Create a tokenizer using [`DefaultTokenizer`] for text blocks.
    pub fn new(config: HtmlTokenizerConfig) -> Result<Self> {
        let tagset = config
            .tagset
            .as_ref()
            .map(|set| set.iter().map(|t| t.to_uppercase()).collect());
        Ok(Self {
            encoder: SequenceEncoder::new(config.scheme)?,
            stripper: MarkerStripper::new()?,
            text_tokenizer: Arc::new(DefaultTokenizer::new()?),
            tagset,
            config,
        })
    }

    /// Use a different text tokenizer for text blocks.
    pub fn with_text_tokenizer(mut self, tokenizer: Arc<dyn TextTokenizer>) -> Self {
        self.text_tokenizer = tokenizer;
        self
    }

    /// The configuration this tokenizer was built with.
    pub fn config(&self) -> &HtmlTokenizerConfig {
        &self.config
    }

    /// Tokenize one tree. The input is not modified; all tokens share a
    /// private copy with the configured renames and removals applied.
    ///
    /// Returns two lists of equal length. For unannotated HTML every tag is
    /// `O`; for HTML without text both lists are empty.
    pub fn tokenize_single(&self, dom: &Dom) -> Result<(Vec<HtmlToken>, Vec<Tag>)> {
        let mut tree = dom.clone();
        if !self.config.kill_tags.is_empty() {
            tree.kill_tags(&self.config.kill_tags);
        }
        if !self.config.replace_tags.is_empty() {
            tree.rename_tags(&self.config.replace_tags);
        }
        let tree = Arc::new(tree);

        let mut state = EncoderState::default();
        let mut tokens = Vec::new();
        let mut tags = Vec::new();

        let mut stack = vec![Step::Enter(tree.root())];
        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(id) => {
                    // ignored nodes are skipped together with their tail
                    if self.is_ignored(&tree, id) {
                        continue;
                    }
                    stack.push(Step::Tail(id));
                    self.tokenize_block(&tree, TextSlot::Text(id), &mut state, &mut tokens, &mut tags)?;
                    stack.extend(tree.children(id).iter().rev().map(|&c| Step::Enter(c)));
                }
                Step::Tail(id) => {
                    self.tokenize_block(&tree, TextSlot::Tail(id), &mut state, &mut tokens, &mut tags)?;
                }
            }
        }

        self.encoder.finish(&mut tags);
        debug!(tokens = tokens.len(), "tokenized document");
        Ok((tokens, tags))
    }

    /// Tokenize many trees in parallel.
    pub fn tokenize(&self, doms: &[Dom]) -> Result<(Vec<Vec<HtmlToken>>, Vec<Vec<Tag>>)> {
        let results = doms
            .par_iter()
            .map(|dom| self.tokenize_single(dom))
            .collect::<Result<Vec<_>>>()?;
        Ok(results.into_iter().unzip())
    }

    fn is_ignored(&self, dom: &Dom, id: NodeId) -> bool {
        match dom.tag_name(id) {
            Some(name) => self.config.ignore_tags.contains(name),
            None => true,
        }
    }

    fn tokenize_block(
        &self,
        dom: &Arc<Dom>,
        slot: TextSlot,
        state: &mut EncoderState,
        tokens: &mut Vec<HtmlToken>,
        tags: &mut Vec<Tag>,
    ) -> Result<()> {
        let text = dom.slot_text(slot);
        if text.trim().is_empty() {
            return Ok(());
        }

        let raw: Vec<TextToken> = self
            .text_tokenizer
            .tokenize(text)
            .filter(|t| self.is_known_marker_or_text(&t.chars))
            .collect();
        let chars: Vec<&str> = raw.iter().map(|t| t.chars.as_str()).collect();
        let encoded = self.encoder.encode_partial(state, &chars)?;

        let block: Arc<[String]> = encoded
            .iter()
            .map(|(i, _)| raw[*i].chars.clone())
            .collect();
        for (index, (i, tag)) in encoded.into_iter().enumerate() {
            tokens.push(HtmlToken {
                index,
                tokens: Arc::clone(&block),
                slot,
                position: raw[i].position,
                length: raw[i].length,
                dom: Arc::clone(dom),
            });
            tags.push(tag);
        }
        Ok(())
    }

    /// Markers of types outside the tagset are dropped entirely, so their
    /// words become plain `O` tokens.
    fn is_known_marker_or_text(&self, token: &str) -> bool {
        let Some(tagset) = &self.tagset else {
            return true;
        };
        match self.encoder.classifier().marker_type(token) {
            Some(entity_type) => tagset.contains(&entity_type),
            None => true,
        }
    }

    /// Build an annotated tree from tokens and their tags.
    ///
    /// Markers are inserted as ` __START_<TYPE>__ ` / ` __END_<TYPE>__ ` at
    /// the recorded token offsets, so all other text is preserved exactly.
    /// The tokens should come from a tree without markers (see
    /// [`HtmlTokenizer::cleanup_tree`]).
    ///
    /// Returns `None` for an empty token list.
    pub fn detokenize_single(&self, tokens: &[HtmlToken], tags: &[Tag]) -> Result<Option<Dom>> {
        if tokens.len() != tags.len() {
            return Err(WebstructError::LengthMismatch {
                tokens: tokens.len(),
                tags: tags.len(),
            });
        }
        let Some(first) = tokens.first() else {
            return Ok(None);
        };
        let mut tree = first.dom().clone();

        // (position, is_start, type) per text block
        let mut edits: BTreeMap<TextSlot, Vec<(usize, bool, String)>> = BTreeMap::new();
        let mut pos = 0;
        for g in group(tokens.iter().zip(tags), false)? {
            let n = g.items.len();
            if let Some(entity_type) = g.entity_type {
                let start = &tokens[pos];
                let end = &tokens[pos + n - 1];
                edits
                    .entry(start.slot)
                    .or_default()
                    .push((start.position, true, entity_type.clone()));
                edits
                    .entry(end.slot)
                    .or_default()
                    .push((end.position + end.length, false, entity_type));
            }
            pos += n;
        }

        for (slot, mut marks) in edits {
            // ends before starts at the same offset: "A __END_X__ __START_Y__ B"
            marks.sort_by_key(|&(position, is_start, _)| (position, is_start));
            let source = tree.slot_text(slot);
            let offsets: Vec<usize> = source
                .char_indices()
                .map(|(b, _)| b)
                .chain(std::iter::once(source.len()))
                .collect();
            let byte_at = |chars: usize| offsets[chars.min(offsets.len() - 1)];

            let mut out = String::with_capacity(source.len() + marks.len() * 16);
            let mut copied = 0;
            for (position, is_start, entity_type) in marks {
                let at = byte_at(position);
                out.push_str(&source[copied..at]);
                copied = at;
                let kind = if is_start { "START" } else { "END" };
                out.push_str(&format!(" __{kind}_{entity_type}__ "));
            }
            out.push_str(&source[copied..]);
            tree.set_slot_text(slot, out);
        }

        debug!(tokens = tokens.len(), "detokenized document");
        Ok(Some(tree))
    }

    /// Return a copy of `dom` with all markers removed from text and tails.
    pub fn cleanup_tree(&self, dom: &Dom) -> Dom {
        let mut cleaned = dom.clone();
        let ids: Vec<NodeId> = cleaned.descendants(cleaned.root()).collect();
        for id in ids {
            for slot in [TextSlot::Text(id), TextSlot::Tail(id)] {
                let text = cleaned.slot_text(slot);
                if self.stripper.has_markers(text) {
                    let stripped = self.stripper.strip(text);
                    cleaned.set_slot_text(slot, stripped);
                }
            }
        }
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::parse_tags;
    use crate::html::rewrite_entity_tags;

    const ANNOTATED: &str = "<p>hello, <PER>John <b>Doe</b></PER> <br> <PER>Mary</PER> said</p>";

    fn annotated_dom() -> Dom {
        Dom::parse_fragment(&rewrite_entity_tags(ANNOTATED, &["PER"]).unwrap())
    }

    fn words(tokens: &[HtmlToken]) -> Vec<&str> {
        tokens.iter().map(|t| t.token()).collect()
    }

    fn tokenizer(config: HtmlTokenizerConfig) -> HtmlTokenizer {
        HtmlTokenizer::new(config).unwrap()
    }

    #[test]
    fn test_tokenize_single() {
        let t = tokenizer(HtmlTokenizerConfig::new().with_replace_tags([("b", "strong")]));
        let (tokens, tags) = t.tokenize_single(&annotated_dom()).unwrap();

        assert_eq!(words(&tokens), ["hello", "John", "Doe", "Mary", "said"]);
        assert_eq!(tags, parse_tags(&["O", "B-PER", "I-PER", "B-PER", "O"]).unwrap());

        let places: Vec<_> = tokens
            .iter()
            .map(|tok| {
                let dom = tok.dom();
                (dom.tag_name(tok.elem()).unwrap(), dom.tag_name(tok.parent()).unwrap())
            })
            .collect();
        assert_eq!(
            places,
            [("p", "p"), ("p", "p"), ("strong", "strong"), ("br", "p"), ("br", "p")]
        );
        assert!(tokens[3].is_tail());
        assert!(!tokens[2].is_tail());
    }

    #[test]
    fn test_tokenize_bilou() {
        let t = tokenizer(HtmlTokenizerConfig::new().with_scheme(Scheme::Bilou));
        let (_, tags) = t.tokenize_single(&annotated_dom()).unwrap();
        assert_eq!(tags, parse_tags(&["O", "B-PER", "L-PER", "U-PER", "O"]).unwrap());
    }

    #[test]
    fn test_token_positions_and_block() {
        let t = tokenizer(HtmlTokenizerConfig::new());
        let dom = Dom::parse_fragment("<p>Hello  wide world</p>");
        let (tokens, _) = t.tokenize_single(&dom).unwrap();
        assert_eq!(tokens[1].position, 7);
        assert_eq!(tokens[1].length, 4);
        assert_eq!(tokens[1].index, 1);
        assert_eq!(&*tokens[1].tokens, ["Hello", "wide", "world"]);
    }

    #[test]
    fn test_empty_document() {
        let t = tokenizer(HtmlTokenizerConfig::new());
        let (tokens, tags) = t.tokenize_single(&Dom::parse_fragment("<p></p>")).unwrap();
        assert!(tokens.is_empty());
        assert!(tags.is_empty());
        assert!(t.detokenize_single(&[], &[]).unwrap().is_none());
    }

    #[test]
    fn test_caller_tree_untouched() {
        let t = tokenizer(
            HtmlTokenizerConfig::new()
                .with_kill_tags(["b"])
                .with_replace_tags([("p", "div")]),
        );
        let dom = Dom::parse_fragment("<p>a <b>b</b> c</p>");
        let before = dom.to_html();
        let (tokens, _) = t.tokenize_single(&dom).unwrap();
        assert_eq!(dom.to_html(), before);
        assert_eq!(words(&tokens), ["a", "b", "c"]);
        assert_eq!(tokens[0].dom().to_html(), "<div>a b c</div>");
    }

    #[test]
    fn test_ignored_elements_and_comments() {
        let t = tokenizer(HtmlTokenizerConfig::new());
        let dom = Dom::parse_fragment("<div>a<script>x</script>b</div>");
        let (tokens, _) = t.tokenize_single(&dom).unwrap();
        assert_eq!(words(&tokens), ["a"]);

        let dom = Dom::parse_fragment("<div><p>a</p><!-- c d -->e<style>p {}</style>f<p>g</p></div>");
        let (tokens, _) = t.tokenize_single(&dom).unwrap();
        assert_eq!(words(&tokens), ["a", "g"]);

        let t = tokenizer(HtmlTokenizerConfig::new().with_ignore_tags(Vec::<String>::new()));
        let dom = Dom::parse_fragment("<div>a<script>x</script>b</div>");
        let (tokens, _) = t.tokenize_single(&dom).unwrap();
        assert_eq!(words(&tokens), ["a", "x", "b"]);
    }

    #[test]
    fn test_unknown_entity_types_are_demoted() {
        let t = tokenizer(HtmlTokenizerConfig::new().with_tagset(["per"]));
        let dom = Dom::parse_fragment(
            "<p> __START_ORG__ Acme __END_ORG__ and __START_PER__ John __END_PER__ </p>",
        );
        let (tokens, tags) = t.tokenize_single(&dom).unwrap();
        assert_eq!(words(&tokens), ["Acme", "and", "John"]);
        assert_eq!(tags, parse_tags(&["O", "O", "B-PER"]).unwrap());
    }

    #[test]
    fn test_malformed_markers_fail() {
        let t = tokenizer(HtmlTokenizerConfig::new());
        let dom = Dom::parse_fragment("<p> __START_PER__ John __END_ORG__ </p>");
        assert!(matches!(
            t.tokenize_single(&dom),
            Err(WebstructError::MalformedMarkerSequence { .. })
        ));
    }

    #[test]
    fn test_detokenize_length_mismatch() {
        let t = tokenizer(HtmlTokenizerConfig::new());
        let (tokens, _) = t.tokenize_single(&annotated_dom()).unwrap();
        let err = t.detokenize_single(&tokens, &[Tag::Outside]).unwrap_err();
        assert!(matches!(err, WebstructError::LengthMismatch { tokens: 5, tags: 1 }));
    }

    #[test]
    fn test_cleanup_tree() {
        let t = tokenizer(HtmlTokenizerConfig::new());
        let cleaned = t.cleanup_tree(&annotated_dom());
        assert_eq!(cleaned.to_html(), "<p>hello, John <b>Doe</b> <br> Mary said</p>");
    }

    #[test]
    fn test_detokenize_roundtrip() {
        let t = tokenizer(HtmlTokenizerConfig::new());
        let annotated = annotated_dom();
        let clean = t.cleanup_tree(&annotated);

        let (_, tags) = t.tokenize_single(&annotated).unwrap();
        let (clean_tokens, clean_tags) = t.tokenize_single(&clean).unwrap();
        assert!(clean_tags.iter().all(Tag::is_outside));

        let restored = t.detokenize_single(&clean_tokens, &tags).unwrap().unwrap();
        let (restored_tokens, restored_tags) = t.tokenize_single(&restored).unwrap();
        assert_eq!(words(&restored_tokens), words(&clean_tokens));
        assert_eq!(restored_tags, tags);
        assert_eq!(t.cleanup_tree(&restored).to_html(), clean.to_html());
        assert_eq!(
            restored.to_html(),
            "<p>hello,  __START_PER__ John <b>Doe __END_PER__ </b> <br>  __START_PER__ Mary __END_PER__  said</p>"
        );
    }

    #[test]
    fn test_detokenize_preserves_punctuation() {
        let t = tokenizer(HtmlTokenizerConfig::new());
        let dom = Dom::parse_fragment("<p>Visit: Shelbourne Road, Dublin.</p>");
        let (tokens, _) = t.tokenize_single(&dom).unwrap();
        assert_eq!(words(&tokens), ["Visit:", "Shelbourne", "Road", "Dublin", "."]);
        let tags = parse_tags(&["O", "B-STREET", "I-STREET", "B-CITY", "O"]).unwrap();
        let out = t.detokenize_single(&tokens, &tags).unwrap().unwrap();
        assert_eq!(
            out.text(out.root()),
            "Visit:  __START_STREET__ Shelbourne Road __END_STREET__ ,  __START_CITY__ Dublin __END_CITY__ ."
        );
    }

    #[test]
    fn test_tokenize_many() {
        let t = tokenizer(HtmlTokenizerConfig::new());
        let doms = vec![annotated_dom(), Dom::parse_fragment("<p>x y</p>")];
        let (x, y) = t.tokenize(&doms).unwrap();
        assert_eq!(x.len(), 2);
        assert_eq!(y[0].len(), 5);
        assert_eq!(words(&x[1]), ["x", "y"]);
    }

    #[test]
    fn test_config_from_json() {
        let config = HtmlTokenizerConfig::from_json(
            r#"{"scheme": "bilou", "replace_tags": {"b": "strong"}, "tagset": ["PER"]}"#,
        )
        .unwrap();
        assert_eq!(config.scheme, Scheme::Bilou);
        assert_eq!(config.replace_tags.get("b").map(String::as_str), Some("strong"));
        assert!(config.ignore_tags.contains("script"));
        assert!(HtmlTokenizerConfig::from_json("{\"scheme\": 3}").is_err());
    }
}
