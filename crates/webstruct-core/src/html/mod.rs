//! HTML side of the pipeline: the arena tree, annotation markup helpers,
//! page domain inference and the position-preserving HTML tokenizer.

pub mod dom;
pub mod domain;
pub mod markup;
pub mod tokenizer;

pub use dom::{Descendants, Dom, Node, NodeId, NodeKind, TextSlot};
pub use domain::{DEFAULT_DOMAIN_BLACKLIST, DomainGuesser, registered_domain};
pub use markup::{EntityTagRewriter, MarkerStripper, rewrite_entity_tags, strip_markers};
pub use tokenizer::{HtmlToken, HtmlTokenizer, HtmlTokenizerConfig};
